//! The reader's authenticated session.
//!
//! A session is three keys in a [`SessionStore`]: `auth_token`, `user_email`
//! and `user_name`. All three present means logged in; anything less means
//! logged out. [`Session`] is the single object the rest of the program asks
//! about authentication.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::api::{LoginRequest, SignupRequest};
use crate::client::Backend;
use crate::{FolioError, Result};

pub const AUTH_TOKEN_KEY: &str = "auth_token";
pub const USER_EMAIL_KEY: &str = "user_email";
pub const USER_NAME_KEY: &str = "user_name";

const DEMO_EMAIL: &str = "teacher@giaic.com";
const DEMO_NAME: &str = "GIAIC Teacher (Demo)";

/// Key/value persistence behind a [`Session`].
pub trait SessionStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// Keeps the session for the lifetime of the process only.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.values.remove(key);
        Ok(())
    }
}

/// A JSON object on disk, rewritten on every change.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl FileStore {
    /// Open the store at `path`; a missing file is an empty session.
    ///
    /// An unreadable or corrupt file is logged and treated as empty so that a
    /// bad session file can never lock the reader out.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let values = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "ignoring corrupt session file");
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(FolioError::Io(e)),
        };

        Ok(Self { path, values })
    }

    /// `<config dir>/folio/session.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("folio").join("session.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(&self.values)
            .map_err(|e| FolioError::SessionError(e.to_string()))?;
        fs::write(&self.path, raw)?;
        Ok(())
    }
}

impl SessionStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        if self.values.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}

/// The logged-in reader
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub email: String,
    pub name: String,
}

/// Authentication state over a [`SessionStore`].
pub struct Session<S: SessionStore> {
    store: S,
}

impl<S: SessionStore> Session<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The current user, when every session key is present.
    pub fn load(&self) -> Option<User> {
        let _token = self.store.get(AUTH_TOKEN_KEY)?;
        let email = self.store.get(USER_EMAIL_KEY)?;
        let name = self.store.get(USER_NAME_KEY)?;
        Some(User { email, name })
    }

    pub fn is_authenticated(&self) -> bool {
        self.load().is_some()
    }

    /// The bearer token, only while fully logged in
    pub fn token(&self) -> Option<String> {
        self.load().and_then(|_| self.store.get(AUTH_TOKEN_KEY))
    }

    /// Store all three keys.
    pub fn set(&mut self, token: &str, email: &str, name: &str) -> Result<()> {
        self.store.set(AUTH_TOKEN_KEY, token)?;
        self.store.set(USER_EMAIL_KEY, email)?;
        self.store.set(USER_NAME_KEY, name)?;
        debug!(email, "session stored");
        Ok(())
    }

    /// Remove all three keys.
    pub fn clear(&mut self) -> Result<()> {
        self.store.remove(AUTH_TOKEN_KEY)?;
        self.store.remove(USER_EMAIL_KEY)?;
        self.store.remove(USER_NAME_KEY)?;
        Ok(())
    }

    /// Log in against the backend and store the session.
    pub async fn login<B>(&mut self, backend: &B, email: &str, password: &str) -> Result<User>
    where
        B: Backend + ?Sized,
    {
        let request = LoginRequest { email: email.to_string(), password: password.to_string() };
        let token = backend.login(&request).await?;
        let name = display_name(email);

        self.set(&token, email, &name)?;
        Ok(User { email: email.to_string(), name })
    }

    /// Create an account, then log in to obtain its token.
    pub async fn signup<B>(&mut self, backend: &B, request: &SignupRequest) -> Result<User>
    where
        B: Backend + ?Sized,
    {
        backend.signup(request).await?;

        let login = LoginRequest { email: request.email.clone(), password: request.password.clone() };
        let token = backend.login(&login).await?;

        self.set(&token, &request.email, &request.full_name)?;
        Ok(User { email: request.email.clone(), name: request.full_name.clone() })
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

/// The name shown for an account that logged in with `email`
pub fn display_name(email: &str) -> String {
    if email == DEMO_EMAIL {
        return DEMO_NAME.to_string();
    }
    email.split('@').next().unwrap_or(email).to_string()
}

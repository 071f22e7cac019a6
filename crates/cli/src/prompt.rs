use std::io::{self, BufRead, Write};

use folio_core::{Confirm, TruncationNotice};

use crate::echo;

/// Asks on the terminal before sending a truncated page.
///
/// With `--yes` every truncation is accepted without asking. A closed or
/// unreadable stdin counts as "no".
pub struct TerminalConfirm {
    assume_yes: bool,
}

impl TerminalConfirm {
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }
}

impl Confirm for TerminalConfirm {
    fn confirm_truncation(&mut self, notice: &TruncationNotice) -> bool {
        echo::print_truncation_notice(notice);
        if self.assume_yes {
            echo::print_info("Continuing (--yes)");
            return true;
        }

        eprint!("Send the truncated text? [y/N] ");
        let _ = io::stderr().flush();

        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(0) | Err(_) => false,
            Ok(_) => is_yes(&answer),
        }
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

use std::{env, fs, path::PathBuf};

fn input_arg() -> clap::Arg {
    clap::arg!(<INPUT> "URL to fetch, local HTML file, or '-' for stdin")
}

fn output_arg() -> clap::Arg {
    clap::arg!(-o --output <FILE> "Output file (default: stdout)")
        .value_name("FILE")
        .value_parser(clap::value_parser!(std::path::PathBuf))
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=OUT_DIR");

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let completions_dir = out_dir.join("completions");

    fs::create_dir_all(&completions_dir).unwrap();

    let mut cmd = clap::Command::new("folio")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Reader-assist tools for documentation sites")
        .arg(clap::arg!(--config <FILE> "Config file").global(true))
        .arg(clap::arg!(--"api-url" <URL> "Backend URL").global(true))
        .arg(clap::arg!(--session <FILE> "Session file").global(true))
        .arg(clap::arg!(-y --yes "Send truncated content without asking").global(true))
        .arg(clap::arg!(-v --verbose "Enable debug logging").global(true))
        .subcommand(
            clap::Command::new("extract")
                .about("Print the primary text of a page")
                .arg(input_arg())
                .arg(clap::arg!(-f --format <FORMAT> "Output format").value_parser(["text", "json"]))
                .arg(clap::arg!(--selector <CSS> "Content region selector").action(clap::ArgAction::Append))
                .arg(output_arg()),
        )
        .subcommand(
            clap::Command::new("translate")
                .about("Translate a page")
                .arg(input_arg())
                .arg(clap::arg!(-l --lang <LANG> "Target language code"))
                .arg(clap::arg!(--text "Treat INPUT as plain text instead of HTML"))
                .arg(output_arg()),
        )
        .subcommand(
            clap::Command::new("personalize")
                .about("Rewrite a page for a skill level")
                .arg(input_arg())
                .arg(
                    clap::arg!(-l --level <LEVEL> "Skill level")
                        .required(true)
                        .value_parser(["beginner", "intermediate", "advanced"]),
                )
                .arg(clap::arg!(--chapter <CHAPTER> "Chapter slug"))
                .arg(clap::arg!(--text "Treat INPUT as plain text instead of HTML"))
                .arg(output_arg()),
        )
        .subcommand(
            clap::Command::new("chat")
                .about("Ask the book assistant")
                .arg(clap::arg!([QUESTION] "The question; omit for an interactive session"))
                .arg(clap::arg!(--page <PAGE> "Page URL or path the question is about"))
                .arg(clap::arg!(--chapter <CHAPTER> "Chapter slug"))
                .arg(clap::arg!(--select <TEXT> "Selected text to send as context")),
        )
        .subcommand(
            clap::Command::new("login")
                .about("Log in and store the session")
                .arg(clap::arg!(--email <EMAIL>).required(true))
                .arg(clap::arg!(--password <PASSWORD>).required(true)),
        )
        .subcommand(
            clap::Command::new("signup")
                .about("Create an account and log in")
                .arg(clap::arg!(--email <EMAIL>).required(true))
                .arg(clap::arg!(--password <PASSWORD>).required(true))
                .arg(clap::arg!(--name <NAME>).required(true))
                .arg(clap::arg!(--experience <LEVEL>))
                .arg(clap::arg!(--background <BACKGROUND>))
                .arg(clap::arg!(--hardware <HARDWARE>)),
        )
        .subcommand(clap::Command::new("logout").about("Forget the stored session"))
        .subcommand(clap::Command::new("whoami").about("Show the logged-in user"))
        .subcommand(
            clap::Command::new("completions")
                .about("Generate a shell completion script")
                .arg(clap::arg!(<SHELL>).value_parser(["bash", "elvish", "fish", "powershell", "zsh"])),
        );

    clap_complete::generate_to(clap_complete::shells::Bash, &mut cmd, "folio", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Zsh, &mut cmd, "folio", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Fish, &mut cmd, "folio", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::PowerShell, &mut cmd, "folio", &completions_dir).unwrap();

    println!("cargo:warning=Shell completions generated in: {}", completions_dir.display());
}

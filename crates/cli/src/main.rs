use anyhow::Result;
use clap::{value_parser, Arg, ArgAction, Command};
use std::path::PathBuf;

mod commands;

fn build_cli() -> Command {
    Command::new("shelfwatch")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Shelfwatch Contributors")
        .about("Files ebooks and mangas dropped into a folder into a tidy library")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("PATH")
                .help("TOML config file")
                .value_parser(value_parser!(PathBuf))
                .global(true),
        )
        .arg(
            Arg::new("root")
                .short('r')
                .long("root")
                .value_name("DIR")
                .help("Root of the watched tree (overrides WATCH_DIRECTORY)")
                .value_parser(value_parser!(PathBuf))
                .global(true),
        )
        .arg(
            Arg::new("mangas")
                .long("mangas")
                .help("Also monitor the mangas folder")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("no-books")
                .long("no-books")
                .help("Do not monitor the books folder")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("poll")
                .long("poll")
                .help("Discover files by periodic listing instead of filesystem events")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("workers")
                .short('j')
                .long("workers")
                .value_name("N")
                .help("Maximum number of files processed at once")
                .value_parser(value_parser!(usize))
                .global(true),
        )
        .arg(
            Arg::new("log-level")
                .short('l')
                .long("log-level")
                .value_name("LEVEL")
                .help("Log level when RUST_LOG is not set")
                .value_parser(["error", "warn", "info", "debug", "trace"])
                .global(true),
        )
        .subcommand(Command::new("watch").about("Watch the tree and file new documents as they arrive (default)"))
        .subcommand(Command::new("scan").about("Process the documents currently waiting, then exit"))
        .subcommand(
            Command::new("parse")
                .about("Show how a file name would be interpreted")
                .arg(Arg::new("name").required(true).value_name("FILENAME").help("File name to parse"))
                .arg(
                    Arg::new("manga")
                        .short('m')
                        .long("manga")
                        .help("Use the manga naming convention")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("config")
                .about("Print the effective configuration")
                .arg(
                    Arg::new("init")
                        .long("init")
                        .value_name("PATH")
                        .help("Write a default config file to PATH instead")
                        .value_parser(value_parser!(PathBuf)),
                ),
        )
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = build_cli().get_matches();
    let args = matches.subcommand().map(|(_, sub)| sub).unwrap_or(&matches);

    let config = commands::load_config(args)?;

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.app.log_level.to_string()),
    )
    .init();

    match matches.subcommand() {
        Some(("scan", _)) => commands::scan(config).await,
        Some(("parse", sub_matches)) => commands::parse(sub_matches),
        Some(("config", sub_matches)) => commands::show_config(&config, sub_matches),
        _ => commands::watch(config).await,
    }
}

use anyhow::{Context, Result};
use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use log::info;
use std::path::Path;

use duoblog::build::{build_site, check_site};
use duoblog::config::Config;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let matches = App::new("duoblog")
        .version(env!("CARGO_PKG_VERSION"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .subcommand(
            SubCommand::with_name("build")
                .about("Builds the site into the output directory")
                .arg(
                    Arg::with_name("output")
                        .long("output")
                        .short("o")
                        .takes_value(true)
                        .value_name("DIR")
                        .help("Overrides the project's output directory"),
                )
                .arg(
                    Arg::with_name("no-minify")
                        .long("no-minify")
                        .help("Writes HTML and feeds without minifying them"),
                ),
        )
        .subcommand(
            SubCommand::with_name("check")
                .about("Loads and validates the site without writing anything"),
        )
        .get_matches();

    match matches.subcommand() {
        ("build", Some(args)) => build(args),
        ("check", Some(_)) => check(),
        _ => unreachable!("clap requires a subcommand"),
    }
}

fn load_config(output: Option<&Path>) -> Result<Config> {
    let cwd = std::env::current_dir().context("Getting the current directory")?;
    Config::from_directory(&cwd, output)
}

fn build(args: &ArgMatches) -> Result<()> {
    let mut config = load_config(args.value_of("output").map(Path::new))?;
    if args.is_present("no-minify") {
        config.minify = false;
    }
    let summary = build_site(&config)?;
    info!(
        "Wrote {} pages and {} feeds, copied {} files to {}",
        summary.pages,
        summary.feeds,
        summary.copied,
        config.output_directory.display()
    );
    Ok(())
}

fn check() -> Result<()> {
    let config = load_config(None)?;
    let pages = check_site(&config)?;
    info!("{} pages OK", pages);
    Ok(())
}

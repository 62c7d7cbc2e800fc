//! # Command Line Interface
//!
//! The command tree is built in `cli.rs`.
//! The subcommands are run from the `commands` module.

use env_logger;
use wdikit::commands;

mod cli;

fn main() -> Result<(),Box<dyn std::error::Error>>
{
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let main_cmd = cli::build_cli();
    let matches = main_cmd.clone().get_matches();

    match matches.subcommand() {
        Some(("convert",cmd)) => commands::convert::convert(cmd),
        Some(("geometry",cmd)) => commands::stat::geometry(cmd),
        Some(("interleave",cmd)) => commands::stat::interleave(cmd),
        Some(("completions",cmd)) => commands::completions::generate(main_cmd,cmd),
        _ => {
            eprintln!("No subcommand was found, try `wdikit --help`");
            Err(Box::new(commands::CommandError::InvalidCommand))
        }
    }
}

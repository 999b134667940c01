//! `belts-solve < input.json > output.json` (spec.md §6.3/§6.4/§6.5).

use std::io::{self, Read};

use color_eyre::eyre::Result;

fn main() -> Result<()> {
    if std::env::var("RUST_BACKTRACE").is_err() {
        std::env::set_var("RUST_BACKTRACE", "FULL");
    }
    color_eyre::install()?;
    env_logger::init();

    let mut input = String::new();
    io::stdin().read_to_string(&mut input)?;

    match factory_planner::belts::solve(&input) {
        Ok(output) => {
            println!("{}", serde_json::to_string(&output)?);
            Ok(())
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    }
}

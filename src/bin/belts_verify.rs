//! `belts-verify <input.json> <output.json>` (spec.md §4.3/§6.5).
//!
//! Exits 0 and prints nothing on a pass, exits 2 with one diagnostic line
//! per violation on stderr otherwise.

use std::fs;

use color_eyre::eyre::{eyre, Result};
use factory_planner::belts::model::BeltsProblem;
use factory_planner::belts::output::BeltsOutput;

fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let input_path = args.next().ok_or_else(|| eyre!("usage: belts-verify <input.json> <output.json>"))?;
    let output_path = args.next().ok_or_else(|| eyre!("usage: belts-verify <input.json> <output.json>"))?;

    let input = fs::read_to_string(&input_path)?;
    let output = fs::read_to_string(&output_path)?;

    let problem = BeltsProblem::parse(&input)?;
    let solution: BeltsOutput = serde_json::from_str(&output)?;

    let violations = factory_planner::verify::verify_belts(&problem, &solution);
    if violations.is_empty() {
        Ok(())
    } else {
        for violation in &violations {
            log::warn!("{violation}");
            eprintln!("{violation}");
        }
        std::process::exit(2);
    }
}

//! Classify command implementation.

use super::models::ClassifyArgs;
use super::utils::open_input;
use crate::classify::{format_browser_groups, ChromeProcessMap};
use anyhow::{Context, Result};

/// Print Chrome processes grouped by browser and process type
///
/// **Public** - main entry point called from main.rs
pub fn execute_classify(args: ClassifyArgs) -> Result<()> {
    let reader = open_input(&args.input)?;
    let map = ChromeProcessMap::from_listing(reader).context("Failed to read process listing")?;

    if map.is_empty() {
        println!("No Chrome processes found in {}", args.input.display());
        return Ok(());
    }

    print!("{}", format_browser_groups(&map));
    Ok(())
}

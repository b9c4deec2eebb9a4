//! `castext facts`: list the built-in fact sheets, or print one.

use anyhow::Result;
use castext::{BuiltinFactSheets, FactSheetProvider};

pub fn execute(key: Option<&str>) -> Result<()> {
    match key {
        Some(key) => match BuiltinFactSheets.lookup(key) {
            Some(sheet) => println!("{}", sheet.render()),
            None => anyhow::bail!("No fact sheet is registered under `{key}`"),
        },
        None => {
            for key in BuiltinFactSheets::keys() {
                println!("{key}");
            }
        }
    }
    Ok(())
}

//! Example: context diff between two XML documents
//!
//! Prints a context-style diff with file modification times in the header.
//!
//! Usage: cargo run --example diff <old.xml> <new.xml>

use std::env;
use std::fs;
use std::io::{self, Write};
use std::time::SystemTime;

use xml_linediff::{DiffOptions, DiffStyle, Input, XmlDiff};

fn modified(path: &str) -> io::Result<String> {
    let since_epoch = fs::metadata(path)?
        .modified()?
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default();
    Ok(format!("{}s", since_epoch.as_secs()))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    if args.len() != 3 {
        eprintln!("Usage: {} <old.xml> <new.xml>", args[0]);
        std::process::exit(1);
    }

    let old_file = &args[1];
    let new_file = &args[2];

    let options = DiffOptions::default()
        .with_from_date(modified(old_file)?)
        .with_to_date(modified(new_file)?);
    let differ = XmlDiff::new().style(DiffStyle::Context).options(options);

    let mut stdout = io::stdout().lock();
    let mut changed = false;
    for line in differ.diff(Input::path(old_file), Input::path(new_file))? {
        changed = true;
        stdout.write_all(line.as_bytes())?;
    }

    if !changed {
        eprintln!("No differences after normalization.");
    }
    Ok(())
}

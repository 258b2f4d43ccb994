//! Example: print the normalized form of an XML document
//!
//! This is the text the differ compares, line by line.
//!
//! Usage: cargo run --example normalize <file.xml>

use std::env;
use std::fs::File;
use std::io::BufReader;

use xml_linediff::normalize;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    if args.len() != 2 {
        eprintln!("Usage: {} <file.xml>", args[0]);
        std::process::exit(1);
    }

    let reader = BufReader::new(File::open(&args[1])?);
    print!("{}", normalize(reader)?);
    Ok(())
}

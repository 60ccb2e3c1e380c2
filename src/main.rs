use std::io::{Read, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use itertools::Itertools;

use pbnset::Diagnostics;

#[derive(clap::Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Input path; use "-" for stdin
    input_path: PathBuf,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut bytes = vec![];
    if args.input_path == PathBuf::from("-") {
        std::io::stdin()
            .read_to_end(&mut bytes)
            .context("reading stdin")?;
    } else {
        bytes = std::fs::read(&args.input_path)
            .with_context(|| format!("reading {}", args.input_path.display()))?;
    }

    let mut diags = Diagnostics::new();
    match pbnset::parse(&bytes, &mut diags) {
        Ok(set) => {
            let mut stdout = std::io::stdout().lock();
            pbnset::render(&set, &mut stdout)?;
            stdout.flush()?;
            Ok(())
        }
        Err(err) => {
            if !diags.is_empty() {
                eprintln!("{}", diags.iter().join("\n"));
            }
            Err(err).context(format!("parsing {}", args.input_path.display()))
        }
    }
}

//! Patchstream CLI.
//!
//! Small operational tools over the library: decode and inspect a single
//! binary grid file, or scan a local patch directory and list what a
//! local source would serve from it.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use patchstream::grid;
use patchstream::source::LocalSource;

#[derive(Parser)]
#[command(name = "patchstream")]
#[command(about = "Inspect patchstream grid files and data directories", long_about = None)]
#[command(version = patchstream::VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decode a binary grid file and print its header
    Inspect {
        /// Path to a .bin grid file
        file: PathBuf,

        /// Also decode the value payload and print cell statistics
        #[arg(long)]
        data: bool,
    },
    /// List the patches a local source would serve from a directory
    Scan {
        /// Data directory holding .bin patch files
        dir: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Inspect { file, data } => inspect(&file, data),
        Command::Scan { dir } => scan(&dir).await,
    };

    if let Err(message) = result {
        eprintln!("error: {}", message);
        process::exit(1);
    }
}

fn inspect(file: &PathBuf, with_data: bool) -> Result<(), String> {
    let bytes = std::fs::read(file).map_err(|e| format!("{}: {}", file.display(), e))?;
    let grid = grid::decode(&bytes, with_data).map_err(|e| e.to_string())?;

    println!("bounds:  {:.4}N {:.4}E {:.4}S {:.4}W",
        grid.bounds.north, grid.bounds.east, grid.bounds.south, grid.bounds.west);
    println!("cells:   {} x {}", grid.count_x, grid.count_y);
    println!("range:   {} .. {}", grid.min_value, grid.max_value);
    println!("units:   {}", grid.units().unwrap_or("-"));

    let mut keys: Vec<&String> = grid.metadata.keys().collect();
    keys.sort();
    for key in keys {
        if key == "units" {
            continue;
        }
        println!("meta:    {} = {}", key, grid.metadata[key]);
    }

    if with_data {
        let masked = grid
            .no_data
            .map(|sentinel| grid.values.iter().filter(|v| **v == sentinel).count())
            .unwrap_or(0);
        println!("values:  {} ({} masked)", grid.values.len(), masked);
    }

    Ok(())
}

async fn scan(dir: &PathBuf) -> Result<(), String> {
    let source = LocalSource::new(dir);
    let mut infos = source
        .available_patches()
        .await
        .map_err(|e| e.to_string())?;

    infos.sort_by(|a, b| a.filename.cmp(&b.filename));

    if infos.is_empty() {
        println!("no patches in {}", dir.display());
        return Ok(());
    }

    for info in &infos {
        println!(
            "{:<12} {:<12} level {} index {:>6}  {}",
            info.site, info.name, info.level, info.index, info.filename
        );
    }
    println!("{} patches", infos.len());

    Ok(())
}

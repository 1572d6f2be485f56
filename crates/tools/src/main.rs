use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use delve_core::replay::replay_journal_inputs;
use delve_core::{LoadedJournal, load_journal_from_file};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Replay a journal file and report the final state
    Replay {
        /// Path to the journal JSONL file
        journal: PathBuf,
        /// Print only the final snapshot hash
        #[arg(short, long)]
        quiet: bool,
    },
    /// Print a journal file's header and record count without replaying
    Inspect {
        /// Path to the journal JSONL file
        journal: PathBuf,
    },
    /// Dump a journal file as one pretty-printed JSON document
    Export {
        /// Path to the journal JSONL file
        journal: PathBuf,
    },
}

fn load(path: &PathBuf) -> Result<LoadedJournal> {
    load_journal_from_file(path)
        .map_err(|e| anyhow::anyhow!("failed to load journal {}: {e}", path.display()))
}

fn main() -> Result<()> {
    let args = Args::parse();

    match args.command {
        Command::Replay { journal, quiet } => {
            let loaded = load(&journal)?;
            let game = replay_journal_inputs(&loaded.journal)
                .map_err(|e| anyhow::anyhow!("replay failed: {e}"))?;

            if quiet {
                println!("{:016x}", game.snapshot_hash());
            } else {
                for event in game.log() {
                    println!("{event}");
                }
                println!();
                println!("Replay complete.");
                println!("Inputs applied: {}", game.next_input_seq());
                println!("Outcome: {:?}", game.outcome());
                println!("Snapshot hash: {:016x}", game.snapshot_hash());
            }
        }
        Command::Inspect { journal } => {
            let loaded = load(&journal)?;
            let header = &loaded.journal;

            println!("Format version: {}", header.format_version);
            println!("Build: {}", header.build_id);
            println!("Content hash: {:016x}", header.content_hash);
            println!("Seed: {}", header.seed);
            println!("Party: {}", header.heroes.join(", "));
            match &header.positions {
                Some(positions) => {
                    let squares: Vec<String> =
                        positions.iter().map(|p| format!("({}, {})", p.x, p.y)).collect();
                    println!("Start squares: {}", squares.join(" "));
                }
                None => println!("Start squares: dealt from the seed"),
            }
            println!("Records: {}", header.inputs.len());
            println!("Chain head: {}", loaded.last_sha256_hex);
        }
        Command::Export { journal } => {
            let loaded = load(&journal)?;
            let json = serde_json::to_string_pretty(&loaded.journal)?;
            println!("{json}");
        }
    }

    Ok(())
}

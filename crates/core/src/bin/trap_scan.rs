//! Scans book continuations for evaluation traps with a local engine

use std::time::Duration;

use chess_scout_core::engine::{EngineChannel, EngineConfig};
use chess_scout_core::{
    scan_book, ContinuationEnricher, ExplorerClient, Position, RatingBand, Result, TrapClassifier,
};

/// Reads one FEN per line; blank lines and `#` comments are skipped.
fn read_fens(path: &str) -> Result<Vec<Position>> {
    let mut positions = Vec::new();
    for line in std::fs::read_to_string(path)?.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        positions.push(Position::from_fen(line)?);
    }
    Ok(positions)
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let engine_path = args.next().unwrap_or_else(|| {
        eprintln!("Usage: trap_scan <engine> [fen | @fen-file] [rating]");
        std::process::exit(1);
    });
    let positions = match args.next() {
        Some(arg) => match arg.strip_prefix('@') {
            Some(path) => match read_fens(path) {
                Ok(positions) => positions,
                Err(e) => {
                    eprintln!("Failed to load {}: {}", path, e);
                    std::process::exit(1);
                }
            },
            None => match Position::from_fen(&arg) {
                Ok(position) => vec![position],
                Err(e) => {
                    eprintln!("Bad FEN: {}", e);
                    std::process::exit(1);
                }
            },
        },
        None => vec![Position::startpos()],
    };
    let rating = args.next().map(|value| {
        RatingBand::parse(&value).unwrap_or_else(|| {
            eprintln!("Unknown rating band: {} (try 1600)", value);
            std::process::exit(1);
        })
    });

    let config = EngineConfig::new(&engine_path)
        .depth(14)
        .deadline(Duration::from_secs(60));
    let channel = match EngineChannel::spawn(config).await {
        Ok(channel) => channel,
        Err(e) => {
            eprintln!("Failed to start engine: {}", e);
            std::process::exit(1);
        }
    };

    let client = ExplorerClient::new().expect("Failed to create client");
    let enricher = ContinuationEnricher::new(client);
    let classifier = TrapClassifier::new(channel);

    for position in &positions {
        println!("Scanning: {}", position.fen());

        match scan_book(&enricher, &classifier, position, rating).await {
            Ok(scan) => {
                println!("  {} continuations in book", scan.continuations.len());
                if scan.traps.is_empty() {
                    println!("  no traps at the current threshold\n");
                    continue;
                }
                for trap in &scan.traps {
                    println!(
                        "  TRAP {:6} {:>9} games  {}  eval {:+.1}",
                        trap.san,
                        trap.total_games(),
                        trap.opening_name(),
                        trap.trap_eval.unwrap_or_default(),
                    );
                }
                println!();
            }
            Err(e) => {
                eprintln!("Scan failed: {}", e);
                std::process::exit(1);
            }
        }
    }
}

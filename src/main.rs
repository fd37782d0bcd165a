use std::env;
use std::time::Instant;

use log::LevelFilter;

#[macro_use]
extern crate text_io;

use crate::solver::{Bag, SolveConfig, Solver, WordIndex};

mod dictionary;
mod solver;

const CONFIG_FILE: &str = "tilecross.json";

fn init_logger() {
    let mut builder = env_logger::Builder::new();
    builder
        .filter(None, LevelFilter::Info)
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(false);

    // Let RUST_LOG override our defaults if explicitly set
    if let Ok(spec) = env::var("RUST_LOG") {
        builder.parse_filters(&spec);
    }

    builder.init();
}

fn solve_tray(index: &WordIndex, config: &SolveConfig, tray: &str) {
    let hand: Bag = tray.chars().collect();
    if hand.is_empty() {
        println!("No letters staged");
        return;
    }

    let mut solver = Solver::new(index, config.clone());
    let start = Instant::now();
    let solution = solver.solve(&hand);
    log::info!("search finished in {:?}", start.elapsed());

    println!("{}", solution.board);
    if solution.leftover == 0 {
        println!("Solved perfectly!");
    } else {
        println!(
            "No perfect solution: {} tile(s) left in hand (shown at the top-left)",
            solution.leftover
        );
    }
}

fn main() {
    init_logger();

    let mut args = env::args().skip(1);
    let tiles = args.next();
    let words_path = args.next().unwrap_or_else(|| "words.json".to_string());

    let words = dictionary::load_words(&words_path);
    let index = WordIndex::new(words);
    log::info!("{} words in play", index.len());
    let config = SolveConfig::from_file(CONFIG_FILE).unwrap_or_default();

    match tiles {
        Some(tray) => solve_tray(&index, &config, &tray),
        None => loop {
            println!("Enter tiles (blank line to quit):");
            let tray: String = read!("{}\n");
            if tray.trim().is_empty() {
                break;
            }
            solve_tray(&index, &config, tray.trim());
        },
    }
}

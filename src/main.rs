use std::path::PathBuf;

use clap::Parser;

use loteria_pdf::boards::generate_boards;
use loteria_pdf::catalog::load_catalog;
use loteria_pdf::render::{render_boards_pdf, render_cards_pdf};
use loteria_pdf::Error;

// Board shape is fixed for the traditional game.
const BOARD_ROWS: usize = 4;
const BOARD_COLS: usize = 4;

/// Loteria deck and boards PDF generator
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// CSV card list with columns id,name,filename
    #[arg(long)]
    csv: PathBuf,

    /// Directory containing one image per card
    #[arg(long)]
    images: PathBuf,

    /// Seed for reproducible boards
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Number of boards to generate
    #[arg(long, default_value_t = 20)]
    boards: usize,

    /// Output PDF for the card deck
    #[arg(long, default_value = "cartas.pdf")]
    out_cards: PathBuf,

    /// Output PDF for the boards
    #[arg(long, default_value = "tableros.pdf")]
    out_boards: PathBuf,

    /// Print progress details
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

fn run(args: &Args) -> Result<(), Error> {
    if args.verbose {
        println!("Reading card list: {}", args.csv.display());
    }
    let catalog = load_catalog(&args.csv, &args.images)?;
    if args.verbose {
        println!("Loaded {} cards", catalog.len());
        println!("Generating deck -> {}", args.out_cards.display());
    }

    render_cards_pdf(&catalog, &args.out_cards)?;

    if args.verbose {
        println!(
            "Generating {} boards (seed {}) -> {}",
            args.boards,
            args.seed,
            args.out_boards.display()
        );
    }
    let board_set = generate_boards(&catalog, args.boards, BOARD_ROWS, BOARD_COLS, args.seed)?;
    render_boards_pdf(&catalog, &board_set, &args.out_boards)?;

    Ok(())
}

fn main() {
    let args = Args::parse();

    println!("Loteria PDF Generator");
    println!("=====================");
    println!("Card list:   {}", args.csv.display());
    println!("Images:      {}", args.images.display());
    println!("Seed:        {}", args.seed);
    println!("Boards:      {}", args.boards);
    println!();

    if let Err(err) = run(&args) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }

    println!();
    println!("✓ Loteria PDFs generated successfully!");
    println!("  Deck:   {}", args.out_cards.display());
    println!("  Boards: {}", args.out_boards.display());
}

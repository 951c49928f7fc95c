use std::collections::HashSet;
use std::path::PathBuf;

use loteria_pdf::boards::{generate_boards, BoardError};
use loteria_pdf::catalog::{CardId, CardRecord, Catalog};

fn catalog_of(n: u16) -> Catalog {
    Catalog::new(
        (1..=n)
            .map(|id| CardRecord {
                id: CardId::new(id),
                name: format!("card {id}"),
                image_path: PathBuf::from(format!("{id}.png")),
            })
            .collect(),
    )
}

#[test]
fn full_deck_scenario_is_reproducible() {
    let catalog = catalog_of(54);

    let a = generate_boards(&catalog, 20, 4, 4, 42).unwrap();
    let b = generate_boards(&catalog, 20, 4, 4, 42).unwrap();

    assert_eq!(a.len(), 20);
    assert_eq!(a.seed(), 42);
    // Bit-for-bit: same card id at every cell, in order.
    assert_eq!(a, b);
}

#[test]
fn different_seed_changes_at_least_one_board() {
    let catalog = catalog_of(54);

    let a = generate_boards(&catalog, 20, 4, 4, 42).unwrap();
    let b = generate_boards(&catalog, 20, 4, 4, 43).unwrap();

    assert_ne!(a, b, "seed 43 must not reproduce the seed 42 board set");
}

#[test]
fn every_board_has_sixteen_distinct_cards() {
    let catalog = catalog_of(54);
    let set = generate_boards(&catalog, 20, 4, 4, 42).unwrap();

    for board in set.iter() {
        assert_eq!(board.cells().len(), 16);
        let distinct: HashSet<CardId> = board.cells().iter().copied().collect();
        assert_eq!(distinct.len(), 16, "board repeats a card");
    }
}

#[test]
fn boards_only_use_catalog_cards() {
    let catalog = catalog_of(54);
    let known: HashSet<CardId> = catalog.ids().into_iter().collect();

    let set = generate_boards(&catalog, 20, 4, 4, 42).unwrap();
    for board in set.iter() {
        for id in board.cells() {
            assert!(known.contains(id), "unknown card id {id} on a board");
        }
    }
}

#[test]
fn cells_are_addressable_row_major() {
    let catalog = catalog_of(54);
    let set = generate_boards(&catalog, 1, 4, 4, 5).unwrap();
    let board = &set.boards()[0];

    for row in 0..4 {
        for col in 0..4 {
            assert_eq!(board.cell(row, col), board.cells()[row * 4 + col]);
        }
    }
}

#[test]
fn boards_within_a_run_are_distinct_when_possible() {
    // 54 choose 16 is astronomically larger than 20, so one run should
    // never need the duplicate fallback.
    let catalog = catalog_of(54);
    let set = generate_boards(&catalog, 20, 4, 4, 42).unwrap();

    let fingerprints: HashSet<Vec<CardId>> =
        set.iter().map(|board| board.fingerprint()).collect();
    assert_eq!(fingerprints.len(), 20);
}

#[test]
fn small_catalog_fails_with_counts_in_message() {
    let catalog = catalog_of(10);
    let err = generate_boards(&catalog, 20, 4, 4, 42).unwrap_err();

    match &err {
        BoardError::InsufficientCards { need, have, .. } => {
            assert_eq!(*need, 16);
            assert_eq!(*have, 10);
        }
    }
    let message = err.to_string();
    assert!(
        message.contains("need 16, have 10"),
        "message must name the counts, got: {message}"
    );
}

#[test]
fn zero_count_yields_empty_set() {
    let catalog = catalog_of(54);
    let set = generate_boards(&catalog, 0, 4, 4, 42).unwrap();
    assert!(set.is_empty());
}

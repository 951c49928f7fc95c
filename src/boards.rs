//! Reproducible random board generation.
//!
//! A board is a fixed grid of distinct cards sampled from the catalog.
//! Generation is a pure function of `(catalog, count, rows, cols, seed)`:
//! the same inputs always yield the identical [`BoardSet`], bit for bit,
//! because all randomness comes from a ChaCha8 generator seeded from the
//! caller's seed and nothing else.
//!
//! Exact duplicate boards within one run are avoided by fingerprinting the
//! set of ids on each board and redrawing on collision, up to
//! [`MAX_REDRAWS`] attempts per board. When the catalog is too small to
//! support `count` distinct boards the duplicate is accepted after the
//! budget runs out; generation never loops indefinitely.

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use thiserror::Error as ThisError;

use crate::catalog::{CardId, Catalog};

/// Redraw budget per board before a duplicate fingerprint is accepted.
pub const MAX_REDRAWS: usize = 64;

///
/// BoardError
///

#[derive(Debug, ThisError)]
pub enum BoardError {
    #[error("not enough cards for a {rows}x{cols} board: need {need}, have {have}")]
    InsufficientCards {
        rows: usize,
        cols: usize,
        need: usize,
        have: usize,
    },
}

/// One generated board: a row-major grid of card ids.
///
/// Invariant: no card id appears twice on the same board.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    rows: usize,
    cols: usize,
    cells: Vec<CardId>,
}

impl Board {
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[must_use]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// All cells in row-major order, length `rows * cols`.
    #[must_use]
    pub fn cells(&self) -> &[CardId] {
        &self.cells
    }

    /// The card at `(row, col)`.
    #[must_use]
    pub fn cell(&self, row: usize, col: usize) -> CardId {
        self.cells[row * self.cols + col]
    }

    /// Canonical duplicate-detection key: the sorted ids on this board.
    ///
    /// Two boards with the same cards in different cell positions count as
    /// the same board for uniqueness purposes.
    #[must_use]
    pub fn fingerprint(&self) -> Vec<CardId> {
        let mut ids = self.cells.clone();
        ids.sort_unstable();
        ids
    }
}

/// The complete set of boards from one generation run.
///
/// Retains the seed so a caller (or a test) can regenerate and diff.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoardSet {
    seed: u64,
    boards: Vec<Board>,
}

impl BoardSet {
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.boards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.boards.is_empty()
    }

    #[must_use]
    pub fn boards(&self) -> &[Board] {
        &self.boards
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Board> {
        self.boards.iter()
    }
}

/// Generate `count` boards of `rows x cols` cards sampled from the catalog.
///
/// Fails with [`BoardError::InsufficientCards`] when the grid needs more
/// cards than the catalog holds. Otherwise always returns exactly `count`
/// boards; see the module docs for the duplicate-avoidance policy.
pub fn generate_boards(
    catalog: &Catalog,
    count: usize,
    rows: usize,
    cols: usize,
    seed: u64,
) -> Result<BoardSet, BoardError> {
    let need = rows * cols;
    let have = catalog.len();
    if need > have {
        return Err(BoardError::InsufficientCards {
            rows,
            cols,
            need,
            have,
        });
    }

    let ids = catalog.ids();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut seen: HashSet<Vec<CardId>> = HashSet::with_capacity(count);
    let mut boards = Vec::with_capacity(count);

    for _ in 0..count {
        let mut board = draw_board(&ids, rows, cols, &mut rng);
        let mut redraws = 0;
        while seen.contains(&board.fingerprint()) && redraws < MAX_REDRAWS {
            board = draw_board(&ids, rows, cols, &mut rng);
            redraws += 1;
        }
        // If the budget ran out the duplicate is kept; the catalog cannot
        // support this many distinct boards.
        seen.insert(board.fingerprint());
        boards.push(board);
    }

    Ok(BoardSet { seed, boards })
}

/// Sample `rows * cols` distinct ids without replacement, row-major.
fn draw_board(ids: &[CardId], rows: usize, cols: usize, rng: &mut ChaCha8Rng) -> Board {
    let mut deck = ids.to_vec();
    let (drawn, _) = deck.partial_shuffle(rng, rows * cols);
    Board {
        rows,
        cols,
        cells: drawn.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CardRecord;
    use std::path::PathBuf;

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
    fn same_seed_same_boards() {
        let catalog = catalog_of(54);
        let a = generate_boards(&catalog, 5, 4, 4, 7).unwrap();
        let b = generate_boards(&catalog, 5, 4, 4, 7).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn boards_have_no_repeated_cards() {
        let catalog = catalog_of(54);
        let set = generate_boards(&catalog, 10, 4, 4, 1).unwrap();
        for board in set.iter() {
            let fp = board.fingerprint();
            let mut dedup = fp.clone();
            dedup.dedup();
            assert_eq!(fp, dedup, "board repeats a card: {fp:?}");
        }
    }

    #[test]
    fn exact_fit_catalog_terminates() {
        // 16 cards, 4x4 grid: every board is forced to the same
        // fingerprint, so the redraw budget must run out and generation
        // must still return all requested boards.
        let catalog = catalog_of(16);
        let set = generate_boards(&catalog, 3, 4, 4, 9).unwrap();
        assert_eq!(set.len(), 3);
        assert_eq!(set.boards()[0].fingerprint(), set.boards()[1].fingerprint());
    }

    #[test]
    fn insufficient_catalog_is_an_error() {
        let catalog = catalog_of(10);
        let err = generate_boards(&catalog, 1, 4, 4, 0).unwrap_err();
        match err {
            BoardError::InsufficientCards { need, have, .. } => {
                assert_eq!(need, 16);
                assert_eq!(have, 10);
            }
        }
    }
}

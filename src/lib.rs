//! Loteria deck and board PDF generation.
//!
//! The pipeline has three stages, each usable on its own:
//!
//! 1. [`catalog::load_catalog`] reads and validates the card list CSV and
//!    resolves each card's image file.
//! 2. [`boards::generate_boards`] produces a reproducible, seeded set of
//!    boards from the catalog. This stage does no I/O.
//! 3. [`render`] lays the cards and boards onto letter-size PDF pages.

pub mod boards;
pub mod catalog;
pub mod render;

pub use boards::{generate_boards, Board, BoardSet};
pub use catalog::{load_catalog, CardId, CardRecord, Catalog};

use thiserror::Error as ThisError;

///
/// Error
///

#[derive(Debug, ThisError)]
pub enum Error {
    #[error(transparent)]
    Catalog(#[from] catalog::CatalogError),

    #[error(transparent)]
    Board(#[from] boards::BoardError),

    #[error(transparent)]
    Render(#[from] render::RenderError),
}

//! Card catalog loading and validation.
//!
//! The catalog is read from a CSV file with columns `id,name,filename`.
//! Ids are 1-based, unique, and bounded by the traditional deck size of 54.
//! Every `filename` must resolve to an existing file under the images
//! directory; a deck with a missing image is unusable, so validation is
//! fail-fast and each error names the offending row.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error as ThisError;

/// Highest card id the traditional deck uses.
pub const MAX_CARD_ID: u16 = 54;

/// Expected number of cards in a full deck.
pub const DECK_SIZE: usize = 54;

///
/// CatalogError
///

#[derive(Debug, ThisError)]
pub enum CatalogError {
    #[error("cannot read card list {path}: {source}")]
    Read { path: PathBuf, source: csv::Error },

    #[error("card list {path} is missing column '{column}' (expected id,name,filename)")]
    MissingColumn { path: PathBuf, column: &'static str },

    #[error("card list row {row}: {source}")]
    Row { row: usize, source: csv::Error },

    #[error("row {row}: card id {id} is out of range 1..={max}")]
    IdOutOfRange { row: usize, id: i64, max: u16 },

    #[error("row {row}: duplicate card id {id}")]
    DuplicateId { row: usize, id: CardId },

    #[error("card list {path} contains no cards")]
    Empty { path: PathBuf },

    #[error("images directory not found: {path}")]
    MissingImagesDir { path: PathBuf },

    #[error("card {id} ({name}): image not found: {path}")]
    MissingImage { id: CardId, name: String, path: PathBuf },
}

/// Identifier of a card in the catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CardId(pub u16);

impl CardId {
    #[must_use]
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn raw(self) -> u16 {
        self.0
    }
}

impl std::fmt::Display for CardId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One card identity: id, display name, and resolved image path.
///
/// Immutable once loaded. Boards refer to cards by [`CardId`] only.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CardRecord {
    pub id: CardId,
    pub name: String,
    pub image_path: PathBuf,
}

/// The full ordered card list, sorted ascending by id.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    records: Vec<CardRecord>,
}

impl Catalog {
    /// Build a catalog from records, sorting them by id.
    #[must_use]
    pub fn new(mut records: Vec<CardRecord>) -> Self {
        records.sort_by_key(|r| r.id);
        Self { records }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn records(&self) -> &[CardRecord] {
        &self.records
    }

    /// Look up a card by id.
    #[must_use]
    pub fn get(&self, id: CardId) -> Option<&CardRecord> {
        self.records
            .binary_search_by_key(&id, |r| r.id)
            .ok()
            .map(|idx| &self.records[idx])
    }

    /// All card ids in catalog order.
    #[must_use]
    pub fn ids(&self) -> Vec<CardId> {
        self.records.iter().map(|r| r.id).collect()
    }
}

/// Raw CSV row before validation.
#[derive(Debug, Deserialize)]
struct RawRow {
    id: i64,
    name: String,
    filename: String,
}

/// Load and validate the card catalog.
///
/// Reads `csv_path` (columns `id,name,filename`), checks id range and
/// uniqueness, and resolves each filename against `images_dir`, requiring
/// the file to exist. A deck of other than [`DECK_SIZE`] cards loads with
/// a warning; an empty one is an error.
pub fn load_catalog(csv_path: &Path, images_dir: &Path) -> Result<Catalog, CatalogError> {
    if !images_dir.is_dir() {
        return Err(CatalogError::MissingImagesDir {
            path: images_dir.to_path_buf(),
        });
    }

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(csv_path)
        .map_err(|source| CatalogError::Read {
            path: csv_path.to_path_buf(),
            source,
        })?;

    let headers = reader
        .headers()
        .map_err(|source| CatalogError::Read {
            path: csv_path.to_path_buf(),
            source,
        })?
        .clone();
    for column in ["id", "name", "filename"] {
        if !headers.iter().any(|h| h == column) {
            return Err(CatalogError::MissingColumn {
                path: csv_path.to_path_buf(),
                column,
            });
        }
    }

    let mut seen_ids: HashSet<CardId> = HashSet::new();
    let mut records = Vec::new();

    for (idx, result) in reader.deserialize::<RawRow>().enumerate() {
        // Row 1 is the header line.
        let row = idx + 2;
        let raw = result.map_err(|source| CatalogError::Row { row, source })?;

        if raw.id < 1 || raw.id > i64::from(MAX_CARD_ID) {
            return Err(CatalogError::IdOutOfRange {
                row,
                id: raw.id,
                max: MAX_CARD_ID,
            });
        }
        let id = CardId::new(raw.id as u16);
        if !seen_ids.insert(id) {
            return Err(CatalogError::DuplicateId { row, id });
        }

        let image_path = images_dir.join(&raw.filename);
        if !image_path.is_file() {
            return Err(CatalogError::MissingImage {
                id,
                name: raw.name,
                path: image_path,
            });
        }

        records.push(CardRecord {
            id,
            name: raw.name,
            image_path,
        });
    }

    if records.is_empty() {
        return Err(CatalogError::Empty {
            path: csv_path.to_path_buf(),
        });
    }
    if records.len() != DECK_SIZE {
        eprintln!(
            "warning: expected {DECK_SIZE} cards, found {} in {}",
            records.len(),
            csv_path.display()
        );
    }

    Ok(Catalog::new(records))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: u16) -> CardRecord {
        CardRecord {
            id: CardId::new(id),
            name: format!("card {id}"),
            image_path: PathBuf::from(format!("{id}.png")),
        }
    }

    #[test]
    fn catalog_sorts_by_id() {
        let catalog = Catalog::new(vec![record(3), record(1), record(2)]);
        let ids: Vec<u16> = catalog.ids().iter().map(|id| id.raw()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn get_finds_by_id() {
        let catalog = Catalog::new(vec![record(5), record(9)]);
        assert_eq!(catalog.get(CardId::new(9)).unwrap().name, "card 9");
        assert!(catalog.get(CardId::new(4)).is_none());
    }
}

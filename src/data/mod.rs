//! Core data models for fredcat
//!
//! This module contains the series record type shared by the FRED client,
//! the category store and the CSV export, plus the `SeriesSource` seam the
//! category cache fetches through.

pub mod fred;

pub use fred::{FetchError, FredClient};

use async_trait::async_trait;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Metadata describing one FRED time series
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesRecord {
    /// Series identifier (e.g. "GNPCA")
    pub id: String,
    /// Human-readable series title
    pub title: String,
    /// Units the observations are expressed in
    pub units: String,
    /// Free-form notes, absent for many series
    #[serde(default)]
    pub notes: Option<String>,
}

impl SeriesRecord {
    /// Creates a record without notes
    pub fn new(id: impl Into<String>, title: impl Into<String>, units: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            units: units.into(),
            notes: None,
        }
    }

    /// Sets the notes field
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Returns the value of a single projected column
    pub fn field(&self, column: Column) -> &str {
        match column {
            Column::Id => &self.id,
            Column::Title => &self.title,
            Column::Units => &self.units,
            Column::Notes => self.notes.as_deref().unwrap_or(""),
        }
    }
}

/// Columns that can be projected into the CSV output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum Column {
    Id,
    Title,
    Units,
    Notes,
}

impl Column {
    /// Header name used in the CSV output
    pub fn name(&self) -> &'static str {
        match self {
            Column::Id => "id",
            Column::Title => "title",
            Column::Units => "units",
            Column::Notes => "notes",
        }
    }

    /// The default projection: every column, in record order
    pub fn all() -> Vec<Column> {
        vec![Column::Id, Column::Title, Column::Units, Column::Notes]
    }
}

/// Anything that can list the series belonging to a category
///
/// `FredClient` is the production implementation; tests substitute
/// in-memory sources.
#[async_trait]
pub trait SeriesSource: Send + Sync {
    /// Fetches every series in the given category
    async fn fetch_by_category(&self, category_id: u32) -> Result<Vec<SeriesRecord>, FetchError>;
}

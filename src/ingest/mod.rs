//! Booking ingestion: discover exports in a watched folder, extract rows,
//! merge them into bookings.

use sea_orm::DbErr;
use thiserror::Error;

use crate::google::GoogleError;

pub mod merge;
pub mod poll;
pub mod service;
pub mod sheet;

pub use service::{BookingIngestor, FolderReport, NewFile};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Db(#[from] DbErr),
    #[error(transparent)]
    Source(#[from] GoogleError),
    #[error(transparent)]
    Extract(#[from] sheet::ExtractError),
}

/// Counters accumulated while one file is ingested.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    pub sheet_names: Vec<String>,
    pub rows_processed: i32,
    pub rows_inserted: i32,
    pub rows_updated: i32,
    pub rows_ignored: i32,
    pub conflicts_detected: i32,
    pub rows_quarantined: i32,
}

impl RunStats {
    pub fn record(&mut self, outcome: merge::MergeOutcome) {
        match outcome {
            merge::MergeOutcome::Inserted => self.rows_inserted += 1,
            merge::MergeOutcome::Updated => self.rows_updated += 1,
            merge::MergeOutcome::Ignored => self.rows_ignored += 1,
            // a conflicting row still had its mutable fields applied
            merge::MergeOutcome::Conflict => {
                self.conflicts_detected += 1;
                self.rows_updated += 1;
            }
        }
    }
}

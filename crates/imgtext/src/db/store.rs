//! Record store seam used by the pipeline orchestrator.

use crate::item::{ItemUpdate, NewItem, ProcessedItem};

use super::{item_repo, Database, DatabaseError};

/// Create/update/read access to processed-item records.
///
/// Each call is atomic per record; the orchestrator never touches two
/// records in one call.
pub trait RecordStore: Send + Sync {
    /// Inserts a pending record and returns its unique id.
    fn create(&self, item: &NewItem) -> Result<i64, DatabaseError>;

    /// Applies a terminal update to a pending record.
    fn update(&self, id: i64, update: &ItemUpdate) -> Result<(), DatabaseError>;

    fn get(&self, id: i64) -> Result<Option<ProcessedItem>, DatabaseError>;
}

impl RecordStore for Database {
    fn create(&self, item: &NewItem) -> Result<i64, DatabaseError> {
        item_repo::insert(self, item)
    }

    fn update(&self, id: i64, update: &ItemUpdate) -> Result<(), DatabaseError> {
        item_repo::finalize(self, id, update)
    }

    fn get(&self, id: i64) -> Result<Option<ProcessedItem>, DatabaseError> {
        item_repo::find_by_id(self, id)
    }
}

//! Processed item repository: CRUD operations for the `processed_items` table.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, OptionalExtension, Row};

use crate::item::{ItemStatus, ItemUpdate, NewItem, ProcessedItem};

use super::{Database, DatabaseError};

const COLUMNS: &str = "id, image_reference, original_filename, status, local_ocr_text, \
                       remote_enhanced_text, final_text, uploaded_at, processed_at";

/// Query filter parameters for item listing.
#[derive(Debug, Default, Clone)]
pub struct ItemFilter {
    pub status: Option<ItemStatus>,
    /// Case-insensitive substring of the original filename.
    pub search: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_timestamp(idx: usize, raw: &str) -> Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn item_from_row(row: &Row<'_>) -> Result<ProcessedItem, rusqlite::Error> {
    let status: String = row.get(3)?;
    let status = status
        .parse::<ItemStatus>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, e.into()))?;
    let uploaded_at: String = row.get(7)?;
    let processed_at: Option<String> = row.get(8)?;

    Ok(ProcessedItem {
        id: row.get(0)?,
        image_reference: row.get(1)?,
        original_filename: row.get(2)?,
        status,
        local_ocr_text: row.get(4)?,
        remote_enhanced_text: row.get(5)?,
        final_text: row.get(6)?,
        uploaded_at: parse_timestamp(7, &uploaded_at)?,
        processed_at: processed_at
            .as_deref()
            .map(|raw| parse_timestamp(8, raw))
            .transpose()?,
    })
}

/// Inserts a new pending item and returns its assigned id.
pub fn insert(db: &Database, item: &NewItem) -> Result<i64, DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO processed_items (image_reference, original_filename, status, uploaded_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                item.image_reference,
                item.original_filename,
                item.status.as_str(),
                format_timestamp(&item.uploaded_at),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    })
}

/// Moves a pending item to its terminal status.
///
/// All result columns are overwritten. Fails with `AlreadyFinalized` when the
/// item has left `PENDING`, so a record is finalized at most once.
pub fn finalize(db: &Database, id: i64, update: &ItemUpdate) -> Result<(), DatabaseError> {
    if !update.status.is_terminal() {
        return Err(DatabaseError::NonTerminalUpdate {
            id,
            status: update.status.to_string(),
        });
    }

    db.with_conn(|conn| {
        let changed = conn.execute(
            "UPDATE processed_items SET status = ?2, local_ocr_text = ?3,
             remote_enhanced_text = ?4, final_text = ?5, processed_at = ?6
             WHERE id = ?1 AND status = 'PENDING'",
            params![
                id,
                update.status.as_str(),
                update.local_ocr_text,
                update.remote_enhanced_text,
                update.final_text,
                format_timestamp(&update.processed_at),
            ],
        )?;
        if changed == 1 {
            return Ok(());
        }

        let current: Option<String> = conn
            .query_row(
                "SELECT status FROM processed_items WHERE id = ?1",
                params![id],
                |r| r.get(0),
            )
            .optional()?;
        match current {
            None => Err(DatabaseError::NotFound(id)),
            Some(status) => Err(DatabaseError::AlreadyFinalized { id, status }),
        }
    })
}

/// Finds an item by its id.
pub fn find_by_id(db: &Database, id: i64) -> Result<Option<ProcessedItem>, DatabaseError> {
    db.with_conn(|conn| {
        let sql = format!("SELECT {} FROM processed_items WHERE id = ?1", COLUMNS);
        let item = conn
            .query_row(&sql, params![id], item_from_row)
            .optional()?;
        Ok(item)
    })
}

/// Queries items with filters, newest first, returning (rows, total_count).
pub fn query(
    db: &Database,
    filter: &ItemFilter,
) -> Result<(Vec<ProcessedItem>, u64), DatabaseError> {
    db.with_conn(|conn| {
        let mut conditions = Vec::new();
        let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        if let Some(status) = filter.status {
            conditions.push(format!("status = ?{}", param_values.len() + 1));
            param_values.push(Box::new(status.as_str()));
        }
        if let Some(ref search) = filter.search {
            conditions.push(format!(
                "instr(lower(original_filename), lower(?{})) > 0",
                param_values.len() + 1
            ));
            param_values.push(Box::new(search.clone()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let count_sql = format!("SELECT COUNT(*) FROM processed_items {}", where_clause);
        let params_ref: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(|p| p.as_ref()).collect();
        let total: u64 = conn.query_row(&count_sql, params_ref.as_slice(), |r| r.get(0))?;

        let limit = filter.limit.unwrap_or(100) as i64;
        let offset = filter.offset.unwrap_or(0) as i64;
        param_values.push(Box::new(limit));
        param_values.push(Box::new(offset));
        let query_sql = format!(
            "SELECT {} FROM processed_items {} ORDER BY uploaded_at DESC, id DESC LIMIT ?{} OFFSET ?{}",
            COLUMNS,
            where_clause,
            param_values.len() - 1,
            param_values.len()
        );

        let params_ref: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(|p| p.as_ref()).collect();
        let mut stmt = conn.prepare(&query_sql)?;
        let rows: Vec<ProcessedItem> = stmt
            .query_map(params_ref.as_slice(), item_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok((rows, total))
    })
}

/// Counts items with the given status.
pub fn count_by_status(db: &Database, status: ItemStatus) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        let count: u64 = conn.query_row(
            "SELECT COUNT(*) FROM processed_items WHERE status = ?1",
            params![status.as_str()],
            |r| r.get(0),
        )?;
        Ok(count)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn test_db() -> Database {
        Database::open_in_memory().expect("Failed to create test database")
    }

    fn sample_item(name: &str) -> NewItem {
        NewItem::new(format!("uploads/{}.png", name), Some(&format!("{}.png", name)))
    }

    #[test]
    fn test_insert_and_find() {
        let db = test_db();
        let new_item = sample_item("scan");
        let id = insert(&db, &new_item).unwrap();

        let found = find_by_id(&db, id).unwrap().unwrap();
        assert_eq!(found.id, id);
        assert_eq!(found.image_reference, "uploads/scan.png");
        assert_eq!(found.original_filename, "scan.png");
        assert_eq!(found.status, ItemStatus::Pending);
        assert_eq!(found.uploaded_at, new_item.uploaded_at);
        assert!(found.processed_at.is_none());
        assert!(found.final_text.is_none());
    }

    #[test]
    fn test_ids_are_unique() {
        let db = test_db();
        let a = insert(&db, &sample_item("a")).unwrap();
        let b = insert(&db, &sample_item("b")).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_find_nonexistent() {
        let db = test_db();
        assert!(find_by_id(&db, 999).unwrap().is_none());
    }

    #[test]
    fn test_finalize_completed_round_trip() {
        let db = test_db();
        let new_item = sample_item("round");
        let id = insert(&db, &new_item).unwrap();

        let processed_at = new_item.uploaded_at + Duration::seconds(2);
        let update = ItemUpdate::completed(
            "local".to_string(),
            "remote".to_string(),
            "remote".to_string(),
            processed_at,
        );
        finalize(&db, id, &update).unwrap();

        let found = find_by_id(&db, id).unwrap().unwrap();
        assert_eq!(found.status, ItemStatus::Completed);
        assert_eq!(found.local_ocr_text.as_deref(), Some("local"));
        assert_eq!(found.remote_enhanced_text.as_deref(), Some("remote"));
        assert_eq!(found.final_text.as_deref(), Some("remote"));
        assert_eq!(found.processed_at, Some(processed_at));
        assert_eq!(found.image_reference, new_item.image_reference);
    }

    #[test]
    fn test_finalize_twice_is_rejected() {
        let db = test_db();
        let id = insert(&db, &sample_item("twice")).unwrap();

        let failed = ItemUpdate::failed("Processing failed: x".to_string(), None, None, Utc::now());
        finalize(&db, id, &failed).unwrap();

        let completed = ItemUpdate::completed(
            "a".to_string(),
            "b".to_string(),
            "b".to_string(),
            Utc::now(),
        );
        match finalize(&db, id, &completed) {
            Err(DatabaseError::AlreadyFinalized { id: got, status }) => {
                assert_eq!(got, id);
                assert_eq!(status, "FAILED");
            }
            other => panic!("Expected AlreadyFinalized, got {:?}", other),
        }

        let found = find_by_id(&db, id).unwrap().unwrap();
        assert_eq!(found.status, ItemStatus::Failed);
    }

    #[test]
    fn test_finalize_missing_item() {
        let db = test_db();
        let update = ItemUpdate::failed("x".to_string(), None, None, Utc::now());
        assert!(matches!(
            finalize(&db, 42, &update),
            Err(DatabaseError::NotFound(42))
        ));
    }

    #[test]
    fn test_finalize_rejects_pending_update() {
        let db = test_db();
        let id = insert(&db, &sample_item("p")).unwrap();
        let mut update = ItemUpdate::failed("x".to_string(), None, None, Utc::now());
        update.status = ItemStatus::Pending;
        assert!(matches!(
            finalize(&db, id, &update),
            Err(DatabaseError::NonTerminalUpdate { .. })
        ));
    }

    #[test]
    fn test_query_with_status_filter() {
        let db = test_db();
        insert(&db, &sample_item("q1")).unwrap();
        let id = insert(&db, &sample_item("q2")).unwrap();
        finalize(
            &db,
            id,
            &ItemUpdate::failed("Processing failed: x".to_string(), None, None, Utc::now()),
        )
        .unwrap();

        let (rows, total) = query(
            &db,
            &ItemFilter {
                status: Some(ItemStatus::Failed),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(total, 1);
        assert_eq!(rows[0].id, id);
    }

    #[test]
    fn test_query_search_is_case_insensitive() {
        let db = test_db();
        insert(&db, &sample_item("Invoice_March")).unwrap();
        insert(&db, &sample_item("receipt")).unwrap();

        let (rows, total) = query(
            &db,
            &ItemFilter {
                search: Some("invoice".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(total, 1);
        assert_eq!(rows[0].original_filename, "Invoice_March.png");
    }

    #[test]
    fn test_query_orders_newest_first_and_paginates() {
        let db = test_db();
        let base = Utc::now();
        for i in 0..5 {
            let mut item = sample_item(&format!("p{}", i));
            item.uploaded_at = base + Duration::seconds(i);
            insert(&db, &item).unwrap();
        }

        let (rows, total) = query(
            &db,
            &ItemFilter {
                limit: Some(2),
                offset: Some(0),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(total, 5);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].original_filename, "p4.png");
        assert_eq!(rows[1].original_filename, "p3.png");
    }

    #[test]
    fn test_count_by_status() {
        let db = test_db();
        insert(&db, &sample_item("c1")).unwrap();
        insert(&db, &sample_item("c2")).unwrap();

        assert_eq!(count_by_status(&db, ItemStatus::Pending).unwrap(), 2);
        assert_eq!(count_by_status(&db, ItemStatus::Completed).unwrap(), 0);
    }
}

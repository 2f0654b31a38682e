//! SQLite backend — the default document store.
//!
//! Uses a single SQLite database file with two tables:
//! - `documents` — the uploaded PDFs (base64) plus metadata
//! - `ocr_results` — one serialized OCR payload per document
//!
//! `ocr_results.document_id` carries `ON DELETE CASCADE`, but deletion still
//! removes the OCR row explicitly first so the invariant holds even on
//! connections where the `foreign_keys` pragma is off.

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::Utc;
use docchat_core::document::{Document, OcrPayload, OcrRecord};
use docchat_core::error::StoreError;
use docchat_core::store::DocumentStore;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// A production SQLite document store.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Create a new SQLite store from a file path.
    ///
    /// The database and all tables/indexes are created automatically.
    /// Pass `":memory:"` for an in-process ephemeral database (useful for tests).
    pub async fn new(path: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(path)
            .map_err(|e| StoreError::Storage(format!("Invalid SQLite path: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .pragma("foreign_keys", "ON");

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Storage(format!("Failed to open SQLite: {e}")))?;

        let store = Self { pool };
        store.run_migrations().await?;
        info!("SQLite document store initialized at {path}");
        Ok(store)
    }

    /// Create from an existing pool (useful for testing).
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    /// Run schema migrations.
    async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                id          TEXT PRIMARY KEY,
                filename    TEXT NOT NULL,
                content     TEXT NOT NULL,
                created_at  TEXT NOT NULL,
                updated_at  TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("documents table: {e}")))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS ocr_results (
                id          TEXT PRIMARY KEY,
                document_id TEXT UNIQUE NOT NULL
                            REFERENCES documents(id) ON DELETE CASCADE,
                content     TEXT NOT NULL,
                created_at  TEXT NOT NULL,
                updated_at  TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("ocr_results table: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_documents_created_at ON documents(created_at DESC)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("created_at index: {e}")))?;

        debug!("SQLite migrations complete");
        Ok(())
    }

    /// Parse a `Document` (without OCR record) from a joined SQLite row.
    fn row_to_document(row: &sqlx::sqlite::SqliteRow) -> Result<Document, StoreError> {
        let id: String = row
            .try_get("id")
            .map_err(|e| StoreError::QueryFailed(format!("id column: {e}")))?;
        let filename: String = row
            .try_get("filename")
            .map_err(|e| StoreError::QueryFailed(format!("filename column: {e}")))?;
        let content: String = row
            .try_get("content")
            .map_err(|e| StoreError::QueryFailed(format!("content column: {e}")))?;
        let created_at = Self::parse_timestamp(row, "created_at")?;
        let updated_at = Self::parse_timestamp(row, "updated_at")?;

        Ok(Document {
            id,
            filename,
            content,
            created_at,
            updated_at,
            ocr_result: None,
        })
    }

    /// Parse the joined OCR columns, if the LEFT JOIN matched.
    fn row_to_ocr_record(
        row: &sqlx::sqlite::SqliteRow,
        document_id: &str,
    ) -> Result<Option<OcrRecord>, StoreError> {
        let ocr_id: Option<String> = row
            .try_get("ocr_id")
            .map_err(|e| StoreError::QueryFailed(format!("ocr_id column: {e}")))?;
        let Some(id) = ocr_id else {
            return Ok(None);
        };

        let content: String = row
            .try_get("ocr_content")
            .map_err(|e| StoreError::QueryFailed(format!("ocr_content column: {e}")))?;
        let created_at = Self::parse_timestamp(row, "ocr_created_at")?;
        let updated_at = Self::parse_timestamp(row, "ocr_updated_at")?;

        Ok(Some(OcrRecord {
            id,
            document_id: document_id.to_string(),
            content,
            created_at,
            updated_at,
        }))
    }

    fn parse_timestamp(
        row: &sqlx::sqlite::SqliteRow,
        column: &str,
    ) -> Result<chrono::DateTime<Utc>, StoreError> {
        let raw: String = row
            .try_get(column)
            .map_err(|e| StoreError::QueryFailed(format!("{column} column: {e}")))?;
        Ok(match chrono::DateTime::parse_from_rfc3339(&raw) {
            Ok(dt) => dt.with_timezone(&Utc),
            Err(e) => {
                warn!(column, raw = %raw, error = %e, "Unparseable stored timestamp, substituting current time");
                Utc::now()
            }
        })
    }
}

const DOCUMENT_WITH_OCR_COLUMNS: &str = r#"
    d.id, d.filename, d.content, d.created_at, d.updated_at,
    r.id AS ocr_id, r.content AS ocr_content,
    r.created_at AS ocr_created_at, r.updated_at AS ocr_updated_at
"#;

#[async_trait]
impl DocumentStore for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn create_document(
        &self,
        filename: &str,
        raw_bytes: &[u8],
        payload: &OcrPayload,
    ) -> Result<Document, StoreError> {
        let now = Utc::now();
        let now_str = now.to_rfc3339();
        let doc_id = Uuid::new_v4().to_string();
        let ocr_id = Uuid::new_v4().to_string();
        let encoded = BASE64.encode(raw_bytes);
        let payload_json = serde_json::to_string(payload)
            .map_err(|e| StoreError::Storage(format!("Payload serialization: {e}")))?;

        // Both rows in one transaction: a document without its OCR result
        // must never be observable to readers.
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Storage(format!("BEGIN failed: {e}")))?;

        sqlx::query(
            r#"
            INSERT INTO documents (id, filename, content, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&doc_id)
        .bind(filename)
        .bind(&encoded)
        .bind(&now_str)
        .bind(&now_str)
        .execute(&mut *tx)
        .await
        .map_err(|e| StoreError::Storage(format!("INSERT document failed: {e}")))?;

        sqlx::query(
            r#"
            INSERT INTO ocr_results (id, document_id, content, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&ocr_id)
        .bind(&doc_id)
        .bind(&payload_json)
        .bind(&now_str)
        .bind(&now_str)
        .execute(&mut *tx)
        .await
        .map_err(|e| StoreError::Storage(format!("INSERT ocr_result failed: {e}")))?;

        tx.commit()
            .await
            .map_err(|e| StoreError::Storage(format!("COMMIT failed: {e}")))?;

        debug!(document_id = %doc_id, filename, "Stored document with OCR result");

        Ok(Document {
            id: doc_id.clone(),
            filename: filename.to_string(),
            content: encoded,
            created_at: now,
            updated_at: now,
            ocr_result: Some(OcrRecord {
                id: ocr_id,
                document_id: doc_id,
                content: payload_json,
                created_at: now,
                updated_at: now,
            }),
        })
    }

    async fn list_documents(&self) -> Result<Vec<Document>, StoreError> {
        let sql = format!(
            r#"
            SELECT {DOCUMENT_WITH_OCR_COLUMNS}
            FROM documents d
            LEFT JOIN ocr_results r ON r.document_id = d.id
            ORDER BY d.created_at DESC, d.rowid DESC
            "#
        );
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("List documents: {e}")))?;

        rows.iter()
            .map(|row| {
                let mut doc = Self::row_to_document(row)?;
                doc.ocr_result = Self::row_to_ocr_record(row, &doc.id)?;
                Ok(doc)
            })
            .collect()
    }

    async fn find_ocr_results(
        &self,
        ids: &[String],
    ) -> Result<Vec<(OcrRecord, Document)>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        // IN (...) with one positional parameter per id.
        let placeholders: Vec<String> = (1..=ids.len()).map(|i| format!("?{i}")).collect();
        let sql = format!(
            r#"
            SELECT {DOCUMENT_WITH_OCR_COLUMNS}
            FROM ocr_results r
            JOIN documents d ON d.id = r.document_id
            WHERE r.document_id IN ({})
            "#,
            placeholders.join(", ")
        );

        let mut query = sqlx::query(&sql);
        for id in ids {
            query = query.bind(id);
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("Find OCR results: {e}")))?;

        rows.iter()
            .map(|row| {
                let doc = Self::row_to_document(row)?;
                let record = Self::row_to_ocr_record(row, &doc.id)?.ok_or_else(|| {
                    StoreError::QueryFailed("ocr_results join produced NULL ocr_id".into())
                })?;
                Ok((record, doc))
            })
            .collect()
    }

    async fn delete_document(&self, id: &str) -> Result<bool, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Storage(format!("BEGIN failed: {e}")))?;

        // OCR row first. A no-op when the document has none.
        sqlx::query("DELETE FROM ocr_results WHERE document_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::Storage(format!("DELETE ocr_result failed: {e}")))?;

        let result = sqlx::query("DELETE FROM documents WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::Storage(format!("DELETE document failed: {e}")))?;

        tx.commit()
            .await
            .map_err(|e| StoreError::Storage(format!("COMMIT failed: {e}")))?;

        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<usize, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) as cnt FROM documents")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::QueryFailed(format!("COUNT: {e}")))?;

        let cnt: i64 = row
            .try_get("cnt")
            .map_err(|e| StoreError::QueryFailed(format!("cnt column: {e}")))?;

        Ok(cnt as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docchat_core::document::{Page, PageSummary};

    async fn test_store() -> SqliteStore {
        SqliteStore::new("sqlite::memory:").await.unwrap()
    }

    fn make_payload(filename: &str, pages: &[(u32, &str)]) -> OcrPayload {
        OcrPayload {
            file_name: filename.into(),
            completion_time: 1000,
            input_tokens: 100,
            output_tokens: 50,
            pages: pages
                .iter()
                .map(|(page, content)| Page {
                    page: *page,
                    content: (*content).into(),
                    content_length: content.len() as u64,
                })
                .collect(),
            summary: PageSummary {
                total_pages: pages.len() as u32,
                successful_pages: pages.len() as u32,
                failed_pages: 0,
            },
        }
    }

    #[tokio::test]
    async fn create_and_list() {
        let store = test_store().await;
        let payload = make_payload("invoice.pdf", &[(1, "Total: $10")]);
        let doc = store
            .create_document("invoice.pdf", b"%PDF-1.4", &payload)
            .await
            .unwrap();
        assert!(!doc.id.is_empty());
        assert!(doc.ocr_result.is_some());

        let docs = store.list_documents().await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].filename, "invoice.pdf");
        let record = docs[0].ocr_result.as_ref().unwrap();
        assert_eq!(record.payload().unwrap(), payload);
    }

    #[tokio::test]
    async fn content_is_base64() {
        let store = test_store().await;
        let payload = make_payload("a.pdf", &[(1, "x")]);
        let doc = store
            .create_document("a.pdf", b"%PDF-1.4 raw bytes", &payload)
            .await
            .unwrap();
        let decoded = BASE64.decode(&doc.content).unwrap();
        assert_eq!(decoded, b"%PDF-1.4 raw bytes");
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let store = test_store().await;
        for name in ["first.pdf", "second.pdf", "third.pdf"] {
            let payload = make_payload(name, &[(1, "content")]);
            store.create_document(name, b"%PDF", &payload).await.unwrap();
        }

        let docs = store.list_documents().await.unwrap();
        assert_eq!(docs.len(), 3);
        assert_eq!(docs[0].filename, "third.pdf");
        assert_eq!(docs[2].filename, "first.pdf");
    }

    #[tokio::test]
    async fn find_by_id_set() {
        let store = test_store().await;
        let a = store
            .create_document("a.pdf", b"%PDF", &make_payload("a.pdf", &[(1, "alpha")]))
            .await
            .unwrap();
        let b = store
            .create_document("b.pdf", b"%PDF", &make_payload("b.pdf", &[(1, "beta")]))
            .await
            .unwrap();

        let results = store
            .find_ocr_results(&[a.id.clone(), b.id.clone()])
            .await
            .unwrap();
        assert_eq!(results.len(), 2);
        let filenames: Vec<&str> = results.iter().map(|(_, d)| d.filename.as_str()).collect();
        assert!(filenames.contains(&"a.pdf"));
        assert!(filenames.contains(&"b.pdf"));
    }

    #[tokio::test]
    async fn absent_ids_silently_omitted() {
        let store = test_store().await;
        let a = store
            .create_document("a.pdf", b"%PDF", &make_payload("a.pdf", &[(1, "alpha")]))
            .await
            .unwrap();

        let results = store
            .find_ocr_results(&[a.id.clone(), "no-such-id".into()])
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].1.id, a.id);
    }

    #[tokio::test]
    async fn find_with_empty_set() {
        let store = test_store().await;
        let results = store.find_ocr_results(&[]).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn delete_cascades_to_ocr_result() {
        let store = test_store().await;
        let doc = store
            .create_document("a.pdf", b"%PDF", &make_payload("a.pdf", &[(1, "alpha")]))
            .await
            .unwrap();

        let deleted = store.delete_document(&doc.id).await.unwrap();
        assert!(deleted);
        assert_eq!(store.count().await.unwrap(), 0);

        let results = store.find_ocr_results(&[doc.id.clone()]).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn delete_nonexistent_returns_false() {
        let store = test_store().await;
        let deleted = store.delete_document("no-such-id").await.unwrap();
        assert!(!deleted);
    }

    #[tokio::test]
    async fn delete_document_without_ocr_row() {
        let store = test_store().await;
        // Simulate a document whose OCR fields were cleared out-of-band.
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO documents (id, filename, content, created_at, updated_at)
             VALUES ('orphan', 'orphan.pdf', '', ?1, ?1)",
        )
        .bind(&now)
        .execute(&store.pool)
        .await
        .unwrap();

        let deleted = store.delete_document("orphan").await.unwrap();
        assert!(deleted);
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn document_without_ocr_listed_with_none() {
        let store = test_store().await;
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO documents (id, filename, content, created_at, updated_at)
             VALUES ('orphan', 'orphan.pdf', '', ?1, ?1)",
        )
        .bind(&now)
        .execute(&store.pool)
        .await
        .unwrap();

        let docs = store.list_documents().await.unwrap();
        assert_eq!(docs.len(), 1);
        assert!(docs[0].ocr_result.is_none());
    }

    #[tokio::test]
    async fn corrupt_timestamp_still_lists() {
        let store = test_store().await;
        sqlx::query(
            "INSERT INTO documents (id, filename, content, created_at, updated_at)
             VALUES ('bad-ts', 'bad.pdf', '', 'not a timestamp', 'not a timestamp')",
        )
        .execute(&store.pool)
        .await
        .unwrap();

        let docs = store.list_documents().await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].filename, "bad.pdf");
    }

    #[tokio::test]
    async fn count_empty() {
        let store = test_store().await;
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn backend_name() {
        let store = test_store().await;
        assert_eq!(store.name(), "sqlite");
    }
}

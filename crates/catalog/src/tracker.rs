use atlas_models::AtlasError;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use tracing::{info, instrument};

/// One row in the uploads ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadRecord {
    pub public_url: String,
    pub sha256: String,
    pub original_filename: String,
    pub citation_title: String,
    pub citation_year: String,
    pub uploaded_at: DateTime<Utc>,
    pub processed: bool,
}

/// SQLite-backed ledger of ingested PDFs. The canonical papers document
/// lives in the object store; this table exists for quick local queries
/// about what was uploaded and when.
pub struct UploadTracker {
    pool: SqlitePool,
}

impl UploadTracker {
    pub async fn new(pool: SqlitePool) -> Result<Self, AtlasError> {
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| AtlasError::DatabaseError {
                reason: format!("migration failed: {e}"),
            })?;
        Ok(Self { pool })
    }

    /// Inserts or refreshes the row for an archived PDF.
    #[instrument(skip(self, record))]
    pub async fn record_upload(&self, record: &UploadRecord) -> Result<(), AtlasError> {
        sqlx::query(
            r#"
            INSERT INTO uploads
                (public_url, sha256, original_filename, citation_title, citation_year, uploaded_at, processed)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(public_url) DO UPDATE SET
                sha256 = excluded.sha256,
                original_filename = excluded.original_filename,
                citation_title = excluded.citation_title,
                citation_year = excluded.citation_year,
                uploaded_at = excluded.uploaded_at,
                processed = excluded.processed
            "#,
        )
        .bind(&record.public_url)
        .bind(&record.sha256)
        .bind(&record.original_filename)
        .bind(&record.citation_title)
        .bind(&record.citation_year)
        .bind(record.uploaded_at.to_rfc3339())
        .bind(record.processed as i64)
        .execute(&self.pool)
        .await?;
        info!(url = %record.public_url, "Recorded upload");
        Ok(())
    }

    /// Flags an upload as fully processed through the ingest pipeline.
    #[instrument(skip(self))]
    pub async fn mark_processed(&self, public_url: &str) -> Result<(), AtlasError> {
        sqlx::query("UPDATE uploads SET processed = 1 WHERE public_url = ?")
            .bind(public_url)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Most recent uploads, newest first.
    #[instrument(skip(self))]
    pub async fn recent(&self, limit: i64) -> Result<Vec<UploadRecord>, AtlasError> {
        let rows = sqlx::query(
            "SELECT public_url, sha256, original_filename, citation_title, citation_year, \
             uploaded_at, processed FROM uploads ORDER BY uploaded_at DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let uploaded_at: String = row.get("uploaded_at");
            let uploaded_at = DateTime::parse_from_rfc3339(&uploaded_at)
                .map_err(|e| AtlasError::DatabaseError {
                    reason: format!("bad uploaded_at value: {e}"),
                })?
                .with_timezone(&Utc);
            records.push(UploadRecord {
                public_url: row.get("public_url"),
                sha256: row.get("sha256"),
                original_filename: row.get("original_filename"),
                citation_title: row.get("citation_title"),
                citation_year: row.get("citation_year"),
                uploaded_at,
                processed: row.get::<i64, _>("processed") != 0,
            });
        }
        Ok(records)
    }
}

// src/store.rs
//! Where charts live between editing sessions. The odontogram core never
//! calls this; the HTTP host loads the initial chart and saves results.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{PgPool, types::Json};
use uuid::Uuid;

use crate::odontogram::{Chart, ChartError, ChartSummary};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("db error: {0}")]
    Db(#[from] sqlx::Error),
    #[error("stored chart for {owner} is invalid: {source}")]
    Corrupt {
        owner: Uuid,
        #[source]
        source: ChartError,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartEntry {
    pub entry_id: Uuid,
    pub patient_id: Uuid,
    pub chart: Chart,
    pub note: Option<String>,
    pub created_by_user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartEntrySummary {
    pub entry_id: Uuid,
    pub patient_id: Uuid,
    pub note: Option<String>,
    pub created_by_user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub summary: ChartSummary,
}

impl From<&ChartEntry> for ChartEntrySummary {
    fn from(e: &ChartEntry) -> Self {
        ChartEntrySummary {
            entry_id: e.entry_id,
            patient_id: e.patient_id,
            note: e.note.clone(),
            created_by_user_id: e.created_by_user_id,
            created_at: e.created_at,
            summary: e.chart.summary(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewChartEntry {
    pub patient_id: Uuid,
    pub chart: Chart,
    pub note: Option<String>,
    pub created_by_user_id: Uuid,
}

/// Live-saved working copy, one per patient.
#[derive(Debug, Clone, Serialize)]
pub struct ChartDraft {
    pub patient_id: Uuid,
    pub chart: Chart,
    pub updated_by_user_id: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}

#[async_trait]
pub trait ChartStore: Send + Sync {
    async fn patient_exists(&self, patient_id: Uuid) -> Result<bool, StoreError>;
    async fn latest_entry(&self, patient_id: Uuid) -> Result<Option<ChartEntry>, StoreError>;
    async fn get_entry(&self, entry_id: Uuid) -> Result<Option<ChartEntry>, StoreError>;
    async fn list_entries(&self, patient_id: Uuid, limit: i64) -> Result<Vec<ChartEntrySummary>, StoreError>;
    async fn insert_entry(&self, entry: NewChartEntry) -> Result<ChartEntry, StoreError>;
    async fn get_draft(&self, patient_id: Uuid) -> Result<Option<ChartDraft>, StoreError>;
    async fn upsert_draft(&self, patient_id: Uuid, user_id: Uuid, chart: &Chart) -> Result<(), StoreError>;
    async fn delete_draft(&self, patient_id: Uuid) -> Result<(), StoreError>;
}

/* -------------------------
   Postgres
--------------------------*/

#[derive(Debug, sqlx::FromRow)]
struct ChartEntryRow {
    entry_id: Uuid,
    patient_id: Uuid,
    chart: Json<Chart>,
    note: Option<String>,
    created_by_user_id: Option<Uuid>,
    created_at: DateTime<Utc>,
}

impl ChartEntryRow {
    fn into_entry(self) -> Result<ChartEntry, StoreError> {
        let chart = Chart::load(Some(self.chart.0)).map_err(|source| StoreError::Corrupt {
            owner: self.entry_id,
            source,
        })?;
        Ok(ChartEntry {
            entry_id: self.entry_id,
            patient_id: self.patient_id,
            chart,
            note: self.note,
            created_by_user_id: self.created_by_user_id,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ChartDraftRow {
    patient_id: Uuid,
    chart: Json<Chart>,
    updated_by_user_id: Option<Uuid>,
    updated_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct PgChartStore {
    db: PgPool,
}

impl PgChartStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ChartStore for PgChartStore {
    async fn patient_exists(&self, patient_id: Uuid) -> Result<bool, StoreError> {
        let found: Option<Uuid> = sqlx::query_scalar(
            r#"
            SELECT patient_id
            FROM patient
            WHERE patient_id = $1
            "#,
        )
        .bind(patient_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(found.is_some())
    }

    async fn latest_entry(&self, patient_id: Uuid) -> Result<Option<ChartEntry>, StoreError> {
        let row = sqlx::query_as::<_, ChartEntryRow>(
            r#"
            SELECT entry_id, patient_id, chart, note, created_by_user_id, created_at
            FROM chart_entry
            WHERE patient_id = $1
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(patient_id)
        .fetch_optional(&self.db)
        .await?;
        row.map(ChartEntryRow::into_entry).transpose()
    }

    async fn get_entry(&self, entry_id: Uuid) -> Result<Option<ChartEntry>, StoreError> {
        let row = sqlx::query_as::<_, ChartEntryRow>(
            r#"
            SELECT entry_id, patient_id, chart, note, created_by_user_id, created_at
            FROM chart_entry
            WHERE entry_id = $1
            "#,
        )
        .bind(entry_id)
        .fetch_optional(&self.db)
        .await?;
        row.map(ChartEntryRow::into_entry).transpose()
    }

    async fn list_entries(&self, patient_id: Uuid, limit: i64) -> Result<Vec<ChartEntrySummary>, StoreError> {
        let rows = sqlx::query_as::<_, ChartEntryRow>(
            r#"
            SELECT entry_id, patient_id, chart, note, created_by_user_id, created_at
            FROM chart_entry
            WHERE patient_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(patient_id)
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter()
            .map(|r| r.into_entry().map(|e| ChartEntrySummary::from(&e)))
            .collect()
    }

    async fn insert_entry(&self, entry: NewChartEntry) -> Result<ChartEntry, StoreError> {
        let row = sqlx::query_as::<_, ChartEntryRow>(
            r#"
            INSERT INTO chart_entry (patient_id, chart, note, created_by_user_id, created_at)
            VALUES ($1, $2, $3, $4, now())
            RETURNING entry_id, patient_id, chart, note, created_by_user_id, created_at
            "#,
        )
        .bind(entry.patient_id)
        .bind(Json(&entry.chart))
        .bind(entry.note.as_deref())
        .bind(entry.created_by_user_id)
        .fetch_one(&self.db)
        .await?;
        row.into_entry()
    }

    async fn get_draft(&self, patient_id: Uuid) -> Result<Option<ChartDraft>, StoreError> {
        let row = sqlx::query_as::<_, ChartDraftRow>(
            r#"
            SELECT patient_id, chart, updated_by_user_id, updated_at
            FROM chart_draft
            WHERE patient_id = $1
            "#,
        )
        .bind(patient_id)
        .fetch_optional(&self.db)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let chart = Chart::load(Some(row.chart.0)).map_err(|source| StoreError::Corrupt {
            owner: row.patient_id,
            source,
        })?;
        Ok(Some(ChartDraft {
            patient_id: row.patient_id,
            chart,
            updated_by_user_id: row.updated_by_user_id,
            updated_at: row.updated_at,
        }))
    }

    async fn upsert_draft(&self, patient_id: Uuid, user_id: Uuid, chart: &Chart) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO chart_draft (patient_id, chart, updated_by_user_id, updated_at)
            VALUES ($1, $2, $3, now())
            ON CONFLICT (patient_id)
            DO UPDATE SET chart = EXCLUDED.chart,
                          updated_by_user_id = EXCLUDED.updated_by_user_id,
                          updated_at = now()
            "#,
        )
        .bind(patient_id)
        .bind(Json(chart))
        .bind(user_id)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn delete_draft(&self, patient_id: Uuid) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            DELETE FROM chart_draft
            WHERE patient_id = $1
            "#,
        )
        .bind(patient_id)
        .execute(&self.db)
        .await?;
        Ok(())
    }
}

/* -------------------------
   In-memory (tests)
--------------------------*/

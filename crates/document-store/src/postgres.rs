use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};

use crate::{
    Change, CommitReceipt, Document, EntityId, Result, StorageError, Version,
    store::{DocumentStore, validate_changes},
};

const UNIQUE_COLLECTION_KEY: &str = "unique_collection_key";

/// PostgreSQL-backed document store implementation.
///
/// Ids come from one table-wide `BIGSERIAL`, so they are unique across
/// collections; [`InMemoryStore`](crate::InMemoryStore) numbers each collection from 1.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL document store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to the database at `url`.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = PgPool::connect(url).await?;
        Ok(Self::new(pool))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_document(row: PgRow) -> Result<Document> {
        Ok(Document {
            collection: row.try_get("collection")?,
            id: EntityId::new(row.try_get("id")?),
            key: row.try_get("natural_key")?,
            version: Version::new(row.try_get("version")?),
            updated_at: row.try_get("updated_at")?,
            body: row.try_get("body")?,
        })
    }

    async fn current_version(
        tx: &mut Transaction<'_, Postgres>,
        collection: &str,
        id: EntityId,
    ) -> Result<Version> {
        let version: Option<i64> =
            sqlx::query_scalar("SELECT version FROM documents WHERE collection = $1 AND id = $2")
                .bind(collection)
                .bind(id.as_i64())
                .fetch_optional(&mut **tx)
                .await?;
        Ok(version.map_or(Version::initial(), Version::new))
    }

    async fn apply(
        tx: &mut Transaction<'_, Postgres>,
        change: Change,
        receipt: &mut CommitReceipt,
    ) -> Result<()> {
        let now = Utc::now();
        match change {
            Change::Insert {
                collection,
                key,
                body,
            } => {
                let id: i64 = sqlx::query_scalar(
                    r#"
                    INSERT INTO documents (collection, natural_key, version, updated_at, body)
                    VALUES ($1, $2, 1, $3, $4)
                    RETURNING id
                    "#,
                )
                .bind(&collection)
                .bind(&key)
                .bind(now)
                .bind(&body)
                .fetch_one(&mut **tx)
                .await
                .map_err(|e| {
                    if let sqlx::Error::Database(ref db_err) = e
                        && db_err.constraint() == Some(UNIQUE_COLLECTION_KEY)
                    {
                        return StorageError::DuplicateKey {
                            collection: collection.clone(),
                            key: key.clone().unwrap_or_default(),
                        };
                    }
                    StorageError::Database(e)
                })?;
                receipt.inserted.push(EntityId::new(id));
            }
            Change::Update {
                collection,
                id,
                expected,
                body,
            } => {
                let updated = sqlx::query(
                    r#"
                    UPDATE documents
                    SET body = $1, version = version + 1, updated_at = $2
                    WHERE collection = $3 AND id = $4 AND version = $5
                    "#,
                )
                .bind(&body)
                .bind(now)
                .bind(&collection)
                .bind(id.as_i64())
                .bind(expected.as_i64())
                .execute(&mut **tx)
                .await?;

                if updated.rows_affected() != 1 {
                    let actual = Self::current_version(tx, &collection, id).await?;
                    return Err(StorageError::ConcurrencyConflict {
                        collection,
                        id,
                        expected,
                        actual,
                    });
                }
            }
            Change::Delete {
                collection,
                id,
                expected,
            } => {
                let deleted = sqlx::query(
                    "DELETE FROM documents WHERE collection = $1 AND id = $2 AND version = $3",
                )
                .bind(&collection)
                .bind(id.as_i64())
                .bind(expected.as_i64())
                .execute(&mut **tx)
                .await?;

                if deleted.rows_affected() != 1 {
                    let actual = Self::current_version(tx, &collection, id).await?;
                    return Err(StorageError::ConcurrencyConflict {
                        collection,
                        id,
                        expected,
                        actual,
                    });
                }
            }
        }

        receipt.applied += 1;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for PostgresStore {
    async fn get(&self, collection: &str, id: EntityId) -> Result<Option<Document>> {
        let row = sqlx::query(
            r#"
            SELECT collection, id, natural_key, version, updated_at, body
            FROM documents
            WHERE collection = $1 AND id = $2
            "#,
        )
        .bind(collection)
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_document).transpose()
    }

    async fn find_by_key(&self, collection: &str, key: &str) -> Result<Option<Document>> {
        let row = sqlx::query(
            r#"
            SELECT collection, id, natural_key, version, updated_at, body
            FROM documents
            WHERE collection = $1 AND natural_key = $2
            "#,
        )
        .bind(collection)
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_document).transpose()
    }

    async fn list(&self, collection: &str) -> Result<Vec<Document>> {
        let rows = sqlx::query(
            r#"
            SELECT collection, id, natural_key, version, updated_at, body
            FROM documents
            WHERE collection = $1
            ORDER BY id ASC
            "#,
        )
        .bind(collection)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_document).collect()
    }

    #[tracing::instrument(skip(self, changes), fields(changes = changes.len()))]
    async fn commit(&self, changes: Vec<Change>) -> Result<CommitReceipt> {
        validate_changes(&changes)?;

        let mut tx = self.pool.begin().await?;
        let mut receipt = CommitReceipt::default();

        // An early return drops `tx`, which rolls the transaction back.
        for change in changes {
            Self::apply(&mut tx, change, &mut receipt).await?;
        }

        tx.commit().await?;

        Ok(receipt)
    }
}

use anyhow::Context;
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::users::repo_types::{NewUser, SortOrder, User};

/// Rows per INSERT statement; 9 binds per row keeps well under the
/// PostgreSQL limit of 65535 parameters.
const INSERT_CHUNK: usize = 1000;

const USER_COLUMNS: &str =
    "id, uuid, name, email, password_hash, avatar_url, status, last_login_at, created_at, updated_at";

#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("duplicate user ({0})")]
    Conflict(String),
    #[error("database error: {0}")]
    Database(#[source] anyhow::Error),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if db.is_unique_violation() {
                let constraint = db.constraint().unwrap_or("unique").to_string();
                return RepoError::Conflict(constraint);
            }
        }
        RepoError::Database(anyhow::Error::new(err))
    }
}

/// Storage operations the directory needs.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Inserts the whole batch or nothing. Returns the stored rows ordered by id.
    async fn insert_many(&self, users: &[NewUser]) -> Result<Vec<User>, RepoError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, RepoError>;
    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<User>, RepoError>;
    async fn list(&self, order: SortOrder, limit: i64, offset: i64) -> Result<Vec<User>, RepoError>;
}

#[derive(Clone)]
pub struct PgUserRepository {
    db: PgPool,
}

impl PgUserRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn insert_many(&self, users: &[NewUser]) -> Result<Vec<User>, RepoError> {
        if users.is_empty() {
            return Ok(Vec::new());
        }

        let mut tx = self
            .db
            .begin()
            .await
            .context("begin tx")
            .map_err(RepoError::Database)?;
        let mut inserted = Vec::with_capacity(users.len());
        for chunk in users.chunks(INSERT_CHUNK) {
            let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
                "INSERT INTO users (uuid, name, email, password_hash, avatar_url, status, last_login_at, created_at, updated_at) ",
            );
            qb.push_values(chunk, |mut row, u| {
                row.push_bind(u.external_id)
                    .push_bind(u.name.clone())
                    .push_bind(u.email.clone())
                    .push_bind(u.password_hash.clone())
                    .push_bind(u.avatar_url.clone())
                    .push_bind(u.status)
                    .push_bind(u.last_login_at)
                    .push_bind(u.created_at)
                    .push_bind(u.updated_at);
            });
            qb.push(" RETURNING ");
            qb.push(USER_COLUMNS);

            let rows = qb
                .build_query_as::<User>()
                .fetch_all(&mut *tx)
                .await
                .map_err(|e| {
                    warn!(error = %e, "insert users chunk failed; rolling back");
                    RepoError::from(e)
                })?;
            inserted.extend(rows);
        }
        tx.commit().await?;
        // RETURNING carries no ordering guarantee.
        inserted.sort_unstable_by_key(|u| u.id);

        debug!(count = inserted.len(), "users inserted");
        Ok(inserted)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, RepoError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<User>, RepoError> {
        // The column is typed UUID, so anything else cannot match.
        let Ok(uuid) = Uuid::parse_str(external_id) else {
            return Ok(None);
        };
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE uuid = $1"
        ))
        .bind(uuid)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn list(&self, order: SortOrder, limit: i64, offset: i64) -> Result<Vec<User>, RepoError> {
        let direction = match order {
            SortOrder::IdAscending => "ASC",
            SortOrder::IdDescending => "DESC",
        };
        let rows = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY id {direction} LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }
}

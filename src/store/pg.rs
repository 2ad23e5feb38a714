// store/pg.rs
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::{PollStore, StoreError};
use crate::models::{Poll, PollOption, Vote};

// Postgres error code for unique_violation.
const UNIQUE_VIOLATION: &str = "23505";

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }
}

fn map_insert_err(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
            StoreError::UniqueViolation
        }
        _ => StoreError::Backend(err),
    }
}

#[async_trait]
impl PollStore for PgStore {
    async fn insert_poll(&self, poll: &Poll) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO polls (id, title, description, creator_id, created_at, updated_at, is_active, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(poll.id)
        .bind(&poll.title)
        .bind(&poll.description)
        .bind(poll.creator_id)
        .bind(poll.created_at)
        .bind(poll.updated_at)
        .bind(poll.is_active)
        .bind(poll.expires_at)
        .execute(&self.pool)
        .await
        .map_err(map_insert_err)?;

        Ok(())
    }

    async fn fetch_poll(&self, id: Uuid) -> Result<Option<Poll>, StoreError> {
        let poll = sqlx::query_as::<_, Poll>("SELECT * FROM polls WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(poll)
    }

    async fn poll_owner(&self, id: Uuid) -> Result<Option<Uuid>, StoreError> {
        let owner = sqlx::query_scalar::<_, Uuid>("SELECT creator_id FROM polls WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(owner)
    }

    async fn list_polls(&self) -> Result<Vec<Poll>, StoreError> {
        let polls = sqlx::query_as::<_, Poll>("SELECT * FROM polls ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await?;
        Ok(polls)
    }

    async fn update_poll(
        &self,
        id: Uuid,
        title: &str,
        description: Option<&str>,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        sqlx::query("UPDATE polls SET title = $2, description = $3, updated_at = $4 WHERE id = $1")
            .bind(id)
            .bind(title)
            .bind(description)
            .bind(updated_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_poll(&self, id: Uuid) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM polls WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn insert_options(&self, options: &[PollOption]) -> Result<(), StoreError> {
        for option in options {
            sqlx::query(
                "INSERT INTO poll_options (id, poll_id, text, order_index) VALUES ($1, $2, $3, $4)",
            )
            .bind(option.id)
            .bind(option.poll_id)
            .bind(&option.text)
            .bind(option.order_index)
            .execute(&self.pool)
            .await
            .map_err(map_insert_err)?;
        }
        Ok(())
    }

    async fn delete_options(&self, poll_id: Uuid) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM poll_options WHERE poll_id = $1")
            .bind(poll_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn options_for_poll(&self, poll_id: Uuid) -> Result<Vec<PollOption>, StoreError> {
        let options = sqlx::query_as::<_, PollOption>(
            "SELECT * FROM poll_options WHERE poll_id = $1 ORDER BY order_index ASC",
        )
        .bind(poll_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(options)
    }

    async fn insert_vote(&self, vote: &Vote) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO votes (id, poll_id, option_id, user_id, ip_address, user_agent, session_fingerprint, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(vote.id)
        .bind(vote.poll_id)
        .bind(vote.option_id)
        .bind(vote.user_id)
        .bind(&vote.ip_address)
        .bind(&vote.user_agent)
        .bind(&vote.session_fingerprint)
        .bind(vote.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_insert_err)?;

        Ok(())
    }

    async fn vote_counts(&self, poll_id: Uuid) -> Result<HashMap<Uuid, i64>, StoreError> {
        let rows = sqlx::query(
            "SELECT option_id, COUNT(*) AS vote_count FROM votes WHERE poll_id = $1 GROUP BY option_id",
        )
        .bind(poll_id)
        .fetch_all(&self.pool)
        .await?;

        let counts = rows
            .into_iter()
            .map(|row| {
                let option_id: Uuid = row.get("option_id");
                let count: i64 = row.get("vote_count");
                (option_id, count)
            })
            .collect();

        Ok(counts)
    }
}

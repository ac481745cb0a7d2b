use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::job::{JobRow, NewJob};
use crate::models::user::{NewUser, ProfileUpdate, UserRow};
use crate::store::{normalize_search, user_exists_error, Store};

/// PostgreSQL-backed store. Schema lives in `migrations/`.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    fn mode(&self) -> &'static str {
        "postgres"
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRow>, AppError> {
        Ok(
            sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE email = $1")
                .bind(email)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<UserRow>, AppError> {
        Ok(
            sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn create_user(&self, user: NewUser) -> Result<UserRow, AppError> {
        let result = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (id, name, email, phone, password_hash, avatar)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(&user.password_hash)
        .bind(&user.avatar)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => {
                info!("Created user {}", row.id);
                Ok(row)
            }
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Err(user_exists_error()),
            Err(e) => Err(e.into()),
        }
    }

    async fn update_profile(
        &self,
        id: Uuid,
        update: ProfileUpdate,
    ) -> Result<Option<UserRow>, AppError> {
        Ok(sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users SET
                name       = COALESCE($2, name),
                phone      = COALESCE($3, phone),
                headline   = COALESCE($4, headline),
                location   = COALESCE($5, location),
                contact    = COALESCE($6, contact),
                company    = COALESCE($7, company),
                avatar     = COALESCE($8, avatar),
                about      = COALESCE($9, about),
                skills     = COALESCE($10, skills),
                experience = COALESCE($11, experience),
                education  = COALESCE($12, education),
                linkedin   = COALESCE($13, linkedin),
                github     = COALESCE($14, github),
                twitter    = COALESCE($15, twitter)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(update.name)
        .bind(update.phone)
        .bind(update.headline)
        .bind(update.location)
        .bind(update.contact)
        .bind(update.company)
        .bind(update.avatar)
        .bind(update.about)
        .bind(update.skills)
        .bind(update.experience.map(Json))
        .bind(update.education.map(Json))
        .bind(update.linkedin)
        .bind(update.github)
        .bind(update.twitter)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn search_professionals(&self, search: Option<&str>) -> Result<Vec<UserRow>, AppError> {
        let Some(needle) = normalize_search(search) else {
            return Ok(
                sqlx::query_as::<_, UserRow>("SELECT * FROM users ORDER BY created_at")
                    .fetch_all(&self.pool)
                    .await?,
            );
        };

        Ok(sqlx::query_as::<_, UserRow>(
            r#"
            SELECT * FROM users
            WHERE name ILIKE $1
               OR headline ILIKE $1
               OR about ILIKE $1
               OR EXISTS (SELECT 1 FROM unnest(skills) AS skill WHERE skill ILIKE $1)
            ORDER BY created_at
            "#,
        )
        .bind(like_pattern(&needle))
        .fetch_all(&self.pool)
        .await?)
    }

    async fn list_jobs(&self) -> Result<Vec<JobRow>, AppError> {
        Ok(
            sqlx::query_as::<_, JobRow>("SELECT * FROM jobs ORDER BY created_at DESC")
                .fetch_all(&self.pool)
                .await?,
        )
    }

    async fn create_job(&self, job: NewJob, posted_by: Uuid) -> Result<JobRow, AppError> {
        Ok(sqlx::query_as::<_, JobRow>(
            r#"
            INSERT INTO jobs (id, title, company, description, location, salary, posted_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&job.title)
        .bind(&job.company)
        .bind(&job.description)
        .bind(&job.location)
        .bind(&job.salary)
        .bind(posted_by)
        .fetch_one(&self.pool)
        .await?)
    }
}

/// Wraps a literal search term for ILIKE, escaping the pattern metacharacters.
fn like_pattern(needle: &str) -> String {
    let escaped = needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("rust"), "%rust%");
        assert_eq!(like_pattern("100%"), "%100\\%%");
        assert_eq!(like_pattern("ui_ux"), "%ui\\_ux%");
    }
}

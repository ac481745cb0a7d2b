//! Datastore abstraction. `AppState` carries an `Arc<dyn Store>`, chosen at startup:
//! `PgStore` when PostgreSQL is reachable, otherwise the seeded `MemoryStore`.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::job::{JobRow, NewJob};
use crate::models::user::{NewUser, ProfileUpdate, UserRow};

#[async_trait]
pub trait Store: Send + Sync {
    /// `"memory"` or `"postgres"`, reported by the health endpoint.
    fn mode(&self) -> &'static str;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRow>, AppError>;

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<UserRow>, AppError>;

    /// Fails with `AppError::Conflict` when the email is already registered.
    async fn create_user(&self, user: NewUser) -> Result<UserRow, AppError>;

    /// Returns `None` when the user does not exist.
    async fn update_profile(
        &self,
        id: Uuid,
        update: ProfileUpdate,
    ) -> Result<Option<UserRow>, AppError>;

    /// Case-insensitive substring search over name, headline, about, and skills.
    /// `None` or an empty string returns everyone.
    async fn search_professionals(&self, search: Option<&str>) -> Result<Vec<UserRow>, AppError>;

    /// Newest first.
    async fn list_jobs(&self) -> Result<Vec<JobRow>, AppError>;

    async fn create_job(&self, job: NewJob, posted_by: Uuid) -> Result<JobRow, AppError>;
}

pub(crate) fn user_exists_error() -> AppError {
    AppError::Conflict("User already exists".to_string())
}

/// Trims the search term; blank terms mean "no filter".
pub(crate) fn normalize_search(search: Option<&str>) -> Option<String> {
    search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
}

//! In-memory store used when no database is reachable. Seeded with demo data so the
//! site is browsable out of the box. Contents are lost on restart.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::types::Json;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::job::{JobRow, NewJob};
use crate::models::user::{NewUser, ProfileUpdate, UserRow};
use crate::store::{normalize_search, user_exists_error, Store};

const SEED_AVATAR: &str = "https://placehold.co/120x120/0d47a1/ffffff?text=J";

#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<Vec<UserRow>>,
    /// Kept newest first.
    jobs: RwLock<Vec<JobRow>>,
}

impl MemoryStore {
    /// Two demo jobs and two demo professionals. Seeded users have no usable password.
    pub fn seeded() -> Self {
        let now = Utc::now();
        let jobs = vec![
            JobRow {
                id: Uuid::new_v4(),
                title: "Senior Developer".to_string(),
                company: "TechCorp".to_string(),
                description: Some("React & Node.js expert needed.".to_string()),
                location: Some("Remote".to_string()),
                salary: Some("$120k".to_string()),
                posted_by: None,
                created_at: now,
            },
            JobRow {
                id: Uuid::new_v4(),
                title: "UI/UX Designer".to_string(),
                company: "CreativeStudio".to_string(),
                description: Some("Design beautiful interfaces.".to_string()),
                location: Some("New York".to_string()),
                salary: Some("$90k".to_string()),
                posted_by: None,
                created_at: now,
            },
        ];
        let users = vec![
            seed_user(
                "John Doe",
                "john.doe@example.com",
                "Full Stack Developer",
                "Google",
                &["React", "Node.js", "MongoDB"],
            ),
            seed_user(
                "Jane Smith",
                "jane.smith@example.com",
                "Product Designer",
                "Apple",
                &["Figma", "Sketch", "UI/UX"],
            ),
        ];
        Self {
            users: RwLock::new(users),
            jobs: RwLock::new(jobs),
        }
    }
}

fn seed_user(name: &str, email: &str, headline: &str, company: &str, skills: &[&str]) -> UserRow {
    UserRow {
        id: Uuid::new_v4(),
        name: name.to_string(),
        email: email.to_string(),
        // Not a valid bcrypt hash, so login always fails for demo profiles.
        password_hash: String::new(),
        phone: None,
        headline: Some(headline.to_string()),
        location: None,
        contact: None,
        company: Some(company.to_string()),
        avatar: Some(SEED_AVATAR.to_string()),
        about: None,
        skills: skills.iter().map(|s| s.to_string()).collect(),
        experience: Json(vec![]),
        education: Json(vec![]),
        linkedin: None,
        github: None,
        twitter: None,
        created_at: Utc::now(),
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn mode(&self) -> &'static str {
        "memory"
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRow>, AppError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<UserRow>, AppError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn create_user(&self, user: NewUser) -> Result<UserRow, AppError> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.email == user.email) {
            return Err(user_exists_error());
        }
        let row = UserRow {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            phone: user.phone,
            headline: None,
            location: None,
            contact: None,
            company: None,
            avatar: user.avatar,
            about: None,
            skills: vec![],
            experience: Json(vec![]),
            education: Json(vec![]),
            linkedin: None,
            github: None,
            twitter: None,
            created_at: Utc::now(),
        };
        users.push(row.clone());
        debug!("Memory store: created user {}", row.id);
        Ok(row)
    }

    async fn update_profile(
        &self,
        id: Uuid,
        update: ProfileUpdate,
    ) -> Result<Option<UserRow>, AppError> {
        let mut users = self.users.write().await;
        let Some(user) = users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        update.apply_to(user);
        Ok(Some(user.clone()))
    }

    async fn search_professionals(&self, search: Option<&str>) -> Result<Vec<UserRow>, AppError> {
        let users = self.users.read().await;
        let found = match normalize_search(search) {
            Some(needle) => users
                .iter()
                .filter(|u| u.matches_search(&needle))
                .cloned()
                .collect(),
            None => users.clone(),
        };
        Ok(found)
    }

    async fn list_jobs(&self) -> Result<Vec<JobRow>, AppError> {
        Ok(self.jobs.read().await.clone())
    }

    async fn create_job(&self, job: NewJob, posted_by: Uuid) -> Result<JobRow, AppError> {
        let row = JobRow {
            id: Uuid::new_v4(),
            title: job.title,
            company: job.company,
            description: job.description,
            location: job.location,
            salary: job.salary,
            posted_by: Some(posted_by),
            created_at: Utc::now(),
        };
        self.jobs.write().await.insert(0, row.clone());
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Ada".to_string(),
            email: email.to_string(),
            phone: None,
            password_hash: "hash".to_string(),
            avatar: None,
        }
    }

    #[tokio::test]
    async fn test_seeded_store_has_demo_data() {
        let store = MemoryStore::seeded();
        assert_eq!(store.list_jobs().await.unwrap().len(), 2);
        assert_eq!(store.search_professionals(None).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_email_is_conflict() {
        let store = MemoryStore::default();
        store.create_user(new_user("ada@example.com")).await.unwrap();
        let err = store
            .create_user(new_user("ada@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_search_by_skill_is_case_insensitive() {
        let store = MemoryStore::seeded();
        let found = store.search_professionals(Some("FIGMA")).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Jane Smith");

        let blank = store.search_professionals(Some("  ")).await.unwrap();
        assert_eq!(blank.len(), 2);
    }

    #[tokio::test]
    async fn test_new_jobs_listed_first() {
        let store = MemoryStore::seeded();
        let poster = Uuid::new_v4();
        let job = NewJob {
            title: "Data Engineer".to_string(),
            company: "DataCo".to_string(),
            description: None,
            location: None,
            salary: None,
        };
        store.create_job(job, poster).await.unwrap();
        let jobs = store.list_jobs().await.unwrap();
        assert_eq!(jobs.len(), 3);
        assert_eq!(jobs[0].title, "Data Engineer");
        assert_eq!(jobs[0].posted_by, Some(poster));
    }

    #[tokio::test]
    async fn test_update_unknown_user_returns_none() {
        let store = MemoryStore::default();
        let updated = store
            .update_profile(Uuid::new_v4(), ProfileUpdate::default())
            .await
            .unwrap();
        assert!(updated.is_none());
    }
}

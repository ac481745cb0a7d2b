use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExperienceItem {
    pub title: Option<String>,
    pub company: Option<String>,
    pub duration: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EducationItem {
    pub degree: Option<String>,
    pub institution: Option<String>,
    pub duration: Option<String>,
}

/// Stored user record. Carries the password hash and must never be serialized to clients;
/// use [`UserProfile`] for responses.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub phone: Option<String>,
    pub headline: Option<String>,
    pub location: Option<String>,
    pub contact: Option<String>,
    pub company: Option<String>,
    pub avatar: Option<String>,
    pub about: Option<String>,
    pub skills: Vec<String>,
    pub experience: Json<Vec<ExperienceItem>>,
    pub education: Json<Vec<EducationItem>>,
    pub linkedin: Option<String>,
    pub github: Option<String>,
    pub twitter: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl UserRow {
    /// Case-insensitive substring match over name, headline, about, and skills.
    /// `needle` must already be lowercased.
    pub fn matches_search(&self, needle: &str) -> bool {
        let contains = |field: &Option<String>| {
            field
                .as_deref()
                .map(|v| v.to_lowercase().contains(needle))
                .unwrap_or(false)
        };
        self.name.to_lowercase().contains(needle)
            || contains(&self.headline)
            || contains(&self.about)
            || self.skills.iter().any(|s| s.to_lowercase().contains(needle))
    }
}

/// Public projection of a user, as returned by every profile endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub headline: Option<String>,
    pub location: Option<String>,
    pub contact: Option<String>,
    pub company: Option<String>,
    pub avatar: Option<String>,
    pub about: Option<String>,
    pub skills: Vec<String>,
    pub experience: Vec<ExperienceItem>,
    pub education: Vec<EducationItem>,
    pub linkedin: Option<String>,
    pub github: Option<String>,
    pub twitter: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<UserRow> for UserProfile {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            headline: row.headline,
            location: row.location,
            contact: row.contact,
            company: row.company,
            avatar: row.avatar,
            about: row.about,
            skills: row.skills,
            experience: row.experience.0,
            education: row.education.0,
            linkedin: row.linkedin,
            github: row.github,
            twitter: row.twitter,
            created_at: row.created_at,
        }
    }
}

/// Fields required to register a user. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password_hash: String,
    pub avatar: Option<String>,
}

/// Partial profile update. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub headline: Option<String>,
    pub location: Option<String>,
    pub contact: Option<String>,
    pub company: Option<String>,
    pub avatar: Option<String>,
    pub about: Option<String>,
    pub skills: Option<Vec<String>>,
    pub experience: Option<Vec<ExperienceItem>>,
    pub education: Option<Vec<EducationItem>>,
    pub linkedin: Option<String>,
    pub github: Option<String>,
    pub twitter: Option<String>,
}

impl ProfileUpdate {
    pub fn apply_to(self, user: &mut UserRow) {
        fn merge(target: &mut Option<String>, value: Option<String>) {
            if value.is_some() {
                *target = value;
            }
        }

        merge(&mut user.phone, self.phone);
        merge(&mut user.headline, self.headline);
        merge(&mut user.location, self.location);
        merge(&mut user.contact, self.contact);
        merge(&mut user.company, self.company);
        merge(&mut user.avatar, self.avatar);
        merge(&mut user.about, self.about);
        merge(&mut user.linkedin, self.linkedin);
        merge(&mut user.github, self.github);
        merge(&mut user.twitter, self.twitter);

        if let Some(name) = self.name {
            user.name = name;
        }
        if let Some(skills) = self.skills {
            user.skills = skills;
        }
        if let Some(experience) = self.experience {
            user.experience = Json(experience);
        }
        if let Some(education) = self.education {
            user.education = Json(education);
        }
    }
}

/// Splits a comma-separated skills string, trimming entries and dropping empties.
pub fn split_skills(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

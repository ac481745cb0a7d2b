//! Axum route handlers for profiles and the professionals directory.

use axum::{
    async_trait,
    extract::{FromRequest, Multipart, Path, Query, Request, State},
    http::header::CONTENT_TYPE,
    Json,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::user::{split_skills, EducationItem, ExperienceItem, ProfileUpdate, UserProfile};
use crate::profile::upload::save_avatar;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub search: Option<String>,
}

/// Skills arrive either as a JSON array or as a comma-separated form field.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SkillsField {
    List(Vec<String>),
    Csv(String),
}

/// Editable profile fields. Anything else in the body (email, password, ...) is ignored.
#[derive(Debug, Default, Deserialize)]
struct ProfilePatchBody {
    name: Option<String>,
    phone: Option<String>,
    headline: Option<String>,
    location: Option<String>,
    contact: Option<String>,
    company: Option<String>,
    avatar: Option<String>,
    about: Option<String>,
    skills: Option<SkillsField>,
    experience: Option<Vec<ExperienceItem>>,
    education: Option<Vec<EducationItem>>,
    linkedin: Option<String>,
    github: Option<String>,
    twitter: Option<String>,
}

impl From<ProfilePatchBody> for ProfileUpdate {
    fn from(body: ProfilePatchBody) -> Self {
        let skills = body.skills.map(|s| match s {
            SkillsField::List(list) => list
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            SkillsField::Csv(raw) => split_skills(&raw),
        });
        ProfileUpdate {
            name: body.name.filter(|n| !n.trim().is_empty()),
            phone: body.phone,
            headline: body.headline,
            location: body.location,
            contact: body.contact,
            company: body.company,
            avatar: body.avatar,
            about: body.about,
            skills,
            experience: body.experience,
            education: body.education,
            linkedin: body.linkedin,
            github: body.github,
            twitter: body.twitter,
        }
    }
}

pub struct AvatarUpload {
    pub file_name: String,
    pub bytes: bytes::Bytes,
}

/// PATCH body: JSON, or multipart form fields plus an optional `avatar` file.
pub struct ProfileForm {
    pub update: ProfileUpdate,
    pub avatar: Option<AvatarUpload>,
}

#[async_trait]
impl FromRequest<AppState> for ProfileForm {
    type Rejection = AppError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, AppError> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.starts_with("multipart/form-data"))
            .unwrap_or(false);

        if !is_multipart {
            let Json(body) = Json::<ProfilePatchBody>::from_request(req, state)
                .await
                .map_err(|e| AppError::Validation(e.body_text()))?;
            return Ok(ProfileForm {
                update: body.into(),
                avatar: None,
            });
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?;

        let mut fields = Map::new();
        let mut avatar = None;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?
        {
            let name = field.name().unwrap_or_default().to_string();
            if name == "avatar" {
                let is_image = field
                    .content_type()
                    .map(|ct| ct.starts_with("image/"))
                    .unwrap_or(false);
                if !is_image {
                    return Err(AppError::Validation("avatar must be an image".to_string()));
                }
                let file_name = field.file_name().unwrap_or("avatar").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(e.body_text()))?;
                if !bytes.is_empty() {
                    avatar = Some(AvatarUpload { file_name, bytes });
                }
                continue;
            }

            let text = field
                .text()
                .await
                .map_err(|e| AppError::Validation(e.body_text()))?;
            let value = match name.as_str() {
                // Structured fields travel as JSON text inside the form.
                "experience" | "education" => serde_json::from_str(&text).map_err(|e| {
                    AppError::Validation(format!("{name} must be a JSON array: {e}"))
                })?,
                _ => Value::String(text),
            };
            fields.insert(name, value);
        }

        let body: ProfilePatchBody = serde_json::from_value(Value::Object(fields))
            .map_err(|e| AppError::Validation(format!("Invalid profile fields: {e}")))?;

        Ok(ProfileForm {
            update: body.into(),
            avatar,
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/profile/me
pub async fn handle_get_me(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<UserProfile>, AppError> {
    let row = state
        .store
        .find_user_by_id(user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    Ok(Json(row.into()))
}

/// PATCH /api/profile
///
/// Stores the avatar first (if any) so the update can point at it.
pub async fn handle_update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    form: ProfileForm,
) -> Result<Json<UserProfile>, AppError> {
    let mut update = form.update;
    if let Some(avatar) = form.avatar {
        let url = save_avatar(&state.config.upload_dir, &avatar.file_name, &avatar.bytes).await?;
        update.avatar = Some(url);
    }

    let row = state
        .store
        .update_profile(user.user_id, update)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    Ok(Json(row.into()))
}

/// GET /api/profile/professionals?search=
pub async fn handle_list_professionals(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<Vec<UserProfile>>, AppError> {
    let rows = state
        .store
        .search_professionals(params.search.as_deref())
        .await?;
    Ok(Json(rows.into_iter().map(UserProfile::from).collect()))
}

/// GET /api/profile/:id
pub async fn handle_get_professional(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UserProfile>, AppError> {
    let not_found = || AppError::NotFound("Professional not found".to_string());
    let id = Uuid::parse_str(&id).map_err(|_| not_found())?;
    let row = state
        .store
        .find_user_by_id(id)
        .await?
        .ok_or_else(not_found)?;
    Ok(Json(row.into()))
}

use std::sync::Arc;

use axum::{Json, extract::State as AxumState};
use tracing::info;

use super::{State, session::CurrentUser};
use crate::{
    error::AppError,
    models::{Profile, ProfileForm},
};

/// The caller's edit form; a first-time caller gets a blank one with their sign-in email
pub async fn load_profile(
    AxumState(state): AxumState<Arc<State>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<ProfileForm>, AppError> {
    let form = match state.profiles.find_by_owner(user.id).await? {
        Some(profile) => ProfileForm::from_profile(&profile),
        None => ProfileForm {
            email: user.email.unwrap_or_default(),
            ..ProfileForm::default()
        },
    };

    Ok(Json(form))
}

pub async fn save_profile(
    AxumState(state): AxumState<Arc<State>>,
    CurrentUser(user): CurrentUser,
    Json(form): Json<ProfileForm>,
) -> Result<Json<Profile>, AppError> {
    let draft = form.into_draft();
    draft.validate()?;

    let profile = state.profiles.upsert_for_owner(user.id, &draft).await?;
    info!("Saved portfolio /{} for {}", profile.username, user.id);

    Ok(Json(profile))
}

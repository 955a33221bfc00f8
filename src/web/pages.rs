//! Server-rendered HTML pages.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State as AxumState},
    response::Html,
};
use minijinja::{Environment, context};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::State;
use crate::{
    error::AppError,
    models::{MAX_WORK_LINKS, Profile, is_web_url},
    pricing::{niche_options, rights_options},
    thumbnail::resolve_all,
};

/// Answers for "how many brand deals have you done", stored verbatim on the lead
pub const EXPERIENCE_LEVELS: [(&str, &str); 4] = [
    ("Newbie", "I'm new (0 deals)"),
    ("Beginner", "1-5 deals"),
    ("Intermediate", "5-20 deals"),
    ("Pro", "20+ deals"),
];

/// Template environment with every page compiled in
pub struct Pages {
    env: Environment<'static>,
}

impl Pages {
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.add_template("base.html", include_str!("../../templates/base.html"))?;
        env.add_template("home.html", include_str!("../../templates/home.html"))?;
        env.add_template(
            "creator_calc.html",
            include_str!("../../templates/creator_calc.html"),
        )?;
        env.add_template("profile.html", include_str!("../../templates/profile.html"))?;
        env.add_template("login.html", include_str!("../../templates/login.html"))?;
        env.add_template("dashboard.html", include_str!("../../templates/dashboard.html"))?;
        env.add_template(
            "auth_error.html",
            include_str!("../../templates/auth_error.html"),
        )?;

        Ok(Self { env })
    }

    pub fn render<S: Serialize>(&self, name: &str, ctx: S) -> Result<Html<String>, AppError> {
        let template = self.env.get_template(name)?;
        Ok(Html(template.render(ctx)?))
    }
}

#[derive(Serialize)]
struct WorkCard {
    title: String,
    url: String,
    thumbnail: Option<String>,
}

fn platform_label(platform: &str) -> &'static str {
    if platform == "youtube" {
        "YouTube"
    } else {
        "Instagram"
    }
}

fn initial(profile: &Profile) -> String {
    profile
        .full_name
        .chars()
        .next()
        .map(|c| c.to_uppercase().collect())
        .unwrap_or_else(|| "?".to_string())
}

pub async fn home(AxumState(state): AxumState<Arc<State>>) -> Result<Html<String>, AppError> {
    state.pages.render(
        "home.html",
        context! {
            niches => niche_options(),
            experience_levels => EXPERIENCE_LEVELS,
        },
    )
}

pub async fn creator_calc(
    AxumState(state): AxumState<Arc<State>>,
) -> Result<Html<String>, AppError> {
    state.pages.render(
        "creator_calc.html",
        context! {
            niches => niche_options(),
            rights => rights_options(),
            experience_levels => EXPERIENCE_LEVELS,
        },
    )
}

pub async fn login(AxumState(state): AxumState<Arc<State>>) -> Result<Html<String>, AppError> {
    state.pages.render("login.html", context! {})
}

pub async fn dashboard(AxumState(state): AxumState<Arc<State>>) -> Result<Html<String>, AppError> {
    state.pages.render("dashboard.html", context! {})
}

#[derive(Deserialize)]
pub struct AuthErrorParams {
    error: Option<String>,
}

pub async fn auth_code_error(
    AxumState(state): AxumState<Arc<State>>,
    Query(params): Query<AuthErrorParams>,
) -> Result<Html<String>, AppError> {
    state
        .pages
        .render("auth_error.html", context! { error => params.error })
}

/// Public portfolio at `/{username}`
pub async fn portfolio(
    AxumState(state): AxumState<Arc<State>>,
    Path(username): Path<String>,
) -> Result<Html<String>, AppError> {
    let profile = state
        .profiles
        .find_by_username(&username)
        .await?
        .ok_or(AppError::NotFound)?;

    let links: Vec<_> = profile
        .work_links
        .0
        .iter()
        .filter(|link| is_web_url(&link.url))
        .take(MAX_WORK_LINKS)
        .cloned()
        .collect();
    let urls: Vec<&str> = links.iter().map(|l| l.url.as_str()).collect();
    let thumbnails = resolve_all(state.thumbnails.as_ref(), &urls).await;
    debug!(
        "Resolved {} of {} thumbnails for {username}",
        thumbnails.iter().flatten().count(),
        links.len()
    );

    let work: Vec<WorkCard> = links
        .into_iter()
        .zip(thumbnails)
        .map(|(link, thumbnail)| WorkCard {
            title: link.title,
            url: link.url,
            thumbnail,
        })
        .collect();

    let stats = &profile.stats.0;
    let platform_url = Some(stats.platform_url.as_str()).filter(|url| is_web_url(url));

    state.pages.render(
        "profile.html",
        context! {
            initial => initial(&profile),
            platform_url => platform_url,
            platform_label => platform_label(&stats.platform),
            stats => stats,
            work => work,
            profile => &profile,
        },
    )
}

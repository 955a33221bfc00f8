//! JSON endpoints behind the landing page and the calculator.

use std::sync::Arc;

use anyhow::anyhow;
use axum::{
    Json,
    extract::State as AxumState,
    http::{StatusCode, header},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info, warn};

use super::State;
use crate::{
    error::AppError,
    models::{Lead, LeadSubmission, QuoteContact, SurveyAnswers},
    pricing::{Quote, format_inr},
    quote_image::{QuotePanel, QuoteRenderer},
};

/// The views box accepts both `50000` and `"50,000"`
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ViewsInput {
    Number(f64),
    Text(String),
}

impl Default for ViewsInput {
    fn default() -> Self {
        ViewsInput::Text(String::new())
    }
}

impl ViewsInput {
    fn as_text(&self) -> String {
        match self {
            ViewsInput::Number(n) => n.to_string(),
            ViewsInput::Text(s) => s.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct QuoteRequest {
    #[serde(default)]
    pub views: ViewsInput,
    #[serde(default)]
    pub niche: String,
    #[serde(default)]
    pub rights: String,
}

impl QuoteRequest {
    fn quote(&self) -> Result<Quote, AppError> {
        Ok(Quote::from_input(
            &self.views.as_text(),
            &self.niche,
            &self.rights,
        )?)
    }
}

#[derive(Debug, Serialize)]
pub struct DisplayFigures {
    pub average: String,
    pub minimum: String,
    pub maximum: String,
    pub base_rate: String,
    pub production_fee: String,
}

#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    pub quote: Quote,
    pub display: DisplayFigures,
}

impl From<Quote> for QuoteResponse {
    fn from(quote: Quote) -> Self {
        Self {
            display: DisplayFigures {
                average: format_inr(quote.average),
                minimum: format_inr(quote.minimum),
                maximum: format_inr(quote.maximum),
                base_rate: format_inr(quote.base_rate),
                production_fee: format_inr(quote.production_fee),
            },
            quote,
        }
    }
}

pub async fn quote(Json(request): Json<QuoteRequest>) -> Result<Json<QuoteResponse>, AppError> {
    Ok(Json(request.quote()?.into()))
}

pub async fn submit_lead(
    AxumState(state): AxumState<Arc<State>>,
    Json(submission): Json<LeadSubmission>,
) -> Result<(StatusCode, Json<Lead>), AppError> {
    let lead = submission.validate()?;
    let stored = state.leads.insert_lead(&lead).await?;
    info!("Stored lead {} from the application form", stored.id);

    Ok((StatusCode::CREATED, Json(stored)))
}

#[derive(Debug, Deserialize)]
pub struct DownloadRequest {
    #[serde(flatten)]
    pub quote: QuoteRequest,
    #[serde(flatten)]
    pub contact: QuoteContact,
}

/// Save the lead, then hand back the quote card as a PNG attachment
pub async fn download_quote(
    AxumState(state): AxumState<Arc<State>>,
    Json(request): Json<DownloadRequest>,
) -> Result<impl IntoResponse, AppError> {
    let quote = request.quote.quote()?;
    let lead = request.contact.into_lead(quote.average)?;

    // The download still goes ahead when the lead can't be stored
    match state.leads.insert_lead(&lead).await {
        Ok(stored) => info!("Stored lead {} with quote {}", stored.id, quote.average),
        Err(e) => error!("DB Save Error: {e}"),
    }

    let niche = request.quote.niche;
    let rights = request.quote.rights;
    let handle = lead.instagram;
    let file_name = QuoteRenderer::file_name(&handle);

    let png = tokio::task::spawn_blocking(move || {
        state.renderer.render_png(&QuotePanel {
            quote: &quote,
            niche: &niche,
            rights: &rights,
            handle: &handle,
        })
    })
    .await
    .map_err(|e| anyhow!("quote render task failed: {e}"))??;

    Ok((
        [
            (header::CONTENT_TYPE, mime::IMAGE_PNG.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        png,
    ))
}

/// Best-effort enrichment of earlier leads; a store failure is logged, not reported
pub async fn submit_survey(
    AxumState(state): AxumState<Arc<State>>,
    Json(answers): Json<SurveyAnswers>,
) -> Result<impl IntoResponse, AppError> {
    answers.validate()?;

    if answers.email.trim().is_empty() {
        warn!("Survey submitted without an email, nothing to merge");
        return Ok(Json(json!({ "updated": 0 })));
    }

    let updated = match state.leads.merge_survey(&answers).await {
        Ok(n) => {
            info!("Survey saved onto {n} lead(s)");
            n
        }
        Err(e) => {
            error!("Survey merge failed: {e}");
            0
        }
    };

    Ok(Json(json!({ "updated": updated })))
}

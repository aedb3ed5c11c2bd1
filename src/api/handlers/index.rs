use crate::AppState;
use crate::api::error::AppError;
use crate::api::view::{Banner, BannerKind};
use axum::{
    extract::{Query, State},
    response::Html,
};
use serde::Deserialize;
use utoipa::IntoParams;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct IndexQuery {
    /// Banner text
    pub message: Option<String>,
    /// Banner style, `success` (default) or `error`
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[utoipa::path(
    get,
    path = "/",
    params(IndexQuery),
    responses(
        (status = 200, description = "Upload form", content_type = "text/html", body = String)
    ),
    tag = "upload"
)]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<IndexQuery>,
) -> Result<Html<String>, AppError> {
    let banner = query
        .message
        .filter(|m| !m.is_empty())
        .map(|message| Banner::notice(BannerKind::parse(query.kind.as_deref()), message));

    state.pages.render(&state.config, banner.as_ref())
}

//! Tag handlers

use axum::{extract::State, Json};

use crate::{
    api::extractors::ApiJson,
    auth::AuthenticatedPrincipal,
    models::Tag,
    services::CreateTagRequest,
    state::AppState,
    Error, Result,
};

/// GET /api/v1/tags
pub async fn list_tags(State(state): State<AppState>) -> Result<Json<Vec<String>>> {
    Ok(Json(state.tag_service.list_names().await?))
}

/// POST /api/v1/tags (admin only)
pub async fn create_tag(
    State(state): State<AppState>,
    AuthenticatedPrincipal(principal): AuthenticatedPrincipal,
    ApiJson(request): ApiJson<CreateTagRequest>,
) -> Result<Json<Tag>> {
    if !principal.has_role(state.auth.admin_role()) {
        return Err(Error::Forbidden("Creating tags requires the admin role".to_string()));
    }
    Ok(Json(state.tag_service.find_or_create(request).await?))
}

// ============================================================================
// Storefront API - Menu Handlers
// File: crates/storefront-api/src/handlers/menu.rs
// ============================================================================
//! Navigation menu HTTP handlers

use axum::{extract::State, http::StatusCode, Json};
use uuid::Uuid;
use validator::Validate;

use storefront_core::domain::{MenuItemPatch, NewMenuItem};

use crate::dto::{MenuTreeResponse, MenuUpdateResponse, MoveItemRequest, ReorderRequest, StructureRequest};
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath};
use crate::response::ApiResponse;
use crate::state::AppState;

type MenuResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

/// GET /api/v1/storefronts/{storefront_id}/menu
pub async fn get_menu(
    State(state): State<AppState>,
    ApiPath(storefront_id): ApiPath<Uuid>,
) -> MenuResult<MenuTreeResponse> {
    let view = state.navigation.get_tree(storefront_id).await?;
    Ok(Json(ApiResponse::success(view.into())))
}

/// GET /api/v1/storefronts/{storefront_id}/menu/public
pub async fn get_public_menu(
    State(state): State<AppState>,
    ApiPath(storefront_id): ApiPath<Uuid>,
) -> MenuResult<MenuTreeResponse> {
    let view = state.navigation.get_public_tree(storefront_id).await?;
    Ok(Json(ApiResponse::success(view.into())))
}

/// POST /api/v1/storefronts/{storefront_id}/menu/items
pub async fn create_item(
    State(state): State<AppState>,
    ApiPath(storefront_id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<NewMenuItem>,
) -> Result<(StatusCode, Json<ApiResponse<MenuUpdateResponse>>), ApiError> {
    let update = state.navigation.create_item(storefront_id, payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(update.into()))))
}

/// PUT /api/v1/storefronts/{storefront_id}/menu/items/{item_id}
pub async fn update_item(
    State(state): State<AppState>,
    ApiPath((storefront_id, item_id)): ApiPath<(Uuid, Uuid)>,
    ApiJson(patch): ApiJson<MenuItemPatch>,
) -> MenuResult<MenuUpdateResponse> {
    if patch.is_empty() {
        return Err(ApiError::BadRequest("Nothing to update".to_string()));
    }
    let update = state
        .navigation
        .update_item(storefront_id, item_id, patch)
        .await?;
    Ok(Json(ApiResponse::success(update.into())))
}

/// DELETE /api/v1/storefronts/{storefront_id}/menu/items/{item_id}
pub async fn delete_item(
    State(state): State<AppState>,
    ApiPath((storefront_id, item_id)): ApiPath<(Uuid, Uuid)>,
) -> MenuResult<MenuUpdateResponse> {
    let update = state.navigation.delete_item(storefront_id, item_id).await?;
    Ok(Json(ApiResponse::success(update.into())))
}

/// POST /api/v1/storefronts/{storefront_id}/menu/items/{item_id}/move
pub async fn move_item(
    State(state): State<AppState>,
    ApiPath((storefront_id, item_id)): ApiPath<(Uuid, Uuid)>,
    ApiJson(payload): ApiJson<MoveItemRequest>,
) -> MenuResult<MenuUpdateResponse> {
    let update = state
        .navigation
        .reparent(storefront_id, item_id, payload.parent_id, payload.position)
        .await?;
    Ok(Json(ApiResponse::success(update.into())))
}

/// POST /api/v1/storefronts/{storefront_id}/menu/items/{item_id}/promote
pub async fn promote_item(
    State(state): State<AppState>,
    ApiPath((storefront_id, item_id)): ApiPath<(Uuid, Uuid)>,
) -> MenuResult<MenuUpdateResponse> {
    let update = state.navigation.promote(storefront_id, item_id).await?;
    Ok(Json(ApiResponse::success(update.into())))
}

/// POST /api/v1/storefronts/{storefront_id}/menu/reorder
pub async fn reorder_items(
    State(state): State<AppState>,
    ApiPath(storefront_id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<ReorderRequest>,
) -> MenuResult<MenuUpdateResponse> {
    payload.validate()?;
    let update = state
        .navigation
        .reorder(storefront_id, payload.item_ids)
        .await?;
    Ok(Json(ApiResponse::success(update.into())))
}

/// PUT /api/v1/storefronts/{storefront_id}/menu/structure
pub async fn set_structure(
    State(state): State<AppState>,
    ApiPath(storefront_id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<StructureRequest>,
) -> MenuResult<MenuUpdateResponse> {
    let update = state
        .navigation
        .apply_structure(storefront_id, payload.entries, payload.expected_revision)
        .await?;
    Ok(Json(ApiResponse::success(update.into())))
}

use std::sync::Arc;

use api_ingress::RequestId;
use axum::{
    body::{to_bytes, Body},
    extract::{rejection::PathRejection, Path},
    http::StatusCode,
    Extension, Json,
};
use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

use crate::api::rest::error::ApiError;
use crate::contract::model::User;
use crate::domain::service::Service;
use crate::domain::validation::{is_valid_identifier, is_valid_user_patch, is_valid_user_payload};

/// The `{id}` segment as axum saw it; a segment that is not UTF-8 arrives as `Err`.
type IdSegment = Result<Path<String>, PathRejection>;

/// List every user in stored order.
pub async fn list_users(
    Extension(svc): Extension<Arc<Service>>,
    request_id: RequestId,
) -> Result<Json<Vec<User>>, ApiError> {
    info!(%request_id, "Listing users");
    let users = svc.list_users().await?;
    Ok(Json(users))
}

/// Get a specific user by ID
pub async fn get_user(
    Extension(svc): Extension<Arc<Service>>,
    request_id: RequestId,
    segment: IdSegment,
) -> Result<Json<User>, ApiError> {
    let (id, uuid) = parse_id(segment)?;
    info!(%request_id, "Getting user with id: {}", id);

    svc.get_user(uuid)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound { id })
}

/// Create a new user from the request body. An `id` segment in the path, if any, is ignored.
pub async fn create_user(
    Extension(svc): Extension<Arc<Service>>,
    request_id: RequestId,
    body: Body,
) -> Result<(StatusCode, Json<User>), ApiError> {
    info!(%request_id, "Creating user");
    let payload = read_json(body).await?;

    if !is_valid_user_payload(&payload) {
        return Err(ApiError::InvalidPayload);
    }
    let Value::Object(fields) = payload else {
        return Err(ApiError::InvalidPayload);
    };

    let user = svc.create_user(fields).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Merge the request body onto an existing user
pub async fn update_user(
    Extension(svc): Extension<Arc<Service>>,
    request_id: RequestId,
    segment: IdSegment,
    body: Body,
) -> Result<Json<User>, ApiError> {
    let (id, uuid) = parse_id(segment)?;
    info!(%request_id, "Updating user {}", id);
    let payload = read_json(body).await?;

    if !is_valid_user_patch(&payload) {
        return Err(ApiError::InvalidPayload);
    }
    let Value::Object(patch) = payload else {
        return Err(ApiError::InvalidPayload);
    };

    svc.update_user(uuid, patch)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound { id })
}

/// Delete a user by ID
pub async fn delete_user(
    Extension(svc): Extension<Arc<Service>>,
    request_id: RequestId,
    segment: IdSegment,
) -> Result<StatusCode, ApiError> {
    let (id, uuid) = parse_id(segment)?;
    info!(%request_id, "Deleting user: {}", id);

    match svc.delete_user(uuid).await? {
        Some(_) => Ok(StatusCode::NO_CONTENT),
        None => Err(ApiError::DeleteTargetMissing { id }),
    }
}

/// PUT or DELETE on the collection itself: there is no record to address.
pub async fn missing_id(request_id: RequestId) -> ApiError {
    debug!(%request_id, "Record operation without an id");
    ApiError::InvalidId
}

/// Hex digits compare case-insensitively, so `ABC…` and `abc…` address the same record.
fn parse_id(segment: IdSegment) -> Result<(String, Uuid), ApiError> {
    let Path(raw) = segment.map_err(|rejection| {
        debug!(%rejection, "Undecodable id segment");
        ApiError::InvalidId
    })?;
    if !is_valid_identifier(&raw) {
        return Err(ApiError::InvalidId);
    }
    let uuid = Uuid::parse_str(&raw).map_err(|_| ApiError::InvalidId)?;
    Ok((raw, uuid))
}

/// Buffer the whole body, then parse it as JSON.
async fn read_json(body: Body) -> Result<Value, ApiError> {
    let bytes = to_bytes(body, usize::MAX).await.map_err(ApiError::Stream)?;
    serde_json::from_slice(&bytes).map_err(ApiError::Parse)
}

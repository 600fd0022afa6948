use crate::dto::order_status_dto::OrderStatus;
use crate::dto::queue_dto::{ApproveReq, CreatedRes, RejectReq, SubmissionReq};
use crate::dto::status_dto::StatusSnapshot;
use crate::error::api_error::ApiError;
use crate::error::request_error::{OptionalRequest, ValidatedRequest};
use crate::model::queue::QueueRecord;
use crate::response::api_response::ApiSuccessResponse;
use crate::state::queue_state::QueueState;
use axum::{
    extract::{Path, State},
    Json,
};
use axum_macros::debug_handler;
use chrono::Utc;

// 提交投稿
#[debug_handler]
pub async fn submit(
    State(state): State<QueueState>,
    ValidatedRequest(payload): ValidatedRequest<SubmissionReq>,
) -> Result<Json<ApiSuccessResponse<CreatedRes>>, ApiError> {
    let record = state.intake_service.submit(payload, Utc::now()).await?;
    Ok(Json(ApiSuccessResponse::send(CreatedRes { id: record.id })))
}

pub async fn list_queue(
    State(state): State<QueueState>,
) -> Result<Json<ApiSuccessResponse<Vec<QueueRecord>>>, ApiError> {
    let records = state.status_service.queue().await?;
    Ok(Json(ApiSuccessResponse::send(records)))
}

pub async fn approve(
    State(state): State<QueueState>,
    Path(id): Path<String>,
    OptionalRequest(payload): OptionalRequest<ApproveReq>,
) -> Result<Json<ApiSuccessResponse<QueueRecord>>, ApiError> {
    let dims = payload.unwrap_or_default().into();
    let record = state
        .moderation_service
        .approve(&id, dims, Utc::now())
        .await?;
    Ok(Json(ApiSuccessResponse::send(record)))
}

pub async fn reject(
    State(state): State<QueueState>,
    Path(id): Path<String>,
    OptionalRequest(payload): OptionalRequest<RejectReq>,
) -> Result<Json<ApiSuccessResponse<()>>, ApiError> {
    let RejectReq { decided_by, reason } = payload.unwrap_or_default();
    state
        .moderation_service
        .reject(&id, decided_by, reason, Utc::now())
        .await?;
    Ok(Json(ApiSuccessResponse::ack("rejected")))
}

// 显示端开始播放
pub async fn mark_playing(
    State(state): State<QueueState>,
    Path(id): Path<String>,
) -> Result<Json<ApiSuccessResponse<QueueRecord>>, ApiError> {
    let record = state.playback_service.mark_playing(&id, Utc::now()).await?;
    Ok(Json(ApiSuccessResponse::send(record)))
}

// 播放结束或跳过当前
pub async fn complete(
    State(state): State<QueueState>,
    Path(id): Path<String>,
) -> Result<Json<ApiSuccessResponse<()>>, ApiError> {
    state
        .playback_service
        .complete(&id, None, Utc::now())
        .await?;
    Ok(Json(ApiSuccessResponse::ack("completed")))
}

pub async fn order_status(
    State(state): State<QueueState>,
    Path(id): Path<String>,
) -> Result<Json<ApiSuccessResponse<OrderStatus>>, ApiError> {
    let status = state.playback_service.order_status(&id, Utc::now()).await?;
    Ok(Json(ApiSuccessResponse::send(status)))
}

pub async fn status(
    State(state): State<QueueState>,
) -> Result<Json<ApiSuccessResponse<StatusSnapshot>>, ApiError> {
    let snapshot = state.status_service.snapshot().await?;
    Ok(Json(ApiSuccessResponse::send(snapshot)))
}

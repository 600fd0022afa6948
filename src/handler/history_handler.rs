use crate::dto::queue_dto::{CreatedRes, DeletedRes};
use crate::error::api_error::ApiError;
use crate::model::history::HistoryRecord;
use crate::response::api_response::ApiSuccessResponse;
use crate::state::history_state::HistoryState;
use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;

pub async fn list_history(
    State(state): State<HistoryState>,
) -> Result<Json<ApiSuccessResponse<Vec<HistoryRecord>>>, ApiError> {
    let records = state.history_service.list().await?;
    Ok(Json(ApiSuccessResponse::send(records)))
}

pub async fn delete_history(
    State(state): State<HistoryState>,
    Path(id): Path<String>,
) -> Result<Json<ApiSuccessResponse<()>>, ApiError> {
    state.history_service.delete(&id).await?;
    Ok(Json(ApiSuccessResponse::ack("deleted")))
}

// 清空全部历史
pub async fn delete_all_history(
    State(state): State<HistoryState>,
) -> Result<Json<ApiSuccessResponse<DeletedRes>>, ApiError> {
    let deleted = state.history_service.delete_all().await?;
    Ok(Json(ApiSuccessResponse::send(DeletedRes { deleted })))
}

pub async fn restore_history(
    State(state): State<HistoryState>,
    Path(id): Path<String>,
) -> Result<Json<ApiSuccessResponse<CreatedRes>>, ApiError> {
    let record = state.history_service.restore(&id, Utc::now()).await?;
    Ok(Json(ApiSuccessResponse::send(CreatedRes { id: record.id })))
}

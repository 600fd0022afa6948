use crate::dto::rank_dto::{RankBoard, TopQuery};
use crate::error::{api_error::ApiError, request_error::RequestError};
use crate::response::api_response::ApiSuccessResponse;
use crate::service::rank_service::DEFAULT_TOP_LIMIT;
use crate::state::rank_state::RankState;
use axum::{
    extract::{Query, State},
    Json,
};
use validator::Validate;

pub async fn get_rankings(
    State(state): State<RankState>,
    Query(query): Query<TopQuery>,
) -> Result<Json<ApiSuccessResponse<RankBoard>>, ApiError> {
    query.validate().map_err(RequestError::from)?;
    let board = state
        .rank_service
        .top(query.limit.unwrap_or(DEFAULT_TOP_LIMIT))
        .await?;
    Ok(Json(ApiSuccessResponse::send(board)))
}

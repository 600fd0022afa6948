use crate::{handler::rank_handler, state::rank_state::RankState};
use axum::{routing::get, Router};

pub fn routes() -> Router<RankState> {
    let router = Router::new().route("/rankings", get(rank_handler::get_rankings));
    return router;
}

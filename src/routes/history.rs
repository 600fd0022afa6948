use crate::{handler::history_handler, state::history_state::HistoryState};
use axum::{
    routing::{delete, get, post},
    Router,
};

pub fn routes() -> Router<HistoryState> {
    let router = Router::new()
        .route(
            "/history",
            get(history_handler::list_history).delete(history_handler::delete_all_history),
        )
        .route("/history/:id", delete(history_handler::delete_history))
        .route("/history/:id/restore", post(history_handler::restore_history));
    return router;
}

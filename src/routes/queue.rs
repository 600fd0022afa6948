use crate::{handler::queue_handler, state::queue_state::QueueState};
use axum::{
    routing::{get, post},
    Router,
};

pub fn routes() -> Router<QueueState> {
    let router = Router::new()
        .route("/submissions", post(queue_handler::submit))
        .route("/queue", get(queue_handler::list_queue))
        .route("/queue/:id/approve", post(queue_handler::approve))
        .route("/queue/:id/reject", post(queue_handler::reject))
        .route("/queue/:id/playing", post(queue_handler::mark_playing))
        .route("/queue/:id/complete", post(queue_handler::complete))
        .route("/order-status/:id", get(queue_handler::order_status))
        .route("/status", get(queue_handler::status));
    return router;
}

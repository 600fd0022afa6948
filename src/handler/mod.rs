pub mod history_handler;
pub mod queue_handler;
pub mod rank_handler;

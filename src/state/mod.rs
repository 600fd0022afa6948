pub mod history_state;
pub mod queue_state;
pub mod rank_state;
pub mod realtime_state;

pub mod history_repository;
pub mod queue_repository;
pub mod rank_repository;
pub mod setting_repository;

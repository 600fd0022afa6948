pub mod order_status_dto;
pub mod queue_dto;
pub mod rank_dto;
pub mod realtime_dto;
pub mod status_dto;

pub mod api_error;
pub mod db_error;
pub mod error_code;
pub mod queue_error;
pub mod request_error;

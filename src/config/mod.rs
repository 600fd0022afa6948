pub mod display_config;
pub mod parameter;

pub mod history;
pub mod legacy;
pub mod queue;
pub mod ranking;
pub mod setting;

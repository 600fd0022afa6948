pub mod history;
pub mod queue;
pub mod rank;
pub mod root;

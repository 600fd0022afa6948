pub mod clock;
pub mod media;

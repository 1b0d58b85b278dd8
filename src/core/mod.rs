pub mod config;
pub mod point;
pub mod viewport;

pub mod engine;
pub mod sink;

pub mod config;
pub mod export;
pub mod fetch;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod sheets;

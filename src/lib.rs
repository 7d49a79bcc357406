pub mod channel;
pub mod config;
pub mod engine;
pub mod errors;
pub mod host;
pub mod job;
pub mod loader;
pub mod logging;
pub mod output;
pub mod pipeline;
pub mod signal;
pub mod stack_config;
pub mod stage;

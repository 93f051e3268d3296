pub mod config;
pub mod logging;

pub mod catalog;
pub mod control;
pub mod error;
pub mod executor;
pub mod model;
pub mod naming;
pub mod progress;
pub mod quality;
pub mod resume;
pub mod retrieval;
pub mod scheduler;

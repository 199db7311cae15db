// Shared core: configuration, domain model and persistence.

pub mod config;
pub mod db;
pub mod jobs;
pub mod model;

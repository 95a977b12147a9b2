//! Question Image Service
//!
//! Accepts question images over HTTP, compresses large ones to a size budget,
//! stores them in S3 under `questions/<subject>/` and returns the public URL.

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod openapi;
pub mod services;

// Public re-exports
pub use config::Config;
pub use error::{AppError, Result};

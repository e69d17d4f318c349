//! Shared utilities for stockq
//!
//! This crate provides common functionality used across the stockq workspace,
//! namely logging setup and application-level configuration.

pub mod config;
pub mod logging;

pub use config::{AppConfig, LogFormat};
pub use logging::{init_tracing, init_tracing_with};

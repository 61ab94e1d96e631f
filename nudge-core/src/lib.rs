//! # nudge-core
//!
//! Core library for nudge - a behavioral pattern detector and suggestion
//! engine for personal activity streams.
//!
//! This library provides:
//! - Domain types for tracking events, patterns, and suggestions
//! - Pattern detection over sorted event streams (time, sequence,
//!   frequency, location)
//! - Suggestion generation, relevance scoring, and preference filtering
//! - Configuration management
//! - Logging infrastructure
//!
//! ## Architecture
//!
//! Data flows through a pipeline of pure stages:
//! - **Detection:** `analyzer::detect_patterns` turns an event stream into
//!   confidence-scored patterns
//! - **Generation and ranking:** the `engine` module turns patterns into
//!   scored suggestions and filters them against user preferences
//! - **Session state:** `engine::SuggestionSession` holds one user's
//!   preferences, exclusions, and feedback between passes
//!
//! ## Example
//!
//! ```rust,no_run
//! use nudge_core::{analyzer, engine::SuggestionSession, Config};
//!
//! let config = Config::load().expect("failed to load config");
//! let export = nudge_core::ingest::read_events("events.jsonl".as_ref())
//!     .expect("failed to read events");
//!
//! let patterns = analyzer::detect_patterns(&export.events);
//! let mut session = SuggestionSession::new("u-1", config.engine.default_preferences());
//! let visible = session.run(&patterns, chrono::Utc::now());
//! println!("{} suggestions", visible.len());
//! ```

// Re-export commonly used items at the crate root
pub use analyzer::detect_patterns;
pub use config::Config;
pub use error::{Error, Result};
pub use types::*;

// Public modules
pub mod analyzer;
pub mod config;
pub mod engine;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod types;

//! Resume recommender library
//!
//! Parses resumes into structured profiles, scores them against job postings
//! with an explainable weighted model and ranks job catalogs.

pub mod cli;
pub mod config;
pub mod error;
pub mod input;
pub mod matching;
pub mod output;
pub mod processing;

pub use config::Config;
pub use error::{RecommenderError, Result};

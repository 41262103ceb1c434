//! Résumé tailoring library
//!
//! The pipeline keeps identity-bearing fields away from the language model:
//! records are sanitized before any oracle call, edits are applied to the
//! anonymized copy, and the result is merged back onto the original.

pub mod cli;
pub mod config;
pub mod error;
pub mod input;
pub mod llm;
pub mod output;
pub mod processing;

pub use config::Config;
pub use error::{Result, TailorError};

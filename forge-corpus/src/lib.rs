//! forge-corpus library interface
//!
//! Speech corpus curation: classify raw recordings into a canonically named
//! corpus, then draw speaker-balanced, normalized evaluation sets from it.

pub mod build_info;
pub mod config;
pub mod error;
pub mod models;
pub mod rules;
pub mod services;
pub mod workflow;

pub use crate::config::CorpusConfig;
pub use crate::error::{ClassifyError, DecodeError, HashError, OrganizeError, SampleError};

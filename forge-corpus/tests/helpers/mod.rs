//! Test Helper Utilities
//!
//! Shared fixtures for forge-corpus integration tests

#![allow(dead_code)]

pub mod audio_generator;
pub mod corpus_builder;

pub use audio_generator::{generate_test_wav, AudioConfig};
pub use corpus_builder::{add_recording, build_label_dir, canonical_file, corpus_temp_dir};

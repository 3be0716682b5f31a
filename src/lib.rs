//! smol-dev: prompt-to-codebase generation pipeline
//!
//! Turns a natural-language intent into a multi-file codebase in three stages: plan the
//! file list, agree on shared dependencies (names, schemas, symbols), then generate every
//! file concurrently with bounded parallelism, streaming each one to disk. Files that
//! already have content are skipped, so an interrupted run resumes where it stopped.

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod overrides;
pub mod pipeline;
pub mod prompts;
pub mod provider;
pub mod stage;
pub mod types;

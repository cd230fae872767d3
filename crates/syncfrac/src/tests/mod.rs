//! Integration tests for the sweep engine
//!
//! Tests are organized by topic:
//! - `cache_behavior` - Cache durability, corruption handling, and cleanup
//! - `config_files` - Sweep configuration documents
//! - `end_to_end` - Full sweeps through the orchestrator API

mod config_files;

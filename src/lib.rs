//! Config Patch Library
//!
//! Applies declarative `set` / `replace` / `unset` patches to a hierarchical
//! configuration held in a [`store::ConfigStore`].

pub mod batch;
pub mod cli;
pub mod command;
pub mod config;
pub mod error;
pub mod format;
pub mod logging;
pub mod patch;
pub mod reader;
pub mod store;
pub mod value;

pub use batch::{BatchFailure, BatchReport, FailureReason, apply_all};
pub use command::{ParseError, PatchCommand, RawRecord, Scope};
pub use patch::{Operation, PatchError, patch};
pub use reader::{FileReadError, apply_config_file};
pub use store::{ConfigStore, MemoryStore};
pub use value::{ConfigValue, Record, Term};

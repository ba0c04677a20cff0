//! todo - to-do list management library
//!
//! This library provides the core of the todo CLI: an ordered task list with
//! write-through persistence, form validation, attachment staging and the
//! create/edit mode that decides what a submission does.
//!
//! # Core Concepts
//!
//! - **Task**: a to-do item with title, due date, assignee and attachments
//! - **Draft**: raw form values, turned into a task only after validation
//! - **Staging**: the attachment set carried into the next submission
//! - **Edit mode**: `Idle` creates, `Editing(id)` overwrites that task
//!
//! # Module Organization
//!
//! - `app`: Application state and the edit-mode state machine
//! - `cli`: Command-line interface using clap
//! - `clock`: Source of the current date
//! - `config`: Configuration loading from `config.toml`
//! - `error`: Error types and result aliases
//! - `lock`: File locking and atomic writes
//! - `output`: Human and JSON output
//! - `staging`: Attachment staging set
//! - `storage`: Key-value persistence backends
//! - `store`: Task collection with write-through persistence
//! - `task`: Task, draft and attachment records
//! - `validate`: Draft validation

pub mod app;
pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod lock;
pub mod output;
pub mod staging;
pub mod storage;
pub mod store;
pub mod task;
pub mod validate;

pub use error::{Error, Result};

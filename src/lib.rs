//! Flow Ledger - declarative stage flows with a SQLite task and transition ledger
//!
//! This library provides:
//! - Flow definitions loaded from YAML, with single-parent inheritance
//! - Routing queries over a flow (next stage, eligible workers, valid moves)
//! - Database connection, configuration and migrations
//! - Data models and repositories for projects, tasks and the audit log
//! - A task store that routes every status change through the task's flow
//!
//! # Example
//!
//! ```no_run
//! use flowledger::flow::{DirSource, FlowLoader};
//!
//! let loader = FlowLoader::new(DirSource::new("flows"));
//! let flow = loader.load("bugfix").unwrap();
//! let next = flow.transition("in_progress", "coder", true).unwrap();
//! println!("{} -> {:?}", next.to_status, next.eligible_classes);
//! ```

pub mod config;
pub mod db;
pub mod error;
pub mod flow;
pub mod models;
pub mod repo;
pub mod store;

pub use flow::{load_flow, list_flow_names};

//! Core business logic for DeciFrame.
//!
//! This crate contains pure business logic with ZERO web or database
//! dependencies. All domain types, validation rules, status machines, the
//! workflow condition grammar and executor, and report rendering live here.
//!
//! # Modules
//!
//! - `auth` - Roles and password hashing
//! - `code` - Display codes derived from numeric ids
//! - `department` - Hierarchy depth and cycle rules
//! - `lifecycle` - Status machines for problems, cases, projects, epics
//! - `notify` - Delivery preferences and message templating
//! - `report` - Report datasets, summaries, HTML, and PDF artifacts
//! - `search` - Full-text query preparation
//! - `workflow` - Template definitions, conditions, and the step executor

pub mod auth;
pub mod code;
pub mod department;
pub mod lifecycle;
pub mod notify;
pub mod report;
pub mod search;
pub mod workflow;

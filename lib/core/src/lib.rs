//! Core domain types and utilities for the cutlist production tracker.
//!
//! This crate provides the identifier types and error handling foundation
//! shared by the people resource and the server.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{DepartmentId, ParseIdError, PersonId, TaskId};

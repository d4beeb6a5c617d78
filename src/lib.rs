//! Declarative verification of provisioned cloud infrastructure.
//!
//! A suite of [`models::VerificationCase`]s names resources by kind and
//! parameters and lists the field values each resource must have. A run
//! fetches every resource's live descriptor (retrying while the cloud
//! catches up), checks each expectation, and reports every mismatch at once.

pub mod commands;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod models;
pub mod suite;
pub mod verify;

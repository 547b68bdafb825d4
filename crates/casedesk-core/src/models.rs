//! Domain models for casedesk.
//!
//! These are the core types shared across all crates.

pub mod actor;
pub mod appeal;
pub mod appeal_status;
pub mod attachment;
pub mod comment;
pub mod organization;
pub mod representative;
pub mod specialist;
pub mod stop_interval;
pub mod task;
pub mod user;

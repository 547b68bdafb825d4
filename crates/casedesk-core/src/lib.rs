//! casedesk core: domain models, the appeal access policy and the
//! status lifecycle.
//!
//! Everything in this crate is free of I/O. Persistence is described by
//! the traits in [`repository`] and implemented by `casedesk-db`;
//! notification delivery is described by [`notification::NotificationSink`].

pub mod error;
pub mod models;
pub mod notification;
pub mod policy;
pub mod repository;
pub mod transition;

pub use error::{CaseError, CaseResult};

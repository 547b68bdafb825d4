//! casedesk server: configuration, first-start seeding, service assembly
//! and the notification delivery task.

pub mod bootstrap;
pub mod config;
pub mod delivery;
pub mod state;

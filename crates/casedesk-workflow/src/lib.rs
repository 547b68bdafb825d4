//! casedesk workflow: appeal, comment and task orchestration on top of
//! the access policy, the status transition rules, the entity store, local
//! attachment storage and notification sinks. Also hosts directory
//! administration and appeal stop intervals.

pub mod appeal;
pub mod comment;
pub mod config;
pub mod directory;
pub mod error;
pub mod files;
pub mod notify;
pub mod stop_interval;
pub mod storage;
pub mod task;

pub use appeal::AppealService;
pub use comment::{CommentService, CommentWithFiles};
pub use config::WorkflowConfig;
pub use directory::DirectoryService;
pub use error::WorkflowError;
pub use files::{FileDownload, FileUpload};
pub use notify::{ChannelNotificationSink, LogNotificationSink};
pub use stop_interval::StopIntervalService;
pub use storage::LocalFileStorage;
pub use task::TaskService;

//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Together these traits form the
//! entity store the workflows are written against.

use uuid::Uuid;

use chrono::{DateTime, Utc};

use crate::error::CaseResult;
use crate::models::{
    actor::Actor,
    appeal::{Appeal, AppealScope, CreateAppeal},
    appeal_status::{AppealStatus, CreateAppealStatus, UpdateAppealStatus},
    attachment::{Attachment, AttachmentOwner},
    comment::{Comment, CreateComment},
    organization::{CreateOrganization, Organization, UpdateOrganization},
    representative::{CreateRepresentative, Representative, UpdateRepresentative},
    specialist::{CreateSpecialist, Specialist},
    stop_interval::{CreateStopInterval, StopInterval, UpdateStopInterval},
    task::{CreateTask, Task, UpdateTask},
    user::{CreateUser, UpdateUser, User},
};
use crate::transition::StatusCatalog;

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

// ---------------------------------------------------------------------------
// People
// ---------------------------------------------------------------------------

pub trait UserRepository: Send + Sync {
    fn create(&self, input: CreateUser) -> impl Future<Output = CaseResult<User>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = CaseResult<User>> + Send;
    fn get_by_email(&self, email: &str) -> impl Future<Output = CaseResult<User>> + Send;
    fn update(&self, id: Uuid, input: UpdateUser)
    -> impl Future<Output = CaseResult<User>> + Send;
    /// Soft-delete: clears `is_active`.
    fn delete(&self, id: Uuid) -> impl Future<Output = CaseResult<()>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = CaseResult<PaginatedResult<User>>> + Send;
}

pub trait RepresentativeRepository: Send + Sync {
    /// Fails with `Validation` when the main representative is missing or
    /// belongs to another organization.
    fn create(
        &self,
        input: CreateRepresentative,
    ) -> impl Future<Output = CaseResult<Representative>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = CaseResult<Representative>> + Send;
    fn get_by_user_id(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = CaseResult<Option<Representative>>> + Send;
    /// Re-parenting is rejected with `Validation` if it would make the
    /// representative its own ancestor.
    fn update(
        &self,
        id: Uuid,
        input: UpdateRepresentative,
    ) -> impl Future<Output = CaseResult<Representative>> + Send;
    /// Fails with `Conflict` while subordinates exist.
    fn delete(&self, id: Uuid) -> impl Future<Output = CaseResult<()>> + Send;
    fn list_by_organization(
        &self,
        organization_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = CaseResult<PaginatedResult<Representative>>> + Send;
    fn get_subordinates(
        &self,
        main_representative_id: Uuid,
    ) -> impl Future<Output = CaseResult<Vec<Representative>>> + Send;
}

pub trait SpecialistRepository: Send + Sync {
    fn create(&self, input: CreateSpecialist)
    -> impl Future<Output = CaseResult<Specialist>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = CaseResult<Specialist>> + Send;
    fn get_by_user_id(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = CaseResult<Option<Specialist>>> + Send;
    fn add_organization(
        &self,
        id: Uuid,
        organization_id: Uuid,
    ) -> impl Future<Output = CaseResult<Specialist>> + Send;
    fn remove_organization(
        &self,
        id: Uuid,
        organization_id: Uuid,
    ) -> impl Future<Output = CaseResult<Specialist>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = CaseResult<()>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = CaseResult<PaginatedResult<Specialist>>> + Send;
}

/// Resolves the actor context for an authenticated user.
pub trait ActorRepository: Send + Sync {
    /// Role precedence: superuser, representative, specialist, plain user.
    fn load_actor(&self, user_id: Uuid) -> impl Future<Output = CaseResult<Actor>> + Send;
}

// ---------------------------------------------------------------------------
// Organizations
// ---------------------------------------------------------------------------

pub trait OrganizationRepository: Send + Sync {
    fn create(
        &self,
        input: CreateOrganization,
    ) -> impl Future<Output = CaseResult<Organization>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = CaseResult<Organization>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateOrganization,
    ) -> impl Future<Output = CaseResult<Organization>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = CaseResult<()>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = CaseResult<PaginatedResult<Organization>>> + Send;
}

// ---------------------------------------------------------------------------
// Status catalog
// ---------------------------------------------------------------------------

pub trait AppealStatusRepository: Send + Sync {
    /// Names are unique (`AlreadyExists`).
    fn create(
        &self,
        input: CreateAppealStatus,
    ) -> impl Future<Output = CaseResult<AppealStatus>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = CaseResult<AppealStatus>> + Send;
    fn get_by_name(
        &self,
        name: &str,
    ) -> impl Future<Output = CaseResult<Option<AppealStatus>>> + Send;
    /// Flipping `is_final` fails with `Conflict` while appeals use the
    /// status.
    fn update(
        &self,
        id: Uuid,
        input: UpdateAppealStatus,
    ) -> impl Future<Output = CaseResult<AppealStatus>> + Send;
    /// Fails with `Conflict` while appeals or organizations reference it.
    fn delete(&self, id: Uuid) -> impl Future<Output = CaseResult<()>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = CaseResult<PaginatedResult<AppealStatus>>> + Send;
    /// The complete catalog.
    fn catalog(&self) -> impl Future<Output = CaseResult<StatusCatalog>> + Send;
}

// ---------------------------------------------------------------------------
// Appeals and their children
// ---------------------------------------------------------------------------

pub trait AppealRepository: Send + Sync {
    fn create(&self, input: CreateAppeal) -> impl Future<Output = CaseResult<Appeal>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = CaseResult<Appeal>> + Send;
    /// Write the mutable fields (`status_id`, `actual_date`,
    /// `responsible_user_id`, `solving`) in a single atomic statement.
    fn persist(&self, appeal: &Appeal) -> impl Future<Output = CaseResult<Appeal>> + Send;
    /// Delete comment files, comments, appeal files, tasks, stop intervals
    /// and the appeal, in that order, within one transaction.
    fn delete(&self, id: Uuid) -> impl Future<Output = CaseResult<()>> + Send;
    fn list(
        &self,
        scope: AppealScope,
        pagination: Pagination,
    ) -> impl Future<Output = CaseResult<PaginatedResult<Appeal>>> + Send;
}

pub trait CommentRepository: Send + Sync {
    fn create(&self, input: CreateComment) -> impl Future<Output = CaseResult<Comment>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = CaseResult<Comment>> + Send;
    /// Newest first.
    fn list_by_appeal(
        &self,
        appeal_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = CaseResult<PaginatedResult<Comment>>> + Send;
    /// Remove the comment together with its file records.
    fn delete(&self, id: Uuid) -> impl Future<Output = CaseResult<()>> + Send;
}

pub trait TaskRepository: Send + Sync {
    /// `status` must be non-empty; `status` and `gitlab_url` are bounded
    /// (`Validation`).
    fn create(&self, input: CreateTask) -> impl Future<Output = CaseResult<Task>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = CaseResult<Task>> + Send;
    fn update(&self, id: Uuid, input: UpdateTask)
    -> impl Future<Output = CaseResult<Task>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = CaseResult<()>> + Send;
    fn list_by_appeal(
        &self,
        appeal_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = CaseResult<PaginatedResult<Task>>> + Send;
    fn list_by_user(
        &self,
        user_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = CaseResult<PaginatedResult<Task>>> + Send;
}

pub trait StopIntervalRepository: Send + Sync {
    /// Closed intervals must end after they start (`Validation`).
    fn create(
        &self,
        input: CreateStopInterval,
    ) -> impl Future<Output = CaseResult<StopInterval>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = CaseResult<StopInterval>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateStopInterval,
    ) -> impl Future<Output = CaseResult<StopInterval>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = CaseResult<()>> + Send;
    /// Ordered by start.
    fn list_by_appeal(
        &self,
        appeal_id: Uuid,
    ) -> impl Future<Output = CaseResult<Vec<StopInterval>>> + Send;
    /// Intervals of any appeal that cover `at`.
    fn list_active(
        &self,
        at: DateTime<Utc>,
    ) -> impl Future<Output = CaseResult<Vec<StopInterval>>> + Send;
}

pub trait AttachmentRepository: Send + Sync {
    fn create(
        &self,
        owner: AttachmentOwner,
        path: String,
    ) -> impl Future<Output = CaseResult<Attachment>> + Send;
    /// Fails with `NotFound` unless the attachment belongs to `owner`.
    fn get(
        &self,
        owner: AttachmentOwner,
        id: Uuid,
    ) -> impl Future<Output = CaseResult<Attachment>> + Send;
    fn list(
        &self,
        owner: AttachmentOwner,
    ) -> impl Future<Output = CaseResult<Vec<Attachment>>> + Send;
    /// Every attachment of the appeal and of its comments.
    fn list_for_appeal_tree(
        &self,
        appeal_id: Uuid,
    ) -> impl Future<Output = CaseResult<Vec<Attachment>>> + Send;
    fn delete(
        &self,
        owner: AttachmentOwner,
        id: Uuid,
    ) -> impl Future<Output = CaseResult<()>> + Send;
}

//! Task service: follow-up work items attached to an appeal.

use casedesk_core::error::{CaseError, CaseResult};
use casedesk_core::models::actor::Actor;
use casedesk_core::models::appeal::Appeal;
use casedesk_core::models::task::{CreateTask, Task, TaskDraft, UpdateTask};
use casedesk_core::policy::{NOT_ENOUGH_PERMISSIONS, Operation, authorize};
use casedesk_core::repository::{
    AppealRepository, PaginatedResult, Pagination, TaskRepository,
};
use tracing::info;
use uuid::Uuid;

use crate::appeal::ensure_active;

pub const TASK_AUTHOR_ONLY: &str = "only the author may change this task";

/// Anyone who may comment on an appeal may open a task on it. Changing or
/// removing a task is reserved to its author and superusers.
pub struct TaskService<A, T>
where
    A: AppealRepository,
    T: TaskRepository,
{
    appeals: A,
    tasks: T,
}

impl<A, T> TaskService<A, T>
where
    A: AppealRepository,
    T: TaskRepository,
{
    pub fn new(appeals: A, tasks: T) -> Self {
        Self { appeals, tasks }
    }

    pub async fn create(&self, actor: &Actor, appeal_id: Uuid, draft: TaskDraft) -> CaseResult<Task> {
        let appeal = self.parent(actor, appeal_id, Operation::Comment).await?;
        let task = self
            .tasks
            .create(CreateTask {
                appeal_id: appeal.id,
                user_id: actor.user_id,
                gitlab_url: draft.gitlab_url,
                status: draft.status,
                description: draft.description,
            })
            .await?;
        info!(task_id = %task.id, %appeal_id, user_id = %actor.user_id, "Task created");
        Ok(task)
    }

    pub async fn get(&self, actor: &Actor, task_id: Uuid) -> CaseResult<Task> {
        let task = self.tasks.get_by_id(task_id).await?;
        self.parent(actor, task.appeal_id, Operation::Read).await?;
        Ok(task)
    }

    pub async fn list_for_appeal(
        &self,
        actor: &Actor,
        appeal_id: Uuid,
        pagination: Pagination,
    ) -> CaseResult<PaginatedResult<Task>> {
        self.parent(actor, appeal_id, Operation::Read).await?;
        self.tasks.list_by_appeal(appeal_id, pagination).await
    }

    /// Tasks authored by `user_id`; visible to that user and superusers.
    pub async fn list_for_user(
        &self,
        actor: &Actor,
        user_id: Uuid,
        pagination: Pagination,
    ) -> CaseResult<PaginatedResult<Task>> {
        ensure_active(actor)?;
        if actor.user_id != user_id && !actor.is_superuser() {
            return Err(CaseError::denied(NOT_ENOUGH_PERMISSIONS));
        }
        self.tasks.list_by_user(user_id, pagination).await
    }

    pub async fn update(&self, actor: &Actor, task_id: Uuid, changes: UpdateTask) -> CaseResult<Task> {
        let task = self.authored(actor, task_id).await?;
        if changes.is_empty() {
            return Ok(task);
        }
        let task = self.tasks.update(task.id, changes).await?;
        info!(task_id = %task.id, user_id = %actor.user_id, "Task updated");
        Ok(task)
    }

    pub async fn delete(&self, actor: &Actor, task_id: Uuid) -> CaseResult<()> {
        let task = self.authored(actor, task_id).await?;
        self.tasks.delete(task.id).await?;
        info!(%task_id, appeal_id = %task.appeal_id, user_id = %actor.user_id, "Task deleted");
        Ok(())
    }

    async fn authored(&self, actor: &Actor, task_id: Uuid) -> CaseResult<Task> {
        let task = self.get(actor, task_id).await?;
        if task.user_id != actor.user_id && !actor.is_superuser() {
            return Err(CaseError::denied(TASK_AUTHOR_ONLY));
        }
        Ok(task)
    }

    async fn parent(
        &self,
        actor: &Actor,
        appeal_id: Uuid,
        operation: Operation,
    ) -> CaseResult<Appeal> {
        ensure_active(actor)?;
        let appeal = self.appeals.get_by_id(appeal_id).await?;
        authorize(actor, &appeal, operation)?;
        Ok(appeal)
    }
}

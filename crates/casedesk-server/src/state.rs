//! Assembled services shared by the request handlers.

use casedesk_db::repository::{
    SurrealActorRepository, SurrealAppealRepository, SurrealAppealStatusRepository,
    SurrealAttachmentRepository, SurrealCommentRepository, SurrealOrganizationRepository,
    SurrealRepresentativeRepository, SurrealSpecialistRepository, SurrealStopIntervalRepository,
    SurrealTaskRepository,
};
use casedesk_workflow::{
    AppealService, ChannelNotificationSink, CommentService, DirectoryService,
    StopIntervalService, TaskService, WorkflowConfig,
};
use surrealdb::{Connection, Surreal};

use crate::delivery::DeliveryRouter;

pub type Appeals<C> = AppealService<
    SurrealAppealRepository<C>,
    SurrealAppealStatusRepository<C>,
    SurrealAttachmentRepository<C>,
    ChannelNotificationSink,
>;

pub type Comments<C> = CommentService<
    SurrealAppealRepository<C>,
    SurrealCommentRepository<C>,
    SurrealAttachmentRepository<C>,
>;

pub type Tasks<C> = TaskService<SurrealAppealRepository<C>, SurrealTaskRepository<C>>;

pub type StopIntervals<C> =
    StopIntervalService<SurrealAppealRepository<C>, SurrealStopIntervalRepository<C>>;

pub type Directory<C> = DirectoryService<
    SurrealAppealStatusRepository<C>,
    SurrealOrganizationRepository<C>,
    SurrealRepresentativeRepository<C>,
    SurrealSpecialistRepository<C>,
>;

pub type Router<C> = DeliveryRouter<
    SurrealOrganizationRepository<C>,
    SurrealAppealRepository<C>,
    SurrealAppealStatusRepository<C>,
>;

pub struct AppState<C: Connection> {
    pub actors: SurrealActorRepository<C>,
    pub appeals: Appeals<C>,
    pub comments: Comments<C>,
    pub tasks: Tasks<C>,
    pub stop_intervals: StopIntervals<C>,
    pub directory: Directory<C>,
}

impl<C: Connection> AppState<C> {
    pub fn new(db: Surreal<C>, notifier: ChannelNotificationSink, config: WorkflowConfig) -> Self {
        let appeals = AppealService::new(
            SurrealAppealRepository::new(db.clone()),
            SurrealAppealStatusRepository::new(db.clone()),
            SurrealAttachmentRepository::new(db.clone()),
            notifier,
            config.clone(),
        );
        let comments = CommentService::new(
            SurrealAppealRepository::new(db.clone()),
            SurrealCommentRepository::new(db.clone()),
            SurrealAttachmentRepository::new(db.clone()),
            config,
        );
        let tasks = TaskService::new(
            SurrealAppealRepository::new(db.clone()),
            SurrealTaskRepository::new(db.clone()),
        );
        let stop_intervals = StopIntervalService::new(
            SurrealAppealRepository::new(db.clone()),
            SurrealStopIntervalRepository::new(db.clone()),
        );
        let directory = DirectoryService::new(
            SurrealAppealStatusRepository::new(db.clone()),
            SurrealOrganizationRepository::new(db.clone()),
            SurrealRepresentativeRepository::new(db.clone()),
            SurrealSpecialistRepository::new(db.clone()),
        );
        Self {
            actors: SurrealActorRepository::new(db),
            appeals,
            comments,
            tasks,
            stop_intervals,
            directory,
        }
    }
}

/// Router for the delivery task, reading from the same database.
pub fn delivery_router<C: Connection>(db: Surreal<C>) -> Router<C> {
    DeliveryRouter::new(
        SurrealOrganizationRepository::new(db.clone()),
        SurrealAppealRepository::new(db.clone()),
        SurrealAppealStatusRepository::new(db),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use casedesk_core::models::appeal::AppealDraft;
    use casedesk_core::models::appeal_status::CreateAppealStatus;
    use casedesk_core::models::organization::CreateOrganization;
    use casedesk_core::models::representative::CreateRepresentative;
    use casedesk_core::models::user::CreateUser;
    use casedesk_core::notification::NotificationEvent;
    use casedesk_core::repository::{
        ActorRepository, AppealStatusRepository, OrganizationRepository, RepresentativeRepository,
        UserRepository,
    };
    use casedesk_core::error::CaseError;
    use casedesk_core::models::organization::UpdateOrganization;
    use casedesk_core::models::task::TaskDraft;
    use casedesk_db::repository::SurrealUserRepository;
    use surrealdb::engine::local::Mem;

    #[tokio::test]
    async fn created_appeal_reaches_the_delivery_channel() {
        let db = Surreal::new::<Mem>(()).await.unwrap();
        db.use_ns("test").use_db("test").await.unwrap();
        casedesk_db::run_migrations(&db).await.unwrap();

        let uploads = tempfile::tempdir().unwrap();
        let config = WorkflowConfig {
            upload_dir: uploads.path().to_path_buf(),
            ..WorkflowConfig::default()
        };
        SurrealAppealStatusRepository::new(db.clone())
            .create(CreateAppealStatus {
                name: config.initial_status_name.clone(),
                description: None,
                is_final: false,
                color: None,
            })
            .await
            .unwrap();
        let organization = SurrealOrganizationRepository::new(db.clone())
            .create(CreateOrganization {
                name: "Acme".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        let user = SurrealUserRepository::new(db.clone())
            .create(CreateUser {
                email: "rep@acme.test".into(),
                password: "secret-password".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        SurrealRepresentativeRepository::new(db.clone())
            .create(CreateRepresentative {
                user_id: user.id,
                organization_id: organization.id,
                name: "Ann".into(),
                surname: "Lee".into(),
                ..Default::default()
            })
            .await
            .unwrap();

        let (sink, mut rx) = ChannelNotificationSink::channel(4);
        let state = AppState::new(db.clone(), sink, config);
        let actor = state.actors.load_actor(user.id).await.unwrap();
        let appeal = state
            .appeals
            .create(&actor, AppealDraft::default())
            .await
            .unwrap();

        let event = rx.recv().await.unwrap();
        assert_eq!(event.appeal_id(), appeal.id);
        assert!(matches!(event, NotificationEvent::AppealCreated { .. }));

        let route = delivery_router(db).route(&event).await.unwrap();
        assert_eq!(route.organization_id, organization.id);

        let task = state
            .tasks
            .create(
                &actor,
                appeal.id,
                TaskDraft {
                    status: "opened".into(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(task.appeal_id, appeal.id);

        let rename = UpdateOrganization {
            name: Some("Renamed".into()),
            ..Default::default()
        };
        let err = state
            .directory
            .update_organization(&actor, organization.id, rename)
            .await
            .unwrap_err();
        assert!(matches!(err, CaseError::PermissionDenied { .. }));
    }
}

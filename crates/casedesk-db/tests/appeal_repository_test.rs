//! Integration tests for the status catalog, appeal, comment and attachment
//! repositories using in-memory SurrealDB.

use casedesk_core::error::CaseError;
use casedesk_core::models::appeal::{AppealContact, AppealDraft, AppealScope, CreateAppeal};
use casedesk_core::models::appeal_status::{CreateAppealStatus, UpdateAppealStatus};
use casedesk_core::models::attachment::{AttachmentOwner, storage_path};
use casedesk_core::models::comment::CreateComment;
use casedesk_core::models::organization::CreateOrganization;
use casedesk_core::models::stop_interval::{CreateStopInterval, UpdateStopInterval};
use casedesk_core::models::task::{CreateTask, UpdateTask};
use casedesk_core::repository::{
    AppealRepository, AppealStatusRepository, AttachmentRepository, CommentRepository,
    OrganizationRepository, Pagination, StopIntervalRepository, TaskRepository,
};
use casedesk_core::transition::apply_transition;
use casedesk_db::repository::{
    SurrealAppealRepository, SurrealAppealStatusRepository, SurrealAttachmentRepository,
    SurrealCommentRepository, SurrealOrganizationRepository, SurrealStopIntervalRepository,
    SurrealTaskRepository,
};
use chrono::{Duration, Utc};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

async fn setup() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    casedesk_db::run_migrations(&db).await.unwrap();
    db
}

async fn create_status(db: &Surreal<Db>, name: &str, is_final: bool) -> Uuid {
    SurrealAppealStatusRepository::new(db.clone())
        .create(CreateAppealStatus {
            name: name.into(),
            description: None,
            is_final,
            color: None,
        })
        .await
        .unwrap()
        .id
}

fn new_appeal(user_id: Uuid, organization_id: Uuid, status_id: Uuid) -> CreateAppeal {
    CreateAppeal {
        user_id,
        organization_id,
        status_id,
        draft: AppealDraft {
            subject: "Printer is on fire".into(),
            description: "Third floor".into(),
            priority: "high".into(),
            contact: AppealContact {
                name: "Ivan".into(),
                phone: "+7000".into(),
                ..Default::default()
            },
        },
    }
}

// ---------------------------------------------------------------------------
// Status catalog
// ---------------------------------------------------------------------------

#[tokio::test]
async fn status_crud_and_catalog() {
    let db = setup().await;
    let repo = SurrealAppealStatusRepository::new(db);

    let new = repo
        .create(CreateAppealStatus {
            name: "New".into(),
            description: Some("Just arrived".into()),
            is_final: false,
            color: Some("#00ff00".into()),
        })
        .await
        .unwrap();
    assert_eq!(new.color, "#00ff00");

    let done = repo
        .create(CreateAppealStatus {
            name: "Done".into(),
            description: None,
            is_final: true,
            color: None,
        })
        .await
        .unwrap();
    assert_eq!(done.color, "#000000");

    let found = repo.get_by_name("Done").await.unwrap().unwrap();
    assert_eq!(found.id, done.id);
    assert!(repo.get_by_name("Missing").await.unwrap().is_none());

    let catalog = repo.catalog().await.unwrap();
    assert_eq!(catalog.len(), 2);
    assert!(catalog.is_final(done.id));
    assert!(!catalog.is_final(new.id));

    let renamed = repo
        .update(
            new.id,
            UpdateAppealStatus {
                name: Some("Open".into()),
                description: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.name, "Open");
    assert!(renamed.description.is_none());

    let page = repo.list(Pagination::default()).await.unwrap();
    assert_eq!(page.total, 2);
}

#[tokio::test]
async fn status_name_and_color_are_validated() {
    let db = setup().await;
    let repo = SurrealAppealStatusRepository::new(db);

    repo.create(CreateAppealStatus {
        name: "New".into(),
        description: None,
        is_final: false,
        color: None,
    })
    .await
    .unwrap();

    let dup = repo
        .create(CreateAppealStatus {
            name: "New".into(),
            description: None,
            is_final: true,
            color: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(dup, CaseError::AlreadyExists { .. }));

    let bad_color = repo
        .create(CreateAppealStatus {
            name: "Odd".into(),
            description: None,
            is_final: false,
            color: Some("red".into()),
        })
        .await
        .unwrap_err();
    assert!(matches!(bad_color, CaseError::Validation { .. }));
}

#[tokio::test]
async fn status_in_use_cannot_be_deleted() {
    let db = setup().await;
    let status = create_status(&db, "New", false).await;
    let unused = create_status(&db, "Spare", false).await;

    SurrealAppealRepository::new(db.clone())
        .create(new_appeal(Uuid::new_v4(), Uuid::new_v4(), status))
        .await
        .unwrap();

    let repo = SurrealAppealStatusRepository::new(db);
    let err = repo.delete(status).await.unwrap_err();
    assert!(matches!(err, CaseError::Conflict { .. }));

    repo.delete(unused).await.unwrap();
}

#[tokio::test]
async fn final_flag_of_status_in_use_is_frozen() {
    let db = setup().await;
    let status = create_status(&db, "In progress", false).await;
    let unused = create_status(&db, "Spare", false).await;

    SurrealAppealRepository::new(db.clone())
        .create(new_appeal(Uuid::new_v4(), Uuid::new_v4(), status))
        .await
        .unwrap();

    let repo = SurrealAppealStatusRepository::new(db);
    let err = repo
        .update(
            status,
            UpdateAppealStatus {
                is_final: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CaseError::Conflict { .. }));
    assert!(!repo.get_by_id(status).await.unwrap().is_final);

    // Other fields, and a flag that does not change, are still editable.
    let renamed = repo
        .update(
            status,
            UpdateAppealStatus {
                name: Some("Working".into()),
                is_final: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.name, "Working");

    let spare = repo
        .update(
            unused,
            UpdateAppealStatus {
                is_final: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(spare.is_final);
}

#[tokio::test]
async fn completion_status_of_organization_cannot_be_deleted() {
    let db = setup().await;
    let status = create_status(&db, "Closed by client", true).await;

    SurrealOrganizationRepository::new(db.clone())
        .create(CreateOrganization {
            name: "Acme".into(),
            custom_appeal_completion: true,
            custom_appeal_completion_status_id: Some(status),
            ..Default::default()
        })
        .await
        .unwrap();

    let err = SurrealAppealStatusRepository::new(db)
        .delete(status)
        .await
        .unwrap_err();
    assert!(matches!(err, CaseError::Conflict { .. }));
}

// ---------------------------------------------------------------------------
// Appeals
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_and_get_appeal() {
    let db = setup().await;
    let status = create_status(&db, "New", false).await;
    let repo = SurrealAppealRepository::new(db);

    let user = Uuid::new_v4();
    let org = Uuid::new_v4();
    let appeal = repo.create(new_appeal(user, org, status)).await.unwrap();

    assert_eq!(appeal.user_id, user);
    assert_eq!(appeal.organization_id, org);
    assert_eq!(appeal.status_id, status);
    assert_eq!(appeal.contact.name, "Ivan");
    assert!(appeal.actual_date.is_none());
    assert!(appeal.responsible_user_id.is_none());

    let fetched = repo.get_by_id(appeal.id).await.unwrap();
    assert_eq!(fetched, appeal);
}

#[tokio::test]
async fn persist_writes_transition_atomically() {
    let db = setup().await;
    let new = create_status(&db, "New", false).await;
    let done = create_status(&db, "Done", true).await;

    let statuses = SurrealAppealStatusRepository::new(db.clone());
    let repo = SurrealAppealRepository::new(db);
    let appeal = repo
        .create(new_appeal(Uuid::new_v4(), Uuid::new_v4(), new))
        .await
        .unwrap();

    let catalog = statuses.catalog().await.unwrap();
    let outcome = apply_transition(&appeal, done, &catalog, Utc::now()).unwrap();
    let mut next = outcome.appeal;
    next.solving = "Replaced the fuser".into();
    next.responsible_user_id = Some(Uuid::new_v4());

    let stored = repo.persist(&next).await.unwrap();
    assert_eq!(stored.status_id, done);
    assert!(stored.actual_date.is_some());
    assert_eq!(stored.solving, "Replaced the fuser");
    assert_eq!(stored.responsible_user_id, next.responsible_user_id);
    assert_eq!(stored.organization_id, appeal.organization_id);

    // Reopening clears the completion stamp.
    let reopened = apply_transition(&stored, new, &catalog, Utc::now()).unwrap();
    let stored = repo.persist(&reopened.appeal).await.unwrap();
    assert!(stored.actual_date.is_none());
}

#[tokio::test]
async fn persist_missing_appeal_is_not_found() {
    let db = setup().await;
    let status = create_status(&db, "New", false).await;
    let repo = SurrealAppealRepository::new(db);

    let mut ghost = repo
        .create(new_appeal(Uuid::new_v4(), Uuid::new_v4(), status))
        .await
        .unwrap();
    ghost.id = Uuid::new_v4();

    let err = repo.persist(&ghost).await.unwrap_err();
    assert!(matches!(err, CaseError::NotFound { .. }));
}

#[tokio::test]
async fn list_respects_scope() {
    let db = setup().await;
    let status = create_status(&db, "New", false).await;
    let repo = SurrealAppealRepository::new(db);

    let org_a = Uuid::new_v4();
    let org_b = Uuid::new_v4();
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();

    repo.create(new_appeal(alice, org_a, status)).await.unwrap();
    repo.create(new_appeal(alice, org_a, status)).await.unwrap();
    repo.create(new_appeal(bob, org_b, status)).await.unwrap();

    let all = repo
        .list(AppealScope::All, Pagination::default())
        .await
        .unwrap();
    assert_eq!(all.total, 3);
    assert_eq!(all.items.len(), 3);
    // Newest first.
    assert!(all.items[0].created_at >= all.items[2].created_at);

    let org_only = repo
        .list(AppealScope::Organizations(vec![org_b]), Pagination::default())
        .await
        .unwrap();
    assert_eq!(org_only.total, 1);
    assert_eq!(org_only.items[0].user_id, bob);

    let none = repo
        .list(AppealScope::Organizations(vec![]), Pagination::default())
        .await
        .unwrap();
    assert_eq!(none.total, 0);
    assert!(none.items.is_empty());

    let mine = repo
        .list(AppealScope::SubmittedBy(alice), Pagination::default())
        .await
        .unwrap();
    assert_eq!(mine.total, 2);

    let paged = repo
        .list(
            AppealScope::All,
            Pagination {
                offset: 1,
                limit: 1,
            },
        )
        .await
        .unwrap();
    assert_eq!(paged.total, 3);
    assert_eq!(paged.items.len(), 1);
}

#[tokio::test]
async fn delete_removes_children() {
    let db = setup().await;
    let status = create_status(&db, "New", false).await;
    let appeals = SurrealAppealRepository::new(db.clone());
    let comments = SurrealCommentRepository::new(db.clone());
    let attachments = SurrealAttachmentRepository::new(db.clone());

    let appeal = appeals
        .create(new_appeal(Uuid::new_v4(), Uuid::new_v4(), status))
        .await
        .unwrap();
    let other = appeals
        .create(new_appeal(Uuid::new_v4(), Uuid::new_v4(), status))
        .await
        .unwrap();

    let comment = comments
        .create(CreateComment {
            appeal_id: appeal.id,
            user_id: appeal.user_id,
            text: "see attached".into(),
        })
        .await
        .unwrap();
    let owner = AttachmentOwner::Comment(comment.id);
    attachments
        .create(owner, storage_path(owner, "log.txt"))
        .await
        .unwrap();
    let owner = AttachmentOwner::Appeal(appeal.id);
    attachments
        .create(owner, storage_path(owner, "photo.jpg"))
        .await
        .unwrap();
    let kept = AttachmentOwner::Appeal(other.id);
    attachments
        .create(kept, storage_path(kept, "keep.pdf"))
        .await
        .unwrap();

    let tasks = SurrealTaskRepository::new(db.clone());
    let task = tasks
        .create(CreateTask {
            appeal_id: appeal.id,
            user_id: appeal.user_id,
            status: "opened".into(),
            ..Default::default()
        })
        .await
        .unwrap();
    let kept_task = tasks
        .create(CreateTask {
            appeal_id: other.id,
            user_id: other.user_id,
            status: "opened".into(),
            ..Default::default()
        })
        .await
        .unwrap();
    let intervals = SurrealStopIntervalRepository::new(db.clone());
    let interval = intervals
        .create(CreateStopInterval {
            appeal_id: appeal.id,
            start_dt: Utc::now(),
            end_dt: None,
            description: None,
        })
        .await
        .unwrap();

    assert_eq!(
        attachments.list_for_appeal_tree(appeal.id).await.unwrap().len(),
        2
    );

    appeals.delete(appeal.id).await.unwrap();

    assert!(matches!(
        appeals.get_by_id(appeal.id).await.unwrap_err(),
        CaseError::NotFound { .. }
    ));
    assert!(matches!(
        comments.get_by_id(comment.id).await.unwrap_err(),
        CaseError::NotFound { .. }
    ));
    assert!(
        attachments
            .list_for_appeal_tree(appeal.id)
            .await
            .unwrap()
            .is_empty()
    );
    assert!(
        attachments
            .list(AttachmentOwner::Comment(comment.id))
            .await
            .unwrap()
            .is_empty()
    );
    assert!(matches!(
        tasks.get_by_id(task.id).await.unwrap_err(),
        CaseError::NotFound { .. }
    ));
    assert!(matches!(
        intervals.get_by_id(interval.id).await.unwrap_err(),
        CaseError::NotFound { .. }
    ));
    // Unrelated appeals are untouched.
    assert_eq!(attachments.list(kept).await.unwrap().len(), 1);
    tasks.get_by_id(kept_task.id).await.unwrap();
    appeals.get_by_id(other.id).await.unwrap();
}

// ---------------------------------------------------------------------------
// Tasks and stop intervals
// ---------------------------------------------------------------------------

#[tokio::test]
async fn task_crud_and_listing() {
    let db = setup().await;
    let repo = SurrealTaskRepository::new(db);
    let appeal_id = Uuid::new_v4();
    let author = Uuid::new_v4();

    let task = repo
        .create(CreateTask {
            appeal_id,
            user_id: author,
            gitlab_url: "https://gitlab.example.com/ops/issues/7".into(),
            status: "opened".into(),
            description: "Replace toner".into(),
        })
        .await
        .unwrap();
    repo.create(CreateTask {
        appeal_id: Uuid::new_v4(),
        user_id: author,
        status: "opened".into(),
        ..Default::default()
    })
    .await
    .unwrap();

    let err = repo
        .create(CreateTask {
            appeal_id,
            user_id: author,
            status: String::new(),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, CaseError::Validation { .. }));

    let updated = repo
        .update(
            task.id,
            UpdateTask {
                status: Some("closed".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.status, "closed");
    assert_eq!(updated.description, "Replace toner");

    let by_appeal = repo
        .list_by_appeal(appeal_id, Pagination::default())
        .await
        .unwrap();
    assert_eq!(by_appeal.total, 1);
    let by_user = repo.list_by_user(author, Pagination::default()).await.unwrap();
    assert_eq!(by_user.total, 2);

    repo.delete(task.id).await.unwrap();
    assert!(matches!(
        repo.delete(task.id).await.unwrap_err(),
        CaseError::NotFound { .. }
    ));
    assert!(matches!(
        repo.update(task.id, UpdateTask::default()).await.unwrap_err(),
        CaseError::NotFound { .. }
    ));
}

#[tokio::test]
async fn stop_intervals_validate_bounds_and_report_active() {
    let db = setup().await;
    let repo = SurrealStopIntervalRepository::new(db);
    let appeal_id = Uuid::new_v4();
    let now = Utc::now();

    let err = repo
        .create(CreateStopInterval {
            appeal_id,
            start_dt: now,
            end_dt: Some(now - Duration::hours(1)),
            description: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, CaseError::Validation { .. }));

    let past = repo
        .create(CreateStopInterval {
            appeal_id,
            start_dt: now - Duration::days(2),
            end_dt: Some(now - Duration::days(1)),
            description: Some("waiting for vendor".into()),
        })
        .await
        .unwrap();
    let running = repo
        .create(CreateStopInterval {
            appeal_id,
            start_dt: now - Duration::hours(1),
            end_dt: None,
            description: None,
        })
        .await
        .unwrap();

    let all = repo.list_by_appeal(appeal_id).await.unwrap();
    assert_eq!(
        all.iter().map(|i| i.id).collect::<Vec<_>>(),
        vec![past.id, running.id]
    );

    let active = repo.list_active(now).await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, running.id);

    // Closing before the start is rejected; closing after it works.
    let err = repo
        .update(
            running.id,
            UpdateStopInterval {
                end_dt: Some(Some(now - Duration::hours(2))),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CaseError::Validation { .. }));

    let closed = repo
        .update(
            running.id,
            UpdateStopInterval {
                end_dt: Some(Some(now - Duration::minutes(1))),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(closed.end_dt.is_some());
    assert!(repo.list_active(now).await.unwrap().is_empty());

    repo.delete(past.id).await.unwrap();
    assert_eq!(repo.list_by_appeal(appeal_id).await.unwrap().len(), 1);
}

// ---------------------------------------------------------------------------
// Comments and attachments
// ---------------------------------------------------------------------------

#[tokio::test]
async fn comments_are_listed_newest_first() {
    let db = setup().await;
    let repo = SurrealCommentRepository::new(db);
    let appeal_id = Uuid::new_v4();
    let user_id = Uuid::new_v4();

    for text in ["first", "second", "third"] {
        repo.create(CreateComment {
            appeal_id,
            user_id,
            text: text.into(),
        })
        .await
        .unwrap();
    }
    repo.create(CreateComment {
        appeal_id: Uuid::new_v4(),
        user_id,
        text: "elsewhere".into(),
    })
    .await
    .unwrap();

    let page = repo
        .list_by_appeal(appeal_id, Pagination::default())
        .await
        .unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.items[0].text, "third");
    assert_eq!(page.items[2].text, "first");
}

#[tokio::test]
async fn deleting_a_comment_drops_its_file_records() {
    let db = setup().await;
    let comments = SurrealCommentRepository::new(db.clone());
    let attachments = SurrealAttachmentRepository::new(db);

    let comment = comments
        .create(CreateComment {
            appeal_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            text: "draft".into(),
        })
        .await
        .unwrap();
    let owner = AttachmentOwner::Comment(comment.id);
    attachments
        .create(owner, storage_path(owner, "a.txt"))
        .await
        .unwrap();

    comments.delete(comment.id).await.unwrap();

    assert!(matches!(
        comments.get_by_id(comment.id).await.unwrap_err(),
        CaseError::NotFound { .. }
    ));
    assert!(attachments.list(owner).await.unwrap().is_empty());
}

#[tokio::test]
async fn attachment_must_belong_to_owner() {
    let db = setup().await;
    let repo = SurrealAttachmentRepository::new(db);

    let owner = AttachmentOwner::Appeal(Uuid::new_v4());
    let attachment = repo
        .create(owner, storage_path(owner, "report.xlsx"))
        .await
        .unwrap();
    assert_eq!(attachment.owner, owner);
    assert_eq!(attachment.file_name(), "report.xlsx");

    let fetched = repo.get(owner, attachment.id).await.unwrap();
    assert_eq!(fetched.path, attachment.path);

    let stranger = AttachmentOwner::Appeal(Uuid::new_v4());
    let err = repo.get(stranger, attachment.id).await.unwrap_err();
    assert!(matches!(err, CaseError::NotFound { .. }));

    // Same id under the comment table does not exist either.
    let err = repo
        .delete(AttachmentOwner::Comment(owner.id()), attachment.id)
        .await
        .unwrap_err();
    assert!(matches!(err, CaseError::NotFound { .. }));

    repo.delete(owner, attachment.id).await.unwrap();
    assert!(repo.list(owner).await.unwrap().is_empty());
}

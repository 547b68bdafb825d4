//! First-start seeding of the status catalog and the first superuser.

use casedesk_core::error::{CaseError, CaseResult};
use casedesk_core::models::appeal_status::{AppealStatus, CreateAppealStatus};
use casedesk_core::models::user::{CreateUser, User};
use casedesk_core::repository::{AppealStatusRepository, UserRepository};
use casedesk_db::repository::verify_password;
use tracing::{info, warn};

use crate::config::FirstSuperuser;

/// Make sure the status new appeals start in exists.
pub async fn ensure_initial_status<S: AppealStatusRepository>(
    statuses: &S,
    name: &str,
) -> CaseResult<AppealStatus> {
    if let Some(status) = statuses.get_by_name(name).await? {
        return Ok(status);
    }

    let status = statuses
        .create(CreateAppealStatus {
            name: name.to_string(),
            description: Some("Initial status of new appeals".into()),
            is_final: false,
            color: None,
        })
        .await?;
    info!(status_id = %status.id, name, "Seeded initial appeal status");
    Ok(status)
}

/// Create the configured superuser unless a user with that email exists.
///
/// An existing account is left alone; a stale configured password or a
/// missing superuser flag is only reported.
pub async fn ensure_superuser<U: UserRepository>(
    users: &U,
    admin: &FirstSuperuser,
    pepper: Option<&str>,
) -> CaseResult<User> {
    match users.get_by_email(&admin.email).await {
        Ok(user) => {
            if !user.is_superuser {
                warn!(user_id = %user.id, "Configured first superuser has no superuser rights");
            }
            if !credentials_match(&user, &admin.password, pepper)? {
                warn!(user_id = %user.id, "Configured first superuser password differs from the stored one");
            }
            return Ok(user);
        }
        Err(CaseError::NotFound { .. }) => {}
        Err(e) => return Err(e),
    }

    let user = users
        .create(CreateUser {
            email: admin.email.clone(),
            password: admin.password.clone(),
            is_staff: true,
            is_superuser: true,
            ..Default::default()
        })
        .await?;
    info!(user_id = %user.id, email = %user.email, "Seeded first superuser");
    Ok(user)
}

/// Whether `password` is the one stored for `user`.
pub fn credentials_match(user: &User, password: &str, pepper: Option<&str>) -> CaseResult<bool> {
    Ok(verify_password(password, &user.password_hash, pepper)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use casedesk_db::repository::{SurrealAppealStatusRepository, SurrealUserRepository};
    use surrealdb::Surreal;
    use surrealdb::engine::local::{Db, Mem};

    async fn setup() -> Surreal<Db> {
        let db = Surreal::new::<Mem>(()).await.unwrap();
        db.use_ns("test").use_db("test").await.unwrap();
        casedesk_db::run_migrations(&db).await.unwrap();
        db
    }

    #[tokio::test]
    async fn initial_status_is_seeded_once() {
        let db = setup().await;
        let statuses = SurrealAppealStatusRepository::new(db);

        let first = ensure_initial_status(&statuses, "New").await.unwrap();
        let second = ensure_initial_status(&statuses, "New").await.unwrap();

        assert_eq!(first.id, second.id);
        assert!(!first.is_final);
        assert_eq!(statuses.catalog().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn superuser_is_seeded_once() {
        let db = setup().await;
        let users = SurrealUserRepository::new(db);
        let admin = FirstSuperuser {
            email: "root@example.com".into(),
            password: "changeme".into(),
        };

        let first = ensure_superuser(&users, &admin, None).await.unwrap();
        let second = ensure_superuser(&users, &admin, None).await.unwrap();

        assert!(first.is_superuser);
        assert_eq!(first.id, second.id);
        assert!(credentials_match(&first, "changeme", None).unwrap());
    }

    #[tokio::test]
    async fn seeded_password_honours_the_pepper() {
        let db = setup().await;
        let users = SurrealUserRepository::with_pepper(db, "pepper".into());
        let admin = FirstSuperuser {
            email: "root@example.com".into(),
            password: "changeme".into(),
        };

        let user = ensure_superuser(&users, &admin, Some("pepper")).await.unwrap();

        assert!(credentials_match(&user, "changeme", Some("pepper")).unwrap());
        assert!(!credentials_match(&user, "changeme", None).unwrap());
        assert!(!credentials_match(&user, "other", Some("pepper")).unwrap());
    }
}

//! Actor context resolution on top of the people repositories.

use casedesk_core::error::CaseResult;
use casedesk_core::models::actor::Actor;
use casedesk_core::repository::{
    ActorRepository, RepresentativeRepository, SpecialistRepository, UserRepository,
};
use surrealdb::{Connection, Surreal};
use tracing::debug;
use uuid::Uuid;

use super::{SurrealRepresentativeRepository, SurrealSpecialistRepository, SurrealUserRepository};

/// Loads an [`Actor`] by classifying the user exactly once.
#[derive(Clone)]
pub struct SurrealActorRepository<C: Connection> {
    users: SurrealUserRepository<C>,
    representatives: SurrealRepresentativeRepository<C>,
    specialists: SurrealSpecialistRepository<C>,
}

impl<C: Connection> SurrealActorRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self {
            users: SurrealUserRepository::new(db.clone()),
            representatives: SurrealRepresentativeRepository::new(db.clone()),
            specialists: SurrealSpecialistRepository::new(db),
        }
    }
}

impl<C: Connection> ActorRepository for SurrealActorRepository<C> {
    async fn load_actor(&self, user_id: Uuid) -> CaseResult<Actor> {
        let user = self.users.get_by_id(user_id).await?;

        let mut actor = if user.is_superuser {
            Actor::superuser(user_id)
        } else if let Some(rep) = self.representatives.get_by_user_id(user_id).await? {
            Actor::representative(user_id, rep.id, rep.organization_id)
        } else if let Some(spec) = self.specialists.get_by_user_id(user_id).await? {
            Actor::specialist(user_id, spec.id, spec.organization_ids)
        } else {
            Actor::plain(user_id)
        };
        actor.is_active = user.is_active;

        debug!(%user_id, role = ?actor.role, "Actor context loaded");
        Ok(actor)
    }
}

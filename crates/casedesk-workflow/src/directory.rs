//! Directory administration: the status catalog, organizations,
//! representatives and specialists.
//!
//! Reads are open to any active user. Mutations are reserved to
//! superusers, except that a representative may edit the contact
//! settings of its own organization and its own record.

use casedesk_core::error::CaseResult;
use casedesk_core::models::actor::Actor;
use casedesk_core::models::appeal_status::{
    AppealStatus, CreateAppealStatus, UpdateAppealStatus,
};
use casedesk_core::models::organization::{
    CreateOrganization, Organization, UpdateOrganization,
};
use casedesk_core::models::representative::{
    CreateRepresentative, Representative, UpdateRepresentative,
};
use casedesk_core::models::specialist::{CreateSpecialist, Specialist};
use casedesk_core::policy::{
    authorize_organization_update, authorize_representative_update, require_superuser,
};
use casedesk_core::repository::{
    AppealStatusRepository, OrganizationRepository, PaginatedResult, Pagination,
    RepresentativeRepository, SpecialistRepository,
};
use tracing::info;
use uuid::Uuid;

use crate::appeal::ensure_active;

fn require_admin(actor: &Actor) -> CaseResult<()> {
    ensure_active(actor)?;
    require_superuser(actor)
}

pub struct DirectoryService<S, O, R, P>
where
    S: AppealStatusRepository,
    O: OrganizationRepository,
    R: RepresentativeRepository,
    P: SpecialistRepository,
{
    statuses: S,
    organizations: O,
    representatives: R,
    specialists: P,
}

impl<S, O, R, P> DirectoryService<S, O, R, P>
where
    S: AppealStatusRepository,
    O: OrganizationRepository,
    R: RepresentativeRepository,
    P: SpecialistRepository,
{
    pub fn new(statuses: S, organizations: O, representatives: R, specialists: P) -> Self {
        Self {
            statuses,
            organizations,
            representatives,
            specialists,
        }
    }

    // -- statuses ----------------------------------------------------------

    pub async fn create_status(
        &self,
        actor: &Actor,
        input: CreateAppealStatus,
    ) -> CaseResult<AppealStatus> {
        require_admin(actor)?;
        let status = self.statuses.create(input).await?;
        info!(status_id = %status.id, name = %status.name, by = %actor.user_id, "Appeal status created");
        Ok(status)
    }

    pub async fn update_status(
        &self,
        actor: &Actor,
        id: Uuid,
        input: UpdateAppealStatus,
    ) -> CaseResult<AppealStatus> {
        require_admin(actor)?;
        let status = self.statuses.update(id, input).await?;
        info!(status_id = %id, by = %actor.user_id, "Appeal status updated");
        Ok(status)
    }

    pub async fn delete_status(&self, actor: &Actor, id: Uuid) -> CaseResult<()> {
        require_admin(actor)?;
        self.statuses.delete(id).await?;
        info!(status_id = %id, by = %actor.user_id, "Appeal status deleted");
        Ok(())
    }

    pub async fn list_statuses(
        &self,
        actor: &Actor,
        pagination: Pagination,
    ) -> CaseResult<PaginatedResult<AppealStatus>> {
        ensure_active(actor)?;
        self.statuses.list(pagination).await
    }

    // -- organizations -----------------------------------------------------

    pub async fn create_organization(
        &self,
        actor: &Actor,
        input: CreateOrganization,
    ) -> CaseResult<Organization> {
        require_admin(actor)?;
        let organization = self.organizations.create(input).await?;
        info!(organization_id = %organization.id, by = %actor.user_id, "Organization created");
        Ok(organization)
    }

    pub async fn get_organization(&self, actor: &Actor, id: Uuid) -> CaseResult<Organization> {
        ensure_active(actor)?;
        self.organizations.get_by_id(id).await
    }

    pub async fn update_organization(
        &self,
        actor: &Actor,
        id: Uuid,
        input: UpdateOrganization,
    ) -> CaseResult<Organization> {
        ensure_active(actor)?;
        authorize_organization_update(actor, id, &input)?;
        let organization = self.organizations.update(id, input).await?;
        info!(organization_id = %id, by = %actor.user_id, "Organization updated");
        Ok(organization)
    }

    pub async fn delete_organization(&self, actor: &Actor, id: Uuid) -> CaseResult<()> {
        require_admin(actor)?;
        self.organizations.delete(id).await?;
        info!(organization_id = %id, by = %actor.user_id, "Organization deleted");
        Ok(())
    }

    pub async fn list_organizations(
        &self,
        actor: &Actor,
        pagination: Pagination,
    ) -> CaseResult<PaginatedResult<Organization>> {
        ensure_active(actor)?;
        self.organizations.list(pagination).await
    }

    // -- representatives ---------------------------------------------------

    pub async fn create_representative(
        &self,
        actor: &Actor,
        input: CreateRepresentative,
    ) -> CaseResult<Representative> {
        require_admin(actor)?;
        let representative = self.representatives.create(input).await?;
        info!(
            representative_id = %representative.id,
            organization_id = %representative.organization_id,
            by = %actor.user_id,
            "Representative created"
        );
        Ok(representative)
    }

    pub async fn get_representative(
        &self,
        actor: &Actor,
        id: Uuid,
    ) -> CaseResult<Representative> {
        ensure_active(actor)?;
        self.representatives.get_by_id(id).await
    }

    pub async fn update_representative(
        &self,
        actor: &Actor,
        id: Uuid,
        input: UpdateRepresentative,
    ) -> CaseResult<Representative> {
        ensure_active(actor)?;
        authorize_representative_update(actor, id, &input)?;
        let representative = self.representatives.update(id, input).await?;
        info!(representative_id = %id, by = %actor.user_id, "Representative updated");
        Ok(representative)
    }

    pub async fn delete_representative(&self, actor: &Actor, id: Uuid) -> CaseResult<()> {
        require_admin(actor)?;
        self.representatives.delete(id).await?;
        info!(representative_id = %id, by = %actor.user_id, "Representative deleted");
        Ok(())
    }

    pub async fn list_representatives(
        &self,
        actor: &Actor,
        organization_id: Uuid,
        pagination: Pagination,
    ) -> CaseResult<PaginatedResult<Representative>> {
        ensure_active(actor)?;
        self.representatives
            .list_by_organization(organization_id, pagination)
            .await
    }

    // -- specialists -------------------------------------------------------

    pub async fn create_specialist(
        &self,
        actor: &Actor,
        input: CreateSpecialist,
    ) -> CaseResult<Specialist> {
        require_admin(actor)?;
        let specialist = self.specialists.create(input).await?;
        info!(specialist_id = %specialist.id, by = %actor.user_id, "Specialist created");
        Ok(specialist)
    }

    pub async fn get_specialist(&self, actor: &Actor, id: Uuid) -> CaseResult<Specialist> {
        ensure_active(actor)?;
        self.specialists.get_by_id(id).await
    }

    /// Put an organization under the specialist's control.
    pub async fn assign_organization(
        &self,
        actor: &Actor,
        specialist_id: Uuid,
        organization_id: Uuid,
    ) -> CaseResult<Specialist> {
        require_admin(actor)?;
        let specialist = self
            .specialists
            .add_organization(specialist_id, organization_id)
            .await?;
        info!(%specialist_id, %organization_id, by = %actor.user_id, "Organization assigned to specialist");
        Ok(specialist)
    }

    pub async fn unassign_organization(
        &self,
        actor: &Actor,
        specialist_id: Uuid,
        organization_id: Uuid,
    ) -> CaseResult<Specialist> {
        require_admin(actor)?;
        let specialist = self
            .specialists
            .remove_organization(specialist_id, organization_id)
            .await?;
        info!(%specialist_id, %organization_id, by = %actor.user_id, "Organization unassigned from specialist");
        Ok(specialist)
    }

    pub async fn delete_specialist(&self, actor: &Actor, id: Uuid) -> CaseResult<()> {
        require_admin(actor)?;
        self.specialists.delete(id).await?;
        info!(specialist_id = %id, by = %actor.user_id, "Specialist deleted");
        Ok(())
    }

    pub async fn list_specialists(
        &self,
        actor: &Actor,
        pagination: Pagination,
    ) -> CaseResult<PaginatedResult<Specialist>> {
        ensure_active(actor)?;
        self.specialists.list(pagination).await
    }
}

//! Notification delivery task.
//!
//! Drains the intent channel and resolves where each intent should go
//! from the organization's notification settings. Actual chat and mail
//! transports are outside this service; routed intents are logged.

use casedesk_core::error::CaseResult;
use casedesk_core::notification::NotificationEvent;
use casedesk_core::repository::{AppealRepository, AppealStatusRepository, OrganizationRepository};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Where a single intent is delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub appeal_id: Uuid,
    pub kind: &'static str,
    pub organization_id: Uuid,
    /// Internal chat, if the organization has one and wants messages there.
    pub chat_id: Option<String>,
    pub call_specialists: bool,
    /// Name of the new status for status changes.
    pub status: Option<String>,
}

pub struct DeliveryRouter<O, A, S>
where
    O: OrganizationRepository,
    A: AppealRepository,
    S: AppealStatusRepository,
{
    organizations: O,
    appeals: A,
    statuses: S,
}

impl<O, A, S> DeliveryRouter<O, A, S>
where
    O: OrganizationRepository,
    A: AppealRepository,
    S: AppealStatusRepository,
{
    pub fn new(organizations: O, appeals: A, statuses: S) -> Self {
        Self {
            organizations,
            appeals,
            statuses,
        }
    }

    pub async fn route(&self, event: &NotificationEvent) -> CaseResult<Route> {
        let (organization_id, status) = match event {
            NotificationEvent::AppealCreated {
                organization_id, ..
            } => (*organization_id, None),
            NotificationEvent::StatusChanged(change) => {
                let appeal = self.appeals.get_by_id(change.appeal_id).await?;
                let status = self.statuses.get_by_id(change.new_status_id).await?;
                (appeal.organization_id, Some(status.name))
            }
        };

        let organization = self.organizations.get_by_id(organization_id).await?;
        let chat_id = organization
            .telegram_chat_id
            .filter(|_| organization.send_notifications_to_internal_chat);

        Ok(Route {
            appeal_id: event.appeal_id(),
            kind: event.kind(),
            organization_id,
            chat_id,
            call_specialists: organization.call_internal_specialists,
            status,
        })
    }

    /// Run until every sender is dropped.
    pub async fn run(self, mut rx: mpsc::Receiver<NotificationEvent>) {
        while let Some(event) = rx.recv().await {
            match self.route(&event).await {
                Ok(route) => info!(
                    kind = route.kind,
                    appeal_id = %route.appeal_id,
                    organization_id = %route.organization_id,
                    chat_id = route.chat_id.as_deref(),
                    call_specialists = route.call_specialists,
                    status = route.status.as_deref(),
                    "Notification routed"
                ),
                Err(e) => warn!(
                    kind = event.kind(),
                    appeal_id = %event.appeal_id(),
                    error = %e,
                    "Notification dropped"
                ),
            }
        }
        info!("Notification channel closed");
    }
}

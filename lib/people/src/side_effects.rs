//! Effects that follow a committed person mutation.
//!
//! Cache, index and event effects are post-commit and best effort: each is
//! idempotent, a failure is logged and the request still succeeds. Token
//! issuance is the exception because the token is part of the response.

use crate::changes::PersonChanges;
use crate::error::PersonError;
use crate::field::PersonField;
use crate::person::Person;
use crate::ports::{
    DepartmentDirectory, EventPublisher, PersonCache, PersonEvent, PersonEventKind, PersonIndex,
    TokenIssuer,
};
use cutlist_core::{DepartmentId, PersonId, Result};
use cutlist_platform_access::Caller;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Extra data produced by the post-update effects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateOutcome {
    /// Department ids of the person after the update.
    pub departments: Vec<DepartmentId>,
    /// Access token minted because the expiration date changed.
    pub access_token: Option<String>,
}

/// Runs the side effects of person mutations.
#[derive(Clone)]
pub struct SideEffectCoordinator {
    departments: Arc<dyn DepartmentDirectory>,
    cache: Arc<dyn PersonCache>,
    index: Arc<dyn PersonIndex>,
    tokens: Arc<dyn TokenIssuer>,
    events: Arc<dyn EventPublisher>,
}

impl SideEffectCoordinator {
    /// Creates a coordinator over the given collaborators.
    #[must_use]
    pub fn new(
        departments: Arc<dyn DepartmentDirectory>,
        cache: Arc<dyn PersonCache>,
        index: Arc<dyn PersonIndex>,
        tokens: Arc<dyn TokenIssuer>,
        events: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            departments,
            cache,
            index,
            tokens,
            events,
        }
    }

    /// Resolves requested department ids into existing departments.
    ///
    /// # Errors
    ///
    /// `DepartmentNotFound` for a malformed or unknown id, `Database` if the
    /// directory cannot be queried.
    pub async fn resolve_departments(
        &self,
        person_id: PersonId,
        raw_ids: &[String],
    ) -> Result<BTreeSet<DepartmentId>, PersonError> {
        let mut resolved = BTreeSet::new();
        for raw in raw_ids {
            let not_found = || PersonError::DepartmentNotFound { id: raw.clone() };
            let id: DepartmentId = raw.parse().map_err(|_| not_found())?;
            let department = self
                .departments
                .find_department(id)
                .await
                .map_err(|report| PersonError::from_store(report, person_id))?;
            match department {
                Some(department) => {
                    resolved.insert(department.id);
                }
                None => return Err(not_found().into()),
            }
        }
        Ok(resolved)
    }

    /// Runs the effects of a committed update.
    ///
    /// # Errors
    ///
    /// Only token issuance can fail the request.
    pub async fn after_update(
        &self,
        caller: &Caller,
        person: &Person,
        changes: &PersonChanges,
    ) -> Result<UpdateOutcome, PersonError> {
        self.invalidate_cache(person.id).await;
        self.unindex(person.id).await;
        if person.active {
            self.index(person).await;
        }
        self.publish(PersonEvent::new(
            PersonEventKind::Update,
            person.id,
            caller.person_id(),
        ))
        .await;

        let access_token = if changes.contains(PersonField::ExpirationDate) {
            Some(self.issue_token(person).await?)
        } else {
            None
        };

        Ok(UpdateOutcome {
            departments: person.departments.iter().copied().collect(),
            access_token,
        })
    }

    /// Runs the effects of a committed deletion.
    pub async fn after_delete(&self, caller: &Caller, person_id: PersonId) {
        self.unindex(person_id).await;
        self.publish(PersonEvent::new(
            PersonEventKind::Delete,
            person_id,
            caller.person_id(),
        ))
        .await;
        self.invalidate_cache(person_id).await;
    }

    /// Mints an access token scoped to `person`.
    ///
    /// # Errors
    ///
    /// `Database` if the token cannot be stored.
    pub async fn issue_token(&self, person: &Person) -> Result<String, PersonError> {
        let token = self
            .tokens
            .issue_for(person)
            .await
            .map_err(|report| PersonError::from_store(report, person.id))?;
        debug!(person_id = %person.id, expires = ?person.expiration_date, "issued access token");
        Ok(token)
    }

    async fn invalidate_cache(&self, person_id: PersonId) {
        if let Err(error) = self.cache.invalidate(person_id).await {
            warn!(%person_id, %error, "person cache invalidation failed");
        }
    }

    async fn unindex(&self, person_id: PersonId) {
        if let Err(error) = self.index.remove(person_id).await {
            warn!(%person_id, %error, "removing person from search index failed");
        }
    }

    async fn index(&self, person: &Person) {
        if let Err(error) = self.index.add(person).await {
            warn!(person_id = %person.id, %error, "indexing person failed");
        }
    }

    async fn publish(&self, event: PersonEvent) {
        if let Err(error) = self.events.publish(&event).await {
            warn!(
                person_id = %event.person_id,
                event = event.kind.as_str(),
                %error,
                "publishing person event failed"
            );
        }
    }
}

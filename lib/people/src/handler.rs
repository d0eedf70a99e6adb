//! Operations of the person resource.
//!
//! An item request moves through fetch, authorize, validate, mutate, side
//! effects and serialize. Every step returns early on failure; nothing is
//! persisted before validation passes.

use crate::changes::PersonChanges;
use crate::error::PersonError;
use crate::person::{Person, PersonFilter};
use crate::policy::{AuthorizationPolicy, ViewLevel};
use crate::ports::{DeletionCascade, PersonIndex, PersonStore};
use crate::presentation::present;
use crate::side_effects::SideEffectCoordinator;
use cutlist_core::{PersonId, Result};
use cutlist_platform_access::Caller;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Deployment settings consulted by the update flow.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeopleSettings {
    /// Emails of accounts that can never be deactivated.
    pub protected_accounts: Vec<String>,
    /// Maximum number of active non-bot persons. `None` means unlimited.
    pub user_limit: Option<u64>,
}

impl PeopleSettings {
    fn is_protected(&self, email: &str) -> bool {
        self.protected_accounts
            .iter()
            .any(|protected| protected.eq_ignore_ascii_case(email))
    }
}

fn parse_id(raw_id: &str) -> Result<PersonId, PersonError> {
    raw_id.parse().map_err(|_| {
        PersonError::NotFound {
            id: raw_id.to_string(),
        }
        .into()
    })
}

/// Operations on a single person.
#[derive(Clone)]
pub struct PersonItemHandler {
    store: Arc<dyn PersonStore>,
    cascade: Arc<dyn DeletionCascade>,
    effects: SideEffectCoordinator,
    policy: AuthorizationPolicy,
    settings: Arc<PeopleSettings>,
}

impl PersonItemHandler {
    #[must_use]
    pub fn new(
        store: Arc<dyn PersonStore>,
        cascade: Arc<dyn DeletionCascade>,
        effects: SideEffectCoordinator,
        settings: PeopleSettings,
    ) -> Self {
        Self {
            store,
            cascade,
            effects,
            policy: AuthorizationPolicy,
            settings: Arc::new(settings),
        }
    }

    /// Reads a person at the view level the caller is entitled to.
    ///
    /// # Errors
    ///
    /// `NotFound` for a malformed or unknown id, `Database` when the store
    /// fails.
    #[instrument(skip(self), fields(caller = %caller.person_id()))]
    pub async fn get(
        &self,
        caller: &Caller,
        raw_id: &str,
        relations: bool,
    ) -> Result<Map<String, Value>, PersonError> {
        let id = parse_id(raw_id)?;
        let person = self.fetch(id).await?;
        let is_self = caller.is_self(id);
        if !self.policy.can_read_detail(caller, is_self) {
            return Err(PersonError::PermissionDenied {
                reason: format!("cannot read person {id}"),
            }
            .into());
        }

        let mut out = present(&person, self.policy.detail_view(caller, is_self), relations);
        self.policy.strip_protected(&mut out);
        Ok(out)
    }

    /// Applies a partial update and returns the safe view of the result.
    ///
    /// Fields the caller may not write are silently dropped. The response
    /// carries the person's department ids and, when the expiration date
    /// was changed, a fresh `access_token`.
    ///
    /// # Errors
    ///
    /// - `WrongParameter` for a non-object body, a mistyped field or an
    ///   activation beyond the user limit
    /// - `NotFound`, `PermissionDenied`, `DepartmentNotFound`,
    ///   `PersonInProtectedAccounts`, `Database`
    #[instrument(skip(self, body), fields(caller = %caller.person_id()))]
    pub async fn update(
        &self,
        caller: &Caller,
        raw_id: &str,
        body: Value,
    ) -> Result<Map<String, Value>, PersonError> {
        let Value::Object(requested) = body else {
            return Err(PersonError::wrong_parameter("request body must be a JSON object").into());
        };
        let id = parse_id(raw_id)?;
        let mut person = self.fetch(id).await?;
        self.policy
            .check_update(caller, &person)
            .map_err(PersonError::from)?;

        let filtered = self.policy.filter_update_fields(caller, requested);
        if !filtered.dropped.is_empty() {
            debug!(person_id = %id, dropped = ?filtered.dropped, "ignoring fields the caller may not write");
        }
        let changes = PersonChanges::parse(filtered.allowed)?;
        let departments = match &changes.departments {
            Some(raw_ids) => Some(self.effects.resolve_departments(id, raw_ids).await?),
            None => None,
        };

        self.pre_update(&person, &changes).await?;

        changes.clone().apply(&mut person, departments);
        self.store
            .save(&person)
            .await
            .map_err(|report| PersonError::from_store(report, id))?;
        info!(person_id = %id, fields = ?changes.fields().collect::<Vec<_>>(), "person updated");

        let outcome = self.effects.after_update(caller, &person, &changes).await?;

        let mut out = present(&person, ViewLevel::Safe, false);
        self.policy.strip_protected(&mut out);
        out.insert(
            "departments".to_string(),
            Value::Array(
                outcome
                    .departments
                    .iter()
                    .map(|id| Value::String(id.to_string()))
                    .collect(),
            ),
        );
        if let Some(token) = outcome.access_token {
            out.insert("access_token".to_string(), Value::String(token));
        }
        Ok(out)
    }

    /// Deletes a person and everything attached to it.
    ///
    /// # Errors
    ///
    /// - `PermissionDenied` on self-deletion or for non-admins
    /// - `ModelWithRelations` when the person is still referenced and
    ///   `force` is not set
    /// - `NotFound`, `Database`
    #[instrument(skip(self), fields(caller = %caller.person_id()))]
    pub async fn delete(&self, caller: &Caller, raw_id: &str, force: bool) -> Result<(), PersonError> {
        let id = parse_id(raw_id)?;
        let person = self.fetch(id).await?;
        self.policy
            .check_delete(caller, &person)
            .map_err(PersonError::from)?;
        self.pre_delete(&person);

        self.cascade
            .remove_person(id, force)
            .await
            .map_err(|report| PersonError::from_store(report, id))?;
        info!(person_id = %id, email = %person.email, force, "person deleted");

        self.effects.after_delete(caller, id).await;
        Ok(())
    }

    /// Checks an update against the user limit and protected accounts.
    async fn pre_update(&self, person: &Person, changes: &PersonChanges) -> Result<(), PersonError> {
        let activating = !person.active && changes.active == Some(true);
        let stays_human = !person.is_bot && changes.is_bot != Some(true);
        if activating && stays_human {
            if let Some(limit) = self.settings.user_limit {
                let active = self
                    .store
                    .count_active_humans()
                    .await
                    .map_err(|report| PersonError::from_store(report, person.id))?;
                if active >= limit {
                    info!(person_id = %person.id, active, limit, "activation refused at user limit");
                    return Err(PersonError::wrong_parameter("User limit reached.").into());
                }
            }
        }

        if changes.active == Some(false) && self.settings.is_protected(&person.email) {
            return Err(PersonError::PersonInProtectedAccounts {
                email: person.email.clone(),
            }
            .into());
        }
        Ok(())
    }

    fn pre_delete(&self, person: &Person) {
        debug!(person_id = %person.id, "deleting person");
    }

    async fn fetch(&self, id: PersonId) -> Result<Person, PersonError> {
        self.store
            .find(id)
            .await
            .map_err(|report| PersonError::from_store(report, id))?
            .ok_or_else(|| {
                PersonError::NotFound {
                    id: id.to_string(),
                }
                .into()
            })
    }
}

/// Operations on the person collection.
#[derive(Clone)]
pub struct PersonCollectionHandler {
    store: Arc<dyn PersonStore>,
    index: Arc<dyn PersonIndex>,
    policy: AuthorizationPolicy,
}

impl PersonCollectionHandler {
    #[must_use]
    pub fn new(store: Arc<dyn PersonStore>, index: Arc<dyn PersonIndex>) -> Self {
        Self {
            store,
            index,
            policy: AuthorizationPolicy,
        }
    }

    /// Lists persons matching `filter`.
    ///
    /// Admins get the safe view, or the full view with `with_pass_hash`;
    /// everyone else gets the minimal view.
    ///
    /// # Errors
    ///
    /// `Database` when the store fails.
    #[instrument(skip(self), fields(caller = %caller.person_id()))]
    pub async fn list(
        &self,
        caller: &Caller,
        filter: &PersonFilter,
        relations: bool,
        with_pass_hash: bool,
    ) -> Result<Vec<Map<String, Value>>, PersonError> {
        let level = self.policy.list_view(caller, with_pass_hash);
        let persons = self
            .store
            .list(filter)
            .await
            .map_err(PersonError::database)?;
        debug!(count = persons.len(), ?level, "listed persons");
        Ok(persons
            .iter()
            .map(|person| present(person, level, relations))
            .collect())
    }

    /// Persons are created through invitations, never through the resource.
    ///
    /// # Errors
    ///
    /// Always `MethodNotAllowed`.
    pub fn create(&self, caller: &Caller) -> Result<Map<String, Value>, PersonError> {
        debug!(caller = %caller.person_id(), "refusing person creation");
        Err(PersonError::MethodNotAllowed.into())
    }

    /// Searches active persons by name or email.
    ///
    /// # Errors
    ///
    /// `Database` when the index or the store fails.
    #[instrument(skip(self), fields(caller = %caller.person_id()))]
    pub async fn search(
        &self,
        caller: &Caller,
        query: &str,
        limit: usize,
    ) -> Result<Vec<Map<String, Value>>, PersonError> {
        let ids = self
            .index
            .search(query, limit)
            .await
            .map_err(PersonError::database)?;

        let mut results = Vec::with_capacity(ids.len());
        for id in ids {
            let person = self
                .store
                .find(id)
                .await
                .map_err(|report| PersonError::from_store(report, id))?;
            if let Some(person) = person.filter(|person| person.active) {
                results.push(present(&person, ViewLevel::Minimal, false));
            }
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::person::Department;
    use crate::ports::PersonEventKind;
    use crate::testing::{Fixture, IndexOp};
    use crate::StoreError;
    use chrono::NaiveDate;
    use cutlist_core::DepartmentId;
    use cutlist_platform_access::Role;
    use serde_json::json;

    fn settings() -> PeopleSettings {
        PeopleSettings {
            protected_accounts: vec!["admin@example.com".to_string()],
            user_limit: None,
        }
    }

    fn person(first: &str, last: &str, role: Role) -> Person {
        let email = format!("{}.{}@example.com", first, last).to_lowercase();
        let mut person = Person::new(first, last, email);
        person.role = role;
        person
    }

    fn caller_for(person: &Person) -> Caller {
        Caller::new(person.id, person.role)
    }

    fn context(report: &rootcause::Report<PersonError>) -> &PersonError {
        report.current_context()
    }

    #[tokio::test]
    async fn get_returns_safe_view_for_self() {
        let fixture = Fixture::new();
        let mut john = person("John", "Doe", Role::User);
        john.password = Some("hash".to_string());
        john.jti = Some("jti".to_string());
        fixture.add_person(&john);

        let out = fixture
            .item_handler(settings())
            .get(&caller_for(&john), &john.id.to_string(), false)
            .await
            .expect("get");

        assert_eq!(out["email"], "john.doe@example.com");
        assert!(!out.contains_key("password"));
        assert!(!out.contains_key("jti"));
    }

    #[tokio::test]
    async fn get_returns_minimal_view_for_other_regular_user() {
        let fixture = Fixture::new();
        let john = person("John", "Doe", Role::User);
        let jane = person("Jane", "Roe", Role::User);
        fixture.add_person(&john);
        fixture.add_person(&jane);

        let out = fixture
            .item_handler(settings())
            .get(&caller_for(&jane), &john.id.to_string(), true)
            .await
            .expect("get");

        assert!(!out.contains_key("email"));
        assert_eq!(out["full_name"], "John Doe");
        assert!(out.contains_key("departments"));
    }

    #[tokio::test]
    async fn get_unknown_or_malformed_id_is_not_found() {
        let fixture = Fixture::new();
        let admin = person("Ada", "Min", Role::Admin);
        fixture.add_person(&admin);
        let handler = fixture.item_handler(settings());
        let caller = caller_for(&admin);

        let err = handler
            .get(&caller, &PersonId::new().to_string(), false)
            .await
            .expect_err("unknown id");
        assert!(matches!(context(&err), PersonError::NotFound { .. }));

        let err = handler.get(&caller, "42", false).await.expect_err("malformed id");
        assert!(matches!(context(&err), PersonError::NotFound { .. }));
    }

    #[tokio::test]
    async fn get_surfaces_store_errors_as_database() {
        let fixture = Fixture::new();
        fixture.store.fail_with(StoreError::Statement {
            details: "syntax error at or near".to_string(),
        });

        let err = fixture
            .item_handler(settings())
            .get(
                &Caller::new(PersonId::new(), Role::Admin),
                &PersonId::new().to_string(),
                false,
            )
            .await
            .expect_err("store failure");

        assert_eq!(
            context(&err),
            &PersonError::Database {
                details: "syntax error at or near".to_string()
            }
        );
    }

    #[tokio::test]
    async fn non_admin_update_never_touches_admin_fields() {
        let fixture = Fixture::new();
        let john = person("John", "Doe", Role::Client);
        fixture.add_person(&john);

        let body = json!({
            "first_name": "Johnny",
            "role": "admin",
            "departments": [DepartmentId::new().to_string()],
            "active": false,
            "is_bot": true,
            "archived": true,
            "login_failed_attempts": 0,
            "last_login_failed": null,
            "is_generated_from_ldap": true,
            "ldap_uid": "jdoe",
            "last_presence": "2024-01-01",
            "password": "plain",
            "jti": "forged",
            "id": "per_01ARZ3NDEKTSV4RRFFQ69G5FAV",
        });
        let out = fixture
            .item_handler(settings())
            .update(&caller_for(&john), &john.id.to_string(), body)
            .await
            .expect("update");

        let stored = fixture.store.get(john.id).expect("stored");
        assert_eq!(stored.first_name, "Johnny");
        assert_eq!(stored.role, Role::Client);
        assert!(stored.departments.is_empty());
        assert!(stored.active);
        assert!(!stored.is_bot);
        assert!(!stored.archived);
        assert!(!stored.is_generated_from_ldap);
        assert_eq!(stored.ldap_uid, None);
        assert_eq!(stored.last_presence, None);
        assert_eq!(stored.password, None);
        assert_eq!(stored.jti, None);
        assert_eq!(stored.id, john.id);
        assert_eq!(out["role"], "client");
        assert!(!out.contains_key("access_token"));
    }

    #[tokio::test]
    async fn self_update_with_expiration_date_depends_on_person_permission() {
        let fixture = Fixture::new();
        let staff = person("Sam", "Staff", Role::User);
        let vendor = person("Val", "Vendor", Role::Vendor);
        fixture.add_person(&staff);
        fixture.add_person(&vendor);
        let handler = fixture.item_handler(settings());
        let body = json!({"role": "admin", "expiration_date": "2030-01-01"});

        let out = handler
            .update(&caller_for(&staff), &staff.id.to_string(), body.clone())
            .await
            .expect("staff update");
        let stored = fixture.store.get(staff.id).expect("stored");
        assert_eq!(stored.role, Role::User);
        assert_eq!(stored.expiration_date, NaiveDate::from_ymd_opt(2030, 1, 1));
        assert_eq!(out["expiration_date"], "2030-01-01");
        assert!(out["access_token"].as_str().is_some());

        let out = handler
            .update(&caller_for(&vendor), &vendor.id.to_string(), body)
            .await
            .expect("vendor update");
        let stored = fixture.store.get(vendor.id).expect("stored");
        assert_eq!(stored.role, Role::Vendor);
        assert_eq!(stored.expiration_date, None);
        assert!(!out.contains_key("access_token"));

        assert_eq!(fixture.tokens.issued(), vec![staff.id]);
    }

    #[tokio::test]
    async fn admin_update_of_other_person() {
        let fixture = Fixture::new();
        let admin = person("Ada", "Min", Role::Admin);
        let john = person("John", "Doe", Role::User);
        let modeling = Department::new("Modeling", "#ff0000");
        fixture.add_person(&admin);
        fixture.add_person(&john);
        fixture.departments.insert(modeling.clone());

        let out = fixture
            .item_handler(settings())
            .update(
                &caller_for(&admin),
                &john.id.to_string(),
                json!({"role": "supervisor", "departments": [modeling.id.to_string()]}),
            )
            .await
            .expect("update");

        let stored = fixture.store.get(john.id).expect("stored");
        assert_eq!(stored.role, Role::Supervisor);
        assert!(stored.departments.contains(&modeling.id));
        assert_eq!(out["departments"], json!([modeling.id.to_string()]));
        assert!(stored.updated_at >= john.updated_at);
    }

    #[tokio::test]
    async fn non_admin_cannot_update_someone_else() {
        let fixture = Fixture::new();
        let manager = person("Max", "Manager", Role::Manager);
        let john = person("John", "Doe", Role::User);
        fixture.add_person(&manager);
        fixture.add_person(&john);

        let err = fixture
            .item_handler(settings())
            .update(
                &caller_for(&manager),
                &john.id.to_string(),
                json!({"first_name": "X"}),
            )
            .await
            .expect_err("denied");

        assert!(matches!(context(&err), PersonError::PermissionDenied { .. }));
        assert_eq!(fixture.store.saves(), 0);
    }

    #[tokio::test]
    async fn update_rejects_non_object_body_and_mistyped_fields() {
        let fixture = Fixture::new();
        let john = person("John", "Doe", Role::User);
        fixture.add_person(&john);
        let handler = fixture.item_handler(settings());
        let caller = caller_for(&john);

        let err = handler
            .update(&caller, &john.id.to_string(), json!(["first_name"]))
            .await
            .expect_err("array body");
        assert!(matches!(context(&err), PersonError::WrongParameter { .. }));

        let err = handler
            .update(&caller, &john.id.to_string(), json!({"has_avatar": "yes"}))
            .await
            .expect_err("mistyped");
        assert!(context(&err).to_string().contains("has_avatar"));
        assert_eq!(fixture.store.saves(), 0);
    }

    #[tokio::test]
    async fn unknown_department_fails_without_state_change() {
        let fixture = Fixture::new();
        let admin = person("Ada", "Min", Role::Admin);
        let john = person("John", "Doe", Role::User);
        fixture.add_person(&admin);
        fixture.add_person(&john);
        let handler = fixture.item_handler(settings());

        for raw in [DepartmentId::new().to_string(), "not-an-id".to_string()] {
            let err = handler
                .update(
                    &caller_for(&admin),
                    &john.id.to_string(),
                    json!({"departments": [raw]}),
                )
                .await
                .expect_err("unknown department");
            assert!(matches!(context(&err), PersonError::DepartmentNotFound { .. }));
        }
        assert_eq!(fixture.store.saves(), 0);
    }

    #[tokio::test]
    async fn activation_at_user_limit_is_refused() {
        let fixture = Fixture::new();
        let admin = person("Ada", "Min", Role::Admin);
        let mut john = person("John", "Doe", Role::User);
        john.active = false;
        fixture.add_person(&admin);
        fixture.add_person(&john);
        let handler = fixture.item_handler(PeopleSettings {
            user_limit: Some(1),
            ..settings()
        });

        let err = handler
            .update(&caller_for(&admin), &john.id.to_string(), json!({"active": true}))
            .await
            .expect_err("limit reached");

        assert_eq!(
            context(&err),
            &PersonError::WrongParameter {
                message: "User limit reached.".to_string()
            }
        );
        assert_eq!(fixture.store.get(john.id), Some(john.clone()));
        assert!(fixture.cache.invalidated().is_empty());
        assert!(fixture.events.events().is_empty());

        // Bots do not count towards the limit.
        handler
            .update(
                &caller_for(&admin),
                &john.id.to_string(),
                json!({"active": true, "is_bot": true}),
            )
            .await
            .expect("bot activation");
        assert!(fixture.store.get(john.id).is_some_and(|p| p.active && p.is_bot));
    }

    #[tokio::test]
    async fn activation_below_limit_succeeds() {
        let fixture = Fixture::new();
        let admin = person("Ada", "Min", Role::Admin);
        let mut john = person("John", "Doe", Role::User);
        john.active = false;
        fixture.add_person(&admin);
        fixture.add_person(&john);

        fixture
            .item_handler(PeopleSettings {
                user_limit: Some(2),
                ..settings()
            })
            .update(&caller_for(&admin), &john.id.to_string(), json!({"active": true}))
            .await
            .expect("activation");

        assert!(fixture.store.get(john.id).is_some_and(|p| p.active));
        assert!(fixture.index.contains(john.id));
    }

    #[tokio::test]
    async fn deactivating_protected_account_is_refused() {
        let fixture = Fixture::new();
        let admin = person("Ada", "Min", Role::Admin);
        let mut root = person("Root", "Account", Role::Admin);
        root.email = "Admin@example.com".to_string();
        fixture.add_person(&admin);
        fixture.add_person(&root);

        let err = fixture
            .item_handler(settings())
            .update(&caller_for(&admin), &root.id.to_string(), json!({"active": false}))
            .await
            .expect_err("protected");

        assert!(matches!(
            context(&err),
            PersonError::PersonInProtectedAccounts { .. }
        ));
        assert_eq!(fixture.store.get(root.id), Some(root));
        assert_eq!(fixture.store.saves(), 0);
    }

    #[tokio::test]
    async fn update_runs_each_side_effect_once() {
        let fixture = Fixture::new();
        let john = person("John", "Doe", Role::User);
        fixture.add_person(&john);

        fixture
            .item_handler(settings())
            .update(&caller_for(&john), &john.id.to_string(), json!({"locale": "fr_FR"}))
            .await
            .expect("update");

        assert_eq!(fixture.cache.invalidated(), vec![john.id]);
        assert_eq!(
            fixture.index.ops(),
            vec![IndexOp::Remove(john.id), IndexOp::Add(john.id)]
        );
        let events = fixture.events.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, PersonEventKind::Update);
        assert_eq!(events[0].actor_id, john.id);
    }

    #[tokio::test]
    async fn deactivated_person_leaves_the_index() {
        let fixture = Fixture::new();
        let admin = person("Ada", "Min", Role::Admin);
        let john = person("John", "Doe", Role::User);
        fixture.add_person(&admin);
        fixture.add_person(&john);

        fixture
            .item_handler(settings())
            .update(&caller_for(&admin), &john.id.to_string(), json!({"active": false}))
            .await
            .expect("deactivation");

        assert_eq!(fixture.index.ops(), vec![IndexOp::Remove(john.id)]);
        assert!(!fixture.index.contains(john.id));
    }

    #[tokio::test]
    async fn failing_cache_does_not_fail_update() {
        let fixture = Fixture::new();
        let john = person("John", "Doe", Role::User);
        fixture.add_person(&john);
        fixture.cache.fail();

        fixture
            .item_handler(settings())
            .update(&caller_for(&john), &john.id.to_string(), json!({"phone": "555"}))
            .await
            .expect("update");

        assert_eq!(
            fixture.store.get(john.id).and_then(|p| p.phone),
            Some("555".to_string())
        );
    }

    #[tokio::test]
    async fn self_delete_is_denied_for_every_role() {
        for role in Role::ALL {
            let fixture = Fixture::new();
            let me = person("Me", "Myself", role);
            fixture.add_person(&me);

            let err = fixture
                .item_handler(settings())
                .delete(&caller_for(&me), &me.id.to_string(), false)
                .await
                .expect_err("self delete");

            assert!(matches!(context(&err), PersonError::PermissionDenied { .. }));
            assert!(fixture.store.get(me.id).is_some());
        }
    }

    #[tokio::test]
    async fn non_admin_delete_is_denied() {
        let fixture = Fixture::new();
        let manager = person("Max", "Manager", Role::Manager);
        let john = person("John", "Doe", Role::User);
        fixture.add_person(&manager);
        fixture.add_person(&john);

        let err = fixture
            .item_handler(settings())
            .delete(&caller_for(&manager), &john.id.to_string(), true)
            .await
            .expect_err("denied");

        assert!(matches!(context(&err), PersonError::PermissionDenied { .. }));
    }

    #[tokio::test]
    async fn admin_delete_runs_side_effects_once() {
        let fixture = Fixture::new();
        let admin = person("Ada", "Min", Role::Admin);
        let john = person("John", "Doe", Role::User);
        fixture.add_person(&admin);
        fixture.add_person(&john);

        fixture
            .item_handler(settings())
            .delete(&caller_for(&admin), &john.id.to_string(), false)
            .await
            .expect("delete");

        assert!(fixture.store.get(john.id).is_none());
        assert_eq!(fixture.index.ops(), vec![IndexOp::Remove(john.id)]);
        assert_eq!(fixture.cache.invalidated(), vec![john.id]);
        let events = fixture.events.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, PersonEventKind::Delete);
        assert_eq!(events[0].actor_id, admin.id);
    }

    #[tokio::test]
    async fn delete_of_assigned_person_needs_force() {
        let fixture = Fixture::new();
        let admin = person("Ada", "Min", Role::Admin);
        let john = person("John", "Doe", Role::User);
        fixture.add_person(&admin);
        fixture.add_person(&john);
        fixture.cascade.assign_task(john.id);
        let handler = fixture.item_handler(settings());

        let err = handler
            .delete(&caller_for(&admin), &john.id.to_string(), false)
            .await
            .expect_err("blocked");
        assert!(matches!(
            context(&err),
            PersonError::ModelWithRelations { .. }
        ));
        assert!(fixture.store.get(john.id).is_some());
        assert!(fixture.events.events().is_empty());

        handler
            .delete(&caller_for(&admin), &john.id.to_string(), true)
            .await
            .expect("forced delete");
        assert!(fixture.store.get(john.id).is_none());
    }

    #[tokio::test]
    async fn list_view_depends_on_caller_and_flag() {
        let fixture = Fixture::new();
        let admin = person("Ada", "Min", Role::Admin);
        let mut john = person("John", "Doe", Role::User);
        john.password = Some("hash".to_string());
        fixture.add_person(&admin);
        fixture.add_person(&john);
        let handler = fixture.collection_handler();
        let filter = PersonFilter::default();

        let full = handler
            .list(&caller_for(&admin), &filter, false, true)
            .await
            .expect("list");
        assert_eq!(full.len(), 2);
        assert_eq!(full[0]["last_name"], "Doe");
        assert_eq!(full[0]["password"], "hash");

        let minimal = handler
            .list(&caller_for(&john), &filter, false, true)
            .await
            .expect("list");
        assert!(minimal.iter().all(|p| !p.contains_key("password")));
        assert!(minimal.iter().all(|p| !p.contains_key("email")));
    }

    #[tokio::test]
    async fn list_applies_filter_and_pagination() {
        let fixture = Fixture::new();
        let admin = person("Ada", "Min", Role::Admin);
        let mut bot = person("Render", "Bot", Role::User);
        bot.is_bot = true;
        fixture.add_person(&admin);
        fixture.add_person(&bot);
        for name in ["Alpha", "Bravo", "Charlie"] {
            fixture.add_person(&person(name, "Artist", Role::User));
        }
        let handler = fixture.collection_handler();

        let humans = PersonFilter {
            is_bot: Some(false),
            role: Some(Role::User),
            page: Some(2),
            limit: Some(2),
            ..PersonFilter::default()
        };
        let page = handler
            .list(&caller_for(&admin), &humans, false, false)
            .await
            .expect("list");
        assert_eq!(page.len(), 1);
        assert_eq!(page[0]["first_name"], "Charlie");
    }

    #[tokio::test]
    async fn create_is_not_allowed() {
        let fixture = Fixture::new();
        let err = fixture
            .collection_handler()
            .create(&Caller::new(PersonId::new(), Role::Admin))
            .expect_err("405");
        assert_eq!(context(&err), &PersonError::MethodNotAllowed);
    }

    #[tokio::test]
    async fn search_returns_active_matches() {
        let fixture = Fixture::new();
        let john = person("John", "Doe", Role::User);
        let jane = person("Jane", "Doe", Role::User);
        fixture.add_person(&john);
        fixture.add_person(&jane);
        fixture.add_person(&person("Bob", "Smith", Role::User));
        let handler = fixture.collection_handler();
        let caller = caller_for(&john);

        let results = handler.search(&caller, "doe", 10).await.expect("search");
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|p| p["last_name"] == "Doe"));

        let results = handler.search(&caller, "jane DOE", 10).await.expect("search");
        assert_eq!(results.len(), 1);

        assert!(handler.search(&caller, "  ", 10).await.expect("search").is_empty());
    }
}

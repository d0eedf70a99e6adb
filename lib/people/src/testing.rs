//! In-memory implementations of the person ports.
//!
//! Each fake records what was asked of it so tests can assert on side
//! effects. Enabled for this crate's tests and, through the `testing`
//! feature, for downstream crates.

use crate::error::{SideEffectError, StoreError};
use crate::handler::{PeopleSettings, PersonCollectionHandler, PersonItemHandler};
use crate::person::{Department, Person, PersonFilter};
use crate::ports::{
    DeletionCascade, DepartmentDirectory, EventPublisher, PersonCache, PersonEvent, PersonIndex,
    PersonStore, TokenIssuer,
};
use crate::side_effects::SideEffectCoordinator;
use async_trait::async_trait;
use cutlist_core::{DepartmentId, PersonId, Result};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Person records kept in a map.
#[derive(Debug, Default)]
pub struct InMemoryPersonStore {
    persons: Mutex<BTreeMap<PersonId, Person>>,
    failure: Mutex<Option<StoreError>>,
    saves: AtomicUsize,
}

impl InMemoryPersonStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces `person` without counting it as a save.
    pub fn insert(&self, person: Person) {
        lock(&self.persons).insert(person.id, person);
    }

    /// Returns the stored copy of a person.
    #[must_use]
    pub fn get(&self, id: PersonId) -> Option<Person> {
        lock(&self.persons).get(&id).cloned()
    }

    /// Removes a person, returning true if it existed.
    pub fn remove(&self, id: PersonId) -> bool {
        lock(&self.persons).remove(&id).is_some()
    }

    /// Makes every following call fail with `error`.
    pub fn fail_with(&self, error: StoreError) {
        *lock(&self.failure) = Some(error);
    }

    /// Number of successful saves.
    #[must_use]
    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    fn check_failure(&self) -> Result<(), StoreError> {
        match lock(&self.failure).clone() {
            Some(error) => Err(error.into()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl PersonStore for InMemoryPersonStore {
    async fn find(&self, id: PersonId) -> Result<Option<Person>, StoreError> {
        self.check_failure()?;
        Ok(self.get(id))
    }

    async fn list(&self, filter: &PersonFilter) -> Result<Vec<Person>, StoreError> {
        self.check_failure()?;
        let mut persons: Vec<Person> = lock(&self.persons)
            .values()
            .filter(|person| filter.matches(person))
            .cloned()
            .collect();
        persons.sort_by(|a, b| {
            (&a.last_name, &a.first_name).cmp(&(&b.last_name, &b.first_name))
        });
        let offset = usize::try_from(filter.offset()).unwrap_or(usize::MAX);
        let limit = filter
            .limit
            .map_or(usize::MAX, |limit| usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(persons.into_iter().skip(offset).take(limit).collect())
    }

    async fn save(&self, person: &Person) -> Result<(), StoreError> {
        self.check_failure()?;
        self.insert(person.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn count_active_humans(&self) -> Result<u64, StoreError> {
        self.check_failure()?;
        let count = lock(&self.persons)
            .values()
            .filter(|person| person.counts_towards_user_limit())
            .count();
        Ok(count as u64)
    }
}

/// Departments kept in a map.
#[derive(Debug, Default)]
pub struct InMemoryDepartments {
    departments: Mutex<BTreeMap<DepartmentId, Department>>,
}

impl InMemoryDepartments {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a department.
    pub fn insert(&self, department: Department) {
        lock(&self.departments).insert(department.id, department);
    }
}

#[async_trait]
impl DepartmentDirectory for InMemoryDepartments {
    async fn find_department(&self, id: DepartmentId) -> Result<Option<Department>, StoreError> {
        Ok(lock(&self.departments).get(&id).cloned())
    }
}

/// Deletes from an [`InMemoryPersonStore`], guarded by task assignments.
#[derive(Debug)]
pub struct InMemoryCascade {
    store: Arc<InMemoryPersonStore>,
    assignments: Mutex<BTreeMap<PersonId, u64>>,
}

impl InMemoryCascade {
    /// Creates a cascade over `store`.
    #[must_use]
    pub fn new(store: Arc<InMemoryPersonStore>) -> Self {
        Self {
            store,
            assignments: Mutex::new(BTreeMap::new()),
        }
    }

    /// Records a task assignment of `person_id`.
    pub fn assign_task(&self, person_id: PersonId) {
        *lock(&self.assignments).entry(person_id).or_insert(0) += 1;
    }
}

#[async_trait]
impl DeletionCascade for InMemoryCascade {
    async fn remove_person(&self, id: PersonId, force: bool) -> Result<(), StoreError> {
        let mut assignments = lock(&self.assignments);
        let count = assignments.get(&id).copied().unwrap_or(0);
        if count > 0 && !force {
            return Err(StoreError::DeletionBlocked {
                relation: "task assignments".to_string(),
                count,
            }
            .into());
        }
        assignments.remove(&id);
        self.store.remove(id);
        Ok(())
    }
}

/// Cache that records invalidations.
#[derive(Debug, Default)]
pub struct RecordingCache {
    invalidated: Mutex<Vec<PersonId>>,
    failing: AtomicBool,
}

impl RecordingCache {
    /// Ids invalidated so far, in order.
    #[must_use]
    pub fn invalidated(&self) -> Vec<PersonId> {
        lock(&self.invalidated).clone()
    }

    /// Makes every invalidation fail.
    pub fn fail(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl PersonCache for RecordingCache {
    async fn invalidate(&self, id: PersonId) -> Result<(), SideEffectError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(SideEffectError::Cache {
                details: "cache offline".to_string(),
            }
            .into());
        }
        lock(&self.invalidated).push(id);
        Ok(())
    }
}

/// Index operations as recorded by [`RecordingIndex`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexOp {
    Remove(PersonId),
    Add(PersonId),
}

/// Search index that records mutations and matches on lowercase names.
#[derive(Debug, Default)]
pub struct RecordingIndex {
    documents: Mutex<BTreeMap<PersonId, String>>,
    ops: Mutex<Vec<IndexOp>>,
}

impl RecordingIndex {
    /// Mutations so far, in order.
    #[must_use]
    pub fn ops(&self) -> Vec<IndexOp> {
        lock(&self.ops).clone()
    }

    /// Returns true if `id` is currently indexed.
    #[must_use]
    pub fn contains(&self, id: PersonId) -> bool {
        lock(&self.documents).contains_key(&id)
    }

    /// Indexes `person` without recording the operation.
    pub fn seed(&self, person: &Person) {
        lock(&self.documents).insert(person.id, document(person));
    }
}

fn document(person: &Person) -> String {
    format!("{} {}", person.full_name(), person.email).to_lowercase()
}

#[async_trait]
impl PersonIndex for RecordingIndex {
    async fn remove(&self, id: PersonId) -> Result<(), SideEffectError> {
        lock(&self.documents).remove(&id);
        lock(&self.ops).push(IndexOp::Remove(id));
        Ok(())
    }

    async fn add(&self, person: &Person) -> Result<(), SideEffectError> {
        self.seed(person);
        lock(&self.ops).push(IndexOp::Add(person.id));
        Ok(())
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<PersonId>, SideEffectError> {
        let terms: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();
        if terms.is_empty() {
            return Ok(Vec::new());
        }
        Ok(lock(&self.documents)
            .iter()
            .filter(|(_, text)| terms.iter().all(|term| text.contains(term.as_str())))
            .map(|(id, _)| *id)
            .take(limit)
            .collect())
    }
}

/// Token issuer that hands out numbered tokens.
#[derive(Debug, Default)]
pub struct RecordingTokens {
    issued: Mutex<Vec<PersonId>>,
}

impl RecordingTokens {
    /// Persons a token was issued for, in order.
    #[must_use]
    pub fn issued(&self) -> Vec<PersonId> {
        lock(&self.issued).clone()
    }
}

#[async_trait]
impl TokenIssuer for RecordingTokens {
    async fn issue_for(&self, person: &Person) -> Result<String, StoreError> {
        let mut issued = lock(&self.issued);
        issued.push(person.id);
        Ok(format!("token-{}-{}", person.id, issued.len()))
    }
}

/// Publisher that keeps every event.
#[derive(Debug, Default)]
pub struct RecordingEvents {
    events: Mutex<Vec<PersonEvent>>,
}

impl RecordingEvents {
    /// Published events, in order.
    #[must_use]
    pub fn events(&self) -> Vec<PersonEvent> {
        lock(&self.events).clone()
    }
}

#[async_trait]
impl EventPublisher for RecordingEvents {
    async fn publish(&self, event: &PersonEvent) -> Result<(), SideEffectError> {
        lock(&self.events).push(event.clone());
        Ok(())
    }
}

/// Every fake wired together.
#[derive(Clone)]
pub struct Fixture {
    pub store: Arc<InMemoryPersonStore>,
    pub departments: Arc<InMemoryDepartments>,
    pub cascade: Arc<InMemoryCascade>,
    pub cache: Arc<RecordingCache>,
    pub index: Arc<RecordingIndex>,
    pub tokens: Arc<RecordingTokens>,
    pub events: Arc<RecordingEvents>,
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

impl Fixture {
    /// Creates empty fakes.
    #[must_use]
    pub fn new() -> Self {
        let store = Arc::new(InMemoryPersonStore::new());
        Self {
            cascade: Arc::new(InMemoryCascade::new(Arc::clone(&store))),
            store,
            departments: Arc::new(InMemoryDepartments::new()),
            cache: Arc::new(RecordingCache::default()),
            index: Arc::new(RecordingIndex::default()),
            tokens: Arc::new(RecordingTokens::default()),
            events: Arc::new(RecordingEvents::default()),
        }
    }

    /// Stores `person`, indexing it if active.
    pub fn add_person(&self, person: &Person) {
        self.store.insert(person.clone());
        if person.active {
            self.index.seed(person);
        }
    }

    /// Coordinator over the fakes.
    #[must_use]
    pub fn coordinator(&self) -> SideEffectCoordinator {
        SideEffectCoordinator::new(
            self.departments.clone(),
            self.cache.clone(),
            self.index.clone(),
            self.tokens.clone(),
            self.events.clone(),
        )
    }

    /// Item handler over the fakes.
    #[must_use]
    pub fn item_handler(&self, settings: PeopleSettings) -> PersonItemHandler {
        PersonItemHandler::new(
            self.store.clone(),
            self.cascade.clone(),
            self.coordinator(),
            settings,
        )
    }

    /// Collection handler over the fakes.
    #[must_use]
    pub fn collection_handler(&self) -> PersonCollectionHandler {
        PersonCollectionHandler::new(self.store.clone(), self.index.clone())
    }
}

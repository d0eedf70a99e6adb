//! In-process cache of person records.
//!
//! Every authenticated request resolves its caller through this cache, so
//! role and activation changes must invalidate it.

use async_trait::async_trait;
use cutlist_core::{PersonId, Result};
use cutlist_people::{Person, PersonCache, PersonStore, SideEffectError, StoreError};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Read-through cache in front of a [`PersonStore`].
pub struct CachedPersons {
    store: Arc<dyn PersonStore>,
    entries: RwLock<HashMap<PersonId, Person>>,
}

impl CachedPersons {
    /// Creates an empty cache over `store`.
    pub fn new(store: Arc<dyn PersonStore>) -> Self {
        Self {
            store,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the person, loading it from the store on a miss.
    pub async fn get(&self, id: PersonId) -> Result<Option<Person>, StoreError> {
        if let Some(person) = self.entries.read().await.get(&id) {
            return Ok(Some(person.clone()));
        }

        let person = self.store.find(id).await?;
        if let Some(person) = &person {
            self.entries.write().await.insert(id, person.clone());
            debug!(person_id = %id, "cached person");
        }
        Ok(person)
    }
}

#[async_trait]
impl PersonCache for CachedPersons {
    async fn invalidate(&self, id: PersonId) -> Result<(), SideEffectError> {
        self.entries.write().await.remove(&id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cutlist_people::testing::InMemoryPersonStore;

    #[tokio::test]
    async fn serves_stale_entry_until_invalidated() {
        let store = Arc::new(InMemoryPersonStore::new());
        let mut john = Person::new("John", "Doe", "john.doe@example.com");
        store.insert(john.clone());
        let cache = CachedPersons::new(store.clone());

        assert_eq!(cache.get(john.id).await.expect("get"), Some(john.clone()));

        john.active = false;
        store.insert(john.clone());
        assert!(cache.get(john.id).await.expect("get").is_some_and(|p| p.active));

        cache.invalidate(john.id).await.expect("invalidate");
        assert!(cache.get(john.id).await.expect("get").is_some_and(|p| !p.active));
    }

    #[tokio::test]
    async fn missing_person_is_not_cached() {
        let store = Arc::new(InMemoryPersonStore::new());
        let cache = CachedPersons::new(store);
        assert_eq!(cache.get(PersonId::new()).await.expect("get"), None);
        assert!(cache.entries.read().await.is_empty());
    }
}

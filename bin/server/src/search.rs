//! In-process full-text index of active persons.
//!
//! Each person is indexed under the lowercase words of their name, email
//! and desktop login. A query matches a person when every query term is a
//! prefix of one of its words.

use async_trait::async_trait;
use cutlist_core::{PersonId, Result};
use cutlist_people::{Person, PersonIndex, SideEffectError};
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tracing::info;

/// Person index held in memory, rebuilt at startup.
#[derive(Default)]
pub struct PersonSearchIndex {
    documents: RwLock<BTreeMap<PersonId, Vec<String>>>,
}

fn words(person: &Person) -> Vec<String> {
    let mut text = format!("{} {} {}", person.first_name, person.last_name, person.email);
    if let Some(login) = &person.desktop_login {
        text.push(' ');
        text.push_str(login);
    }
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_string)
        .collect()
}

impl PersonSearchIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole index with the active persons among `persons`.
    pub async fn rebuild(&self, persons: &[Person]) {
        let documents: BTreeMap<PersonId, Vec<String>> = persons
            .iter()
            .filter(|person| person.active)
            .map(|person| (person.id, words(person)))
            .collect();
        info!(indexed = documents.len(), "rebuilt person search index");
        *self.documents.write().await = documents;
    }
}

#[async_trait]
impl PersonIndex for PersonSearchIndex {
    async fn remove(&self, id: PersonId) -> Result<(), SideEffectError> {
        self.documents.write().await.remove(&id);
        Ok(())
    }

    async fn add(&self, person: &Person) -> Result<(), SideEffectError> {
        self.documents.write().await.insert(person.id, words(person));
        Ok(())
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<PersonId>, SideEffectError> {
        let terms: Vec<String> = query
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|term| !term.is_empty())
            .map(str::to_string)
            .collect();
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        Ok(self
            .documents
            .read()
            .await
            .iter()
            .filter(|(_, words)| {
                terms
                    .iter()
                    .all(|term| words.iter().any(|word| word.starts_with(term.as_str())))
            })
            .map(|(id, _)| *id)
            .take(limit)
            .collect())
    }
}

//! Publication of person events.
//!
//! Events go to NATS under `<prefix>.person.update` and
//! `<prefix>.person.delete` as JSON. Without a NATS server they are only
//! logged.

use async_trait::async_trait;
use cutlist_core::Result;
use cutlist_people::{EventPublisher, PersonEvent, SideEffectError};
use tracing::{debug, info};

/// Returns the subject an event is published under.
pub fn subject_for(prefix: &str, event: &PersonEvent) -> String {
    format!("{prefix}.{}", event.kind.as_str().replace(':', "."))
}

/// Publishes events to a NATS server.
pub struct NatsEventPublisher {
    client: async_nats::Client,
    subject_prefix: String,
}

impl NatsEventPublisher {
    /// Connects to the NATS server at `url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection fails.
    pub async fn connect(url: &str, subject_prefix: String) -> Result<Self, SideEffectError> {
        let client = async_nats::connect(url)
            .await
            .map_err(|e| SideEffectError::Publish {
                details: format!("failed to connect to {url}: {e}"),
            })?;
        info!(url, "connected to NATS");
        Ok(Self {
            client,
            subject_prefix,
        })
    }
}

#[async_trait]
impl EventPublisher for NatsEventPublisher {
    async fn publish(&self, event: &PersonEvent) -> Result<(), SideEffectError> {
        let subject = subject_for(&self.subject_prefix, event);
        let bytes = serde_json::to_vec(event).map_err(|e| SideEffectError::Publish {
            details: format!("failed to serialize event: {e}"),
        })?;

        self.client
            .publish(subject.clone(), bytes.into())
            .await
            .map_err(|e| SideEffectError::Publish {
                details: e.to_string(),
            })?;

        debug!(%subject, person_id = %event.person_id, "published person event");
        Ok(())
    }
}

/// Writes events to the log instead of a message bus.
#[derive(Debug, Default)]
pub struct LoggingEventPublisher;

#[async_trait]
impl EventPublisher for LoggingEventPublisher {
    async fn publish(&self, event: &PersonEvent) -> Result<(), SideEffectError> {
        info!(
            event = event.kind.as_str(),
            person_id = %event.person_id,
            actor_id = %event.actor_id,
            "person event"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cutlist_core::PersonId;
    use cutlist_people::PersonEventKind;

    #[test]
    fn subjects_use_dots() {
        let event = PersonEvent::new(PersonEventKind::Update, PersonId::new(), PersonId::new());
        assert_eq!(subject_for("cutlist", &event), "cutlist.person.update");
    }

    #[tokio::test]
    async fn logging_publisher_accepts_events() {
        let event = PersonEvent::new(PersonEventKind::Delete, PersonId::new(), PersonId::new());
        LoggingEventPublisher.publish(&event).await.expect("publish");
    }
}

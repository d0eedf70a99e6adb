use cutlist_people::{
    EventPublisher, PersonCollectionHandler, PersonItemHandler, PersonStore,
    SideEffectCoordinator,
};
use cutlist_server::{
    app,
    auth::{AppState, SessionRepository, SessionTokenIssuer},
    cache::CachedPersons,
    config::ServerConfig,
    db::{DepartmentRepository, PersonRepository},
    events::{LoggingEventPublisher, NatsEventPublisher},
    search::PersonSearchIndex,
};
use sqlx::postgres::PgPoolOptions;
use std::error::Error;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment
    let config = ServerConfig::from_env()?;
    tracing::info!("Loaded configuration");

    // Create database connection pool
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;

    // Run migrations
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(&db_pool).await?;

    // Cleanup expired sessions on startup
    let session_repo = SessionRepository::new(db_pool.clone());
    match session_repo.delete_expired().await {
        Ok(count) if count > 0 => {
            tracing::info!(
                deleted_sessions = count,
                "Cleaned up expired sessions on startup"
            );
        }
        Ok(_) => {}
        Err(e) => {
            tracing::warn!(error = %e.current_context(), "Failed to cleanup expired sessions on startup");
        }
    }

    // Spawn periodic session cleanup task
    let cleanup_repo = session_repo.clone();
    let cleanup_interval_secs = config.session.cleanup_interval_seconds;
    tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(std::time::Duration::from_secs(cleanup_interval_secs));
        loop {
            interval.tick().await;
            match cleanup_repo.delete_expired().await {
                Ok(count) if count > 0 => {
                    tracing::debug!(deleted_sessions = count, "Periodic session cleanup");
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(error = %e.current_context(), "Failed to cleanup expired sessions");
                }
            }
        }
    });

    let people = PersonRepository::new(db_pool.clone());
    let store: Arc<dyn PersonStore> = Arc::new(people.clone());
    let persons = Arc::new(CachedPersons::new(store.clone()));

    // Index active persons
    let index = Arc::new(PersonSearchIndex::new());
    match people.active_persons().await {
        Ok(active) => index.rebuild(&active).await,
        Err(e) => {
            tracing::warn!(error = %e.current_context(), "Failed to build person search index");
        }
    }

    let events: Arc<dyn EventPublisher> = match &config.nats.url {
        Some(url) => Arc::new(
            NatsEventPublisher::connect(url, config.nats.subject_prefix.clone())
                .await
                .map_err(|e| e.current_context().to_string())?,
        ),
        None => {
            tracing::info!("No NATS url configured, person events are only logged");
            Arc::new(LoggingEventPublisher)
        }
    };

    let sessions = Arc::new(session_repo);
    let tokens = Arc::new(SessionTokenIssuer::new(
        sessions.clone(),
        chrono::Duration::days(config.session.token_duration_days),
    ));
    let effects = SideEffectCoordinator::new(
        Arc::new(DepartmentRepository::new(db_pool.clone())),
        persons.clone(),
        index.clone(),
        tokens,
        events,
    );
    let items = PersonItemHandler::new(
        store.clone(),
        Arc::new(people),
        effects,
        config.people.into(),
    );
    let collection = PersonCollectionHandler::new(store, index);

    let app_state = Arc::new(AppState::new(items, collection, persons, sessions));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("listening on http://{}", config.bind_addr);

    axum::serve(listener, app(app_state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

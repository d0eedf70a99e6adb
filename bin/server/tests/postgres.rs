//! Repository tests against a live Postgres.
//!
//! Run with `DATABASE_URL=postgres://... cargo test -- --ignored`.

use chrono::{Duration, NaiveDate};
use cutlist_core::PersonId;
use cutlist_people::{
    Department, DeletionCascade, DepartmentDirectory, Person, PersonFilter, PersonStore,
    StoreError,
};
use cutlist_platform_access::{Role, Session, SessionKind};
use cutlist_server::auth::{SessionRepository, SessionStore, generate_session_id};
use cutlist_server::db::{DepartmentRepository, PersonRepository};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

async fn pool() -> PgPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&url)
        .await
        .expect("connect");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("migrate");
    pool
}

fn unique_person(first: &str) -> Person {
    let tag = ulid::Ulid::new().to_string().to_lowercase();
    let mut person = Person::new(first, format!("Test{tag}"), format!("{first}.{tag}@example.com"));
    person.desktop_login = Some(format!("{first}-{tag}").to_lowercase());
    person
}

#[tokio::test]
#[ignore]
async fn save_and_find_round_trip_with_departments() {
    let pool = pool().await;
    let people = PersonRepository::new(pool.clone());
    let departments = DepartmentRepository::new(pool);

    let department = Department::new(format!("Modeling {}", ulid::Ulid::new()), "#00ff00");
    departments.create(&department).await.expect("create department");
    assert_eq!(
        departments
            .find_department(department.id)
            .await
            .expect("find department"),
        Some(department.clone())
    );

    let mut person = unique_person("john");
    person.role = Role::Supervisor;
    person.expiration_date = NaiveDate::from_ymd_opt(2030, 1, 1);
    person.departments.insert(department.id);
    people.save(&person).await.expect("save");

    let stored = people.find(person.id).await.expect("find").expect("stored");
    assert_eq!(stored.role, Role::Supervisor);
    assert_eq!(stored.expiration_date, person.expiration_date);
    assert!(stored.departments.contains(&department.id));

    person.departments.clear();
    person.first_name = "Johnny".to_string();
    people.save(&person).await.expect("update");
    let stored = people.find(person.id).await.expect("find").expect("stored");
    assert_eq!(stored.first_name, "Johnny");
    assert!(stored.departments.is_empty());

    let filtered = people
        .list(&PersonFilter {
            email: Some(person.email.to_uppercase()),
            ..PersonFilter::default()
        })
        .await
        .expect("list");
    assert_eq!(filtered.len(), 1);
}

#[tokio::test]
#[ignore]
async fn active_human_count_ignores_bots_and_inactive() {
    let pool = pool().await;
    let people = PersonRepository::new(pool);
    let before = people.count_active_humans().await.expect("count");

    let human = unique_person("human");
    let mut bot = unique_person("bot");
    bot.is_bot = true;
    let mut inactive = unique_person("inactive");
    inactive.active = false;
    for person in [&human, &bot, &inactive] {
        people.save(person).await.expect("save");
    }

    let after = people.count_active_humans().await.expect("count");
    assert_eq!(after, before + 1);

    let active = people.active_persons().await.expect("active");
    assert!(active.iter().any(|p| p.id == human.id));
    assert!(!active.iter().any(|p| p.id == inactive.id));
}

#[tokio::test]
#[ignore]
async fn deletion_is_blocked_by_task_assignments_unless_forced() {
    let pool = pool().await;
    let people = PersonRepository::new(pool.clone());
    let person = unique_person("artist");
    people.save(&person).await.expect("save");

    let task_id = cutlist_core::TaskId::new().to_string();
    sqlx::query("INSERT INTO tasks (id, name, nb_drawings) VALUES ($1, 'layout', 12)")
        .bind(&task_id)
        .execute(&pool)
        .await
        .expect("task");
    sqlx::query("INSERT INTO task_assignees (task_id, person_id) VALUES ($1, $2)")
        .bind(&task_id)
        .bind(person.id.to_string())
        .execute(&pool)
        .await
        .expect("assignment");

    let err = people
        .remove_person(person.id, false)
        .await
        .expect_err("blocked");
    assert!(matches!(
        err.current_context(),
        StoreError::DeletionBlocked { count: 1, .. }
    ));
    assert!(people.find(person.id).await.expect("find").is_some());

    people.remove_person(person.id, true).await.expect("forced");
    assert!(people.find(person.id).await.expect("find").is_none());
}

#[tokio::test]
#[ignore]
async fn sessions_round_trip_and_expire() {
    let pool = pool().await;
    let people = PersonRepository::new(pool.clone());
    let sessions = SessionRepository::new(pool);
    let person = unique_person("session");
    people.save(&person).await.expect("save");

    let live = Session::new(
        generate_session_id(),
        person.id,
        SessionKind::AccessToken,
        Duration::hours(1),
    );
    let expired = Session::new(
        generate_session_id(),
        person.id,
        SessionKind::Login,
        Duration::hours(-1),
    );
    sessions.create(&live).await.expect("create");
    sessions.create(&expired).await.expect("create");

    let stored = sessions.find(live.id()).await.expect("find").expect("stored");
    assert_eq!(stored.kind(), SessionKind::AccessToken);
    assert_eq!(stored.person_id(), person.id);

    assert!(sessions.delete_expired().await.expect("cleanup") >= 1);
    assert!(sessions.find(expired.id()).await.expect("find").is_none());
    assert!(sessions.find(live.id()).await.expect("find").is_some());

    sessions.delete(live.id()).await.expect("delete");
    assert!(sessions.find(live.id()).await.expect("find").is_none());
}

#[tokio::test]
#[ignore]
async fn missing_person_is_none() {
    let pool = pool().await;
    let people = PersonRepository::new(pool);
    assert!(people.find(PersonId::new()).await.expect("find").is_none());
}

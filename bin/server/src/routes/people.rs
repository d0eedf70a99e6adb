//! Routes of the person resource.
//!
//! - `GET /people`: list, with filters, `relations` and `with_pass_hash`
//! - `POST /people`: always 405
//! - `GET /people/{id}`: read, with `relations`
//! - `PUT|PATCH /people/{id}`: partial update
//! - `DELETE /people/{id}`: delete, with `force`
//! - `GET /search/people`: search active persons

use crate::auth::{AppState, RequireAuth};
use crate::error::ApiError;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use cutlist_core::DepartmentId;
use cutlist_people::PersonFilter;
use cutlist_platform_access::Role;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::Arc;

const DEFAULT_SEARCH_LIMIT: usize = 10;

type JsonObject = Map<String, Value>;

/// Query parameters of the person listing.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ListParams {
    pub relations: bool,
    pub with_pass_hash: bool,
    pub active: Option<bool>,
    pub is_bot: Option<bool>,
    pub archived: Option<bool>,
    pub role: Option<Role>,
    pub email: Option<String>,
    pub department_id: Option<DepartmentId>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl ListParams {
    fn filter(&self) -> PersonFilter {
        PersonFilter {
            active: self.active,
            is_bot: self.is_bot,
            archived: self.archived,
            role: self.role,
            email: self.email.clone(),
            department_id: self.department_id,
            page: self.page,
            limit: self.limit,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ReadParams {
    pub relations: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DeleteParams {
    pub force: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SearchParams {
    pub query: String,
    pub limit: Option<usize>,
}

/// Routes of the person resource.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/people", get(list_people).post(create_person))
        .route(
            "/people/{id}",
            get(get_person)
                .put(update_person)
                .patch(update_person)
                .delete(delete_person),
        )
        .route("/search/people", get(search_people))
}

async fn list_people(
    State(state): State<Arc<AppState>>,
    RequireAuth(caller): RequireAuth,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<JsonObject>>, ApiError> {
    let people = state
        .collection
        .list(&caller, &params.filter(), params.relations, params.with_pass_hash)
        .await?;
    Ok(Json(people))
}

async fn create_person(
    State(state): State<Arc<AppState>>,
    RequireAuth(caller): RequireAuth,
) -> Result<Json<JsonObject>, ApiError> {
    Ok(Json(state.collection.create(&caller)?))
}

async fn get_person(
    State(state): State<Arc<AppState>>,
    RequireAuth(caller): RequireAuth,
    Path(id): Path<String>,
    Query(params): Query<ReadParams>,
) -> Result<Json<JsonObject>, ApiError> {
    Ok(Json(state.items.get(&caller, &id, params.relations).await?))
}

async fn update_person(
    State(state): State<Arc<AppState>>,
    RequireAuth(caller): RequireAuth,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<JsonObject>, ApiError> {
    let Json(body) = body?;
    Ok(Json(state.items.update(&caller, &id, body).await?))
}

async fn delete_person(
    State(state): State<Arc<AppState>>,
    RequireAuth(caller): RequireAuth,
    Path(id): Path<String>,
    Query(params): Query<DeleteParams>,
) -> Result<StatusCode, ApiError> {
    state.items.delete(&caller, &id, params.force).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn search_people(
    State(state): State<Arc<AppState>>,
    RequireAuth(caller): RequireAuth,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<JsonObject>>, ApiError> {
    let limit = params.limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
    Ok(Json(
        state
            .collection
            .search(&caller, &params.query, limit)
            .await?,
    ))
}

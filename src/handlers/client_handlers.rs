//! HTTP handlers for client records.
//!
//! Reads go query string → parser → store. Writes go body → whitelist check
//! → image resolution (when `imageId` is given) → validation → store, and
//! stop at the first failing step.

use crate::{
    errors::AppError,
    models::client::{Client, ClientDraft},
    services::{query_parser, validator},
    state::AppState,
};
use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: i64,
}

/// Values stay untyped so the whitelist runs before any type check.
type Body = Result<Json<HashMap<String, Value>>, JsonRejection>;

/// `GET /clients/count`
pub async fn count_clients(State(state): State<AppState>) -> Result<Json<CountResponse>, AppError> {
    let count = state.clients.count().await?;
    Ok(Json(CountResponse { count }))
}

/// `GET /clients?sort=&page=&search=&<filters>`
pub async fn list_clients(
    State(state): State<AppState>,
    Query(raw): Query<HashMap<String, String>>,
) -> Result<Json<Vec<Client>>, AppError> {
    let query = query_parser::parse_query(&raw)?;
    let clients = state.clients.find(&query).await?;
    Ok(Json(clients))
}

/// `GET /clients/{id}`
pub async fn show_client(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Client>, AppError> {
    state
        .clients
        .get(&id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Not Found"))
}

/// `POST /clients`
pub async fn create_client(
    State(state): State<AppState>,
    body: Body,
) -> Result<Json<Client>, AppError> {
    persist(&state, None, body).await.map(Json)
}

/// `PUT /clients/{id}`
pub async fn update_client(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Body,
) -> Result<Json<Client>, AppError> {
    persist(&state, Some(id), body).await.map(Json)
}

/// `DELETE /clients/{id}`, responding with the removed client.
pub async fn remove_client(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Client>, AppError> {
    state
        .clients
        .remove(&id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Not Found"))
}

async fn persist(state: &AppState, id: Option<String>, body: Body) -> Result<Client, AppError> {
    let Json(body) = body?;
    let input = query_parser::parse_client_input(body)?;

    let image = match &input.image_id {
        Some(image_id) => Some(state.resolver.resolve(image_id).await?),
        None => None,
    };

    let errors = validator::validate(&input.attributes);
    if !errors.is_empty() {
        return Err(AppError::validation_failed(&errors));
    }

    let client = state
        .clients
        .save(ClientDraft {
            id,
            attributes: input.attributes,
            image,
        })
        .await?;
    tracing::info!("saved client {}", client.id);
    Ok(client)
}

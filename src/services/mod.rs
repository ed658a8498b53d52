//! Query parsing, validation and the SQLite-backed stores behind the handlers.

pub mod client_store;
pub mod image_resolver;
pub mod image_store;
pub mod query_parser;
pub mod validator;

use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("client `{0}` not found")]
    ClientNotFound(String),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

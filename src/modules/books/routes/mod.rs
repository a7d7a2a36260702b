//! HTTP handlers for `/books`.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use shelf_db::Database;
use shelf_http::error::AppError;
use shelf_kernel::schema::{normalize_integers, validate};

use super::models::Book;
use super::repository::{self, BookError};
use super::schema::BOOK_SCHEMA;

impl From<BookError> for AppError {
    fn from(err: BookError) -> Self {
        match err {
            BookError::NotFound(_) => AppError::not_found(err.to_string()),
            BookError::Conflict(_) => AppError::conflict(err.to_string()),
            BookError::Database(db_err) => AppError::Internal(db_err.into()),
        }
    }
}

pub fn router() -> Router<Database> {
    Router::new()
        .route("/", get(list_books).post(create_book))
        .route("/health", get(health_check))
        .route(
            "/{isbn}",
            get(get_book).put(update_book).delete(delete_book),
        )
}

/// Run the payload through the book schema and decode it.
fn parse_book(payload: Result<Json<Value>, JsonRejection>) -> Result<Book, AppError> {
    let Json(mut payload) = payload?;

    validate(&payload, BOOK_SCHEMA).map_err(AppError::validation)?;
    normalize_integers(&mut payload, BOOK_SCHEMA);

    serde_json::from_value(payload).map_err(|e| AppError::bad_request(e.to_string()))
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "books module is healthy"
}

async fn list_books(State(db): State<Database>) -> Result<Json<Value>, AppError> {
    let books = repository::list_all(&db).await?;
    Ok(Json(json!({ "books": books })))
}

async fn get_book(
    State(db): State<Database>,
    Path(isbn): Path<String>,
) -> Result<Json<Value>, AppError> {
    let book = repository::get_by_isbn(&db, &isbn).await?;
    Ok(Json(json!({ "book": book })))
}

async fn create_book(
    State(db): State<Database>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let book = parse_book(payload)?;
    let book = repository::create(&db, &book).await?;

    tracing::info!(isbn = %book.isbn, "book created");
    Ok((StatusCode::CREATED, Json(json!({ "book": book }))))
}

async fn update_book(
    State(db): State<Database>,
    Path(isbn): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let book = parse_book(payload)?;
    let book = repository::update_by_isbn(&db, &isbn, &book).await?;

    tracing::info!(isbn = %book.isbn, "book updated");
    Ok(Json(json!({ "book": book })))
}

async fn delete_book(
    State(db): State<Database>,
    Path(isbn): Path<String>,
) -> Result<Json<Value>, AppError> {
    repository::delete_by_isbn(&db, &isbn).await?;

    tracing::info!(isbn = %isbn, "book deleted");
    Ok(Json(json!({ "message": "Book deleted" })))
}

//! Book persistence. Every operation is one parameterized statement.

use shelf_db::{Database, DbError};
use thiserror::Error;

use super::models::Book;

const COLUMNS: &str = "isbn, amazon_url, author, language, pages, publisher, title, year";

#[derive(Debug, Error)]
pub enum BookError {
    #[error("There is no book with an isbn '{0}")]
    NotFound(String),

    #[error("There is already a book with an isbn '{0}'")]
    Conflict(String),

    #[error(transparent)]
    Database(#[from] DbError),
}

impl From<sqlx::Error> for BookError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(DbError::from_sqlx(err))
    }
}

/// Insert a new book and return the stored row.
pub async fn create(db: &Database, book: &Book) -> Result<Book, BookError> {
    let sql = format!(
        "INSERT INTO books ({COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?) RETURNING {COLUMNS}"
    );

    let result = sqlx::query_as::<_, Book>(&sql)
        .bind(&book.isbn)
        .bind(&book.amazon_url)
        .bind(&book.author)
        .bind(&book.language)
        .bind(book.pages)
        .bind(&book.publisher)
        .bind(&book.title)
        .bind(book.year)
        .fetch_one(db.pool())
        .await;

    match result.map_err(DbError::from_sqlx) {
        Ok(row) => {
            tracing::debug!(isbn = %row.isbn, "book created");
            Ok(row)
        }
        Err(err) if err.is_unique_violation() => Err(BookError::Conflict(book.isbn.clone())),
        Err(err) => Err(err.into()),
    }
}

/// Return every book ordered by title.
pub async fn list_all(db: &Database) -> Result<Vec<Book>, BookError> {
    let sql = format!("SELECT {COLUMNS} FROM books ORDER BY title");

    let rows = sqlx::query_as::<_, Book>(&sql)
        .fetch_all(db.pool())
        .await?;

    Ok(rows)
}

/// Fetch a single book by isbn.
pub async fn get_by_isbn(db: &Database, isbn: &str) -> Result<Book, BookError> {
    let sql = format!("SELECT {COLUMNS} FROM books WHERE isbn = ?");

    sqlx::query_as::<_, Book>(&sql)
        .bind(isbn)
        .fetch_optional(db.pool())
        .await?
        .ok_or_else(|| BookError::NotFound(isbn.to_string()))
}

/// Replace every mutable field of the book keyed by `isbn`.
///
/// `book.isbn` is ignored; the key never changes.
pub async fn update_by_isbn(db: &Database, isbn: &str, book: &Book) -> Result<Book, BookError> {
    let sql = format!(
        "UPDATE books \
         SET amazon_url = ?, author = ?, language = ?, pages = ?, publisher = ?, title = ?, year = ? \
         WHERE isbn = ? \
         RETURNING {COLUMNS}"
    );

    let row = sqlx::query_as::<_, Book>(&sql)
        .bind(&book.amazon_url)
        .bind(&book.author)
        .bind(&book.language)
        .bind(book.pages)
        .bind(&book.publisher)
        .bind(&book.title)
        .bind(book.year)
        .bind(isbn)
        .fetch_optional(db.pool())
        .await?
        .ok_or_else(|| BookError::NotFound(isbn.to_string()))?;

    tracing::debug!(isbn, "book updated");
    Ok(row)
}

/// Permanently delete the book keyed by `isbn`.
pub async fn delete_by_isbn(db: &Database, isbn: &str) -> Result<(), BookError> {
    let result = sqlx::query("DELETE FROM books WHERE isbn = ?")
        .bind(isbn)
        .execute(db.pool())
        .await?;

    if result.rows_affected() == 0 {
        return Err(BookError::NotFound(isbn.to_string()));
    }

    tracing::debug!(isbn, "book deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::books::BooksModule;
    use shelf_kernel::Module;

    async fn setup() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        let migrations: Vec<(String, shelf_db::Migration)> = BooksModule::new()
            .migrations()
            .into_iter()
            .map(|m| ("books".to_string(), m))
            .collect();
        db.apply_migrations(&migrations).await.unwrap();
        db
    }

    fn power_up() -> Book {
        Book {
            isbn: "0691161518".to_string(),
            amazon_url: "http://a.co/eobPtX2".to_string(),
            author: "Matthew Lane".to_string(),
            language: "english".to_string(),
            pages: 264,
            publisher: "Princeton University Press".to_string(),
            title: "Power-Up: Unlocking the Hidden Mathematics in Video Games".to_string(),
            year: 2017,
        }
    }

    fn lady() -> Book {
        Book {
            isbn: "0691896728345".to_string(),
            amazon_url: "http://a.co/eobPtX2".to_string(),
            author: "Jeanne Savery".to_string(),
            language: "english".to_string(),
            pages: 345,
            publisher: "Princeton University Press".to_string(),
            title: "A Lady's Deception".to_string(),
            year: 2017,
        }
    }

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let db = setup().await;

        let created = create(&db, &power_up()).await.unwrap();
        assert_eq!(created, power_up());
        assert_eq!(get_by_isbn(&db, "0691161518").await.unwrap(), power_up());
    }

    #[tokio::test]
    async fn list_is_ordered_by_title() {
        let db = setup().await;
        create(&db, &power_up()).await.unwrap();
        create(&db, &lady()).await.unwrap();

        let titles: Vec<String> = list_all(&db)
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.title)
            .collect();

        assert_eq!(titles, vec![lady().title, power_up().title]);
    }

    #[tokio::test]
    async fn duplicate_isbn_is_a_conflict() {
        let db = setup().await;
        create(&db, &power_up()).await.unwrap();

        let err = create(&db, &power_up()).await.unwrap_err();
        assert!(matches!(err, BookError::Conflict(isbn) if isbn == "0691161518"));
    }

    #[tokio::test]
    async fn update_replaces_fields_but_keeps_key() {
        let db = setup().await;
        create(&db, &power_up()).await.unwrap();

        let replacement = Book {
            isbn: "9999999999".to_string(),
            language: "spanish".to_string(),
            pages: 265,
            ..lady()
        };
        let updated = update_by_isbn(&db, "0691161518", &replacement).await.unwrap();

        assert_eq!(updated.isbn, "0691161518");
        assert_eq!(updated.title, "A Lady's Deception");
        assert_eq!(updated.pages, 265);
        assert!(matches!(
            get_by_isbn(&db, "9999999999").await,
            Err(BookError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn unknown_isbn_is_not_found_everywhere() {
        let db = setup().await;

        let err = get_by_isbn(&db, "1234567890").await.unwrap_err();
        assert_eq!(err.to_string(), "There is no book with an isbn '1234567890");
        assert!(matches!(
            update_by_isbn(&db, "1234567890", &power_up()).await,
            Err(BookError::NotFound(_))
        ));
        assert!(matches!(
            delete_by_isbn(&db, "1234567890").await,
            Err(BookError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn delete_removes_row() {
        let db = setup().await;
        create(&db, &power_up()).await.unwrap();

        delete_by_isbn(&db, "0691161518").await.unwrap();

        assert!(matches!(
            get_by_isbn(&db, "0691161518").await,
            Err(BookError::NotFound(_))
        ));
    }
}

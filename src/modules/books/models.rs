use serde::{Deserialize, Serialize};

/// A stored book; also the exact wire shape of `{"book": ...}` bodies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Book {
    /// ISBN-10 or ISBN-13, primary key
    pub isbn: String,
    pub amazon_url: String,
    pub author: String,
    pub language: String,
    pub pages: i64,
    pub publisher: String,
    pub title: String,
    pub year: i64,
}

//! Payload rules shared by create and full-replace update.

use shelf_kernel::schema::{FieldRule, Format};

pub const BOOK_SCHEMA: &[FieldRule] = &[
    FieldRule::string("isbn").min_length(10).max_length(13),
    FieldRule::string("amazon_url").format(Format::Uri),
    FieldRule::string("author"),
    FieldRule::string("language"),
    FieldRule::integer("pages").minimum(0),
    FieldRule::string("publisher"),
    FieldRule::string("title"),
    FieldRule::integer("year").minimum(0),
];

//! Kernel for shelf: layered settings, the `Module` trait and its registry,
//! and field-rule validation for JSON payloads.

pub mod module;
pub mod registry;
pub mod schema;
pub mod settings;

pub use module::{InitCtx, Module};
pub use registry::ModuleRegistry;
pub use shelf_db::{Database, Migration};

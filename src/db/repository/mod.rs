//! Repository layer — entity-scoped database operations.
//!
//! Free functions over `&Connection`, one module per entity. Row structs
//! keep the SQL column order in one place; enum columns are converted at
//! the module boundary so callers only ever see typed models.

pub mod appointment;
pub mod document;
pub mod fiche;
pub mod intervention;
pub mod notification;
pub mod role;
pub mod token;
pub mod user;
pub mod verification;

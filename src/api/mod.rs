//! REST surface: a public `/auth` group and the bearer-token protected
//! `/api` tree, wired through an auth middleware that resolves the token
//! back to a user row on every request.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod types;

pub use router::api_router;
pub use types::{ApiContext, CurrentUser};

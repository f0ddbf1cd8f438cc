//! Business logic services.
//!
//! # Services
//!
//! - `resources` - Generic CRUD over every collection, for any store
//! - `users` - Profiles, signup and password login
//!
//! Services hold an `Arc<dyn DocumentStore>` and know nothing about HTTP;
//! [`crate::state::AppState`] builds one set over the durable store and one
//! over the mock store.

pub mod resources;
pub mod users;

pub use resources::{ResourceError, ResourceService};
pub use users::{UserError, UserService};

//! Core types for Rootedlane.
//!
//! This module provides the document and collection vocabulary shared by the
//! store implementations and the HTTP layer.

pub mod collection;
pub mod document;
pub mod id;

pub use collection::{Collection, UnknownCollection};
pub use document::{
    CREATED_AT_FIELD, Document, ID_FIELD, NotAnObject, SERVER_FIELDS, UPDATED_AT_FIELD,
};
pub use id::{LOCAL_ID_LEN, generate_local_id};

//! EntityQA Common Library
//!
//! Entity shapes, identity normalization and test-data generators shared by
//! the API and UI suites.

pub mod datagen;
pub mod error;
pub mod normalize;
pub mod types;

// Re-export commonly used types
pub use error::{Error, IdentityMismatch, Result, ValidationError};
pub use normalize::{remove_id_keys, strip_ids};
pub use types::*;

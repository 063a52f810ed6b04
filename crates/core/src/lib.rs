//! `tollgate-core`: identifiers and validation primitives shared by the
//! auth crates.
//!
//! Nothing in here touches storage, crypto or time.

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult, normalize_email};
pub use id::AccountId;

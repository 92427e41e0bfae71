//! Resource persistence client for the ClipNote backend.
//!
//! The backend owns the resource collection; this crate exposes the one
//! write operation the ingestion flow needs, `add_resource`, called
//! exactly once per successful completion.

pub mod client;
pub mod error;

pub use client::{ResourceClient, ResourceClientConfig};
pub use error::{StorageError, StorageResult};

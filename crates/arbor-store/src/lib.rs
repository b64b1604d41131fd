//! Content-addressed object storage for Arbor.
//!
//! Objects are immutable and identified by the BLAKE3 hash of their content,
//! domain-separated by object kind so a blob and a tree with identical bytes
//! never share an id.
//!
//! # Object Types
//!
//! - [`Blob`] -- raw file content
//! - [`Tree`] -- directory listing mapping names to object references, kept
//!   in the base-name order that tree diffing relies on
//!
//! # Storage Backends
//!
//! All backends implement the [`ObjectStore`] trait:
//!
//! - [`InMemoryObjectStore`] -- `HashMap`-based store for tests and embedding

pub mod error;
pub mod memory;
pub mod object;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use memory::InMemoryObjectStore;
pub use object::{base_name_cmp, Blob, EntryMode, ObjectKind, StoredObject, Tree, TreeEntry};
pub use traits::ObjectStore;

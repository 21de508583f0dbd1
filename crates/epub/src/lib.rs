//! EPUB container access for the retold project.
//!
//! This crate reads an EPUB into memory, exposes its spine-ordered XHTML
//! content documents for rewriting, and repacks the archive with every
//! other entry untouched.

pub mod container;
pub mod error;
pub mod package;
pub mod types;

pub use container::Epub;
pub use error::{EpubError, Result};
pub use types::{DocumentRef, ManifestItem, Metadata, Package, SpineRef};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Resource kind registry
//!
//! Maps a kind name to its schema, form hints, default record and node view.
//!
//! # Core Concepts
//!
//! - [`KindManifest`]: Serializable kind description (JSON or YAML)
//! - [`ResourceKindDescriptor`]: Registered kind with a compiled schema
//! - [`ResourceRegistry`]: Registration-ordered lookup, palette grouping and validation
//!
//! # Example
//!
//! ```rust
//! use rescanvas_registry::ResourceRegistry;
//!
//! let registry = ResourceRegistry::kubernetes().unwrap();
//! let deployment = registry.get("Deployment").unwrap();
//! assert_eq!(deployment.default_record().str_field("apiVersion"), Some("apps/v1"));
//! assert!(registry.get("Pod").is_err());
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod descriptor;
mod error;
mod registry;

pub use descriptor::{KindManifest, ResourceKindDescriptor, ValidationIssue, DEFAULT_GROUP, DEFAULT_VIEW};
pub use error::{RegistryError, UnknownKindError};
pub use registry::ResourceRegistry;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

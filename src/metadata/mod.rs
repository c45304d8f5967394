//! Type metadata: descriptors, members, methods and the catalog holding them.
//!
//! # Key Components
//!
//! - [`typesystem`] - [`crate::TypeData`], the [`crate::Catalog`] and the registration machinery
//! - [`member`] - data member descriptors and typed field accessors
//! - [`method`] - method descriptors and the dynamic invocation bridge
//! - [`config`] - [`crate::CatalogConfig`], the configuration of the global catalog
//!
//! # Examples
//!
//! ```rust
//! use metascope::{field, meta_declare_external, Any, Storable};
//!
//! #[derive(Clone)]
//! struct Label {
//!     text: String,
//! }
//!
//! impl Storable for Label {}
//!
//! meta_declare_external!(Label => |t| t
//!     .member("text", field!(Label, text))
//!     .method("len", |label: &Label| label.text.len()));
//!
//! let label = metascope::get::<Label>();
//! for member in label.members() {
//!     println!("{member}");
//! }
//!
//! let mut instance = Any::new(Label { text: "four".to_string() });
//! let len = label.method("len")?.invoke(&mut instance, &[])?;
//! assert_eq!(*len.cast::<usize>()?, 4);
//! # Ok::<(), metascope::Error>(())
//! ```

/// Configuration of the global catalog
pub mod config;
/// Data member descriptors
pub mod member;
/// Method descriptors and dynamic invocation
pub mod method;
/// Type descriptors, the catalog and registration
pub mod typesystem;

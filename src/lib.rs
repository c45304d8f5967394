// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![warn(missing_docs)]
//#![deny(unsafe_code)]
// - 'any/policy.rs' stores small values inside the pointer-sized slot of an `Any`

//! # metascope
//!
//! Runtime type reflection for Rust. `metascope` keeps a process-wide catalog of type
//! descriptors (name, size, data members, methods), a type-erased value container and a bridge
//! that calls registered methods with erased argument lists.
//!
//! ## Features
//!
//! - **Lazy registration** - a type registers itself on first use, exactly once, also when first
//!   used from several threads
//! - **Stable descriptors** - descriptors never move and never die, lookups hand out
//!   `&'static TypeData`
//! - **Small-value optimisation** - [`Any`] stores pointer-sized values inline and everything
//!   else on the heap
//! - **Checked invocation** - argument count, receiver and argument types are checked before the
//!   original, statically typed function runs
//! - **Two registration styles** - intrusive ([`meta_declare!`] + [`meta_define!`]) for own types,
//!   external ([`meta_declare_external!`]) for everything else
//!
//! ## Quick Start
//!
//! ```rust
//! use metascope::prelude::*;
//! use metascope::{field, meta_declare, meta_define};
//!
//! #[derive(Clone, Default)]
//! struct Player {
//!     name: String,
//!     score: u32,
//! }
//!
//! impl Storable for Player {}
//!
//! impl Player {
//!     fn add(&mut self, points: u32) -> u32 {
//!         self.score += points;
//!         self.score
//!     }
//! }
//!
//! meta_declare!(Player);
//! meta_define!(Player => |t| t
//!     .member("name", field!(Player, name))
//!     .member("score", field!(Player, score))
//!     .method("add", Player::add));
//!
//! let player = get::<Player>();
//! assert_eq!(player.name(), "Player");
//! assert_eq!(player.member_count(), 2);
//!
//! let mut instance = Any::new(Player::default());
//! let score = player.method("add")?.invoke(&mut instance, &[Any::new(5u32)])?;
//! assert_eq!(*score.cast::<u32>()?, 5);
//!
//! let score = player.member("score")?.get_value(&instance)?;
//! assert_eq!(*score.cast::<u32>()?, 5);
//! # Ok::<(), metascope::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`any`] - the type-erased value container [`Any`] and its storage policies
//! - [`metadata`] - descriptors, the [`Catalog`], members, methods and invocation
//! - [`utils`] - type name helpers and the position-indexed [`JumpTable`]
//! - [`prelude`] - convenient re-exports of the common API
//! - [`Error`] and [`Result`] - error handling
//!
//! ## Configuration
//!
//! The global catalog is created on first use. Its capacity and whether the primitive types are
//! committed up front can be chosen once, before that:
//!
//! ```rust
//! use metascope::{Catalog, CatalogConfig};
//!
//! Catalog::configure(CatalogConfig::large())?;
//! assert_eq!(Catalog::global().capacity(), 4096);
//! # Ok::<(), metascope::Error>(())
//! ```
//!
//! ## Logging
//!
//! The crate emits [`tracing`](https://docs.rs/tracing) events: `debug` when a type is committed
//! or sealed, `warn` when a duplicate registration is rejected, `trace` for storage policy
//! creation and method invocation. No subscriber is installed by the library.
#[macro_use]
pub(crate) mod macros;

#[macro_use]
pub(crate) mod error;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust
/// use metascope::prelude::*;
///
/// let int = get::<i32>();
/// assert_eq!(int.kind(), TypeKind::Primitive);
/// ```
pub mod prelude;

/// The type-erased value container
///
/// [`Any`] holds one value of any [`Storable`] type. Small values live inline, larger ones on the
/// heap; the choice is made per type at compile time.
///
/// # Examples
///
/// ```rust
/// use metascope::{Any, StorageKind};
///
/// let number = Any::new(7u16);
/// assert_eq!(number.storage(), StorageKind::Inline);
///
/// let text = Any::new(String::from("seven"));
/// assert_eq!(text.storage(), StorageKind::Heap);
/// assert_eq!(text.cast::<String>()?, "seven");
/// # Ok::<(), metascope::Error>(())
/// ```
pub mod any;

/// Type descriptors, members, methods and the catalog
pub mod metadata;

/// Small helpers: type name trimming and position-indexed function tables
pub mod utils;

/// `metascope` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `metascope` Error type
///
/// # Examples
///
/// ```rust
/// use metascope::{get, Error};
///
/// match get::<i32>().member("bits") {
///     Ok(member) => println!("found {member}"),
///     Err(Error::MemberNotFound { member, .. }) => println!("no member called {member}"),
///     Err(error) => println!("error: {error}"),
/// }
/// ```
pub use error::Error;

pub use any::{Any, Storable, StorageKind};
pub use metadata::{
    config::CatalogConfig,
    member::{Field, Member},
    method::{invoke, IntoMethod, IntoStaticMethod, Method, MethodFlags, ParamList, Receiver},
    typesystem::{
        get, get_by_index, get_by_name, get_of, register, Catalog, Object, Qualifier, Reflect,
        TypeBuilder, TypeData, TypeIndex, TypeKind, TypeOf, TypeRecord,
    },
};
pub use utils::JumpTable;

//! The process-wide type catalog.
//!
//! The [`Catalog`] owns every [`TypeData`]. Descriptors are stored in an append-only
//! [`boxcar::Vec`], which never moves an element once it is written, so references handed out by
//! lookups stay valid for the lifetime of the catalog. The global catalog lives for the whole
//! process, which is why its lookups return `&'static TypeData`.
//!
//! # Indices
//!
//! - **Position**: the [`TypeIndex`] assigned at commit, in registration order
//! - **Name**: exact, case-sensitive name lookup through a [`DashMap`]
//! - **Rust type**: [`TypeId`] lookup for descriptors created with [`TypeData::of`]
//!
//! # Thread Safety
//!
//! Readers never lock. Commits and type registration are serialized by one reentrant lock, so a
//! type that refers to itself (or to a type that refers back to it) can register on the same
//! thread. Only sealed descriptors are visible through [`Catalog::get_by_name`],
//! [`Catalog::get_by_index`] and [`Catalog::iter`]; a descriptor still being filled (or one whose
//! registration failed) is reported as not found. Threads resolving a type through its holder wait
//! on the lock until the descriptor is sealed.
//!
//! # Capacity
//!
//! The capacity is fixed by [`CatalogConfig::capacity`]. A commit beyond it fails with
//! [`crate::Error::CapacityExceeded`]; the storage is never grown behind the caller's back.

use std::{any::TypeId, sync::OnceLock};

use dashmap::DashMap;
use parking_lot::{ReentrantMutex, ReentrantMutexGuard};

use crate::{
    metadata::{
        config::CatalogConfig,
        typesystem::{primitives, TypeData, TypeIndex},
    },
    Error::{AlreadyConfigured, CapacityExceeded, DuplicateType, IndexNotFound, TypeNotFound},
    Result,
};

static CONFIG: OnceLock<CatalogConfig> = OnceLock::new();
static GLOBAL: OnceLock<Catalog> = OnceLock::new();

/// Append-only store of type descriptors
///
/// # Examples
///
/// ```rust
/// use metascope::{Catalog, TypeData};
///
/// let catalog = Catalog::global();
/// let index = catalog.add_type_data("ExampleBlob", 32)?;
///
/// let blob = catalog.get_by_name("ExampleBlob")?;
/// assert_eq!(blob.index(), index);
/// assert_eq!(blob.size(), 32);
/// assert!(catalog.add_type_data("ExampleBlob", 8).is_err());
/// # Ok::<(), metascope::Error>(())
/// ```
pub struct Catalog {
    types: boxcar::Vec<TypeData>,
    by_name: DashMap<String, TypeIndex>,
    by_type_id: DashMap<TypeId, TypeIndex>,
    config: CatalogConfig,
    registration: ReentrantMutex<()>,
}

impl Catalog {
    /// Creates a catalog, committing the primitives if the configuration asks for them
    pub(crate) fn new(config: CatalogConfig) -> Result<Self> {
        let catalog = Catalog {
            types: boxcar::Vec::with_capacity(config.capacity),
            by_name: DashMap::with_capacity(config.capacity),
            by_type_id: DashMap::with_capacity(config.capacity),
            config,
            registration: ReentrantMutex::new(()),
        };

        if config.register_primitives {
            primitives::initialize(&catalog)?;
        }

        tracing::debug!(
            capacity = config.capacity,
            primitives = catalog.len(),
            "created type catalog"
        );
        Ok(catalog)
    }

    /// Installs the configuration of the global catalog
    ///
    /// Must run before the first lookup; the default configuration applies otherwise.
    ///
    /// # Errors
    /// Returns [`crate::Error::AlreadyConfigured`] if the global catalog exists already or a
    /// configuration was installed before.
    pub fn configure(config: CatalogConfig) -> Result<()> {
        if GLOBAL.get().is_some() {
            return Err(AlreadyConfigured);
        }

        CONFIG.set(config).map_err(|_| AlreadyConfigured)
    }

    /// The process-wide catalog, created on first use
    ///
    /// # Panics
    ///
    /// Panics if the installed configuration leaves no room for the primitive types.
    pub fn global() -> &'static Catalog {
        GLOBAL.get_or_init(|| {
            let config = CONFIG.get().copied().unwrap_or_default();
            match Catalog::new(config) {
                Ok(catalog) => catalog,
                Err(error) => panic!("failed to create the type catalog: {error}"),
            }
        })
    }

    /// The configuration this catalog was created with
    #[must_use]
    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// Maximum number of descriptors
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.config.capacity
    }

    /// Number of committed descriptors
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.count()
    }

    /// Returns `true` if no descriptor is committed
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if a sealed descriptor with this name is committed
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get_by_name(name).is_ok()
    }

    /// Sealed descriptors in registration order
    pub fn iter(&self) -> impl Iterator<Item = &TypeData> {
        self.types
            .iter()
            .map(|(_, data)| data)
            .filter(|data| data.is_sealed())
    }

    /// Looks up a sealed descriptor by index
    ///
    /// # Errors
    /// Returns [`crate::Error::IndexNotFound`] if no sealed descriptor has this index.
    pub fn get_by_index(&self, index: TypeIndex) -> Result<&TypeData> {
        self.types
            .get(index.as_usize())
            .filter(|data| data.is_sealed())
            .ok_or(IndexNotFound(index))
    }

    /// Looks up a sealed descriptor by its exact name
    ///
    /// # Errors
    /// Returns [`crate::Error::TypeNotFound`] if no sealed descriptor has this name.
    pub fn get_by_name(&self, name: &str) -> Result<&TypeData> {
        self.by_name
            .get(name)
            .and_then(|entry| self.types.get(entry.value().as_usize()))
            .filter(|data| data.is_sealed())
            .ok_or_else(|| TypeNotFound(name.to_string()))
    }

    /// Looks up the descriptor of a Rust type
    ///
    /// Unlike the other lookups this also returns a descriptor whose registration is open or
    /// failed; check [`TypeData::is_sealed`] before using it.
    #[must_use]
    pub fn get_by_type_id(&self, type_id: TypeId) -> Option<&TypeData> {
        let index = self.by_type_id.get(&type_id).map(|entry| *entry.value())?;
        self.types.get(index.as_usize())
    }

    /// Commits and seals a bare [`crate::TypeKind::Opaque`] descriptor
    ///
    /// The entry has no members or methods and never gains any. Use [`Catalog::add_type`] to
    /// commit a descriptor with members attached.
    ///
    /// # Errors
    /// Returns [`crate::Error::DuplicateType`] if the name is taken and
    /// [`crate::Error::CapacityExceeded`] if the catalog is full.
    pub fn add_type_data(&self, name: &str, size: usize) -> Result<TypeIndex> {
        let committed = self.commit(TypeData::new(name, size))?;
        committed.seal();
        Ok(committed.index())
    }

    /// Commits a fully built descriptor and seals it
    ///
    /// The owner of every member and method already attached to `data` is pointed at the new
    /// index.
    ///
    /// # Errors
    /// Returns [`crate::Error::DuplicateType`] if the name or Rust type is taken and
    /// [`crate::Error::CapacityExceeded`] if the catalog is full.
    pub fn add_type(&self, data: TypeData) -> Result<TypeIndex> {
        let committed = self.commit(data)?;
        committed.seal();
        Ok(committed.index())
    }

    /// Commits a descriptor without sealing it, so registration can keep appending to it
    pub(crate) fn reserve(&self, data: TypeData) -> Result<&TypeData> {
        self.commit(data)
    }

    /// Serializes registration; reentrant on the holding thread
    pub(crate) fn registration_guard(&self) -> ReentrantMutexGuard<'_, ()> {
        self.registration.lock()
    }

    fn commit(&self, mut data: TypeData) -> Result<&TypeData> {
        let _guard = self.registration_guard();

        let taken = self.by_name.contains_key(data.name())
            || data
                .type_id()
                .is_some_and(|type_id| self.by_type_id.contains_key(&type_id));
        if taken {
            tracing::warn!(type_name = data.name(), "rejected duplicate type");
            return Err(DuplicateType(data.name().to_string()));
        }

        let position = self.types.count();
        if position >= self.config.capacity {
            tracing::warn!(
                type_name = data.name(),
                capacity = self.config.capacity,
                "catalog is full"
            );
            return Err(CapacityExceeded(self.config.capacity));
        }

        let index = TypeIndex::new(position)?;
        data.index = index;

        let pushed = self.types.push(data);
        debug_assert_eq!(pushed, position);
        let committed = self
            .types
            .get(position)
            .ok_or(IndexNotFound(index))?;
        committed.adopt();

        self.by_name.insert(committed.name().to_string(), index);
        if let Some(type_id) = committed.type_id() {
            self.by_type_id.insert(type_id, index);
        }

        tracing::debug!(
            type_name = committed.name(),
            %index,
            kind = %committed.kind(),
            size = committed.size(),
            "committed type"
        );
        Ok(committed)
    }
}

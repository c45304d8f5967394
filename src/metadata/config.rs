//! Catalog configuration
//!
//! The catalog never reallocates its storage, so its capacity has to be decided before the first
//! type registers. [`CatalogConfig`] carries that decision together with the other knobs that
//! shape a freshly created [`crate::Catalog`].

/// Default number of descriptor slots in a catalog
pub const DEFAULT_CAPACITY: usize = 256;

/// Configuration for creating a [`crate::Catalog`]
///
/// Install it for the process-wide catalog through [`crate::Catalog::configure`] before any type
/// is looked up. Once the global catalog exists its configuration is fixed.
///
/// # Examples
///
/// ```rust
/// use metascope::CatalogConfig;
///
/// let config = CatalogConfig::default().with_capacity(1024);
/// assert_eq!(config.capacity, 1024);
/// assert!(config.register_primitives);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogConfig {
    /// Maximum number of descriptors, including the primitives (default: 256)
    pub capacity: usize,

    /// Commit the built-in primitive descriptors (`void`, integers, floats, `bool`, `char`,
    /// `String`) when the catalog is created
    pub register_primitives: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            register_primitives: true,
        }
    }
}

impl CatalogConfig {
    /// Creates a configuration without the built-in primitives
    ///
    /// Primitive descriptors are still created on demand the first time a primitive type is
    /// looked up, they just don't occupy slots up front.
    #[must_use]
    pub fn minimal() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            register_primitives: false,
        }
    }

    /// Creates a configuration for programs with many reflectable types
    #[must_use]
    pub fn large() -> Self {
        Self {
            capacity: 4096,
            register_primitives: true,
        }
    }

    /// Sets the descriptor capacity
    #[must_use]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Enables or disables the up-front primitive registration
    #[must_use]
    pub fn with_primitives(mut self, register_primitives: bool) -> Self {
        self.register_primitives = register_primitives;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_config_presets() {
        let default = CatalogConfig::default();
        assert_eq!(default.capacity, 256);
        assert!(default.register_primitives);

        let minimal = CatalogConfig::minimal();
        assert_eq!(minimal.capacity, 256);
        assert!(!minimal.register_primitives);

        let large = CatalogConfig::large();
        assert_eq!(large.capacity, 4096);
        assert!(large.register_primitives);
    }

    #[test]
    fn test_catalog_config_builders() {
        let config = CatalogConfig::minimal()
            .with_capacity(8)
            .with_primitives(true);
        assert_eq!(config.capacity, 8);
        assert!(config.register_primitives);
        assert_ne!(config, CatalogConfig::default());
    }
}

//! Typed per-client configuration store.
//!
//! [`Configs`] holds values of different types under one map. Every entry is
//! addressed by a key type implementing [`ConfigKey`], which fixes the value
//! type and the value reported when nothing has been stored:
//!
//! ```
//! use clasp_core::{ConfigKey, Configs};
//!
//! struct MaxRedirects;
//!
//! impl ConfigKey for MaxRedirects {
//!     type Value = usize;
//!
//!     fn default_value() -> usize {
//!         10
//!     }
//! }
//!
//! let mut configs = Configs::new();
//! assert_eq!(configs.get::<MaxRedirects>(), 10);
//!
//! configs.set::<MaxRedirects>(3);
//! assert_eq!(configs.get::<MaxRedirects>(), 3);
//! ```

use std::fmt;

use http::Extensions;

/// Identifier for one typed configuration entry.
///
/// Storage is keyed by the implementing type, so two keys sharing a value
/// type never see each other's values.
pub trait ConfigKey: 'static {
    /// Type of the stored value.
    type Value: Clone + Send + Sync + 'static;

    /// Value returned by [`Configs::get`] when the key was never set.
    fn default_value() -> Self::Value;
}

struct Slot<K: ConfigKey>(K::Value);

impl<K: ConfigKey> Clone for Slot<K> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

/// Type-erased, cloneable map from [`ConfigKey`] to value.
///
/// Cloning copies every stored value, so a clone can be changed without
/// affecting the original.
#[derive(Clone, Default)]
pub struct Configs {
    values: Extensions,
}

impl Configs {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored value for `K`, or `K::default_value()` if unset.
    #[must_use]
    pub fn get<K: ConfigKey>(&self) -> K::Value {
        self.get_ref::<K>().cloned().unwrap_or_else(K::default_value)
    }

    /// Borrow the stored value for `K`, without falling back to the default.
    #[must_use]
    pub fn get_ref<K: ConfigKey>(&self) -> Option<&K::Value> {
        self.values.get::<Slot<K>>().map(|slot| &slot.0)
    }

    /// Store a value for `K`, returning the previous one.
    pub fn set<K: ConfigKey>(&mut self, value: K::Value) -> Option<K::Value> {
        self.values.insert(Slot::<K>(value)).map(|slot| slot.0)
    }

    /// Builder-style [`set`](Self::set).
    #[must_use]
    pub fn with<K: ConfigKey>(mut self, value: K::Value) -> Self {
        self.set::<K>(value);
        self
    }

    /// Remove the value for `K`; later reads see the default again.
    pub fn remove<K: ConfigKey>(&mut self) -> Option<K::Value> {
        self.values.remove::<Slot<K>>().map(|slot| slot.0)
    }

    /// Returns `true` if a value was explicitly stored for `K`.
    #[must_use]
    pub fn contains<K: ConfigKey>(&self) -> bool {
        self.values.get::<Slot<K>>().is_some()
    }

    /// Number of explicitly stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if nothing was stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for Configs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configs")
            .field("entries", &self.values.len())
            .finish()
    }
}

use crate::ProductId;

/// Version of a stock record, used for optimistic concurrency control.
///
/// A record starts at version 0 when it is created and every successful
/// write increments the version by exactly 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Version(i64);

impl Version {
    /// Creates a new version from a raw value.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the version (0) of a freshly created record.
    pub fn initial() -> Self {
        Self(0)
    }

    /// Returns the next version.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns the raw version value.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Version {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Version> for i64 {
    fn from(version: Version) -> Self {
        version.0
    }
}

/// Stock record of a single product.
///
/// The `version` is the one the record had when it was read. Passing the
/// record back to a write makes that write conditional on nobody else having
/// written in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stock {
    pub product_id: ProductId,
    pub quantity: i64,
    pub version: Version,
}

impl Stock {
    /// A freshly created record: no quantity, initial version.
    pub fn new(product_id: ProductId) -> Self {
        Self {
            product_id,
            quantity: 0,
            version: Version::initial(),
        }
    }

    /// Returns a copy with a different quantity and the same version.
    pub fn with_quantity(self, quantity: i64) -> Self {
        Self { quantity, ..self }
    }
}

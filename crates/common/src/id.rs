//! ID generation utilities.

use ulid::Ulid;
use uuid::Uuid;

/// ID generator for entities and one-time codes.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    _private: (),
}

impl IdGenerator {
    /// Create a new ID generator.
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }

    /// Generate a new ULID-based ID.
    ///
    /// ULIDs are lexicographically sortable, so ordering by ID orders by
    /// creation time.
    #[must_use]
    pub fn generate(&self) -> String {
        Ulid::new().to_string().to_lowercase()
    }

    /// Generate a one-time activation code.
    ///
    /// Random UUID v4 (122 bits of entropy), no time component.
    #[must_use]
    pub fn generate_activation_code(&self) -> String {
        Uuid::new_v4().to_string()
    }

    /// Generate a random API access token.
    #[must_use]
    pub fn generate_token(&self) -> String {
        Uuid::new_v4().simple().to_string()
    }
}

//! Visibility Levels
//!
//! Every container declares one of three visibility levels. The levels form a
//! fixed total order of restrictiveness:
//!
//! ```text
//! Public  <  Internal  <  Private
//! ```
//!
//! The derived `Ord` follows declaration order, so `max` of two levels is always
//! the more restrictive one.
//!
//! # Examples
//!
//! ```rust
//! use catalog_core::models::Visibility;
//!
//! assert_eq!(
//!     Visibility::Public.most_restrictive(Visibility::Private),
//!     Visibility::Private
//! );
//! assert_eq!("internal".parse::<Visibility>().unwrap(), Visibility::Internal);
//! ```

use crate::models::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Visibility level declared on a node or computed for it
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Visible to anyone
    #[default]
    Public,
    /// Visible to authenticated users and link holders
    Internal,
    /// Visible to the owner only
    Private,
}

impl Visibility {
    /// All levels, least restrictive first
    pub const ALL: [Visibility; 3] = [Visibility::Public, Visibility::Internal, Visibility::Private];

    /// Return whichever of the two levels is more restrictive
    pub fn most_restrictive(self, other: Visibility) -> Visibility {
        self.max(other)
    }

    /// Fold an optional inherited level into this one
    pub fn restricted_by(self, inherited: Option<Visibility>) -> Visibility {
        match inherited {
            Some(level) => self.most_restrictive(level),
            None => self,
        }
    }

    /// Whether this level is strictly more restrictive than `other`
    pub fn is_stricter_than(self, other: Visibility) -> bool {
        self > other
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Internal => "internal",
            Visibility::Private => "private",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Visibility {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "public" => Ok(Visibility::Public),
            "internal" => Ok(Visibility::Internal),
            "private" => Ok(Visibility::Private),
            other => Err(ValidationError::InvalidVisibility(other.to_string())),
        }
    }
}

//! Domain-specific newtypes for type safety.
//!
//! Strongly-typed wrappers keep user, song and session ids from being mixed
//! up with each other or with durations. Uses `derive_more` to eliminate
//! arithmetic boilerplate while maintaining zero-cost abstractions.

use std::fmt;
use std::ops::{AddAssign, Sub, SubAssign};

use derive_more::{Add as DeriveAdd, Display, From, Into};
use serde::{Deserialize, Serialize};

// ============================================================================
// Macros for reducing boilerplate
// ============================================================================

/// Generates common methods for numeric newtypes.
macro_rules! impl_newtype_common {
    ($type:ty) => {
        impl $type {
            /// Create a new instance.
            #[must_use]
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            /// Get the inner value.
            #[must_use]
            pub const fn get(self) -> i64 {
                self.0
            }

            /// Check if the value is zero.
            #[must_use]
            pub const fn is_zero(self) -> bool {
                self.0 == 0
            }
        }
    };
}

/// Generates Sub and assignment trait implementations.
macro_rules! impl_sub_traits {
    ($type:ty) => {
        impl Sub for $type {
            type Output = Self;

            fn sub(self, rhs: Self) -> Self::Output {
                Self(self.0 - rhs.0)
            }
        }

        impl SubAssign for $type {
            fn sub_assign(&mut self, rhs: Self) {
                self.0 -= rhs.0;
            }
        }

        impl AddAssign for $type {
            fn add_assign(&mut self, rhs: Self) {
                self.0 += rhs.0;
            }
        }
    };
}

/// Generates an opaque row identifier.
macro_rules! id_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, From, Into, Display,
            Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Create a new id.
            #[must_use]
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            /// Get the raw database value.
            #[must_use]
            pub const fn get(self) -> i64 {
                self.0
            }
        }
    };
}

// ============================================================================
// Identifiers
// ============================================================================

id_newtype!(
    /// Identifies the listener a session belongs to.
    UserId
);

id_newtype!(
    /// Identifies a song in the catalog.
    SongId
);

id_newtype!(
    /// Primary key of a listening session row.
    SessionId
);

// ============================================================================
// PlayCount
// ============================================================================

/// A play count value.
///
/// Number of sessions attributed to a song, artist or weekday.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    DeriveAdd,
    From,
    Into,
    Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct PlayCount(pub i64);

impl_newtype_common!(PlayCount);
impl_sub_traits!(PlayCount);

impl fmt::Display for PlayCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Milliseconds
// ============================================================================

/// A duration in milliseconds.
///
/// Used for listen durations and aggregated listen times.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    DeriveAdd,
    From,
    Into,
    Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct Milliseconds(pub i64);

impl_newtype_common!(Milliseconds);
impl_sub_traits!(Milliseconds);

impl Milliseconds {
    /// Convert to minutes as a floating point value.
    #[must_use]
    pub fn as_minutes_f64(self) -> f64 {
        self.0 as f64 / 60_000.0
    }

    /// Convert to hours as a floating point value.
    #[must_use]
    pub fn as_hours_f64(self) -> f64 {
        self.0 as f64 / 3_600_000.0
    }

    /// Create from seconds.
    #[must_use]
    pub const fn from_secs(secs: i64) -> Self {
        Self(secs * 1000)
    }

    /// Create from minutes.
    #[must_use]
    pub const fn from_mins(mins: i64) -> Self {
        Self(mins * 60 * 1000)
    }
}

impl fmt::Display for Milliseconds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total_seconds = self.0 / 1000;
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        match (hours, minutes) {
            (0, 0) => write!(f, "{seconds}s"),
            (0, _) => write!(f, "{minutes}m {seconds}s"),
            _ => write!(f, "{hours}h {minutes}m {seconds}s"),
        }
    }
}

impl std::iter::Sum for Milliseconds {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        Self(iter.map(|ms| ms.0).sum())
    }
}

// ============================================================================
// Tests
// ============================================================================

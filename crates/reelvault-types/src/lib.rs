//! Shared domain types for the Reelvault media manager.
//!
//! This crate provides the foundational types used across the Reelvault
//! workspace: the movie lifecycle status and the built-in quality tier
//! table that backs the default `QualityTemplate` rows.
//!
//! No crate in the workspace depends on anything *except* `reelvault-types`
//! for cross-cutting type definitions. This keeps the dependency graph
//! clean and prevents circular dependencies.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a tracked movie.
///
/// Stored in the database as the lowercase strings legacy databases
/// contain (`"want"`, `"deleted"`, …). The store layer does not reject
/// unknown strings; this enum covers the statuses the application itself
/// writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovieStatus {
    /// Wanted but not yet found.
    Want,
    /// A release was found and is being held back (quality wait window).
    Waiting,
    /// A release was grabbed and handed to the downloader.
    Snatched,
    /// Downloaded and renamed into the library.
    Downloaded,
    /// Removed by the user; kept for history.
    Deleted,
}

impl MovieStatus {
    /// Returns the string form stored in the `status` column.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Want => "want",
            Self::Waiting => "waiting",
            Self::Snatched => "snatched",
            Self::Downloaded => "downloaded",
            Self::Deleted => "deleted",
        }
    }

    /// Attempts to parse a stored status string.
    ///
    /// Returns `None` for strings this build does not know about.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "want" => Some(Self::Want),
            "waiting" => Some(Self::Waiting),
            "snatched" => Some(Self::Snatched),
            "downloaded" => Some(Self::Downloaded),
            "deleted" => Some(Self::Deleted),
            _ => None,
        }
    }
}

/// A built-in quality tier.
///
/// Each tier is seeded as one non-custom `QualityTemplate` row with a
/// single `QualityTemplateType` child. The `code` lands in the template's
/// unique `name` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QualityTier {
    /// Unique integer code, stable across releases.
    pub code: i64,
    /// Short identifier used in release matching (e.g. `"1080p"`).
    pub identifier: &'static str,
    /// Human-readable label.
    pub label: &'static str,
}

/// Code of the tier marked as the default template.
pub const DEFAULT_QUALITY_CODE: i64 = 20;

/// All built-in quality tiers, best first. Seeding order is preference
/// order.
pub const QUALITY_TIERS: &[QualityTier] = &[
    QualityTier {
        code: 10,
        identifier: "1080p",
        label: "1080p",
    },
    QualityTier {
        code: 20,
        identifier: "720p",
        label: "720p",
    },
    QualityTier {
        code: 30,
        identifier: "brrip",
        label: "BR-Rip",
    },
    QualityTier {
        code: 40,
        identifier: "dvdr",
        label: "DVD-R",
    },
    QualityTier {
        code: 50,
        identifier: "dvdrip",
        label: "DVD-Rip",
    },
    QualityTier {
        code: 60,
        identifier: "scr",
        label: "Screener",
    },
    QualityTier {
        code: 70,
        identifier: "r5",
        label: "R5",
    },
    QualityTier {
        code: 80,
        identifier: "tc",
        label: "TeleCine",
    },
    QualityTier {
        code: 90,
        identifier: "ts",
        label: "TeleSync",
    },
    QualityTier {
        code: 100,
        identifier: "cam",
        label: "Cam",
    },
];

impl QualityTier {
    /// Looks up a built-in tier by its code.
    pub fn by_code(code: i64) -> Option<&'static QualityTier> {
        QUALITY_TIERS.iter().find(|t| t.code == code)
    }

    /// Looks up a built-in tier by its identifier.
    pub fn by_identifier(identifier: &str) -> Option<&'static QualityTier> {
        QUALITY_TIERS.iter().find(|t| t.identifier == identifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trip() {
        for status in [
            MovieStatus::Want,
            MovieStatus::Waiting,
            MovieStatus::Snatched,
            MovieStatus::Downloaded,
            MovieStatus::Deleted,
        ] {
            assert_eq!(MovieStatus::parse(status.as_str()), Some(status));
        }
    }

    #[test]
    fn status_unknown() {
        assert_eq!(MovieStatus::parse(""), None);
        assert_eq!(MovieStatus::parse("WANT"), None);
        assert_eq!(MovieStatus::parse("ignored"), None);
    }

    #[test]
    fn tier_codes_unique() {
        for (i, a) in QUALITY_TIERS.iter().enumerate() {
            for b in &QUALITY_TIERS[i + 1..] {
                assert_ne!(a.code, b.code, "{} and {}", a.identifier, b.identifier);
                assert_ne!(a.identifier, b.identifier);
            }
        }
    }

    #[test]
    fn tier_lookup() {
        assert_eq!(QualityTier::by_code(10).map(|t| t.identifier), Some("1080p"));
        assert_eq!(QualityTier::by_identifier("cam").map(|t| t.code), Some(100));
        assert!(QualityTier::by_code(11).is_none());
    }

    #[test]
    fn default_tier_exists() {
        assert!(QualityTier::by_code(DEFAULT_QUALITY_CODE).is_some());
    }
}

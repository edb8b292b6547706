//! # Quality Policy Engine
//!
//! Derives per-image encode parameters from dimensions and original size.
//!
//! Larger images tolerate more compression, tiny ones show artifacts
//! immediately, so the baseline qualities from [`Config`] are adjusted by an
//! ordered rule table. The first matching rule wins; the last rule always
//! matches.
//!
//! | band       | predicate                                | primary       | alternate     | compression  |
//! |------------|------------------------------------------|---------------|---------------|--------------|
//! | very large | longest side > 3000 OR size > 3 MiB     | -7, floor 75  | -5, floor 75  | +1, cap 9    |
//! | large      | longest side > 2000 OR size > 1.5 MiB   | -4, floor 78  | -2, floor 78  | unchanged    |
//! | small      | longest side < 800 AND size < 300 KiB   | +8, cap 95    | +8, cap 90    | -2, floor 6  |
//! | default    | otherwise                                | baseline      | baseline      | baseline     |
//!
//! "-n, floor f" is `max(f, q - n)`, so a baseline already below the floor
//! is raised to it.

use crate::config::Config;
use serde::Serialize;
use std::fmt;

const KIB: u64 = 1024;
const MIB: u64 = 1024 * 1024;

/// Size band an image falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Band {
    VeryLarge,
    Large,
    Small,
    Default,
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Band::VeryLarge => "very large",
            Band::Large => "large",
            Band::Small => "small",
            Band::Default => "default",
        };
        f.write_str(name)
    }
}

/// One adjustment applied to a baseline value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Keep,
    Lower { by: u8, floor: u8 },
    Raise { by: u8, cap: u8 },
}

impl Step {
    pub fn apply(self, value: u8) -> u8 {
        match self {
            Step::Keep => value,
            Step::Lower { by, floor } => value.saturating_sub(by).max(floor),
            Step::Raise { by, cap } => value.saturating_add(by).min(cap),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Adjustment {
    primary: Step,
    alternate: Step,
    compression: Step,
}

/// Image facts a rule predicate looks at
#[derive(Debug, Clone, Copy)]
pub struct SizeFacts {
    pub longest_side: u32,
    pub bytes: u64,
}

struct PolicyRule {
    band: Band,
    matches: fn(SizeFacts) -> bool,
    adjust: Adjustment,
}

const RULES: &[PolicyRule] = &[
    PolicyRule {
        band: Band::VeryLarge,
        matches: |f| f.longest_side > 3000 || f.bytes > 3 * MIB,
        adjust: Adjustment {
            primary: Step::Lower { by: 7, floor: 75 },
            alternate: Step::Lower { by: 5, floor: 75 },
            compression: Step::Raise { by: 1, cap: 9 },
        },
    },
    PolicyRule {
        band: Band::Large,
        matches: |f| f.longest_side > 2000 || f.bytes * 2 > 3 * MIB,
        adjust: Adjustment {
            primary: Step::Lower { by: 4, floor: 78 },
            alternate: Step::Lower { by: 2, floor: 78 },
            compression: Step::Keep,
        },
    },
    PolicyRule {
        band: Band::Small,
        matches: |f| f.longest_side < 800 && f.bytes < 300 * KIB,
        adjust: Adjustment {
            primary: Step::Raise { by: 8, cap: 95 },
            alternate: Step::Raise { by: 8, cap: 90 },
            compression: Step::Lower { by: 2, floor: 6 },
        },
    },
    PolicyRule {
        band: Band::Default,
        matches: |_| true,
        adjust: Adjustment {
            primary: Step::Keep,
            alternate: Step::Keep,
            compression: Step::Keep,
        },
    },
];

/// Encode parameters for one file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QualityPolicy {
    pub band: Band,
    pub primary_quality: u8,
    pub alternate_quality: u8,
    pub compression_level: u8,
    pub should_resize: bool,
    pub target_max_dimension: u32,
}

/// Baseline values the rules adjust
#[derive(Debug, Clone, Copy)]
pub struct Baseline {
    pub primary_quality: u8,
    pub alternate_quality: u8,
    pub compression_level: u8,
    pub max_dimension: u32,
}

impl From<&Config> for Baseline {
    fn from(config: &Config) -> Self {
        Self {
            primary_quality: config.jpeg_quality,
            alternate_quality: config.webp_quality,
            compression_level: config.png_compression,
            max_dimension: config.max_dimension,
        }
    }
}

impl Baseline {
    /// Choose the encode parameters for an image
    pub fn choose(&self, width: u32, height: u32, bytes: u64) -> QualityPolicy {
        let facts = SizeFacts {
            longest_side: width.max(height),
            bytes,
        };
        let (band, adjust) = RULES
            .iter()
            .find(|rule| (rule.matches)(facts))
            .map(|rule| (rule.band, rule.adjust))
            .unwrap_or((
                Band::Default,
                Adjustment {
                    primary: Step::Keep,
                    alternate: Step::Keep,
                    compression: Step::Keep,
                },
            ));

        QualityPolicy {
            band,
            primary_quality: adjust.primary.apply(self.primary_quality),
            alternate_quality: adjust.alternate.apply(self.alternate_quality),
            compression_level: adjust.compression.apply(self.compression_level),
            should_resize: facts.longest_side > self.max_dimension,
            target_max_dimension: self.max_dimension,
        }
    }
}

/// Dimensions that fit inside a `max`×`max` box, preserving aspect ratio and
/// never enlarging.
pub fn fit_within(width: u32, height: u32, max: u32) -> (u32, u32) {
    let longest = width.max(height);
    if longest <= max || longest == 0 {
        return (width, height);
    }
    let scale = max as f64 / longest as f64;
    let w = ((width as f64 * scale).round() as u32).clamp(1, max);
    let h = ((height as f64 * scale).round() as u32).clamp(1, max);
    (w, h)
}

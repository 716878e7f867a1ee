use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// How a favicon candidate was discovered.
///
/// Variants are declared in storage order, `raw_value` persists that position. Preference between
/// candidates uses `rank`, which is unrelated to the declaration order.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum IconType {
    Icon,
    AppleIcon,
    AppleIconPrecomposed,
    Guess,
    Local,
    NoneFound,
}

impl IconType {
    pub fn all() -> &'static [Self] {
        &[
            Self::Icon,
            Self::AppleIcon,
            Self::AppleIconPrecomposed,
            Self::Guess,
            Self::Local,
            Self::NoneFound,
        ]
    }

    pub fn rank(self) -> u8 {
        match self {
            Self::AppleIconPrecomposed => 5,
            Self::AppleIcon => 4,
            Self::Icon => 3,
            Self::Local => 2,
            Self::Guess => 1,
            Self::NoneFound => 0,
        }
    }

    /// Returns true when `self` strictly outranks `other`.
    pub fn is_preferred_to(self, other: IconType) -> bool {
        self.rank() > other.rank()
    }

    pub fn cmp_rank(self, other: IconType) -> Ordering {
        self.rank().cmp(&other.rank())
    }

    pub fn raw_value(self) -> i64 {
        match self {
            Self::Icon => 0,
            Self::AppleIcon => 1,
            Self::AppleIconPrecomposed => 2,
            Self::Guess => 3,
            Self::Local => 4,
            Self::NoneFound => 5,
        }
    }

    pub fn from_raw_value(value: i64) -> Option<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|icon_type| icon_type.raw_value() == value)
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "icon" => Some(Self::Icon),
            "apple-icon" | "appleIcon" => Some(Self::AppleIcon),
            "apple-icon-precomposed" | "appleIconPrecomposed" => Some(Self::AppleIconPrecomposed),
            "guess" => Some(Self::Guess),
            "local" => Some(Self::Local),
            "none-found" | "noneFound" => Some(Self::NoneFound),
            _ => None,
        }
    }
}

//! XP, level and garden stage.
//!
//! Level uses a flat divisor: every 100 XP is one level.
//! Garden stage is a wider band on top of XP:
//!   0-99    seed
//!   100-249 sprout
//!   250-499 flower
//!   500+    forest
//! Both are derived from XP and never stored independently.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::notice::{MessageClass, Notice};

/// XP per level
pub const XP_PER_LEVEL: u64 = 100;

/// Stage thresholds, highest first
pub const STAGE_THRESHOLDS: &[(u64, GardenStage)] = &[
    (500, GardenStage::Forest),
    (250, GardenStage::Flower),
    (100, GardenStage::Sprout),
];

/// Qualitative growth band of the user's garden
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GardenStage {
    #[default]
    Seed,
    Sprout,
    Flower,
    Forest,
}

impl GardenStage {
    /// Display name
    pub fn label(&self) -> &'static str {
        match self {
            Self::Seed => "Seed",
            Self::Sprout => "Sprout",
            Self::Flower => "Flower",
            Self::Forest => "Forest",
        }
    }

    /// ASCII glyph for terminal output
    pub fn glyph(&self) -> &'static str {
        match self {
            Self::Seed => "(.)",
            Self::Sprout => "(,)",
            Self::Flower => "{*}",
            Self::Forest => "/^\\",
        }
    }

    /// XP at which this stage begins
    pub fn min_xp(&self) -> u64 {
        match self {
            Self::Seed => 0,
            Self::Sprout => 100,
            Self::Flower => 250,
            Self::Forest => 500,
        }
    }

    /// Following stage, if any
    pub fn next(&self) -> Option<GardenStage> {
        match self {
            Self::Seed => Some(Self::Sprout),
            Self::Sprout => Some(Self::Flower),
            Self::Flower => Some(Self::Forest),
            Self::Forest => None,
        }
    }

    /// Message shown when the garden grows into this stage
    pub fn upgrade_message(&self) -> &'static str {
        match self {
            Self::Seed => "Your garden has been planted.",
            Self::Sprout => "Your seed has sprouted! Keep tending your garden.",
            Self::Flower => "Your garden is in full bloom!",
            Self::Forest => "Your garden has grown into a forest!",
        }
    }
}

impl std::fmt::Display for GardenStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Level for a given XP total
pub fn level_for_xp(xp: u64) -> u32 {
    let level = xp / XP_PER_LEVEL + 1;
    u32::try_from(level).unwrap_or(u32::MAX)
}

/// Garden stage for a given XP total
pub fn stage_for_xp(xp: u64) -> GardenStage {
    STAGE_THRESHOLDS
        .iter()
        .find(|(min, _)| xp >= *min)
        .map(|(_, stage)| *stage)
        .unwrap_or(GardenStage::Seed)
}

/// User progression profile. `level` and `stage` always follow `xp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub xp: u64,
    pub level: u32,
    pub stage: GardenStage,
}

impl Default for Profile {
    fn default() -> Self {
        Self::from_xp(0)
    }
}

impl Profile {
    /// Build a profile with derived fields computed from `xp`
    pub fn from_xp(xp: u64) -> Self {
        Self {
            xp,
            level: level_for_xp(xp),
            stage: stage_for_xp(xp),
        }
    }

    /// Progress within the current level
    pub fn level_progress(&self) -> LevelProgress {
        level_progress(self.xp)
    }

    /// XP still needed for the next stage, `None` at the last stage
    pub fn xp_to_next_stage(&self) -> Option<u64> {
        self.stage
            .next()
            .map(|next| next.min_xp().saturating_sub(self.xp))
    }
}

/// Progress within the current level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelProgress {
    pub level: u32,
    pub xp_in_level: u64,
    pub xp_for_level: u64,
    /// 0.0 - 100.0
    pub percentage: f64,
}

/// Level progress for an XP total
pub fn level_progress(xp: u64) -> LevelProgress {
    let xp_in_level = xp % XP_PER_LEVEL;
    LevelProgress {
        level: level_for_xp(xp),
        xp_in_level,
        xp_for_level: XP_PER_LEVEL,
        percentage: (xp_in_level as f64 / XP_PER_LEVEL as f64 * 100.0).min(100.0),
    }
}

/// Result of applying an XP delta
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XpOutcome {
    pub previous: Profile,
    pub profile: Profile,
    pub gained: u64,
    pub crossed_level: bool,
    pub crossed_stage: bool,
}

impl XpOutcome {
    /// The single notice for this delta: stage > level > plain XP
    pub fn notice(&self) -> Notice {
        if self.crossed_stage {
            Notice::new(
                MessageClass::LevelUp,
                format!("{} {}", self.profile.stage.glyph(), self.profile.stage.upgrade_message()),
            )
        } else if self.crossed_level {
            Notice::new(
                MessageClass::LevelUp,
                format!("Level up! You reached level {}.", self.profile.level),
            )
        } else {
            Notice::new(MessageClass::Xp, format!("+{} xp", self.gained))
        }
    }
}

/// Apply `amount` XP to `current`, returning the new profile and which
/// thresholds were crossed. A zero amount changes nothing.
pub fn add_xp(amount: u64, current: &Profile) -> XpOutcome {
    if amount == 0 {
        debug!("ignoring zero xp award");
    }

    // Re-derive from xp so a hand-built profile cannot carry stale fields
    let previous = Profile::from_xp(current.xp);
    let profile = Profile::from_xp(previous.xp.saturating_add(amount));

    XpOutcome {
        previous,
        profile,
        gained: profile.xp - previous.xp,
        crossed_level: profile.level > previous.level,
        crossed_stage: profile.stage != previous.stage,
    }
}

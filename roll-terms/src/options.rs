/*
Copyright 2021 Robin Marchart

   Licensed under the Apache License, Version 2.0 (the "License");
   you may not use this file except in compliance with the License.
   You may obtain a copy of the License at

       http://www.apache.org/licenses/LICENSE-2.0

   Unless required by applicable law or agreed to in writing, software
   distributed under the License is distributed on an "AS IS" BASIS,
   WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
   See the License for the specific language governing permissions and
   limitations under the License.
*/

#[cfg(feature = "serde-support")]
use serde::{Deserialize, Serialize};

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub enum AdvantageMode {
    Normal,
    Advantage,
    Disadvantage,
}

impl Default for AdvantageMode {
    fn default() -> AdvantageMode {
        AdvantageMode::Normal
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde-support", serde(rename_all = "lowercase"))]
pub enum RollMode {
    Public,
    Gm,
    Blind,
    OwnSelf,
}

impl Default for RollMode {
    fn default() -> RollMode {
        RollMode::Public
    }
}

/// `[major, minor]` damage classification pair, e.g. `["phys", "slashing"]`.
#[derive(Debug, PartialEq, Eq, Clone)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct DamageTag {
    pub major: String,
    pub minor: String,
}

impl DamageTag {
    pub fn new(major: &str, minor: &str) -> DamageTag {
        DamageTag {
            major: major.to_string(),
            minor: minor.to_string(),
        }
    }
}

/// Main die of a d20-style check, read from settings on every configure
/// cycle ("1d20", "2d10", ...).
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct MainDieSpec {
    pub count: u32,
    pub faces: u32,
}

/// Success/failure thresholds propagated into the main die's options.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct CheckThresholds {
    pub critical: Option<u32>,
    pub fumble: Option<u32>,
    pub target_value: Option<i64>,
}

/// Immutable per-roll configuration value. Reconfiguration produces a new
/// value instead of mutating a shared one.
#[derive(Debug, PartialEq, Eq, Clone)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct RollOptions {
    pub advantage_mode: AdvantageMode,
    pub critical: bool,
    pub critical_threshold: Option<u32>,
    pub fumble_threshold: Option<u32>,
    pub target_value: Option<i64>,
    /// One entry per term-group (a group is a run of terms between
    /// operators).
    pub damage_type: Vec<DamageTag>,
    pub critical_bonus_dice: u32,
    pub critical_multiplier: Option<i64>,
    pub multiply_numeric: bool,
    pub m_roll: bool,
    pub roll_mode: RollMode,
    pub flavor: Option<String>,
}

impl Default for RollOptions {
    fn default() -> RollOptions {
        RollOptions {
            advantage_mode: AdvantageMode::Normal,
            critical: false,
            critical_threshold: None,
            fumble_threshold: None,
            target_value: None,
            damage_type: Vec::new(),
            critical_bonus_dice: 0,
            critical_multiplier: None,
            multiply_numeric: false,
            m_roll: false,
            roll_mode: RollMode::Public,
            flavor: None,
        }
    }
}

impl RollOptions {
    pub fn thresholds(&self) -> CheckThresholds {
        CheckThresholds {
            critical: self.critical_threshold,
            fumble: self.fumble_threshold,
            target_value: self.target_value,
        }
    }

    /// Copy with a different advantage mode and roll mode, leaving the
    /// original untouched.
    pub fn with_modes(&self, advantage_mode: AdvantageMode, roll_mode: RollMode) -> RollOptions {
        let mut next = self.clone();
        next.advantage_mode = advantage_mode;
        next.roll_mode = roll_mode;
        next
    }
}

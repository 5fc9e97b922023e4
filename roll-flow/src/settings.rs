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

use roll_terms::{parser::parse_main_die, MainDieSpec, ParseError, RollMode};
use serde::{Deserialize, Serialize};

/// Ruleset configuration. The main die of a check is runtime-configurable,
/// so `main_die_spec` is consulted on every configure cycle rather than
/// cached by the core operations.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesetSettings {
    pub main_dice_type: String,
    pub default_roll_mode: RollMode,
    pub constant_first: bool,
}

impl Default for RulesetSettings {
    fn default() -> RulesetSettings {
        RulesetSettings {
            main_dice_type: "1d20".to_string(),
            default_roll_mode: RollMode::Public,
            constant_first: false,
        }
    }
}

impl RulesetSettings {
    pub fn from_toml_str(raw: &str) -> Result<RulesetSettings, toml::de::Error> {
        toml::from_str(raw)
    }

    pub fn main_die_spec(&self) -> Result<MainDieSpec, ParseError> {
        parse_main_die(&self.main_dice_type)
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn test_defaults() {
        let settings = RulesetSettings::default();
        assert_eq!(
            settings.main_die_spec(),
            Ok(MainDieSpec {
                count: 1,
                faces: 20
            })
        );
        assert_eq!(settings.default_roll_mode, RollMode::Public);
    }

    #[test]
    fn test_from_toml() {
        let settings = RulesetSettings::from_toml_str(
            "main_dice_type = \"2d10\"\ndefault_roll_mode = \"blind\"\n",
        )
        .unwrap();
        assert_eq!(
            settings.main_die_spec(),
            Ok(MainDieSpec {
                count: 2,
                faces: 10
            })
        );
        assert_eq!(settings.default_roll_mode, RollMode::Blind);
    }

    #[test]
    fn test_partial_toml_falls_back() {
        let settings = RulesetSettings::from_toml_str("main_dice_type = \"1d12\"\n").unwrap();
        assert_eq!(settings.default_roll_mode, RollMode::Public);
        assert!(!settings.constant_first);
    }
}

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

use crate::{
    error::ConfigureError,
    options::{AdvantageMode, CheckThresholds, MainDieSpec},
    term::{Term, TermSequence},
};

/// Reconfigure the main die (term[0]) for the given advantage mode. The
/// modifier list is reset before anything is applied, so calling this any
/// number of times with the same inputs leaves the same term state.
/// `main_die` must be re-read from settings by the caller on every cycle.
pub fn configure(
    seq: &mut TermSequence,
    mode: AdvantageMode,
    main_die: MainDieSpec,
    thresholds: &CheckThresholds,
) -> Result<(), ConfigureError> {
    seq.with_terms(|terms| {
        let die = match terms.first_mut() {
            Some(Term::Dice(die)) => die,
            _ => return Err(ConfigureError::MissingMainDie),
        };

        die.modifiers.clear();
        die.options.advantage = false;
        die.options.disadvantage = false;
        die.faces = main_die.faces;

        match mode {
            AdvantageMode::Normal => {
                die.count = main_die.count;
            }
            AdvantageMode::Advantage => {
                die.count = main_die.count.saturating_mul(2);
                die.modifiers.push(format!("kh{}", main_die.count));
                die.options.advantage = true;
            }
            AdvantageMode::Disadvantage => {
                die.count = main_die.count.saturating_mul(2);
                die.modifiers.push(format!("kl{}", main_die.count));
                die.options.disadvantage = true;
            }
        }

        if thresholds.critical.is_some() {
            die.options.critical_threshold = thresholds.critical;
        }
        if thresholds.fumble.is_some() {
            die.options.fumble_threshold = thresholds.fumble;
        }
        if thresholds.target_value.is_some() {
            die.options.target_value = thresholds.target_value;
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::parser::{parse_formula, parse_main_die};
    use crate::term::Term;

    const D20: MainDieSpec = MainDieSpec {
        count: 1,
        faces: 20,
    };

    fn main_die(seq: &TermSequence) -> &crate::term::DiceTerm {
        match &seq.terms()[0] {
            Term::Dice(d) => d,
            other => panic!("expected dice term, got {:?}", other),
        }
    }

    #[test]
    fn test_advantage() {
        let mut seq = parse_formula("1d20 + 5").unwrap();
        configure(
            &mut seq,
            AdvantageMode::Advantage,
            D20,
            &CheckThresholds::default(),
        )
        .unwrap();
        assert_eq!(seq.formula(), "2d20kh1 + 5");
        let die = main_die(&seq);
        assert_eq!(die.count, 2);
        assert_eq!(die.modifiers, vec!["kh1".to_string()]);
        assert!(die.options.advantage);
        assert!(!die.options.disadvantage);
    }

    #[test]
    fn test_disadvantage() {
        let mut seq = parse_formula("1d20 + 5").unwrap();
        configure(
            &mut seq,
            AdvantageMode::Disadvantage,
            D20,
            &CheckThresholds::default(),
        )
        .unwrap();
        assert_eq!(seq.formula(), "2d20kl1 + 5");
        assert!(main_die(&seq).options.disadvantage);
    }

    #[test]
    fn test_normal() {
        let mut seq = parse_formula("1d20 + 5").unwrap();
        configure(
            &mut seq,
            AdvantageMode::Normal,
            D20,
            &CheckThresholds::default(),
        )
        .unwrap();
        assert_eq!(seq.formula(), "1d20 + 5");
        assert!(main_die(&seq).modifiers.is_empty());
    }

    #[test]
    fn test_idempotent() {
        let mut seq = parse_formula("1d20 + 5").unwrap();
        configure(
            &mut seq,
            AdvantageMode::Advantage,
            D20,
            &CheckThresholds::default(),
        )
        .unwrap();
        let once = seq.clone();
        for _ in 0..3 {
            configure(
                &mut seq,
                AdvantageMode::Advantage,
                D20,
                &CheckThresholds::default(),
            )
            .unwrap();
        }
        assert_eq!(seq, once);
    }

    #[test]
    fn test_mode_switch_resets_modifiers() {
        let mut seq = parse_formula("1d20").unwrap();
        configure(
            &mut seq,
            AdvantageMode::Advantage,
            D20,
            &CheckThresholds::default(),
        )
        .unwrap();
        configure(
            &mut seq,
            AdvantageMode::Normal,
            D20,
            &CheckThresholds::default(),
        )
        .unwrap();
        assert_eq!(seq.formula(), "1d20");
        let die = main_die(&seq);
        assert!(die.modifiers.is_empty());
        assert!(!die.options.advantage);
    }

    #[test]
    fn test_configurable_main_die() {
        let spec = parse_main_die("2d10").unwrap();
        let mut seq = parse_formula("2d10 + 1").unwrap();
        configure(
            &mut seq,
            AdvantageMode::Advantage,
            spec,
            &CheckThresholds::default(),
        )
        .unwrap();
        assert_eq!(seq.formula(), "4d10kh2 + 1");
    }

    #[test]
    fn test_thresholds_propagate() {
        let mut seq = parse_formula("1d20").unwrap();
        let thresholds = CheckThresholds {
            critical: Some(19),
            fumble: Some(1),
            target_value: Some(15),
        };
        configure(&mut seq, AdvantageMode::Normal, D20, &thresholds).unwrap();
        let die = main_die(&seq);
        assert_eq!(die.options.critical_threshold, Some(19));
        assert_eq!(die.options.fumble_threshold, Some(1));
        assert_eq!(die.options.target_value, Some(15));
    }

    #[test]
    fn test_missing_main_die() {
        let mut seq = parse_formula("5 + 1d20").unwrap();
        assert_eq!(
            configure(
                &mut seq,
                AdvantageMode::Advantage,
                D20,
                &CheckThresholds::default()
            ),
            Err(ConfigureError::MissingMainDie)
        );
        assert_eq!(seq.formula(), "5 + 1d20");
    }
}

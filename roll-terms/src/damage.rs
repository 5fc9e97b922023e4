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
    limits::DiceLimits,
    options::{DamageTag, RollOptions},
    term::{CritBonus, NumericTerm, Term, TermSequence},
};

#[cfg(feature = "parser")]
use crate::parser::parse_formula;

/// Number of term-groups: a group is a run of terms between operators.
fn count_groups(terms: &[Term]) -> usize {
    let mut groups = 0;
    let mut after_operator = true;
    for term in terms {
        if term.is_operator() {
            after_operator = true;
        } else {
            if after_operator {
                groups += 1;
            }
            after_operator = false;
        }
    }
    groups
}

/// Assign per-group damage types and expand the sequence for critical hits.
///
/// Dice counts and numeric values restart from `base_number` on every call,
/// and the critical bonus lives in the sequence's side-channel, so the
/// operation is idempotent and restartable: configuring for a critical and
/// then reconfiguring without one returns the sequence to its base shape.
pub fn configure(seq: &mut TermSequence, options: &RollOptions) -> Result<(), ConfigureError> {
    let groups = count_groups(seq.terms());
    if options.damage_type.len() < groups {
        return Err(ConfigureError::LengthMismatch {
            expected: groups,
            actual: options.damage_type.len(),
        });
    }

    let critical = options.critical;
    let multiplier = options.critical_multiplier.unwrap_or(2);
    let bonus_dice = options.critical_bonus_dice;
    let multiply_numeric = options.multiply_numeric;
    let damage_type = &options.damage_type;

    // a failed walk must not leave half-tagged terms behind
    let snapshot = seq.clone();

    let walked = seq.with_terms(|terms| -> Result<Option<CritBonus>, ConfigureError> {
        let mut group = 0usize;
        let mut after_operator = true;
        let mut first_dice: Option<usize> = None;
        let mut crit_bonus: i64 = 0;

        for (i, term) in terms.iter_mut().enumerate() {
            if term.is_operator() {
                after_operator = true;
                continue;
            }
            if after_operator {
                group += 1;
            }
            after_operator = false;
            let tag: &DamageTag = &damage_type[group - 1];

            match term {
                Term::Dice(die) => {
                    let base = *die
                        .options
                        .base_number
                        .get_or_insert(i64::from(die.count));
                    die.count = base as u32;
                    die.options.damage_type = Some(tag.clone());
                    if critical {
                        crit_bonus = crit_bonus
                            .checked_add(die.max())
                            .ok_or(ConfigureError::Overflow)?;
                        die.options.critical = true;
                    } else {
                        die.options.critical = false;
                    }
                    if first_dice.is_none() {
                        first_dice = Some(i);
                    }
                }
                Term::Numeric(num) => {
                    let base = *num.options.base_number.get_or_insert(num.value);
                    num.value = base;
                    num.options.damage_type = Some(tag.clone());
                    if critical && multiply_numeric {
                        num.value = base
                            .checked_mul(multiplier)
                            .ok_or(ConfigureError::Overflow)?;
                        num.options.critical = true;
                    } else {
                        num.options.critical = false;
                    }
                }
                Term::Operator(_) => unreachable!(),
            }
        }

        if critical {
            if let Some(idx) = first_dice {
                if let Term::Dice(die) = &mut terms[idx] {
                    die.count = die.count.saturating_add(bonus_dice);
                }
            }
            let mut bonus = NumericTerm::flavored(crit_bonus, "Crit");
            bonus.options.critical = true;
            // the bonus anchors right after the first term; see DESIGN.md on
            // this display convention
            Ok(Some(CritBonus {
                anchor: 0,
                term: bonus,
            }))
        } else {
            Ok(None)
        }
    });
    let crit_bonus = match walked {
        Ok(bonus) => bonus,
        Err(e) => {
            *seq = snapshot;
            return Err(e);
        }
    };

    seq.set_crit_bonus(crit_bonus);
    Ok(())
}

/// Build one damage sequence from `(formula, tags)` parts. Every part is
/// parsed and configured on its own, so each carries its own critical bonus,
/// then the parts are joined with `+` operators. A part's tag list is padded
/// with its last tag when the formula has more term-groups than tags.
#[cfg(feature = "parser")]
pub fn damage_parts(
    parts: &[(String, Vec<DamageTag>)],
    options: &RollOptions,
) -> Result<TermSequence, ConfigureError> {
    let mut combined: Vec<Term> = Vec::new();
    for (formula, tags) in parts {
        let mut part = parse_formula(formula)?;
        let groups = count_groups(part.terms());
        let mut part_tags = tags.clone();
        if let Some(last) = part_tags.last().cloned() {
            while part_tags.len() < groups {
                part_tags.push(last.clone());
            }
        }
        let mut part_options = options.clone();
        part_options.damage_type = part_tags;
        configure(&mut part, &part_options)?;
        if !combined.is_empty() {
            combined.push(Term::Operator(crate::term::Operator::Add));
        }
        combined.extend(part.rendered());
    }
    Ok(TermSequence::from_terms(combined))
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::term::DiceTerm;

    fn phys(minor: &str) -> DamageTag {
        DamageTag::new("phys", minor)
    }

    fn dice_term(seq: &TermSequence, idx: usize) -> &DiceTerm {
        match &seq.terms()[idx] {
            Term::Dice(d) => d,
            other => panic!("expected dice term, got {:?}", other),
        }
    }

    #[test]
    fn test_assigns_damage_types_per_group() {
        let mut seq = parse_formula("2d6 + 3").unwrap();
        let mut options = RollOptions::default();
        options.damage_type = vec![phys("slashing"), phys("bludgeoning")];
        configure(&mut seq, &options).unwrap();
        assert_eq!(
            dice_term(&seq, 0).options.damage_type,
            Some(phys("slashing"))
        );
        match &seq.terms()[2] {
            Term::Numeric(n) => {
                assert_eq!(n.options.damage_type, Some(phys("bludgeoning")))
            }
            other => panic!("expected numeric term, got {:?}", other),
        }
    }

    #[test]
    fn test_length_mismatch_fails_before_mutation() {
        let mut seq = parse_formula("2d6 + 1d4").unwrap();
        let before = seq.clone();
        let mut options = RollOptions::default();
        options.damage_type = vec![phys("slashing")];
        assert_eq!(
            configure(&mut seq, &options),
            Err(ConfigureError::LengthMismatch {
                expected: 2,
                actual: 1
            })
        );
        assert_eq!(seq, before);
    }

    #[test]
    fn test_critical_inserts_bonus_after_first_term() {
        let mut seq = parse_formula("2d6 + 1d4").unwrap();
        let mut options = RollOptions::default();
        options.damage_type = vec![phys("slashing"), phys("piercing")];
        options.critical = true;
        configure(&mut seq, &options).unwrap();
        // 2*6 + 1*4 accumulated across dice terms, anchored after term[0]
        assert_eq!(seq.formula(), "2d6[slashing] + 16[Crit] + 1d4[piercing]");
        assert_eq!(dice_term(&seq, 0).count, 2);
        assert_eq!(dice_term(&seq, 2).count, 1);
        assert!(seq.is_critical());
    }

    #[test]
    fn test_critical_is_idempotent() {
        let mut seq = parse_formula("2d6 + 3").unwrap();
        let mut options = RollOptions::default();
        options.damage_type = vec![phys("slashing"), phys("slashing")];
        options.critical = true;
        configure(&mut seq, &options).unwrap();
        let once = seq.clone();
        configure(&mut seq, &options).unwrap();
        configure(&mut seq, &options).unwrap();
        assert_eq!(seq, once);
    }

    #[test]
    fn test_critical_then_normal_restores_base() {
        let mut seq = parse_formula("2d6 + 3").unwrap();
        let mut options = RollOptions::default();
        options.damage_type = vec![phys("slashing"), phys("slashing")];
        options.critical = true;
        options.critical_bonus_dice = 1;
        configure(&mut seq, &options).unwrap();
        assert_eq!(dice_term(&seq, 0).count, 3);
        assert!(seq.crit_bonus().is_some());

        options.critical = false;
        options.critical_bonus_dice = 0;
        configure(&mut seq, &options).unwrap();
        assert_eq!(dice_term(&seq, 0).count, 2);
        assert!(seq.crit_bonus().is_none());
        assert!(!seq.is_critical());
        assert_eq!(seq.formula(), "2d6[slashing] + 3[slashing]");
    }

    #[test]
    fn test_critical_bonus_dice_only_on_first_dice_term() {
        let mut seq = parse_formula("2d6 + 1d4").unwrap();
        let mut options = RollOptions::default();
        options.damage_type = vec![phys("slashing"), phys("piercing")];
        options.critical = true;
        options.critical_bonus_dice = 2;
        configure(&mut seq, &options).unwrap();
        assert_eq!(dice_term(&seq, 0).count, 4);
        assert_eq!(dice_term(&seq, 2).count, 1);
        // the flat bonus derives from base counts, not the padded one
        assert_eq!(seq.crit_bonus().unwrap().term.value, 16);
    }

    #[test]
    fn test_multiply_numeric() {
        let mut seq = parse_formula("1d8 + 4").unwrap();
        let mut options = RollOptions::default();
        options.damage_type = vec![phys("piercing"), phys("piercing")];
        options.critical = true;
        options.multiply_numeric = true;
        options.critical_multiplier = Some(3);
        configure(&mut seq, &options).unwrap();
        match &seq.terms()[2] {
            Term::Numeric(n) => {
                assert_eq!(n.value, 12);
                assert_eq!(n.options.base_number, Some(4));
                assert!(n.options.critical);
            }
            other => panic!("expected numeric term, got {:?}", other),
        }
        // and back down when reconfigured without the critical
        options.critical = false;
        configure(&mut seq, &options).unwrap();
        match &seq.terms()[2] {
            Term::Numeric(n) => assert_eq!(n.value, 4),
            other => panic!("expected numeric term, got {:?}", other),
        }
    }

    #[test]
    fn test_overflow_leaves_terms_unchanged() {
        // the numeric overflows after the leading dice term was walked
        let mut seq = parse_formula("1d6 + 9223372036854775807").unwrap();
        let before = seq.clone();
        let mut options = RollOptions::default();
        options.damage_type = vec![phys("fire"), phys("fire")];
        options.critical = true;
        options.multiply_numeric = true;
        assert_eq!(
            configure(&mut seq, &options),
            Err(ConfigureError::Overflow)
        );
        assert_eq!(seq, before);
    }

    #[test]
    fn test_damage_parts_scenario() {
        // damage parts [["2d6", phys/slashing], ["1d4", phys/piercing]] with
        // critical and no bonus dice
        let parts = vec![
            ("2d6".to_string(), vec![phys("slashing")]),
            ("1d4".to_string(), vec![phys("piercing")]),
        ];
        let mut options = RollOptions::default();
        options.critical = true;
        let seq = damage_parts(&parts, &options).unwrap();
        assert!(seq.formula().contains("+ 12[Crit]"));
        assert!(seq.formula().contains("+ 4[Crit]"));
        let dice: Vec<&DiceTerm> = seq
            .terms()
            .iter()
            .filter_map(|t| match t {
                Term::Dice(d) => Some(d),
                _ => None,
            })
            .collect();
        assert_eq!(dice[0].count, 2);
        assert_eq!(dice[1].count, 1);
    }

    #[test]
    fn test_damage_parts_without_critical() {
        let parts = vec![
            ("2d6".to_string(), vec![phys("slashing")]),
            ("3".to_string(), vec![phys("slashing")]),
        ];
        let seq = damage_parts(&parts, &RollOptions::default()).unwrap();
        assert_eq!(seq.formula(), "2d6[slashing] + 3[slashing]");
    }

    #[test]
    fn test_damage_parts_pads_short_tag_list() {
        let parts = vec![("2d6 + 3".to_string(), vec![phys("fire")])];
        let seq = damage_parts(&parts, &RollOptions::default()).unwrap();
        assert_eq!(seq.formula(), "2d6[fire] + 3[fire]");
    }

    #[test]
    fn test_damage_parts_without_tags_fails() {
        let parts = vec![("2d6".to_string(), Vec::new())];
        assert!(damage_parts(&parts, &RollOptions::default()).is_err());
    }
}

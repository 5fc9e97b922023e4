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

use crate::{error::EvalError, term::Operator};

#[cfg(feature = "roll")]
use crate::term::{DiceTerm, Keep, Term, TermSequence};
#[cfg(feature = "roll")]
use rand::{distributions::Uniform, Rng};

#[cfg(all(feature = "roll", feature = "logging"))]
use log::debug;

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum FoldItem {
    Value(i64),
    Op(Operator),
}

/// Fold a flat value/operator list with `* /` binding tighter than `+ -`.
/// A leading `+`/`-` acts as the sign of the first value. All arithmetic is
/// checked.
pub fn fold_items(items: &[FoldItem]) -> Result<i64, EvalError> {
    let mut groups: Vec<(Operator, i64)> = Vec::new();
    let mut pending = Operator::Add;
    let mut pending_muldiv: Option<Operator> = None;
    let mut expect_value = true;

    for item in items {
        match item {
            FoldItem::Value(v) => {
                match pending_muldiv.take() {
                    Some(op) => {
                        let last = groups.last_mut().ok_or(EvalError::Malformed)?;
                        last.1 = match op {
                            Operator::Mul => {
                                last.1.checked_mul(*v).ok_or(EvalError::Overflow)?
                            }
                            Operator::Div => {
                                if *v == 0 {
                                    return Err(EvalError::DivideByZero);
                                }
                                last.1.checked_div(*v).ok_or(EvalError::Overflow)?
                            }
                            _ => unreachable!(),
                        };
                    }
                    None => {
                        groups.push((pending, *v));
                        pending = Operator::Add;
                    }
                }
                expect_value = false;
            }
            FoldItem::Op(op) => match op {
                Operator::Add | Operator::Sub => {
                    if expect_value {
                        // consecutive +/- fold into a sign
                        if *op == Operator::Sub {
                            pending = match pending {
                                Operator::Add => Operator::Sub,
                                _ => Operator::Add,
                            };
                        }
                    } else {
                        pending = *op;
                    }
                    expect_value = true;
                }
                Operator::Mul | Operator::Div => {
                    if expect_value || pending_muldiv.is_some() {
                        return Err(EvalError::Malformed);
                    }
                    pending_muldiv = Some(*op);
                    expect_value = true;
                }
            },
        }
    }
    if expect_value && !items.is_empty() {
        return Err(EvalError::Malformed);
    }

    let mut total: i64 = 0;
    for (op, v) in groups {
        total = match op {
            Operator::Add => total.checked_add(v).ok_or(EvalError::Overflow)?,
            Operator::Sub => total.checked_sub(v).ok_or(EvalError::Overflow)?,
            _ => unreachable!(),
        };
    }
    Ok(total)
}

/// Outcome of one dice term: raw rolls, rolls kept after `kh`/`kl`, and
/// their sum.
#[cfg(feature = "roll")]
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct DieRoll {
    pub formula: String,
    pub rolls: Vec<i64>,
    pub kept: Vec<i64>,
    pub total: i64,
}

#[cfg(feature = "roll")]
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct RollOutcome {
    pub total: i64,
    pub dice: Vec<DieRoll>,
    /// Kept sum of term[0] when it is a dice term, for threshold labeling.
    pub main_die_total: Option<i64>,
}

#[cfg(feature = "roll")]
fn roll_dice_term<R: Rng>(dice: &DiceTerm, rng: &mut R) -> DieRoll {
    let dist = Uniform::new_inclusive(1, i64::from(dice.faces.max(1)));
    let mut rolls: Vec<i64> = Vec::with_capacity(dice.count as usize);
    for _ in 0..dice.count {
        rolls.push(rng.sample::<i64, _>(dist));
    }
    let kept = match dice.keep_spec() {
        Some((keep, n)) => {
            let mut sorted = rolls.clone();
            sorted.sort_unstable();
            let n = (n as usize).min(sorted.len());
            match keep {
                Keep::Highest => sorted[sorted.len() - n..].to_vec(),
                Keep::Lowest => sorted[..n].to_vec(),
            }
        }
        None => {
            for m in &dice.modifiers {
                if !m.starts_with("kh") && !m.starts_with("kl") {
                    #[cfg(feature = "logging")]
                    debug!("ignoring unsupported dice modifier {}", m);
                }
            }
            rolls.clone()
        }
    };
    let total = kept.iter().sum();
    DieRoll {
        formula: dice.to_string(),
        rolls,
        kept,
        total,
    }
}

/// Resolve every dice term in `terms` exactly once against `rng` and fold
/// the resulting values.
#[cfg(feature = "roll")]
pub fn evaluate_terms<R: Rng>(terms: &[Term], rng: &mut R) -> Result<RollOutcome, EvalError> {
    let mut items: Vec<FoldItem> = Vec::with_capacity(terms.len());
    let mut dice: Vec<DieRoll> = Vec::new();
    let mut main_die_total: Option<i64> = None;

    for (i, term) in terms.iter().enumerate() {
        match term {
            Term::Operator(op) => items.push(FoldItem::Op(*op)),
            Term::Dice(d) => {
                let roll = roll_dice_term(d, rng);
                if i == 0 {
                    main_die_total = Some(roll.total);
                }
                items.push(FoldItem::Value(roll.total));
                dice.push(roll);
            }
            Term::Numeric(n) => {
                if let Some(name) = &n.options.placeholder {
                    return Err(EvalError::UnresolvedPlaceholder(name.clone()));
                }
                items.push(FoldItem::Value(n.value));
            }
        }
    }

    let total = fold_items(&items)?;

    #[cfg(feature = "logging")]
    debug!("evaluated {:?} to {}", terms, total);

    Ok(RollOutcome {
        total,
        dice,
        main_die_total,
    })
}

#[cfg(feature = "roll")]
pub fn evaluate_sequence<R: Rng>(
    seq: &TermSequence,
    rng: &mut R,
) -> Result<RollOutcome, EvalError> {
    evaluate_terms(&seq.rendered(), rng)
}

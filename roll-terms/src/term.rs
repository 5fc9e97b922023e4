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

use crate::options::DamageTag;
use std::fmt;

#[cfg(feature = "serde-support")]
use serde::{Deserialize, Serialize};

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
}

impl Operator {
    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Mul => "*",
            Operator::Div => "/",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Per-term annotations. `base_number` remembers the pre-critical count or
/// value and is written exactly once, so reconfiguration can always restart
/// from base state.
#[derive(Debug, PartialEq, Eq, Clone, Default)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct TermOptions {
    pub flavor: Option<String>,
    pub critical: bool,
    pub damage_type: Option<DamageTag>,
    pub base_number: Option<i64>,
    pub advantage: bool,
    pub disadvantage: bool,
    pub critical_threshold: Option<u32>,
    pub fumble_threshold: Option<u32>,
    pub target_value: Option<i64>,
    pub placeholder: Option<String>,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Keep {
    Highest,
    Lowest,
}

#[derive(Debug, PartialEq, Eq, Clone)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct DiceTerm {
    pub count: u32,
    pub faces: u32,
    pub modifiers: Vec<String>,
    pub options: TermOptions,
}

impl DiceTerm {
    pub fn new(count: u32, faces: u32) -> DiceTerm {
        DiceTerm {
            count,
            faces,
            modifiers: Vec::new(),
            options: TermOptions::default(),
        }
    }

    /// First `kh`/`kl` modifier, if any, as a keep instruction.
    pub fn keep_spec(&self) -> Option<(Keep, u32)> {
        self.modifiers.iter().find_map(|m| {
            let (keep, rest) = if m.starts_with("kh") {
                (Keep::Highest, &m[2..])
            } else if m.starts_with("kl") {
                (Keep::Lowest, &m[2..])
            } else {
                return None;
            };
            let n = if rest.is_empty() {
                1
            } else {
                rest.parse::<u32>().ok()?
            };
            Some((keep, n))
        })
    }

    /// Number of dice contributing to the result after keep modifiers.
    pub fn kept_count(&self) -> u32 {
        match self.keep_spec() {
            Some((_, n)) => n.min(self.count),
            None => self.count,
        }
    }
}

impl TermOptions {
    /// Bracket annotation shown after the term: explicit flavor first,
    /// otherwise the minor damage tag.
    pub fn annotation(&self) -> Option<&str> {
        self.flavor
            .as_deref()
            .or_else(|| self.damage_type.as_ref().map(|t| t.minor.as_str()))
    }
}

impl fmt::Display for DiceTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d{}", self.count, self.faces)?;
        for m in &self.modifiers {
            f.write_str(m)?;
        }
        if let Some(annotation) = self.options.annotation() {
            write!(f, "[{}]", annotation)?;
        }
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct NumericTerm {
    pub value: i64,
    pub options: TermOptions,
}

impl NumericTerm {
    pub fn new(value: i64) -> NumericTerm {
        NumericTerm {
            value,
            options: TermOptions::default(),
        }
    }

    pub fn flavored(value: i64, flavor: &str) -> NumericTerm {
        let mut term = NumericTerm::new(value);
        term.options.flavor = Some(flavor.to_string());
        term
    }

    /// Sentinel standing in for an unresolved `@name` variable.
    pub fn placeholder(name: &str) -> NumericTerm {
        let mut term = NumericTerm::new(0);
        term.options.placeholder = Some(name.to_string());
        term
    }
}

impl fmt::Display for NumericTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = &self.options.placeholder {
            return write!(f, "@{}", name);
        }
        write!(f, "{}", self.value)?;
        if let Some(annotation) = self.options.annotation() {
            write!(f, "[{}]", annotation)?;
        }
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub enum Term {
    Operator(Operator),
    Dice(DiceTerm),
    Numeric(NumericTerm),
}

impl Term {
    pub fn is_operator(&self) -> bool {
        matches!(self, Term::Operator(_))
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Operator(op) => op.fmt(f),
            Term::Dice(dice) => dice.fmt(f),
            Term::Numeric(num) => num.fmt(f),
        }
    }
}

/// Critical-bonus annotation kept out of the base term list. The rendered
/// sequence splices `+ <term>` in after `anchor`, so reconfiguration rebuilds
/// it from base state instead of accumulating spliced terms.
#[derive(Debug, PartialEq, Eq, Clone)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct CritBonus {
    pub anchor: usize,
    pub term: NumericTerm,
}

/// Ordered term list with its cached display formula. The formula is only
/// ever recomputed from the terms, never edited directly.
#[derive(Debug, PartialEq, Eq, Clone)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct TermSequence {
    terms: Vec<Term>,
    crit_bonus: Option<CritBonus>,
    formula: String,
}

impl TermSequence {
    pub fn from_terms(terms: Vec<Term>) -> TermSequence {
        let mut seq = TermSequence {
            terms,
            crit_bonus: None,
            formula: String::new(),
        };
        seq.recompute_formula();
        seq
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    pub fn formula(&self) -> &str {
        &self.formula
    }

    pub fn crit_bonus(&self) -> Option<&CritBonus> {
        self.crit_bonus.as_ref()
    }

    /// Base terms with the critical annotation spliced in.
    pub fn rendered(&self) -> Vec<Term> {
        let mut terms = self.terms.clone();
        if let Some(bonus) = &self.crit_bonus {
            let at = (bonus.anchor + 1).min(terms.len());
            terms.insert(at, Term::Operator(Operator::Add));
            terms.insert(at + 1, Term::Numeric(bonus.term.clone()));
        }
        terms
    }

    pub fn recompute_formula(&mut self) {
        self.formula = render_terms(&self.rendered());
    }

    /// Mutable access to the base terms; recomputes the formula afterwards.
    pub fn with_terms<F, T>(&mut self, f: F) -> T
    where
        F: FnOnce(&mut Vec<Term>) -> T,
    {
        let result = f(&mut self.terms);
        self.recompute_formula();
        result
    }

    pub fn set_crit_bonus(&mut self, bonus: Option<CritBonus>) {
        self.crit_bonus = bonus;
        self.recompute_formula();
    }

    /// Append terms, inserting a joining `+` when `terms` does not already
    /// lead with an operator.
    pub fn append_terms(&mut self, terms: Vec<Term>) {
        if terms.is_empty() {
            return;
        }
        if !self.terms.is_empty() && !terms[0].is_operator() {
            self.terms.push(Term::Operator(Operator::Add));
        }
        self.terms.extend(terms);
        self.recompute_formula();
    }

    /// Replace the first placeholder sentinel named `name` with a concrete
    /// numeric carrying `value`. Returns false when no such sentinel exists.
    pub fn resolve_placeholder(&mut self, name: &str, value: i64) -> bool {
        for term in self.terms.iter_mut() {
            if let Term::Numeric(num) = term {
                if num.options.placeholder.as_deref() == Some(name) {
                    let mut resolved = NumericTerm::new(value);
                    resolved.options.flavor = Some(name.to_string());
                    *term = Term::Numeric(resolved);
                    self.recompute_formula();
                    return true;
                }
            }
        }
        false
    }

    /// Names of all still-unresolved placeholder sentinels.
    pub fn unresolved_placeholders(&self) -> Vec<String> {
        self.terms
            .iter()
            .filter_map(|t| match t {
                Term::Numeric(n) => n.options.placeholder.clone(),
                _ => None,
            })
            .collect()
    }

    pub fn is_critical(&self) -> bool {
        self.crit_bonus.is_some()
            || self.terms.iter().any(|t| match t {
                Term::Dice(d) => d.options.critical,
                Term::Numeric(n) => n.options.critical,
                Term::Operator(_) => false,
            })
    }
}

impl fmt::Display for TermSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.formula)
    }
}

pub fn render_terms(terms: &[Term]) -> String {
    let mut out = String::new();
    for term in terms {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(&term.to_string());
    }
    out
}

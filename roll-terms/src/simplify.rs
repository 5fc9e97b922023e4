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
    error::ConstantEvalError,
    eval::{fold_items, FoldItem},
    parser::parse_formula,
    term::{render_terms, Operator, Term, TermSequence},
};

#[cfg(feature = "logging")]
use log::warn;

/// Safe constant folding: parse `expr` as a dice-free sequence and fold it
/// with checked arithmetic. Never panics, never rolls.
pub fn evaluate_constant(expr: &str) -> Result<i64, ConstantEvalError> {
    let seq = parse_formula(expr).map_err(ConstantEvalError::Parse)?;
    let mut items: Vec<FoldItem> = Vec::with_capacity(seq.terms().len());
    for term in seq.terms() {
        match term {
            Term::Operator(op) => items.push(FoldItem::Op(*op)),
            Term::Numeric(n) if n.options.placeholder.is_none() => {
                items.push(FoldItem::Value(n.value))
            }
            _ => return Err(ConstantEvalError::NonConstant),
        }
    }
    fold_items(&items).map_err(ConstantEvalError::Eval)
}

fn simplifiable(term: &Term) -> bool {
    match term {
        Term::Dice(_) => true,
        Term::Operator(Operator::Add) | Term::Operator(Operator::Sub) => true,
        Term::Operator(_) => false,
        // annotated numerics keep their annotation and are treated as
        // rollable below; unresolved sentinels block simplification
        Term::Numeric(n) => n.options.placeholder.is_none(),
    }
}

fn is_plain_numeric(term: &Term) -> bool {
    match term {
        Term::Numeric(n) => {
            n.options.placeholder.is_none()
                && n.options.flavor.is_none()
                && n.options.damage_type.is_none()
        }
        _ => false,
    }
}

/// Render a partition group, dropping meaningless leading `+` operators.
fn render_group(terms: &[Term]) -> String {
    let start = terms
        .iter()
        .position(|t| !matches!(t, Term::Operator(Operator::Add)))
        .unwrap_or(terms.len());
    render_terms(&terms[start..])
}

fn join_parts(first: &str, second: &str) -> String {
    if first.is_empty() {
        return second.to_string();
    }
    if second.is_empty() {
        return first.to_string();
    }
    if let Some(rest) = second.strip_prefix('-') {
        return format!("{} - {}", first, rest.trim_start());
    }
    if let Some(rest) = second.strip_prefix("+ ") {
        return format!("{} + {}", first, rest);
    }
    format!("{} + {}", first, second)
}

/// Partition a sequence into rollable and constant parts, fold the constant
/// part, and return the canonical minimal formula. Sequences containing any
/// unsupported term come back verbatim.
pub fn simplify(seq: &TermSequence, constant_first: bool) -> String {
    let rendered = seq.rendered();
    if !rendered.iter().all(simplifiable) {
        return seq.formula().to_string();
    }

    let mut op_buffer: Vec<Term> = Vec::new();
    let mut rollable: Vec<Term> = Vec::new();
    let mut constant: Vec<Term> = Vec::new();
    for term in rendered {
        if term.is_operator() {
            op_buffer.push(term);
        } else if is_plain_numeric(&term) {
            constant.append(&mut op_buffer);
            constant.push(term);
        } else {
            rollable.append(&mut op_buffer);
            rollable.push(term);
        }
    }

    let rollable_str = render_group(&rollable);
    let mut constant_str = render_group(&constant);
    if !constant_str.is_empty() {
        match evaluate_constant(&constant_str) {
            Ok(value) => constant_str = value.to_string(),
            Err(_e) => {
                #[cfg(feature = "logging")]
                warn!("constant part {:?} not folded: {}", constant_str, _e);
            }
        }
    }

    let joined = if constant_first {
        join_parts(&constant_str, &rollable_str)
    } else {
        join_parts(&rollable_str, &constant_str)
    };

    match parse_formula(&joined) {
        Ok(canonical) => canonical.formula().to_string(),
        Err(_e) => {
            #[cfg(feature = "logging")]
            warn!("simplified formula {:?} did not re-parse: {}", joined, _e);
            joined
        }
    }
}

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

use std::{error::Error, fmt};

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ParseError {
    pub input: String,
}

impl ParseError {
    pub fn new(input: &str) -> ParseError {
        ParseError {
            input: input.to_string(),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unparseable formula: {:?}", self.input)
    }
}

impl Error for ParseError {}

/// Shape/precondition failures of the configure operations. These fail fast,
/// before any term is mutated.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ConfigureError {
    /// `damage_type` carries fewer entries than the sequence has term-groups.
    LengthMismatch { expected: usize, actual: usize },
    /// term[0] is not a dice term, so there is no main die to reconfigure.
    MissingMainDie,
    Overflow,
    Parse(ParseError),
}

impl fmt::Display for ConfigureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigureError::LengthMismatch { expected, actual } => write!(
                f,
                "damage type list has {} entries but the formula has {} term-groups",
                actual, expected
            ),
            ConfigureError::MissingMainDie => f.write_str("first term is not a dice term"),
            ConfigureError::Overflow => f.write_str("numeric overflow while configuring"),
            ConfigureError::Parse(e) => e.fmt(f),
        }
    }
}

impl Error for ConfigureError {}

impl From<ParseError> for ConfigureError {
    fn from(e: ParseError) -> ConfigureError {
        ConfigureError::Parse(e)
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum EvalError {
    DivideByZero,
    Overflow,
    /// Operators and values do not alternate in a foldable way.
    Malformed,
    UnresolvedPlaceholder(String),
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalError::DivideByZero => f.write_str("division by zero"),
            EvalError::Overflow => f.write_str("numeric overflow"),
            EvalError::Malformed => f.write_str("malformed term sequence"),
            EvalError::UnresolvedPlaceholder(name) => {
                write!(f, "unresolved placeholder @{}", name)
            }
        }
    }
}

impl Error for EvalError {}

/// Failure of the safe constant evaluator. Always recovered locally: the
/// caller keeps the un-evaluated substring and logs a warning.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ConstantEvalError {
    Parse(ParseError),
    NonConstant,
    Eval(EvalError),
}

impl fmt::Display for ConstantEvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstantEvalError::Parse(e) => e.fmt(f),
            ConstantEvalError::NonConstant => f.write_str("expression is not constant"),
            ConstantEvalError::Eval(e) => e.fmt(f),
        }
    }
}

impl Error for ConstantEvalError {}

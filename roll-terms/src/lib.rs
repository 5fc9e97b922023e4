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

//! Term-rewriting engine for tabletop dice formulas: a parsed formula is a
//! flat sequence of operator/dice/numeric terms that can be reconfigured for
//! advantage or disadvantage, expanded for multi-type critical damage, and
//! simplified to a canonical display formula.

pub mod advantage;
pub mod damage;
pub mod error;
pub mod eval;
pub mod limits;
pub mod options;
#[cfg(feature = "parser")]
pub mod parser;
#[cfg(feature = "parser")]
pub mod simplify;
pub mod term;

pub use error::{ConfigureError, ConstantEvalError, EvalError, ParseError};
pub use options::{
    AdvantageMode, CheckThresholds, DamageTag, MainDieSpec, RollMode, RollOptions,
};
pub use term::{CritBonus, DiceTerm, NumericTerm, Operator, Term, TermOptions, TermSequence};

#[cfg(feature = "roll")]
pub use eval::{DieRoll, RollOutcome};

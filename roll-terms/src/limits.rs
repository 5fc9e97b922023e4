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

pub trait DiceLimits {
    fn min(&self) -> i64;
    fn max(&self) -> i64;
}

use crate::term::{DiceTerm, NumericTerm, Term};

impl DiceLimits for DiceTerm {
    fn min(&self) -> i64 {
        i64::from(self.kept_count())
    }

    fn max(&self) -> i64 {
        i64::from(self.kept_count()).saturating_mul(i64::from(self.faces))
    }
}

impl DiceLimits for NumericTerm {
    fn min(&self) -> i64 {
        self.value
    }

    fn max(&self) -> i64 {
        self.value
    }
}

impl DiceLimits for Term {
    fn min(&self) -> i64 {
        match self {
            Term::Dice(d) => d.min(),
            Term::Numeric(n) => n.min(),
            Term::Operator(_) => 0,
        }
    }

    fn max(&self) -> i64 {
        match self {
            Term::Dice(d) => d.max(),
            Term::Numeric(n) => n.max(),
            Term::Operator(_) => 0,
        }
    }
}

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

//! Interactive roll lifecycle: Draft → (dialog) → Configured → Evaluated →
//! Rendered, driven against pluggable dialog/chat/RNG collaborators.

pub mod lifecycle;
pub mod rng;
pub mod settings;

use async_trait::async_trait;
use roll_terms::{eval::DieRoll, AdvantageMode, RollMode};

/// What the configuration dialog is asked to present.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct DialogSpec {
    pub title: String,
    pub default_roll_mode: RollMode,
    pub available_attributes: Vec<String>,
    pub multi_roll_capable: bool,
}

/// Options bundle a submitted dialog carries back.
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct RollSubmission {
    pub advantage_mode: AdvantageMode,
    pub roll_mode: Option<RollMode>,
    pub bonus_formula: Option<String>,
    /// `(attribute name, resolved value)` replacing the formula's
    /// placeholder sentinel.
    pub chosen_attribute: Option<(String, i64)>,
    pub m_roll: bool,
}

/// Dialog collaborator. Resolves to `None` when the dialog is closed without
/// submitting; cancellation is a first-class value, never an error.
#[async_trait]
pub trait RollDialog {
    async fn prompt(&self, spec: DialogSpec) -> Option<RollSubmission>;
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ChatMessage {
    pub flavor: String,
    pub roll_mode: RollMode,
    pub speaker: String,
    pub formula: String,
    pub total: i64,
    pub breakdown: Vec<DieRoll>,
}

/// Chat collaborator; owns persistence and broadcast of posted messages.
#[async_trait]
pub trait ChatSink {
    async fn post(&self, message: ChatMessage);
}

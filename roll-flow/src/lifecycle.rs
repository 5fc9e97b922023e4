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
    rng::RngHandle, settings::RulesetSettings, ChatMessage, ChatSink, DialogSpec, RollDialog,
    RollSubmission,
};
use rand::Rng;
use roll_terms::{
    advantage, damage,
    eval::{evaluate_sequence, RollOutcome},
    parser::parse_formula,
    simplify::simplify,
    AdvantageMode, ConfigureError, DamageTag, EvalError, MainDieSpec, ParseError, RollOptions,
    Term, TermSequence,
};
use std::{collections::HashMap, error::Error, fmt};

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum RollState {
    Draft,
    AwaitingUserInput,
    Configured,
    Evaluated,
    Rendered,
    Cancelled,
    Failed,
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum LifecycleError {
    /// Evaluating a lifecycle that already carries an outcome; programmer
    /// error, the first outcome stays authoritative.
    DoubleEvaluation,
    /// Mutating the sequence of a lifecycle that already carries an outcome;
    /// the formula must keep matching what was actually rolled.
    MutateAfterEvaluation,
    Configure(ConfigureError),
    Eval(EvalError),
    Parse(ParseError),
}

impl fmt::Display for LifecycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleError::DoubleEvaluation => {
                f.write_str("roll has already been evaluated")
            }
            LifecycleError::MutateAfterEvaluation => {
                f.write_str("roll sequence is immutable once evaluated")
            }
            LifecycleError::Configure(e) => e.fmt(f),
            LifecycleError::Eval(e) => e.fmt(f),
            LifecycleError::Parse(e) => e.fmt(f),
        }
    }
}

impl Error for LifecycleError {}

impl From<ConfigureError> for LifecycleError {
    fn from(e: ConfigureError) -> LifecycleError {
        LifecycleError::Configure(e)
    }
}

impl From<EvalError> for LifecycleError {
    fn from(e: EvalError) -> LifecycleError {
        LifecycleError::Eval(e)
    }
}

impl From<ParseError> for LifecycleError {
    fn from(e: ParseError) -> LifecycleError {
        LifecycleError::Parse(e)
    }
}

/// Modifier keys held when the roll was invoked; holding any of them
/// fast-forwards past the configuration dialog.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub struct ModifierKeys {
    pub shift: bool,
    pub alt: bool,
}

impl ModifierKeys {
    pub fn fast_forward(&self) -> bool {
        self.shift || self.alt
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
enum RollKind {
    Check,
    Damage,
}

/// One roll from draft to rendered chat message. Owned by the coroutine
/// driving it; the sequence is only mutated before evaluation.
#[derive(Debug, Clone)]
pub struct RollLifecycle {
    kind: RollKind,
    sequence: TermSequence,
    /// Damage rolls keep their source parts; configure rebuilds the sequence
    /// from them, so reconfiguration always restarts from base state.
    parts: Vec<(String, Vec<DamageTag>)>,
    options: RollOptions,
    state: RollState,
    outcome: Option<RollOutcome>,
}

impl RollLifecycle {
    /// Draft a d20-style check roll. Placeholders with a matching entry in
    /// `data` are resolved immediately; the rest wait for the dialog.
    pub fn check(
        formula: &str,
        data: &HashMap<String, i64>,
        options: RollOptions,
    ) -> Result<RollLifecycle, LifecycleError> {
        let mut sequence = parse_formula(formula)?;
        for name in sequence.unresolved_placeholders() {
            if let Some(value) = data.get(&name) {
                sequence.resolve_placeholder(&name, *value);
            }
        }
        Ok(RollLifecycle {
            kind: RollKind::Check,
            sequence,
            parts: Vec::new(),
            options,
            state: RollState::Draft,
            outcome: None,
        })
    }

    /// Draft a damage roll from per-type parts.
    pub fn damage(
        parts: &[(String, Vec<DamageTag>)],
        options: RollOptions,
    ) -> Result<RollLifecycle, LifecycleError> {
        let sequence = damage::damage_parts(parts, &options)?;
        Ok(RollLifecycle {
            kind: RollKind::Damage,
            sequence,
            parts: parts.to_vec(),
            options,
            state: RollState::Draft,
            outcome: None,
        })
    }

    pub fn state(&self) -> RollState {
        self.state
    }

    pub fn sequence(&self) -> &TermSequence {
        &self.sequence
    }

    pub fn options(&self) -> &RollOptions {
        &self.options
    }

    pub fn outcome(&self) -> Option<&RollOutcome> {
        self.outcome.as_ref()
    }

    pub fn await_input(&mut self) {
        self.state = RollState::AwaitingUserInput;
    }

    pub fn cancel(&mut self) {
        self.state = RollState::Cancelled;
    }

    /// Fold a dialog submission into the draft: bonus terms are appended
    /// (with a joining `+` when needed), the attribute sentinel is replaced
    /// by the chosen value, and the roll options are rebuilt as a new value.
    pub fn merge_submission(&mut self, sub: &RollSubmission) -> Result<(), LifecycleError> {
        if self.outcome.is_some() {
            return Err(LifecycleError::MutateAfterEvaluation);
        }
        if let Some(bonus) = &sub.bonus_formula {
            if !bonus.trim().is_empty() {
                match self.kind {
                    RollKind::Check => {
                        let bonus_seq = parse_formula(bonus)?;
                        self.sequence.append_terms(bonus_seq.terms().to_vec());
                    }
                    RollKind::Damage => {
                        // bonus damage inherits the tags of the last part
                        let tags = self
                            .parts
                            .last()
                            .map(|(_, t)| t.clone())
                            .unwrap_or_default();
                        self.parts.push((bonus.clone(), tags));
                    }
                }
            }
        }
        if let Some((name, value)) = &sub.chosen_attribute {
            if !self.sequence.resolve_placeholder(name, *value) {
                // the formula may carry a generically named slot; fill the
                // first open sentinel with the chosen attribute
                if let Some(slot) = self.sequence.unresolved_placeholders().first() {
                    self.sequence.resolve_placeholder(slot, *value);
                }
            }
        }
        let mut options = self
            .options
            .with_modes(sub.advantage_mode, sub.roll_mode.unwrap_or(self.options.roll_mode));
        options.m_roll = self.options.m_roll || sub.m_roll;
        self.options = options;
        Ok(())
    }

    /// Run the configurer matching the roll kind. `main_die` must be freshly
    /// read from settings.
    pub fn configure(&mut self, main_die: MainDieSpec) -> Result<(), LifecycleError> {
        if self.outcome.is_some() {
            return Err(LifecycleError::MutateAfterEvaluation);
        }
        match self.kind {
            RollKind::Check => advantage::configure(
                &mut self.sequence,
                self.options.advantage_mode,
                main_die,
                &self.options.thresholds(),
            )?,
            RollKind::Damage => {
                // rebuilt from the parts rather than reconfigured in place,
                // so repeated configure calls never stack critical bonuses
                self.sequence = damage::damage_parts(&self.parts, &self.options)?;
            }
        }
        self.state = RollState::Configured;
        Ok(())
    }

    /// Resolve every dice term exactly once. A second call is refused and
    /// the stored outcome stays as it was.
    pub fn evaluate<R: Rng>(&mut self, rng: &mut R) -> Result<&RollOutcome, LifecycleError> {
        if self.outcome.is_some() {
            return Err(LifecycleError::DoubleEvaluation);
        }
        match evaluate_sequence(&self.sequence, rng) {
            Ok(outcome) => {
                self.outcome = Some(outcome);
                self.state = RollState::Evaluated;
                Ok(self.outcome.as_ref().unwrap())
            }
            Err(e) => {
                self.state = RollState::Failed;
                Err(LifecycleError::Eval(e))
            }
        }
    }

    /// Natural main-die result at or above the critical threshold.
    pub fn is_critical_hit(&self) -> bool {
        let threshold = match self.sequence.terms().first() {
            Some(Term::Dice(d)) => d.options.critical_threshold,
            _ => None,
        };
        match (threshold, self.outcome.as_ref().and_then(|o| o.main_die_total)) {
            (Some(t), Some(natural)) => natural >= i64::from(t),
            _ => false,
        }
    }

    /// Flavor line for the chat card, annotated with the roll's labels.
    pub fn flavor(&self, title: &str) -> String {
        let mut flavor = self
            .options
            .flavor
            .clone()
            .unwrap_or_else(|| title.to_string());
        match self.options.advantage_mode {
            AdvantageMode::Advantage => flavor.push_str(" (Advantage)"),
            AdvantageMode::Disadvantage => flavor.push_str(" (Disadvantage)"),
            AdvantageMode::Normal => {}
        }
        if self.sequence.is_critical() || self.is_critical_hit() {
            flavor.push_str(" (Critical)");
        }
        flavor
    }

    /// Build the chat message and mark the lifecycle rendered. A lifecycle
    /// may legitimately stop at Evaluated instead when chat output is
    /// suppressed.
    pub fn render(
        &mut self,
        title: &str,
        speaker: &str,
        constant_first: bool,
    ) -> Option<ChatMessage> {
        let outcome = self.outcome.as_ref()?;
        let message = ChatMessage {
            flavor: self.flavor(title),
            roll_mode: self.options.roll_mode,
            speaker: speaker.to_string(),
            formula: simplify(&self.sequence, constant_first),
            total: outcome.total,
            breakdown: outcome.dice.clone(),
        };
        self.state = RollState::Rendered;
        Some(message)
    }

    /// Copy for a multi-roll reroll: same configuration, no outcome. The
    /// template itself is never touched by the rerolls.
    pub fn as_template(&self) -> RollLifecycle {
        let mut copy = self.clone();
        copy.outcome = None;
        copy.state = RollState::Configured;
        copy
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct CheckRollRequest {
    pub formula: String,
    pub data: HashMap<String, i64>,
    pub title: String,
    pub speaker: String,
    /// Extra targets rerolled from the evaluated template in mRoll mode.
    pub targets: Vec<String>,
    pub fast_forward: bool,
    pub keys: ModifierKeys,
    pub to_message: bool,
    pub options: RollOptions,
}

#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct DamageRollRequest {
    pub parts: Vec<(String, Vec<DamageTag>)>,
    pub title: String,
    pub speaker: String,
    pub fast_forward: bool,
    pub keys: ModifierKeys,
    pub to_message: bool,
    pub options: RollOptions,
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct RollReport {
    pub target: Option<String>,
    pub formula: String,
    pub total: i64,
    pub outcome: RollOutcome,
}

/// Drives lifecycles against the dialog, chat, settings and RNG
/// collaborators. Multiple independent rolls may run concurrently; each
/// lifecycle is exclusively owned by its driving future.
pub struct RollEngine<D, C> {
    pub settings: RulesetSettings,
    dialog: D,
    chat: C,
    rng: RngHandle,
}

impl<D: RollDialog, C: ChatSink> RollEngine<D, C> {
    pub fn new(settings: RulesetSettings, dialog: D, chat: C, rng: RngHandle) -> RollEngine<D, C> {
        RollEngine {
            settings,
            dialog,
            chat,
            rng,
        }
    }

    async fn prompt(
        &self,
        lifecycle: &mut RollLifecycle,
        title: &str,
        data: &HashMap<String, i64>,
        multi_roll_capable: bool,
    ) -> Result<bool, LifecycleError> {
        lifecycle.await_input();
        let spec = DialogSpec {
            title: title.to_string(),
            default_roll_mode: self.settings.default_roll_mode,
            available_attributes: {
                let mut names: Vec<String> = data.keys().cloned().collect();
                names.sort();
                names
            },
            multi_roll_capable,
        };
        // the driving future suspends here, possibly indefinitely
        match self.dialog.prompt(spec).await {
            Some(submission) => {
                lifecycle.merge_submission(&submission)?;
                Ok(true)
            }
            None => {
                lifecycle.cancel();
                log::debug!("roll {:?} cancelled from dialog", title);
                Ok(false)
            }
        }
    }

    async fn evaluate_and_post(
        &self,
        lifecycle: &mut RollLifecycle,
        title: &str,
        speaker: &str,
        target: Option<&str>,
        to_message: bool,
    ) -> Result<RollReport, LifecycleError> {
        let mut stream = self.rng.stream().await;
        lifecycle.evaluate(&mut stream)?;
        let report = {
            let outcome = lifecycle.outcome().expect("just evaluated");
            RollReport {
                target: target.map(|t| t.to_string()),
                formula: lifecycle.sequence().formula().to_string(),
                total: outcome.total,
                outcome: outcome.clone(),
            }
        };
        if to_message {
            let title = match target {
                Some(t) => format!("{} vs {}", title, t),
                None => title.to_string(),
            };
            if let Some(message) =
                lifecycle.render(&title, speaker, self.settings.constant_first)
            {
                self.chat.post(message).await;
            }
        }
        Ok(report)
    }

    /// Run a full check-roll lifecycle. Returns `None` when the user closed
    /// the dialog without submitting; no chat message is emitted then.
    pub async fn check_roll(
        &self,
        req: CheckRollRequest,
    ) -> Result<Option<Vec<RollReport>>, LifecycleError> {
        let mut lifecycle =
            RollLifecycle::check(&req.formula, &req.data, req.options.clone())?;

        if !(req.fast_forward || req.keys.fast_forward()) {
            let multi = !req.targets.is_empty();
            if !self
                .prompt(&mut lifecycle, &req.title, &req.data, multi)
                .await?
            {
                return Ok(None);
            }
        }

        let main_die = self.settings.main_die_spec()?;
        lifecycle.configure(main_die)?;

        let multi_targets: Vec<Option<&str>> =
            if lifecycle.options().m_roll && !req.targets.is_empty() {
                req.targets.iter().map(|t| Some(t.as_str())).collect()
            } else {
                vec![None]
            };

        let template = lifecycle;
        let mut reports = Vec::with_capacity(multi_targets.len());
        for target in multi_targets {
            // every reroll draws its own RNG stream for independent results
            let mut roll = template.as_template();
            let report = self
                .evaluate_and_post(&mut roll, &req.title, &req.speaker, target, req.to_message)
                .await?;
            reports.push(report);
        }
        Ok(Some(reports))
    }

    /// Run a damage-roll lifecycle over per-type parts.
    pub async fn damage_roll(
        &self,
        req: DamageRollRequest,
    ) -> Result<Option<RollReport>, LifecycleError> {
        let mut lifecycle = RollLifecycle::damage(&req.parts, req.options.clone())?;

        if !(req.fast_forward || req.keys.fast_forward()) {
            let data = HashMap::new();
            if !self.prompt(&mut lifecycle, &req.title, &data, false).await? {
                return Ok(None);
            }
        }

        let main_die = self.settings.main_die_spec()?;
        lifecycle.configure(main_die)?;
        let report = self
            .evaluate_and_post(&mut lifecycle, &req.title, &req.speaker, None, req.to_message)
            .await?;
        Ok(Some(report))
    }
}

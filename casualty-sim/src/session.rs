//! Session value owning one casualty, its aid bag, score ledger and noise.
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::config::{ConfigError, SessionConfig};
use crate::constants::{
    EVENT_LOG_CAPACITY, LOG_DEATH, LOG_DECOMPENSATING, LOG_INTERVENTION_APPLIED,
    LOG_INTERVENTION_SKIPPED, LOG_PUPILS_CHANGED, LOG_SCORE, LOG_SESSION_START, LOG_TENSION_ONSET,
    LOG_WOUND_MARKED,
};
use crate::death::DeathCause;
use crate::export::WoundMarker;
use crate::interventions::{self, Intervention, InterventionOutcome};
use crate::inventory::Inventory;
use crate::ledger::{ScoreEvent, ScoreLedger};
use crate::mechanism::Environment;
use crate::noise::{Noise, NoiseCursor};
use crate::patient::{PatientState, VitalsSummary};
use crate::physiology::{self, StepOutcome};
use crate::scoring;

/// One line of the session event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub t_s: u32,
    pub key: String,
    pub message: String,
}

/// Everything that happened during one or more ticks.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TickReport {
    pub step: StepOutcome,
    pub score_events: Vec<ScoreEvent>,
}

impl TickReport {
    fn merge(&mut self, other: Self) {
        if self.step.death.is_none() {
            self.step.death = other.step.death;
        }
        self.step.decompensating |= other.step.decompensating;
        self.step.pupils_changed |= other.step.pupils_changed;
        self.step.tension_onsets.extend(other.step.tension_onsets);
        self.score_events.extend(other.score_events);
    }
}

/// High-level session wrapper binding configuration, patient and bookkeeping.
#[derive(Debug, Clone)]
pub struct Session {
    config: SessionConfig,
    patient: PatientState,
    inventory: Inventory,
    ledger: ScoreLedger,
    noise: Noise,
    log: VecDeque<LogEntry>,
    markers: Vec<WoundMarker>,
}

impl Session {
    /// Create a session, seeding noise from the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration fails validation.
    pub fn initialize(config: SessionConfig) -> Result<Self, ConfigError> {
        let noise = config.seed.map_or(Noise::Quiet, Noise::seeded);
        Self::with_noise(config, noise)
    }

    /// Create a session with an explicit noise source.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration fails validation.
    pub fn with_noise(config: SessionConfig, mut noise: Noise) -> Result<Self, ConfigError> {
        config.validate()?;
        let patient =
            PatientState::casualty(config.mechanism, config.mass_kg, config.ambient, &mut noise);
        let mut session = Self {
            config,
            patient,
            inventory: Inventory::standard(),
            ledger: ScoreLedger::new(),
            noise,
            log: VecDeque::new(),
            markers: Vec::new(),
        };
        let message = format!(
            "{} casualty, {:.0} kg, {} ambient{}",
            session.config.mechanism.label(),
            session.config.mass_kg,
            session.config.ambient,
            if session.patient.tbi { ", head injury" } else { "" }
        );
        log::info!("{message}");
        session.push_log(LOG_SESSION_START, message);
        Ok(session)
    }

    /// Rebuild the session from its configuration, discarding all progress.
    pub fn reset(&mut self) {
        let noise = self.config.seed.map_or(Noise::Quiet, Noise::seeded);
        let config = self.config.clone();
        match Self::with_noise(config, noise) {
            Ok(fresh) => *self = fresh,
            Err(err) => log::warn!("session reset skipped: {err}"),
        }
    }

    /// Replace the noise source with a freshly seeded one.
    pub fn reseed(&mut self, seed: u64) {
        self.config.seed = Some(seed);
        self.noise = Noise::seeded(seed);
    }

    /// Advance the simulation by one second.
    pub fn tick(&mut self) -> TickReport {
        let env = self.environment();
        let step = physiology::step(&mut self.patient, env, 1, &mut self.noise);
        self.log_step(&step);
        let score_events =
            scoring::evaluate_gates(&self.patient, &mut self.ledger, self.patient.elapsed_minutes());
        for event in &score_events {
            self.push_log(LOG_SCORE, format!("{:+} {}", event.delta, event.reason));
        }
        TickReport { step, score_events }
    }

    /// Advance by whole seconds, one tick at a time.
    pub fn advance(&mut self, seconds: u32) -> TickReport {
        let mut report = TickReport::default();
        for _ in 0..seconds {
            let tick = self.tick();
            report.merge(tick);
        }
        report
    }

    /// Apply a clinician action.
    pub fn apply(&mut self, intervention: &Intervention) -> InterventionOutcome {
        let env = self.environment();
        let events_before = self.ledger.events().len();
        let outcome = interventions::apply(
            intervention,
            &mut self.patient,
            &mut self.inventory,
            &mut self.ledger,
            env,
        );
        let key = if outcome.applied {
            LOG_INTERVENTION_APPLIED
        } else {
            LOG_INTERVENTION_SKIPPED
        };
        self.push_log(key, outcome.message.clone());
        let new_events: Vec<String> = self.ledger.events()[events_before..]
            .iter()
            .map(|event| format!("{:+} {}", event.delta, event.reason))
            .collect();
        for line in new_events {
            self.push_log(LOG_SCORE, line);
        }
        outcome
    }

    /// Record a wound marker from the body map.
    pub fn add_marker(&mut self, marker: WoundMarker) {
        let message = format!(
            "{} marked at ({:.2}, {:.2}) {}",
            marker.kind, marker.x, marker.y, marker.facing
        );
        self.markers.push(marker);
        self.push_log(LOG_WOUND_MARKED, message);
    }

    pub(crate) fn push_log(&mut self, key: &str, message: impl Into<String>) {
        if self.log.len() >= EVENT_LOG_CAPACITY {
            self.log.pop_front();
        }
        self.log.push_back(LogEntry {
            t_s: self.patient.elapsed_s,
            key: key.to_string(),
            message: message.into(),
        });
    }

    fn log_step(&mut self, step: &StepOutcome) {
        for side in &step.tension_onsets {
            log::debug!("t={}s tension developing ({side})", self.patient.elapsed_s);
            self.push_log(
                LOG_TENSION_ONSET,
                format!("Tension pneumothorax developing ({side})"),
            );
        }
        if step.pupils_changed {
            self.push_log(LOG_PUPILS_CHANGED, "Pupils now asymmetric and sluggish");
        }
        if step.decompensating {
            log::debug!("t={}s decompensating", self.patient.elapsed_s);
            self.push_log(LOG_DECOMPENSATING, "Patient decompensating!");
        }
        if let Some(cause) = step.death {
            log::info!("t={}s patient deceased: {cause}", self.patient.elapsed_s);
            self.push_log(LOG_DEATH, format!("Patient deceased: {cause}"));
        }
    }

    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    #[must_use]
    pub const fn environment(&self) -> Environment {
        self.config.environment()
    }

    /// Borrow the underlying immutable patient.
    #[must_use]
    pub const fn patient(&self) -> &PatientState {
        &self.patient
    }

    /// Borrow the underlying mutable patient.
    pub const fn patient_mut(&mut self) -> &mut PatientState {
        &mut self.patient
    }

    /// Apply a closure to the mutable patient, re-clamping afterwards.
    pub fn with_patient_mut<R>(&mut self, f: impl FnOnce(&mut PatientState) -> R) -> R {
        let result = f(&mut self.patient);
        self.patient.clamp();
        result
    }

    #[must_use]
    pub const fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub const fn inventory_mut(&mut self) -> &mut Inventory {
        &mut self.inventory
    }

    #[must_use]
    pub const fn ledger(&self) -> &ScoreLedger {
        &self.ledger
    }

    #[must_use]
    pub const fn score(&self) -> i32 {
        self.ledger.score()
    }

    #[must_use]
    pub const fn noise(&self) -> &Noise {
        &self.noise
    }

    pub fn log(&self) -> impl Iterator<Item = &LogEntry> {
        self.log.iter()
    }

    #[must_use]
    pub fn markers(&self) -> &[WoundMarker] {
        &self.markers
    }

    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.patient.is_dead()
    }

    #[must_use]
    pub const fn death_cause(&self) -> Option<DeathCause> {
        self.patient.death.reason
    }

    #[must_use]
    pub fn summary(&self) -> VitalsSummary {
        self.patient.summary()
    }

    pub(crate) fn from_parts(
        config: SessionConfig,
        patient: PatientState,
        inventory: Inventory,
        ledger: ScoreLedger,
        markers: Vec<WoundMarker>,
        cursor: Option<&NoiseCursor>,
    ) -> Self {
        let noise = Noise::resumed(config.seed, cursor);
        Self {
            config,
            patient,
            inventory,
            ledger,
            noise,
            log: VecDeque::new(),
            markers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::Facing;
    use crate::inventory::Supply;
    use crate::ledger::CareCategory;
    use crate::mechanism::{Ambient, Mechanism};

    fn blast() -> Session {
        Session::initialize(SessionConfig::new(Mechanism::Blast, 80.0, Ambient::Temperate))
            .unwrap()
    }

    #[test]
    fn initialize_rejects_bad_mass() {
        let err = Session::initialize(SessionConfig::new(Mechanism::Blast, 0.0, Ambient::Cold));
        assert!(err.is_err());
    }

    #[test]
    fn initialize_logs_and_issues_kit() {
        let session = blast();
        assert_eq!(session.inventory(), &Inventory::standard());
        assert_eq!(session.score(), 0);
        let first = session.log().next().unwrap();
        assert_eq!(first.key, LOG_SESSION_START);
        assert!(first.message.starts_with("Blast injury"));
        assert!(session.noise().is_quiet());
    }

    #[test]
    fn tick_runs_physiology_then_gates() {
        let mut session = blast();
        let report = session.advance(180);
        assert_eq!(session.patient().elapsed_s, 180);
        // Bleeding blast casualty, no tourniquet by minute three.
        assert!(
            report
                .score_events
                .iter()
                .any(|event| event.delta == -2 && event.reason.contains("hemorrhage"))
        );
        assert_eq!(session.score(), -2);
    }

    #[test]
    fn apply_records_and_logs() {
        let mut session = blast();
        let outcome = session.apply(&Intervention::Tourniquet);
        assert!(outcome.applied);
        assert!(session.ledger().has(CareCategory::Tourniquet));
        assert_eq!(session.inventory().count(Supply::Tourniquet), 1);
        assert!(session.log().any(|entry| entry.key == LOG_INTERVENTION_APPLIED));
    }

    #[test]
    fn event_log_is_capped() {
        let mut session = blast();
        for _ in 0..400 {
            session.apply(&Intervention::Reassess);
        }
        assert_eq!(session.log().count(), EVENT_LOG_CAPACITY);
    }

    #[test]
    fn reset_restores_fresh_casualty() {
        let mut session = blast();
        session.apply(&Intervention::Tourniquet);
        session.advance(30);
        session.reset();
        assert_eq!(session.patient().elapsed_s, 0);
        assert!(session.patient().external_bleed);
        assert_eq!(session.inventory(), &Inventory::standard());
        assert_eq!(session.ledger(), &ScoreLedger::new());
    }

    #[test]
    fn reset_with_a_rejected_config_keeps_the_session() {
        let mut session = blast();
        session.advance(30);
        session.config.mass_kg = 5.0;
        session.reset();
        assert_eq!(session.patient().elapsed_s, 30);
    }

    #[test]
    fn markers_are_kept_in_order() {
        let mut session = blast();
        session.add_marker(WoundMarker {
            x: 0.4,
            y: 0.7,
            facing: Facing::Front,
            kind: "amputation".to_string(),
        });
        assert_eq!(session.markers().len(), 1);
        assert!(session.log().any(|entry| entry.key == LOG_WOUND_MARKED));
    }

    #[test]
    fn direct_edits_stay_in_domain() {
        let mut session = blast();
        session.with_patient_mut(|patient| patient.spo2 = 140.0);
        assert!(session.patient().spo2 <= 100.0);
        session.inventory_mut().set(Supply::WholeBlood, 0);
        assert!(!session.apply(&Intervention::WholeBlood).applied);
    }

    #[test]
    fn reseed_switches_to_seeded_noise() {
        let mut session = blast();
        session.reseed(42);
        assert!(!session.noise().is_quiet());
        assert_eq!(session.config().seed, Some(42));
    }
}

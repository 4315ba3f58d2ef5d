//! Casualty Sim Engine
//!
//! Platform-agnostic physiology, intervention and scoring core for a
//! casualty-care trainer. This crate has no UI, timers or platform
//! dependencies; hosts drive it one simulated second at a time.

pub mod config;
pub mod constants;
pub mod death;
pub mod export;
pub mod history;
pub mod instructor;
pub mod interventions;
pub mod inventory;
pub mod ledger;
pub mod mechanism;
pub mod noise;
pub mod numbers;
pub mod patient;
pub mod physiology;
pub mod scoring;
pub mod session;

// Re-export commonly used types
pub use config::{ConfigError, SessionConfig};
pub use death::DeathCause;
pub use export::{ExportError, Facing, SessionExport, WoundMarker};
pub use history::SessionHistory;
pub use instructor::{Vital, VitalRange};
pub use interventions::{Antibiotic, Intervention, InterventionOutcome};
pub use inventory::{Inventory, Supply};
pub use ledger::{CareAction, CareCategory, GateKey, GateVerdict, ScoreEvent, ScoreLedger};
pub use mechanism::{Ambient, Environment, InjuryPreset, Mechanism};
pub use noise::{Noise, NoiseCursor, NoiseDomain, NoiseSource, SeededNoise, StreamCursor};
pub use patient::{
    Airway, Avpu, BloodPressure, Chest, DeathState, DrugLevels, Hemithorax, MarchStatus,
    PatientState, Pupils, Side, VitalsSummary,
};
pub use physiology::StepOutcome;
pub use scoring::{GATES, Gate, evaluate_gates};
pub use session::{LogEntry, Session, TickReport};

/// Trait for abstracting save/load operations\
/// Platform-specific implementations should provide this
pub trait SessionStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Save a session snapshot
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be saved.
    fn save_session(&self, save_name: &str, snapshot: &SessionExport) -> Result<(), Self::Error>;

    /// Load a session snapshot
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be loaded.
    fn load_session(&self, save_name: &str) -> Result<Option<SessionExport>, Self::Error>;

    /// Delete a saved session
    ///
    /// # Errors
    ///
    /// Returns an error if the save cannot be deleted.
    fn delete_session(&self, save_name: &str) -> Result<(), Self::Error>;
}

/// Entry point for hosts: creates sessions and moves them through storage.
pub struct Trainer<S>
where
    S: SessionStorage,
{
    storage: S,
}

impl<S> Trainer<S>
where
    S: SessionStorage,
{
    pub const fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Create a new session from a configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn create_session(&self, config: SessionConfig) -> Result<Session, ConfigError> {
        Session::initialize(config)
    }

    /// Save a session
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be saved.
    pub fn save_session(&self, save_name: &str, session: &Session) -> Result<(), S::Error> {
        self.storage.save_session(save_name, &session.export())
    }

    /// Load a session and rebuild it for play
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be loaded or fails its checks.
    pub fn load_session(&self, save_name: &str) -> Result<Option<Session>, anyhow::Error>
    where
        S::Error: Into<anyhow::Error>,
    {
        let Some(snapshot) = self.storage.load_session(save_name).map_err(Into::into)? else {
            return Ok(None);
        };
        Ok(Some(snapshot.into_session()?))
    }

    /// Delete a saved session
    ///
    /// # Errors
    ///
    /// Returns an error if the save cannot be deleted.
    pub fn delete_session(&self, save_name: &str) -> Result<(), S::Error> {
        self.storage.delete_session(save_name)
    }
}

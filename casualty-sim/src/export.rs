//! Plain structured snapshot of a session for saving and handoff.
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::config::{ConfigError, SessionConfig};
use crate::inventory::Inventory;
use crate::ledger::ScoreLedger;
use crate::noise::NoiseCursor;
use crate::patient::PatientState;
use crate::session::Session;

pub const EXPORT_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("malformed session export: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported export format version {0}")]
    UnsupportedVersion(u32),
    #[error("exported score {recorded} does not match ledger total {computed}")]
    ScoreMismatch { recorded: i32, computed: i32 },
    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Facing {
    #[default]
    Front,
    Back,
}

impl fmt::Display for Facing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Front => "front",
            Self::Back => "back",
        })
    }
}

/// A wound placed on the body map, in normalized coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WoundMarker {
    pub x: f64,
    pub y: f64,
    pub facing: Facing,
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportMeta {
    pub format_version: u32,
    /// Wall-clock stamp supplied by the caller; the engine itself has no clock.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exported_at: Option<String>,
    pub elapsed_s: u32,
    pub config: SessionConfig,
    /// Stream positions of seeded noise. Snapshots without it restart the
    /// noise from the configured seed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub noise: Option<NoiseCursor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionExport {
    pub meta: ExportMeta,
    pub patient: PatientState,
    pub inventory: Inventory,
    #[serde(default)]
    pub wounds: Vec<WoundMarker>,
    pub score: i32,
    pub ledger: ScoreLedger,
}

impl SessionExport {
    #[must_use]
    pub fn with_timestamp(mut self, stamp: impl Into<String>) -> Self {
        self.meta.exported_at = Some(stamp.into());
        self
    }

    /// Pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, ExportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse and check an exported snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed JSON, an unknown format version or a
    /// score that disagrees with its own ledger.
    pub fn from_json(json: &str) -> Result<Self, ExportError> {
        let export: Self = serde_json::from_str(json)?;
        export.check()?;
        Ok(export)
    }

    fn check(&self) -> Result<(), ExportError> {
        if self.meta.format_version != EXPORT_FORMAT_VERSION {
            return Err(ExportError::UnsupportedVersion(self.meta.format_version));
        }
        if self.score != self.ledger.score() {
            return Err(ExportError::ScoreMismatch {
                recorded: self.score,
                computed: self.ledger.score(),
            });
        }
        Ok(())
    }

    /// Rebuild a live session, resuming seeded noise at the recorded cursor.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot fails its consistency checks or the
    /// embedded configuration is invalid.
    pub fn into_session(self) -> Result<Session, ExportError> {
        self.check()?;
        self.meta.config.validate()?;
        let mut patient = self.patient;
        patient.clamp();
        Ok(Session::from_parts(
            self.meta.config,
            patient,
            self.inventory,
            self.ledger,
            self.wounds,
            self.meta.noise.as_ref(),
        ))
    }
}

impl Session {
    #[must_use]
    pub fn export(&self) -> SessionExport {
        SessionExport {
            meta: ExportMeta {
                format_version: EXPORT_FORMAT_VERSION,
                exported_at: None,
                elapsed_s: self.patient().elapsed_s,
                config: self.config().clone(),
                noise: self.noise().cursor(),
            },
            patient: self.patient().clone(),
            inventory: self.inventory().clone(),
            wounds: self.markers().to_vec(),
            score: self.score(),
            ledger: self.ledger().clone(),
        }
    }
}

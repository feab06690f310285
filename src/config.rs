use crate::reconciliation::PlateGrammar;
use crate::Error;
use serde::{Deserialize, Serialize};

/// Tuning knobs for the track manager.
///
/// The defaults are empirical choices for road traffic at typical video
/// frame rates, not algorithmic invariants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Minimum IOU for a track/detection pair to be accepted by the
    /// assignment solver.
    pub min_iou: f32,
    /// Maximum number of consecutive missed frames before a track is deleted.
    pub max_age: u64,
    /// Consecutive matched frames before a tentative track is confirmed.
    pub min_hits: u64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        TrackerConfig {
            min_iou: 0.3,
            max_age: 30,
            min_hits: 3,
        }
    }
}

impl TrackerConfig {
    pub fn validate(&self) -> Result<(), Error> {
        if !(0.0..=1.0).contains(&self.min_iou) || !self.min_iou.is_finite() {
            return Err(Error::InvalidConfig(format!(
                "min_iou must be within [0, 1], got {}",
                self.min_iou
            )));
        }
        if self.max_age == 0 {
            return Err(Error::InvalidConfig("max_age must be at least 1".into()));
        }
        if self.min_hits == 0 {
            return Err(Error::InvalidConfig("min_hits must be at least 1".into()));
        }
        Ok(())
    }
}

/// Tuning knobs for plate-to-vehicle association.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlateAssociationConfig {
    /// Minimum IOU between a plate box and a vehicle box when the plate
    /// center is not contained by any vehicle box.
    pub min_iou: f32,
}

impl Default for PlateAssociationConfig {
    fn default() -> Self {
        PlateAssociationConfig { min_iou: 0.1 }
    }
}

impl PlateAssociationConfig {
    pub fn validate(&self) -> Result<(), Error> {
        if !(0.0..=1.0).contains(&self.min_iou) || !self.min_iou.is_finite() {
            return Err(Error::InvalidConfig(format!(
                "plate min_iou must be within [0, 1], got {}",
                self.min_iou
            )));
        }
        Ok(())
    }
}

/// Tuning knobs for plate-text reconciliation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcilerConfig {
    /// Target plate grammar.
    pub grammar: PlateGrammar,
    /// Maximum weighted edit distance a correction may move a candidate.
    pub max_edit_distance: f32,
    /// Frequency-weight multiplier applied to corrected candidates
    /// relative to directly observed valid strings.
    pub correction_discount: f32,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        ReconcilerConfig {
            grammar: PlateGrammar::default(),
            max_edit_distance: 2.0,
            correction_discount: 0.5,
        }
    }
}

impl ReconcilerConfig {
    pub fn validate(&self) -> Result<(), Error> {
        self.grammar.validate()?;
        if !(self.max_edit_distance >= 0.0) || !self.max_edit_distance.is_finite() {
            return Err(Error::InvalidConfig(format!(
                "max_edit_distance must be non-negative, got {}",
                self.max_edit_distance
            )));
        }
        if !(0.0..=1.0).contains(&self.correction_discount) || self.correction_discount == 0.0 {
            return Err(Error::InvalidConfig(format!(
                "correction_discount must be within (0, 1], got {}",
                self.correction_discount
            )));
        }
        Ok(())
    }
}

/// Top level configuration for the engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    pub tracker: TrackerConfig,
    pub plate_association: PlateAssociationConfig,
    pub reconciler: ReconcilerConfig,
}

impl EngineConfig {
    /// Validates every section. Malformed configuration aborts engine
    /// construction rather than failing mid-stream.
    pub fn validate(&self) -> Result<(), Error> {
        self.tracker.validate()?;
        self.plate_association.validate()?;
        self.reconciler.validate()
    }
}

use std::hash::{Hash, Hasher};

use crate::kalman_filter::{KalmanFilter, StateCovariance, StateMean};
use crate::{BoundingBox, Detection, TextCandidate};
use tracing::{debug, warn};

/// Enumeration type for the single target track state:
///
/// - Newly created tracks are classified as `Tentative` until enough
///   consecutive matches have been collected.
/// - Then, the track state is changed to `Confirmed` and the identity is
///   reported to downstream consumers.
/// - Tracks that have gone unmatched for too long are classified as
///   `Deleted` to mark them for removal from the active set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackState {
    Tentative,
    Confirmed,
    Deleted,
}

/// Everything observed for one identity over its lifetime: the sparse
/// per-frame box timeline, the plate boxes attached to it, and the raw
/// OCR readings collected for those plates.
#[derive(Debug, Clone)]
pub struct IdentityRecord {
    track_id: u64,
    frames: Vec<(u64, BoundingBox)>,
    plate_boxes: Vec<(u64, BoundingBox)>,
    candidates: Vec<TextCandidate>,
}

impl IdentityRecord {
    pub(crate) fn new(track_id: u64) -> IdentityRecord {
        IdentityRecord {
            track_id,
            frames: vec![],
            plate_boxes: vec![],
            candidates: vec![],
        }
    }

    /// Returns the identity this record belongs to
    pub fn track_id(&self) -> u64 {
        self.track_id
    }

    /// Per-frame box timeline, ascending by frame index. Sparse until
    /// interpolated, dense afterwards.
    pub fn frames(&self) -> &[(u64, BoundingBox)] {
        &self.frames
    }

    /// Plate boxes attached to this identity, ascending by frame index.
    pub fn plate_boxes(&self) -> &[(u64, BoundingBox)] {
        &self.plate_boxes
    }

    /// Raw OCR readings collected while this identity was active.
    pub fn candidates(&self) -> &[TextCandidate] {
        &self.candidates
    }

    /// First frame with a direct observation.
    pub fn first_frame(&self) -> Option<u64> {
        self.frames.first().map(|(frame, _)| *frame)
    }

    /// Last frame with a direct observation.
    pub fn last_frame(&self) -> Option<u64> {
        self.frames.last().map(|(frame, _)| *frame)
    }

    pub(crate) fn push_frame(&mut self, frame_index: u64, bbox: BoundingBox) {
        self.frames.push((frame_index, bbox));
    }

    pub(crate) fn push_plate(
        &mut self,
        frame_index: u64,
        bbox: BoundingBox,
        candidates: Vec<TextCandidate>,
    ) {
        self.plate_boxes.push((frame_index, bbox));
        self.candidates.extend(candidates);
    }

    pub(crate) fn set_frames(&mut self, frames: Vec<(u64, BoundingBox)>) {
        self.frames = frames;
    }
}

/// A single vehicle identity hypothesis with state space
/// `(cx, cy, s, r)` and associated velocities.
#[derive(Debug, Clone)]
pub struct Track {
    /// A unique track identifier.
    track_id: u64,
    /// The current track state.
    state: TrackState,
    /// Mean vector of the state distribution.
    mean: StateMean,
    /// Covariance matrix of the state distribution.
    covariance: StateCovariance,
    /// Total number of frames since creation.
    age: u64,
    /// Total number of measurement updates.
    hits: u64,
    /// Consecutive matched frames, including the seeding detection.
    hit_streak: u64,
    /// Frames since the last measurement update.
    time_since_update: u64,
    /// Accumulated observations for this identity.
    record: IdentityRecord,
}

impl PartialEq for Track {
    fn eq(&self, other: &Self) -> bool {
        self.track_id == other.track_id
    }
}

impl Eq for Track {}

impl Hash for Track {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.track_id.hash(state);
    }
}

impl Track {
    /// Returns a new Tentative track seeded from a detection.
    pub(crate) fn new(track_id: u64, kf: &KalmanFilter, detection: &Detection) -> Track {
        let (mean, covariance) = kf.initiate(detection.bbox());
        let mut record = IdentityRecord::new(track_id);
        record.push_frame(detection.frame_index(), detection.bbox().clone());

        Track {
            track_id,
            state: TrackState::Tentative,
            mean,
            covariance,
            age: 1,
            hits: 1,
            hit_streak: 1,
            time_since_update: 0,
            record,
        }
    }

    /// Return the identifier of the track
    pub fn track_id(&self) -> u64 {
        self.track_id
    }

    /// Return the TrackState of the track
    pub fn state(&self) -> TrackState {
        self.state
    }

    /// Returns true if this track is tentative (unconfirmed).
    pub fn is_tentative(&self) -> bool {
        self.state == TrackState::Tentative
    }

    /// Returns true if this track is confirmed.
    pub fn is_confirmed(&self) -> bool {
        self.state == TrackState::Confirmed
    }

    /// Returns true if this track is dead and should be removed.
    pub fn is_deleted(&self) -> bool {
        self.state == TrackState::Deleted
    }

    /// Return the age of the track in frames
    pub fn age(&self) -> u64 {
        self.age
    }

    /// Return the total number of measurement updates
    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// Return the current consecutive-match streak
    pub fn hit_streak(&self) -> u64 {
        self.hit_streak
    }

    /// Return the number of frames since the last measurement update
    pub fn time_since_update(&self) -> u64 {
        self.time_since_update
    }

    /// Return the accumulated observations of the track
    pub fn record(&self) -> &IdentityRecord {
        &self.record
    }

    /// Returns the track position bounding box
    pub fn bbox(&self) -> BoundingBox {
        KalmanFilter::bbox(&self.mean)
    }

    /// Propagate the state distribution one time step forward.
    ///
    /// Increments `age` and `time_since_update`; `hit_streak` is left
    /// untouched until the association outcome is known.
    pub(crate) fn predict(&mut self, kf: &KalmanFilter) {
        (self.mean, self.covariance) = kf.predict(&self.mean, &self.covariance);
        self.age += 1;
        self.time_since_update += 1;
    }

    /// Perform the measurement update with an associated detection.
    ///
    /// A degenerate box is rejected silently: the state is left unchanged
    /// and no observation is recorded.
    pub(crate) fn update(&mut self, kf: &KalmanFilter, detection: &Detection) {
        if detection.bbox().is_degenerate() {
            debug!(
                track_id = self.track_id,
                frame = detection.frame_index(),
                "rejected degenerate measurement"
            );
            return;
        }

        match kf.update(&self.mean, &self.covariance, detection.bbox()) {
            Ok((mean, covariance)) => (self.mean, self.covariance) = (mean, covariance),
            // Track continues on its predicted state.
            Err(err) => warn!(track_id = self.track_id, %err, "measurement update failed"),
        }

        self.hits += 1;
        self.hit_streak += 1;
        self.time_since_update = 0;
        self.record
            .push_frame(detection.frame_index(), detection.bbox().clone());
    }

    /// Mark this track as missed on the current frame, breaking its streak.
    pub(crate) fn mark_missed(&mut self) {
        self.hit_streak = 0;
    }

    /// Promote this track to Confirmed.
    pub(crate) fn confirm(&mut self) {
        self.state = TrackState::Confirmed;
    }

    /// Mark this track for removal.
    pub(crate) fn mark_deleted(&mut self) {
        self.state = TrackState::Deleted;
    }

    /// Attach a plate observation to the identity.
    pub(crate) fn attach_plate(
        &mut self,
        frame_index: u64,
        bbox: BoundingBox,
        candidates: Vec<TextCandidate>,
    ) {
        self.record.push_plate(frame_index, bbox, candidates);
    }

    /// Consume the track, yielding its identity record.
    pub(crate) fn into_record(self) -> IdentityRecord {
        self.record
    }
}

use crate::config::EngineConfig;
use crate::interpolation;
use crate::plate_association::PlateAssociator;
use crate::reconciliation::{PlateReconciler, ReconciledPlate};
use crate::track::IdentityRecord;
use crate::{BoundingBox, Detection, Error, TextCandidate, Tracker};
use rayon::prelude::*;
use tracing::{debug, warn};

/// A plate detection plus the OCR readings produced for it.
#[derive(Debug, Clone)]
pub struct PlateObservation {
    detection: Detection,
    candidates: Vec<TextCandidate>,
}

impl PlateObservation {
    /// Return a new PlateObservation
    ///
    /// # Parameters
    ///
    /// * `detection`: The plate detection.
    /// * `candidates`: OCR readings for the plate crop; empty when the
    ///   plate was unreadable.
    pub fn new(detection: Detection, candidates: Vec<TextCandidate>) -> PlateObservation {
        PlateObservation {
            detection,
            candidates,
        }
    }

    /// Return the plate detection
    pub fn detection(&self) -> &Detection {
        &self.detection
    }

    /// Return the OCR readings for the plate
    pub fn candidates(&self) -> &[TextCandidate] {
        &self.candidates
    }
}

/// Everything reported for one finished identity: the dense
/// post-interpolation box timeline and the reconciled plate.
#[derive(Debug, Clone)]
pub struct VehicleReport {
    record: IdentityRecord,
    plate: ReconciledPlate,
}

impl VehicleReport {
    /// Return the identity of the report
    pub fn track_id(&self) -> u64 {
        self.record.track_id()
    }

    /// Identity record with a dense per-frame timeline.
    pub fn record(&self) -> &IdentityRecord {
        &self.record
    }

    /// Return the reconciled plate of the identity
    pub fn plate(&self) -> &ReconciledPlate {
        &self.plate
    }
}

/// Frame-by-frame vehicle tracking and plate reconciliation pipeline.
///
/// Consumes detector and OCR output one frame at a time in strict video
/// order, and yields one [`VehicleReport`] per confirmed identity at the
/// end of the stream. Detector and OCR calls happen outside; the engine
/// only imposes that their results arrive in frame order.
///
/// # Examples
///
/// ```
/// use platetrack::{
///     BoundingBox, Detection, Engine, EngineConfig, ObjectClass, PlateObservation,
///     TextCandidate,
/// };
///
/// let mut engine = Engine::new(EngineConfig::default()).unwrap();
///
/// for frame in 0..10 {
///     let vehicle = Detection::new(
///         None,
///         BoundingBox::new(0.0, 0.0, 80.0, 60.0),
///         0.9,
///         ObjectClass::Vehicle,
///         frame,
///     );
///     let plate = PlateObservation::new(
///         Detection::new(
///             None,
///             BoundingBox::new(20.0, 40.0, 60.0, 55.0),
///             0.8,
///             ObjectClass::Plate,
///             frame,
///         ),
///         vec![TextCandidate::new("34ABC123", 0.9, frame)],
///     );
///     engine.process_frame(frame, vec![vehicle], vec![plate]).unwrap();
/// }
///
/// for report in engine.finish() {
///     println!("{}: {}", report.track_id(), report.plate().text());
/// }
/// ```
#[derive(Debug)]
pub struct Engine {
    tracker: Tracker,
    associator: PlateAssociator,
    reconciler: PlateReconciler,
    last_frame: Option<u64>,
}

impl Engine {
    /// Returns a new Engine, or an error when any configuration section
    /// is invalid.
    pub fn new(config: EngineConfig) -> Result<Engine, Error> {
        config.validate()?;
        Ok(Engine {
            tracker: Tracker::new(config.tracker)?,
            associator: PlateAssociator::new(config.plate_association)?,
            reconciler: PlateReconciler::new(config.reconciler)?,
            last_frame: None,
        })
    }

    /// Process one frame of detector and OCR output.
    ///
    /// Steps the tracker with the vehicle detections, then maps each
    /// plate observation onto a confirmed vehicle identity. Plates that
    /// match no vehicle are discarded for the frame; they never seed
    /// identities of their own.
    ///
    /// # Parameters
    ///
    /// * `frame_index`: Video frame index; must strictly increase across
    ///   calls.
    /// * `vehicles`: Vehicle detections of the frame.
    /// * `plates`: Plate detections of the frame with their OCR readings.
    pub fn process_frame(
        &mut self,
        frame_index: u64,
        vehicles: Vec<Detection>,
        plates: Vec<PlateObservation>,
    ) -> Result<(), Error> {
        if let Some(last) = self.last_frame {
            if frame_index <= last {
                return Err(Error::OutOfOrderFrame {
                    frame: frame_index,
                    last,
                });
            }
        }
        self.last_frame = Some(frame_index);

        self.tracker.step(vehicles);

        // Only confirmed identities receive plates.
        let confirmed: Vec<(u64, BoundingBox)> = self
            .tracker
            .confirmed_tracks()
            .map(|track| (track.track_id(), track.bbox()))
            .collect();

        for plate in plates {
            match self.associator.associate(plate.detection(), &confirmed) {
                Some(track_id) => {
                    self.tracker.attach_plate(
                        track_id,
                        frame_index,
                        plate.detection.bbox().clone(),
                        plate.candidates,
                    );
                }
                None => debug!(
                    frame = frame_index,
                    plate_id = %plate.detection.id(),
                    "discarded plate with no owning vehicle"
                ),
            }
        }

        Ok(())
    }

    /// Finish the stream and produce the per-identity reports.
    ///
    /// Remaining tracks are finalized as-is. Interpolation and
    /// reconciliation are independent across identities and run in
    /// parallel. Reports come back sorted by track id.
    pub fn finish(&mut self) -> Vec<VehicleReport> {
        let records = self.tracker.finalize();
        debug!(identities = records.len(), "finalizing stream");

        let mut reports: Vec<VehicleReport> = records
            .into_par_iter()
            .map(|mut record| {
                interpolation::interpolate(&mut record);
                if record.candidates().is_empty() {
                    warn!(
                        track_id = record.track_id(),
                        "identity finished without plate evidence"
                    );
                }
                let plate = self
                    .reconciler
                    .reconcile(record.track_id(), record.candidates());
                VehicleReport { record, plate }
            })
            .collect();
        reports.sort_by_key(|report| report.track_id());
        reports
    }
}

/*!
Vehicle tracking and plate-text reconciliation.

Per frame, vehicle detections drive a SORT-style Kalman tracker that
assigns stable identities, and plate detections (with their OCR
readings) are attached to the vehicle identity that owns them. When the
stream ends, each identity's box timeline is densified by linear
interpolation and its OCR readings are collapsed into one validated
plate string.

```
use platetrack::{
    BoundingBox, Detection, Engine, EngineConfig, ObjectClass, PlateObservation, TextCandidate,
};

let mut engine = Engine::new(EngineConfig::default()).unwrap();

for frame in 0..10 {
    let vehicle = Detection::new(
        None,
        BoundingBox::new(0.0, 0.0, 80.0, 60.0),
        0.9,
        ObjectClass::Vehicle,
        frame,
    );
    let plate = PlateObservation::new(
        Detection::new(
            None,
            BoundingBox::new(20.0, 40.0, 60.0, 55.0),
            0.8,
            ObjectClass::Plate,
            frame,
        ),
        vec![TextCandidate::new("34ABC123", 0.9, frame)],
    );
    engine.process_frame(frame, vec![vehicle], vec![plate]).unwrap();
}

for report in engine.finish() {
    assert_eq!(report.plate().text(), "34ABC123");
}
```
*/
#[macro_use]
extern crate lazy_static;

mod bounding_box;
mod config;
mod detection;
mod engine;
mod error;
pub mod interpolation;
pub mod iou_matching;
mod kalman_filter;
pub mod linear_assignment;
mod plate_association;
mod reconciliation;
mod track;
mod tracker;

pub use bounding_box::BoundingBox;
pub use config::{EngineConfig, PlateAssociationConfig, ReconcilerConfig, TrackerConfig};
pub use detection::{Detection, ObjectClass, TextCandidate};
pub use engine::{Engine, PlateObservation, VehicleReport};
pub use error::Error;
pub use kalman_filter::KalmanFilter;
pub use plate_association::PlateAssociator;
pub use reconciliation::{
    ConfusionTable, PlateGrammar, PlateReconciler, ReconciledPlate,
};
pub use track::{IdentityRecord, Track, TrackState};
pub use tracker::Tracker;

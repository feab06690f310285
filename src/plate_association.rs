use crate::config::PlateAssociationConfig;
use crate::{BoundingBox, Detection, Error};
use tracing::debug;

/// Assigns plate detections to vehicle tracks within a single frame.
///
/// A plate belongs to the vehicle box that contains its center; when no
/// box does, the vehicle with the highest overlap is used instead, as
/// long as that overlap clears the configured minimum. Plates that match
/// neither way are reported unassociated.
#[derive(Debug, Clone)]
pub struct PlateAssociator {
    config: PlateAssociationConfig,
}

impl PlateAssociator {
    /// Returns a new PlateAssociator, or an error when the configuration
    /// is invalid.
    pub fn new(config: PlateAssociationConfig) -> Result<PlateAssociator, Error> {
        config.validate()?;
        Ok(PlateAssociator { config })
    }

    /// Resolve the owning vehicle for one plate detection.
    ///
    /// # Parameters
    ///
    /// * `plate`: The plate detection.
    /// * `vehicles`: `(track_id, bbox)` pairs of the confirmed tracks in
    ///   the current frame, ascending by track id.
    ///
    /// # Returns
    ///
    /// The owning track id, or `None` when no vehicle qualifies. Ties on
    /// overlap go to the smaller track id.
    pub fn associate(&self, plate: &Detection, vehicles: &[(u64, BoundingBox)]) -> Option<u64> {
        let (cx, cy) = plate.bbox().center();

        if let Some((track_id, _)) = vehicles.iter().find(|(_, bbox)| bbox.contains(cx, cy)) {
            return Some(*track_id);
        }

        let mut best: Option<(u64, f32)> = None;
        for (track_id, bbox) in vehicles {
            let iou = plate.bbox().iou(bbox);
            if iou >= self.config.min_iou {
                match best {
                    Some((_, best_iou)) if best_iou >= iou => {}
                    _ => best = Some((*track_id, iou)),
                }
            }
        }

        if best.is_none() {
            debug!(
                plate_id = %plate.id(),
                frame = plate.frame_index(),
                "plate left unassociated"
            );
        }
        best.map(|(track_id, _)| track_id)
    }
}

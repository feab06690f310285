use crate::{BoundingBox, Detection, Track};
use ndarray::*;

/// Intersection over union cost matrix between predicted track boxes and
/// current-frame detections.
///
/// # Returns
///
/// A cost matrix of shape `(tracks.len(), detections.len())` where entry
/// `(i, j)` is `1 - iou(tracks[i], detections[j])`.
pub fn iou_cost_matrix(tracks: &[Track], detections: &[Detection]) -> Array2<f32> {
    Array2::from_shape_fn((tracks.len(), detections.len()), |(row, col)| {
        1.0 - tracks[row].bbox().iou(detections[col].bbox())
    })
}

/// Pairwise intersection over union between two box sets, one row per
/// entry of `boxes`.
pub fn iou_matrix(boxes: &[BoundingBox], candidates: &[BoundingBox]) -> Array2<f32> {
    Array2::from_shape_fn((boxes.len(), candidates.len()), |(row, col)| {
        boxes[row].iou(&candidates[col])
    })
}

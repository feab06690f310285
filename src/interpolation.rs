use crate::track::IdentityRecord;
use crate::BoundingBox;
use tracing::debug;

/// Fill the gaps in an identity's box timeline.
///
/// Every frame index between the first and last observed frame that has
/// no direct detection receives a box linearly interpolated from the two
/// bracketing observations, corner by corner. Frames before the first or
/// after the last observation are never extrapolated; the record's
/// effective lifetime stays exactly `[first_frame, last_frame]`.
///
/// Records with fewer than two observed frames are left untouched.
pub fn interpolate(record: &mut IdentityRecord) {
    let frames = record.frames();
    let (first, last) = match (frames.first(), frames.last()) {
        (Some(first), Some(last)) if frames.len() >= 2 => (first.0, last.clone()),
        _ => return,
    };

    let span = (last.0 - first + 1) as usize;
    if span == frames.len() {
        // Already dense.
        return;
    }

    let mut dense: Vec<(u64, BoundingBox)> = Vec::with_capacity(span);
    for window in frames.windows(2) {
        let (frame_a, ref box_a) = window[0];
        let (frame_b, ref box_b) = window[1];
        dense.push((frame_a, box_a.clone()));

        for frame in frame_a + 1..frame_b {
            let t = (frame - frame_a) as f32 / (frame_b - frame_a) as f32;
            dense.push((frame, lerp(box_a, box_b, t)));
        }
    }
    dense.push(last);

    debug!(
        track_id = record.track_id(),
        observed = frames.len(),
        filled = dense.len() - frames.len(),
        "interpolated timeline gaps"
    );
    record.set_frames(dense);
}

fn lerp(a: &BoundingBox, b: &BoundingBox, t: f32) -> BoundingBox {
    BoundingBox::new(
        a.x1() + (b.x1() - a.x1()) * t,
        a.y1() + (b.y1() - a.y1()) * t,
        a.x2() + (b.x2() - a.x2()) * t,
        a.y2() + (b.y2() - a.y2()) * t,
    )
}

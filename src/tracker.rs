use crate::config::TrackerConfig;
use crate::track::IdentityRecord;
use crate::{
    iou_matching, linear_assignment, BoundingBox, Detection, Error, KalmanFilter, TextCandidate,
    Track,
};
use tracing::{debug, warn};

/// This is the multi-target tracker.
///
/// Owns the set of active tracks and performs the per-frame
/// predict → associate → update → birth/death cycle. Identities are
/// allocated from a counter owned by the instance, so multiple trackers
/// can run independently.
///
/// # Examples
///
/// ```
/// use platetrack::{BoundingBox, Detection, ObjectClass, Tracker, TrackerConfig};
///
/// let mut tracker = Tracker::new(TrackerConfig::default()).unwrap();
///
/// for frame in 0..5 {
///     let detection = Detection::new(
///         None,
///         BoundingBox::new(0.0, 0.0, 50.0, 50.0),
///         0.9,
///         ObjectClass::Vehicle,
///         frame,
///     );
///     tracker.step(vec![detection]);
/// }
///
/// for track in tracker.confirmed_tracks() {
///     println!("{} {:?}", track.track_id(), track.bbox());
/// }
/// ```
#[derive(Debug)]
pub struct Tracker {
    config: TrackerConfig,
    /// A Kalman filter to smooth target trajectories in image space.
    kf: KalmanFilter,
    /// The list of active tracks at the current time step, ascending by id.
    tracks: Vec<Track>,
    /// Used to allocate identifiers to new tracks; ids are never reused.
    next_id: u64,
    /// Records of deleted tracks that reached Confirmed.
    finished: Vec<IdentityRecord>,
}

impl Tracker {
    /// Returns a new Tracker, or an error when the configuration is invalid.
    pub fn new(config: TrackerConfig) -> Result<Tracker, Error> {
        config.validate()?;
        Ok(Tracker {
            config,
            kf: KalmanFilter::default(),
            tracks: vec![],
            next_id: 1,
            finished: vec![],
        })
    }

    /// Return the active tracks
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Confirmed tracks only; tentative identities are withheld from
    /// downstream consumers to suppress spurious single-frame detections.
    pub fn confirmed_tracks(&self) -> impl Iterator<Item = &Track> {
        self.tracks.iter().filter(|track| track.is_confirmed())
    }

    /// Advance the tracker by one frame.
    ///
    /// Detections with degenerate boxes are dropped up front. The
    /// remaining detections are associated to predicted track positions
    /// with a minimum-cost assignment on `1 - IOU`; unmatched detections
    /// seed new tentative tracks, and tracks unmatched for longer than
    /// `max_age` frames are deleted.
    ///
    /// # Parameters
    ///
    /// * `detections`: The vehicle detections of the current frame.
    pub fn step(&mut self, detections: Vec<Detection>) {
        let detections = detections
            .into_iter()
            .filter(|detection| {
                if detection.bbox().is_degenerate() {
                    warn!(
                        detection_id = %detection.id(),
                        frame = detection.frame_index(),
                        "dropped degenerate detection"
                    );
                    false
                } else {
                    true
                }
            })
            .collect::<Vec<_>>();

        for track in &mut self.tracks {
            track.predict(&self.kf);
        }

        let cost_matrix = iou_matching::iou_cost_matrix(&self.tracks, &detections);
        let (matches, unmatched_tracks, unmatched_detections) =
            linear_assignment::min_cost_matching(cost_matrix.view(), 1.0 - self.config.min_iou);

        for m in &matches {
            self.tracks[m.track_idx()].update(&self.kf, &detections[m.detection_idx()]);
        }
        for track_idx in &unmatched_tracks {
            self.tracks[*track_idx].mark_missed();
        }
        if !unmatched_tracks.is_empty() {
            debug!(
                unmatched = unmatched_tracks.len(),
                "tracks without an acceptable detection this frame"
            );
        }

        for detection_idx in unmatched_detections {
            let track = Track::new(self.next_id, &self.kf, &detections[detection_idx]);
            self.next_id += 1;
            self.tracks.push(track);
        }

        for track in &mut self.tracks {
            if track.is_tentative() && track.hit_streak() >= self.config.min_hits {
                debug!(track_id = track.track_id(), "track confirmed");
                track.confirm();
            }
        }

        let max_age = self.config.max_age;
        let (expired, active): (Vec<Track>, Vec<Track>) = std::mem::take(&mut self.tracks)
            .into_iter()
            .partition(|track| track.time_since_update() > max_age);
        self.tracks = active;
        for track in expired {
            self.retire(track);
        }
    }

    /// Attach a plate observation to an active track's identity record.
    pub fn attach_plate(
        &mut self,
        track_id: u64,
        frame_index: u64,
        bbox: BoundingBox,
        candidates: Vec<TextCandidate>,
    ) {
        if let Some(track) = self
            .tracks
            .iter_mut()
            .find(|track| track.track_id() == track_id)
        {
            track.attach_plate(frame_index, bbox, candidates);
        }
    }

    /// Finalize at end-of-stream: every remaining track is retired as-is
    /// and all surviving identity records are returned, ascending by id.
    pub fn finalize(&mut self) -> Vec<IdentityRecord> {
        for track in std::mem::take(&mut self.tracks) {
            self.retire(track);
        }
        let mut records = std::mem::take(&mut self.finished);
        records.sort_by_key(|record| record.track_id());
        records
    }

    /// Delete a track, keeping its record only if the identity was ever
    /// reported. Never-confirmed tracks vanish without a trace by design.
    fn retire(&mut self, mut track: Track) {
        let confirmed = track.is_confirmed();
        track.mark_deleted();
        if confirmed {
            self.finished.push(track.into_record());
        } else {
            warn!(
                track_id = track.track_id(),
                hits = track.hits(),
                "track deleted before confirmation; no identity reported"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::*;
    use anyhow::Result;
    use rand::prelude::*;
    use rand_distr::Normal;
    use rand_pcg::{Lcg64Xsh32, Pcg32};

    fn detection(x1: f32, y1: f32, x2: f32, y2: f32, frame_index: u64) -> Detection {
        Detection::new(
            None,
            BoundingBox::new(x1, y1, x2, y2),
            0.9,
            ObjectClass::Vehicle,
            frame_index,
        )
    }

    /// Returns a pseudo-random (deterministic) f32 between -0.5 and +0.5
    fn next_f32(rng: &mut Lcg64Xsh32) -> f32 {
        (rng.next_u32() as f64 / u32::MAX as f64) as f32 - 0.5
    }

    /// Returns a vec of length n with a normal distribution
    fn normal_vec(rng: &mut Lcg64Xsh32, mean: f32, std_dev: f32, n: i32) -> Vec<f32> {
        let normal = Normal::<f32>::new(mean, std_dev).unwrap();
        (0..n).map(|_| normal.sample(rng)).collect()
    }

    #[test]
    fn stable_id_for_repeated_detections() -> Result<()> {
        let mut tracker = Tracker::new(TrackerConfig::default())?;

        for frame in 0..20 {
            tracker.step(vec![detection(10.0, 10.0, 60.0, 60.0, frame)]);
        }

        assert_eq!(tracker.tracks().len(), 1);
        let track = &tracker.tracks()[0];
        assert_eq!(track.track_id(), 1);
        assert!(track.is_confirmed());
        assert_eq!(track.record().frames().len(), 20);

        Ok(())
    }

    #[test]
    fn tentative_until_min_hits() -> Result<()> {
        let mut tracker = Tracker::new(TrackerConfig::default())?;

        tracker.step(vec![detection(0.0, 0.0, 10.0, 10.0, 0)]);
        assert!(tracker.tracks()[0].is_tentative());
        assert_eq!(tracker.confirmed_tracks().count(), 0);

        tracker.step(vec![detection(0.0, 0.0, 10.0, 10.0, 1)]);
        assert!(tracker.tracks()[0].is_tentative());

        tracker.step(vec![detection(0.0, 0.0, 10.0, 10.0, 2)]);
        assert!(tracker.tracks()[0].is_confirmed());
        assert_eq!(tracker.confirmed_tracks().count(), 1);

        Ok(())
    }

    #[test]
    fn low_iou_detection_seeds_new_track() -> Result<()> {
        let mut tracker = Tracker::new(TrackerConfig::default())?;

        for frame in 0..3 {
            tracker.step(vec![detection(0.0, 0.0, 100.0, 100.0, frame)]);
        }
        assert_eq!(tracker.tracks().len(), 1);

        // IOU with the established track is far below the 0.3 minimum:
        // the track must go unmatched and the detection must seed a new
        // tentative track.
        tracker.step(vec![detection(90.0, 90.0, 160.0, 160.0, 3)]);

        assert_eq!(tracker.tracks().len(), 2);
        let established = &tracker.tracks()[0];
        assert_eq!(established.track_id(), 1);
        assert_eq!(established.time_since_update(), 1);
        assert_eq!(established.hit_streak(), 0);
        let spawned = &tracker.tracks()[1];
        assert_eq!(spawned.track_id(), 2);
        assert!(spawned.is_tentative());

        Ok(())
    }

    #[test]
    fn track_deleted_past_max_age() -> Result<()> {
        let mut tracker = Tracker::new(TrackerConfig {
            max_age: 3,
            ..TrackerConfig::default()
        })?;

        for frame in 0..5 {
            tracker.step(vec![detection(0.0, 0.0, 10.0, 10.0, frame)]);
        }
        assert_eq!(tracker.tracks().len(), 1);

        // Starve the track: deleted once time_since_update exceeds max_age.
        for _ in 0..4 {
            tracker.step(vec![]);
        }
        assert!(tracker.tracks().is_empty());

        let records = tracker.finalize();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].track_id(), 1);
        assert_eq!(records[0].frames().len(), 5);

        Ok(())
    }

    #[test]
    fn starved_tentative_track_reports_nothing() -> Result<()> {
        let mut tracker = Tracker::new(TrackerConfig {
            max_age: 2,
            ..TrackerConfig::default()
        })?;

        // One frame only: the track never reaches Confirmed.
        tracker.step(vec![detection(0.0, 0.0, 10.0, 10.0, 0)]);
        for frame in 1..5 {
            tracker.step(vec![detection(500.0, 500.0, 510.0, 510.0, frame)]);
        }

        let records = tracker.finalize();
        assert!(records.iter().all(|record| record.track_id() != 1));

        Ok(())
    }

    #[test]
    fn ids_are_never_reused() -> Result<()> {
        let mut tracker = Tracker::new(TrackerConfig {
            max_age: 1,
            ..TrackerConfig::default()
        })?;

        tracker.step(vec![detection(0.0, 0.0, 10.0, 10.0, 0)]);
        tracker.step(vec![]);
        tracker.step(vec![]);
        assert!(tracker.tracks().is_empty());

        tracker.step(vec![detection(0.0, 0.0, 10.0, 10.0, 3)]);
        assert_eq!(tracker.tracks()[0].track_id(), 2);

        Ok(())
    }

    #[test]
    fn two_crossing_objects_keep_their_ids() -> Result<()> {
        let iterations = 100;

        // deterministic generator
        let mut rng = Pcg32::seed_from_u64(0);
        let mut movement_jitter = (0..1000).map(|_| next_f32(&mut rng)).collect::<Vec<_>>();
        let mut scale_jitter = normal_vec(&mut rng, 0.0, 0.2, 1000);

        let mut tracker = Tracker::new(TrackerConfig::default())?;

        for iteration in 0..iterations {
            // move down-right
            let d0_x = 0.0 + (iteration as f32) + movement_jitter.pop().unwrap();
            let d0_y = 0.0 + (iteration as f32) + movement_jitter.pop().unwrap();
            let d0_w = 10.0 + scale_jitter.pop().unwrap();
            let d0_h = 10.0 + scale_jitter.pop().unwrap();
            let d0 = detection(d0_x, d0_y, d0_x + d0_w, d0_y + d0_h, iteration as u64);

            // move up-left
            let d1_x = 100.0 - (iteration as f32) + movement_jitter.pop().unwrap();
            let d1_y = 100.0 - (iteration as f32) + movement_jitter.pop().unwrap();
            let d1_w = 8.0 + scale_jitter.pop().unwrap();
            let d1_h = 8.0 + scale_jitter.pop().unwrap();
            let d1 = detection(d1_x, d1_y, d1_x + d1_w, d1_y + d1_h, iteration as u64);

            tracker.step(vec![d0, d1]);
        }

        assert_eq!(tracker.tracks().len(), 2);
        assert!(tracker.tracks().iter().all(|track| track.is_confirmed()));

        let ids = tracker
            .tracks()
            .iter()
            .map(|track| track.track_id())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec![1, 2]);

        // Identity 1 ends near the bottom-right, identity 2 near the top-left.
        let t0 = &tracker.tracks()[0];
        let (cx, cy) = t0.bbox().center();
        assert!(cx > 90.0 && cy > 90.0);
        let t1 = &tracker.tracks()[1];
        let (cx, cy) = t1.bbox().center();
        assert!(cx < 15.0 && cy < 15.0);

        Ok(())
    }
}

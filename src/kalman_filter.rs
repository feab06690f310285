use crate::{BoundingBox, Error};
use nalgebra::{SMatrix, SVector};

/// Mean of a track's state distribution: `(cx, cy, s, r, dcx, dcy, ds)`
/// where `(cx, cy)` is the box center, `s` its scale (area) and `r` its
/// aspect ratio. The aspect ratio carries no velocity term.
pub type StateMean = SVector<f32, 7>;

/// Covariance of a track's state distribution.
pub type StateCovariance = SMatrix<f32, 7, 7>;

type Measurement = SVector<f32, 4>;

/**
A simple Kalman filter for tracking bounding boxes in image space.

The 7-dimensional state space

```text
cx, cy, s, r, dcx, dcy, ds
```

contains the bounding box center position (cx, cy), scale s (area),
aspect ratio r, and the respective velocities of everything but the
aspect ratio.

Object motion follows a constant velocity model. The box geometry
(cx, cy, s, r) is taken as a direct observation of the state space
(linear observation model). One filter instance is shared by every
track; tracks own their mean and covariance.
*/
#[derive(Debug, Clone)]
pub struct KalmanFilter {
    motion_mat: SMatrix<f32, 7, 7>,
    update_mat: SMatrix<f32, 4, 7>,
    measurement_noise: SMatrix<f32, 4, 4>,
    process_noise: SMatrix<f32, 7, 7>,
}

impl Default for KalmanFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl KalmanFilter {
    /// Returns a new KalmanFilter
    pub fn new() -> KalmanFilter {
        let ndim = 4;

        // Constant velocity model: position/scale terms are coupled to
        // their velocity terms one time step ahead.
        let mut motion_mat = SMatrix::<f32, 7, 7>::identity();
        for i in 0..3 {
            motion_mat[(i, ndim + i)] = 1.0;
        }

        let mut update_mat = SMatrix::<f32, 4, 7>::zeros();
        for i in 0..ndim {
            update_mat[(i, i)] = 1.0;
        }

        // Scale and aspect ratio measurements are noisier than the center.
        let measurement_noise =
            SMatrix::<f32, 4, 4>::from_diagonal(&SVector::<f32, 4>::from([1.0, 1.0, 10.0, 10.0]));
        let process_noise = SMatrix::<f32, 7, 7>::from_diagonal(&SVector::<f32, 7>::from([
            1.0, 1.0, 1.0, 1.0, 0.01, 0.01, 0.0001,
        ]));

        KalmanFilter {
            motion_mat,
            update_mat,
            measurement_noise,
            process_noise,
        }
    }

    /// Create a track state from an unassociated measurement.
    ///
    /// # Parameters
    ///
    /// * `bbox`: Bounding box of the seeding detection.
    ///
    /// # Returns
    ///
    /// The mean vector (7 dimensional) and covariance matrix (7x7) of the
    /// new track. Unobserved velocities are initialized to 0 mean with
    /// wide uncertainty; the observed geometry starts narrow.
    pub fn initiate(&self, bbox: &BoundingBox) -> (StateMean, StateCovariance) {
        let [cx, cy, s, r] = bbox.to_xysr();
        let mean = StateMean::from([cx, cy, s, r, 0.0, 0.0, 0.0]);
        let covariance = StateCovariance::from_diagonal(&SVector::<f32, 7>::from([
            10.0, 10.0, 10.0, 10.0, 10000.0, 10000.0, 10000.0,
        ]));
        (mean, covariance)
    }

    /// Run the prediction step, advancing the state one time step.
    pub fn predict(
        &self,
        mean: &StateMean,
        covariance: &StateCovariance,
    ) -> (StateMean, StateCovariance) {
        let mut mean = *mean;
        // Clamp the scale velocity when it would drive the area
        // non-positive on this step.
        if mean[2] + mean[6] <= 0.0 {
            mean[6] = 0.0;
        }

        let mean = self.motion_mat * mean;
        let covariance =
            self.motion_mat * covariance * self.motion_mat.transpose() + self.process_noise;

        (mean, covariance)
    }

    /// Run the correction step against an observed box.
    ///
    /// # Returns
    ///
    /// The measurement-corrected mean and covariance, or
    /// [`Error::SingularInnovation`] when the innovation covariance
    /// cannot be inverted (the caller keeps the predicted state).
    pub fn update(
        &self,
        mean: &StateMean,
        covariance: &StateCovariance,
        bbox: &BoundingBox,
    ) -> Result<(StateMean, StateCovariance), Error> {
        let measurement = Measurement::from(bbox.to_xysr());

        let innovation = measurement - self.update_mat * mean;
        let innovation_cov =
            self.update_mat * covariance * self.update_mat.transpose() + self.measurement_noise;
        let innovation_cov_inv = innovation_cov
            .try_inverse()
            .ok_or(Error::SingularInnovation)?;

        let kalman_gain = covariance * self.update_mat.transpose() * innovation_cov_inv;

        let new_mean = mean + kalman_gain * innovation;
        let new_covariance =
            (StateCovariance::identity() - kalman_gain * self.update_mat) * covariance;

        Ok((new_mean, new_covariance))
    }

    /// Returns the bounding box described by a state mean.
    pub fn bbox(mean: &StateMean) -> BoundingBox {
        BoundingBox::from_xysr([mean[0], mean[1], mean[2], mean[3]])
    }
}

#[cfg(test)]
mod tests {
    use crate::{BoundingBox, KalmanFilter};
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn initiate() {
        let kf = KalmanFilter::new();
        let (mean, covariance) = kf.initiate(&BoundingBox::new(0.0, 1.0, 2.0, 4.0));

        assert_approx_eq!(mean[0], 1.0);
        assert_approx_eq!(mean[1], 2.5);
        assert_approx_eq!(mean[2], 6.0);
        assert_approx_eq!(mean[3], 2.0 / 3.0);
        assert_eq!(mean[4], 0.0);
        assert_eq!(mean[5], 0.0);
        assert_eq!(mean[6], 0.0);

        // Velocities start far less certain than the observed geometry.
        assert!(covariance[(4, 4)] > covariance[(0, 0)]);
    }

    #[test]
    fn predict_is_constant_velocity() {
        let kf = KalmanFilter::new();
        let (mut mean, mut covariance) = kf.initiate(&BoundingBox::new(0.0, 0.0, 10.0, 10.0));
        mean[4] = 2.0;
        mean[5] = -1.0;

        (mean, covariance) = kf.predict(&mean, &covariance);
        assert_approx_eq!(mean[0], 7.0);
        assert_approx_eq!(mean[1], 4.0);
        assert_approx_eq!(mean[2], 100.0);

        // Uncertainty grows without a measurement.
        (mean, _) = kf.predict(&mean, &covariance);
        assert_approx_eq!(mean[0], 9.0);
        assert_approx_eq!(mean[1], 3.0);
    }

    #[test]
    fn predict_clamps_collapsing_scale() {
        let kf = KalmanFilter::new();
        let (mut mean, covariance) = kf.initiate(&BoundingBox::new(0.0, 0.0, 2.0, 2.0));
        mean[6] = -10.0;

        let (mean, _) = kf.predict(&mean, &covariance);
        assert_eq!(mean[2], 4.0);
        assert_eq!(mean[6], 0.0);
    }

    #[test]
    fn update_moves_toward_measurement() {
        let kf = KalmanFilter::new();
        let (mean, covariance) = kf.initiate(&BoundingBox::new(0.0, 0.0, 10.0, 10.0));
        let (mean, covariance) = kf.predict(&mean, &covariance);

        let observed = BoundingBox::new(4.0, 4.0, 14.0, 14.0);
        let (mean, _) = kf.update(&mean, &covariance, &observed).unwrap();

        // Corrected center sits between prediction (5.0) and measurement (9.0).
        assert!(mean[0] > 5.0 && mean[0] < 9.0);
        assert!(mean[1] > 5.0 && mean[1] < 9.0);
        // The correction also produces a velocity estimate.
        assert!(mean[4] > 0.0);
    }

    #[test]
    fn state_round_trips_through_bbox() {
        let kf = KalmanFilter::new();
        let bbox = BoundingBox::new(3.0, 7.0, 23.0, 17.0);
        let (mean, _) = kf.initiate(&bbox);
        let back = KalmanFilter::bbox(&mean);

        assert_approx_eq!(back.x1(), bbox.x1(), 1e-3);
        assert_approx_eq!(back.y1(), bbox.y1(), 1e-3);
        assert_approx_eq!(back.x2(), bbox.x2(), 1e-3);
        assert_approx_eq!(back.y2(), bbox.y2(), 1e-3);
    }
}

//! Constant-velocity Kalman filter over bounding boxes.
//!
//! State is [cx, cy, s, r, vcx, vcy, vs] where s is the box area and r its
//! aspect ratio; the aspect ratio carries no velocity term. Measurements are
//! [cx, cy, s, r] taken from a detection's bounding box.

use nalgebra::{SMatrix, SVector};

use crate::shared::bbox::BoundingBox;

type State = SVector<f64, 7>;
type Measurement = SVector<f64, 4>;
type StateCov = SMatrix<f64, 7, 7>;

pub struct BoxMotionFilter {
    x: State,
    p: StateCov,
    f: StateCov,
    h: SMatrix<f64, 4, 7>,
    q: StateCov,
    r: SMatrix<f64, 4, 4>,
}

impl BoxMotionFilter {
    /// Initializes from a founding detection with zero velocity and high
    /// velocity covariance.
    pub fn new(bbox: &BoundingBox) -> Self {
        let z = measurement_from_box(bbox);
        let mut x = State::zeros();
        x.fixed_rows_mut::<4>(0).copy_from(&z);

        let mut f = StateCov::identity();
        f[(0, 4)] = 1.0;
        f[(1, 5)] = 1.0;
        f[(2, 6)] = 1.0;

        let mut h = SMatrix::<f64, 4, 7>::zeros();
        for i in 0..4 {
            h[(i, i)] = 1.0;
        }

        let p = StateCov::from_diagonal(&SVector::<f64, 7>::from_row_slice(&[
            10.0, 10.0, 10.0, 10.0, 1e4, 1e4, 1e4,
        ]));
        let q = StateCov::from_diagonal(&SVector::<f64, 7>::from_row_slice(&[
            1.0, 1.0, 1.0, 1.0, 0.01, 0.01, 0.0001,
        ]));
        let r = SMatrix::<f64, 4, 4>::from_diagonal(&SVector::<f64, 4>::from_row_slice(&[
            1.0, 1.0, 10.0, 10.0,
        ]));

        Self { x, p, f, h, q, r }
    }

    /// Advances the state one frame and returns the predicted box.
    pub fn predict(&mut self) -> BoundingBox {
        // A scale heading below zero would make the next state meaningless.
        if self.x[6] + self.x[2] <= 0.0 {
            self.x[6] = 0.0;
        }
        self.x = self.f * self.x;
        self.p = self.f * self.p * self.f.transpose() + self.q;
        self.current_box()
    }

    /// Corrects the state with a matched detection.
    pub fn update(&mut self, bbox: &BoundingBox) {
        let z = measurement_from_box(bbox);
        let y = z - self.h * self.x;
        let s = self.h * self.p * self.h.transpose() + self.r;
        let Some(s_inv) = s.try_inverse() else {
            // Singular innovation covariance; keep the prediction.
            return;
        };
        let k = self.p * self.h.transpose() * s_inv;
        self.x += k * y;
        self.p = (StateCov::identity() - k * self.h) * self.p;
    }

    /// Current state as a box, never thinner than one pixel.
    pub fn current_box(&self) -> BoundingBox {
        let s = self.x[2].max(1.0);
        let r = self.x[3].max(1e-4);
        let width = (s * r).sqrt().max(1.0);
        let height = (s / width).max(1.0);
        BoundingBox::from_center(self.x[0], self.x[1], width, height)
    }
}

fn measurement_from_box(bbox: &BoundingBox) -> Measurement {
    let (cx, cy) = bbox.center();
    Measurement::from_row_slice(&[cx, cy, bbox.area(), bbox.width / bbox.height.max(1e-9)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_new_filter_reproduces_founding_box() {
        let bbox = BoundingBox::new(10.0, 20.0, 8.0, 4.0);
        let filter = BoxMotionFilter::new(&bbox);
        let out = filter.current_box();
        assert_relative_eq!(out.x, bbox.x, epsilon = 1e-9);
        assert_relative_eq!(out.y, bbox.y, epsilon = 1e-9);
        assert_relative_eq!(out.width, bbox.width, epsilon = 1e-9);
        assert_relative_eq!(out.height, bbox.height, epsilon = 1e-9);
    }

    #[test]
    fn test_first_prediction_is_stationary() {
        let bbox = BoundingBox::new(10.0, 20.0, 8.0, 4.0);
        let mut filter = BoxMotionFilter::new(&bbox);
        let predicted = filter.predict();
        let (cx, cy) = predicted.center();
        assert_relative_eq!(cx, 14.0, epsilon = 1e-9);
        assert_relative_eq!(cy, 22.0, epsilon = 1e-9);
    }

    #[test]
    fn test_filter_learns_constant_velocity() {
        // Box moving +3 px/frame in x; after a few correction cycles the
        // prediction should lead the last measurement.
        let mut filter = BoxMotionFilter::new(&BoundingBox::new(0.0, 10.0, 10.0, 10.0));
        let mut last_cx = 5.0;
        for step in 1..=10 {
            filter.predict();
            let measured = BoundingBox::new(3.0 * step as f64, 10.0, 10.0, 10.0);
            filter.update(&measured);
            last_cx = measured.center().0;
        }
        let predicted = filter.predict();
        let (cx, _) = predicted.center();
        assert!(
            cx > last_cx + 1.0,
            "prediction {cx} should lead last measurement {last_cx}"
        );
    }

    #[test]
    fn test_update_pulls_state_toward_measurement() {
        let mut filter = BoxMotionFilter::new(&BoundingBox::new(0.0, 0.0, 10.0, 10.0));
        filter.predict();
        filter.update(&BoundingBox::new(4.0, 0.0, 10.0, 10.0));
        let (cx, _) = filter.current_box().center();
        assert!(cx > 5.0 && cx < 9.0, "corrected center {cx}");
    }

    #[test]
    fn test_emitted_box_never_degenerates() {
        let mut filter = BoxMotionFilter::new(&BoundingBox::new(0.0, 0.0, 1.0, 1.0));
        // Shrinking measurements drive the scale toward zero.
        for _ in 0..20 {
            filter.predict();
            filter.update(&BoundingBox::new(0.0, 0.0, 0.5, 0.5));
        }
        let out = filter.predict();
        assert!(out.width >= 1.0);
        assert!(out.height >= 1.0);
    }
}

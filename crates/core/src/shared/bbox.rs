/// Axis-aligned bounding box in pixel coordinates.
///
/// `x`/`y` is the top-left corner. Boxes are compared with IoU everywhere in
/// the tracking pipeline, so the zero-area degenerate case must return 0.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_center(cx: f64, cy: f64, width: f64, height: f64) -> Self {
        Self {
            x: cx - width / 2.0,
            y: cy - height / 2.0,
            width,
            height,
        }
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Intersection over union with another box, in [0, 1].
    pub fn iou(&self, other: &BoundingBox) -> f64 {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = (self.x + self.width).min(other.x + other.width);
        let y2 = (self.y + self.height).min(other.y + other.height);

        let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
        if inter == 0.0 {
            return 0.0;
        }

        inter / (self.area() + other.area() - inter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[test]
    fn test_iou_identical() {
        let a = BoundingBox::new(10.0, 10.0, 100.0, 100.0);
        assert_relative_eq!(a.iou(&a), 1.0);
    }

    #[test]
    fn test_iou_no_overlap() {
        let a = BoundingBox::new(0.0, 0.0, 50.0, 50.0);
        let b = BoundingBox::new(100.0, 100.0, 50.0, 50.0);
        assert_relative_eq!(a.iou(&b), 0.0);
    }

    #[test]
    fn test_iou_partial_overlap() {
        // intersection 50x100 = 5000, union 10000 + 10000 - 5000 = 15000
        let a = BoundingBox::new(0.0, 0.0, 100.0, 100.0);
        let b = BoundingBox::new(50.0, 0.0, 100.0, 100.0);
        assert_relative_eq!(a.iou(&b), 5000.0 / 15000.0);
    }

    #[test]
    fn test_iou_is_symmetric() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(5.0, 5.0, 15.0, 15.0);
        assert_relative_eq!(a.iou(&b), b.iou(&a));
    }

    #[test]
    fn test_iou_touching_edges() {
        let a = BoundingBox::new(0.0, 0.0, 50.0, 50.0);
        let b = BoundingBox::new(50.0, 0.0, 50.0, 50.0);
        assert_relative_eq!(a.iou(&b), 0.0);
    }

    #[rstest]
    #[case::zero_width(BoundingBox::new(0.0, 0.0, 0.0, 100.0))]
    #[case::zero_height(BoundingBox::new(0.0, 0.0, 100.0, 0.0))]
    fn test_iou_degenerate_is_zero(#[case] a: BoundingBox) {
        let b = BoundingBox::new(0.0, 0.0, 50.0, 50.0);
        assert_relative_eq!(a.iou(&b), 0.0);
    }

    #[test]
    fn test_iou_in_unit_range() {
        let boxes = [
            BoundingBox::new(0.0, 0.0, 10.0, 10.0),
            BoundingBox::new(3.0, 3.0, 4.0, 9.0),
            BoundingBox::new(-5.0, -5.0, 20.0, 2.0),
            BoundingBox::new(9.0, 9.0, 1.0, 1.0),
        ];
        for a in &boxes {
            for b in &boxes {
                let v = a.iou(b);
                assert!((0.0..=1.0).contains(&v), "iou {v} out of range");
            }
        }
    }

    #[test]
    fn test_from_center_round_trip() {
        let b = BoundingBox::from_center(50.0, 40.0, 20.0, 10.0);
        assert_relative_eq!(b.x, 40.0);
        assert_relative_eq!(b.y, 35.0);
        let (cx, cy) = b.center();
        assert_relative_eq!(cx, 50.0);
        assert_relative_eq!(cy, 40.0);
    }
}

/// BoundingBox represents an axis-aligned box in image coordinates,
/// stored as its top-left and bottom-right corners.
#[derive(Debug, Clone)]
pub struct BoundingBox {
    /// Left edge (min x)
    x1: f32,
    /// Top edge (min y)
    y1: f32,
    /// Right edge (max x)
    x2: f32,
    /// Bottom edge (max y)
    y2: f32,
}

impl PartialEq for BoundingBox {
    fn eq(&self, other: &Self) -> bool {
        self.x1 == other.x1 && self.y1 == other.y1 && self.x2 == other.x2 && self.y2 == other.y2
    }
}

impl BoundingBox {
    /// Returns a new BoundingBox
    ///
    /// # Parameters
    ///
    /// * `x1`: Left edge.
    /// * `y1`: Top edge.
    /// * `x2`: Right edge.
    /// * `y2`: Bottom edge.
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> BoundingBox {
        BoundingBox { x1, y1, x2, y2 }
    }

    /// Returns the left edge of the bounding box
    pub fn x1(&self) -> f32 {
        self.x1
    }

    /// Returns the top edge of the bounding box
    pub fn y1(&self) -> f32 {
        self.y1
    }

    /// Returns the right edge of the bounding box
    pub fn x2(&self) -> f32 {
        self.x2
    }

    /// Returns the bottom edge of the bounding box
    pub fn y2(&self) -> f32 {
        self.y2
    }

    /// Returns the width of the bounding box
    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    /// Returns the height of the bounding box
    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }

    /// Returns the center of the bounding box as `(x, y)`
    pub fn center(&self) -> (f32, f32) {
        (
            self.x1 + (self.width() / 2.0),
            self.y1 + (self.height() / 2.0),
        )
    }

    /// Returns the area of the bounding box
    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    /// Returns true if the box has zero or negative area. Degenerate
    /// boxes are rejected as measurements and never enter a track state.
    pub fn is_degenerate(&self) -> bool {
        self.area() <= 0.0 || !self.area().is_finite()
    }

    /// Returns true if `(x, y)` lies inside the box (edges inclusive).
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x1 && x <= self.x2 && y >= self.y1 && y <= self.y2
    }

    /// Compute intersection over union with another box.
    ///
    /// # Returns
    ///
    /// The intersection over union in [0.0, 1.0]. Degenerate inputs yield 0.0.
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let ix1 = self.x1.max(other.x1);
        let iy1 = self.y1.max(other.y1);
        let ix2 = self.x2.min(other.x2);
        let iy2 = self.y2.min(other.y2);

        let intersection = (ix2 - ix1).max(0.0) * (iy2 - iy1).max(0.0);
        let union = self.area() + other.area() - intersection;
        if union <= 0.0 {
            0.0
        } else {
            intersection / union
        }
    }

    /// Returns the box in measurement space `(center x, center y, scale, aspect ratio)`,
    /// where scale is the area and the aspect ratio is `width / height`.
    pub fn to_xysr(&self) -> [f32; 4] {
        let (cx, cy) = self.center();
        [cx, cy, self.area(), self.width() / self.height()]
    }

    /// Builds a box from measurement space `(center x, center y, scale, aspect ratio)`.
    pub fn from_xysr(xysr: [f32; 4]) -> BoundingBox {
        let [cx, cy, s, r] = xysr;
        let width = (s.max(0.0) * r.max(0.0)).sqrt();
        let height = if width > 0.0 { s / width } else { 0.0 };
        BoundingBox::new(
            cx - (width / 2.0),
            cy - (height / 2.0),
            cx + (width / 2.0),
            cy + (height / 2.0),
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn center_and_area() {
        let bbox = BoundingBox::new(1.0, 2.0, 14.0, 6.0);
        assert_eq!(bbox.center(), (7.5, 4.0));
        assert_eq!(bbox.area(), 52.0);
    }

    #[test]
    fn iou() {
        let a = BoundingBox::new(0.0, 0.0, 5.0, 5.0);
        assert_eq!(a.iou(&a), 1.0);
        assert_eq!(a.iou(&BoundingBox::new(5.0, 5.0, 10.0, 10.0)), 0.0);
        assert_approx_eq!(a.iou(&BoundingBox::new(1.0, 1.0, 7.0, 7.0)), 0.35555556, 1e-6);
    }

    #[test]
    fn degenerate() {
        assert!(BoundingBox::new(3.0, 3.0, 3.0, 5.0).is_degenerate());
        assert!(BoundingBox::new(5.0, 5.0, 3.0, 6.0).is_degenerate());
        assert!(!BoundingBox::new(0.0, 0.0, 1.0, 1.0).is_degenerate());
    }

    #[test]
    fn xysr_round_trip() {
        let bbox = BoundingBox::new(1.0, 2.0, 14.0, 6.0);
        let [cx, cy, s, r] = bbox.to_xysr();
        assert_eq!((cx, cy), (7.5, 4.0));
        assert_eq!(s, 52.0);
        assert_approx_eq!(r, 3.25, 1e-6);

        let back = BoundingBox::from_xysr([cx, cy, s, r]);
        assert_approx_eq!(back.x1(), 1.0, 1e-4);
        assert_approx_eq!(back.y1(), 2.0, 1e-4);
        assert_approx_eq!(back.x2(), 14.0, 1e-4);
        assert_approx_eq!(back.y2(), 6.0, 1e-4);
    }
}

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in pixel space.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    min: Vec2,
    size: Vec2,
}

impl Aabb {
    /// Creates a box from its upper-left corner and extent.
    #[must_use]
    pub const fn new(min: Vec2, size: Vec2) -> Self {
        Self { min, size }
    }

    /// Creates a box of `size` centred on `center`.
    #[must_use]
    pub fn from_center(center: Vec2, size: Vec2) -> Self {
        Self::new(center - size * 0.5, size)
    }

    /// Upper-left corner.
    #[must_use]
    pub const fn min(&self) -> Vec2 {
        self.min
    }

    /// Lower-right corner.
    #[must_use]
    pub fn max(&self) -> Vec2 {
        self.min + self.size
    }

    /// Width and height.
    #[must_use]
    pub const fn size(&self) -> Vec2 {
        self.size
    }

    /// Centre point.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        self.min + self.size * 0.5
    }

    /// Reports whether the point lies inside the box, edges included.
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        let max = self.max();
        point.x >= self.min.x && point.y >= self.min.y && point.x <= max.x && point.y <= max.y
    }

    /// Reports whether the two boxes share interior area.
    #[must_use]
    pub fn overlaps(&self, other: &Aabb) -> bool {
        let max = self.max();
        let other_max = other.max();
        self.min.x < other_max.x
            && other.min.x < max.x
            && self.min.y < other_max.y
            && other.min.y < max.y
    }

    /// Returns the box displaced by `delta`.
    #[must_use]
    pub fn translated(&self, delta: Vec2) -> Self {
        Self::new(self.min + delta, self.size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touching_boxes_do_not_overlap() {
        let left = Aabb::new(Vec2::ZERO, Vec2::splat(32.0));
        let right = Aabb::new(Vec2::new(32.0, 0.0), Vec2::splat(32.0));
        assert!(!left.overlaps(&right));
        assert!(left.overlaps(&right.translated(Vec2::new(-0.5, 0.0))));
    }

    #[test]
    fn centred_box_reports_its_centre() {
        let bounds = Aabb::from_center(Vec2::new(50.0, 40.0), Vec2::new(20.0, 10.0));
        assert_eq!(bounds.min(), Vec2::new(40.0, 35.0));
        assert_eq!(bounds.center(), Vec2::new(50.0, 40.0));
        assert!(bounds.contains(Vec2::new(60.0, 45.0)));
        assert!(!bounds.contains(Vec2::new(60.1, 45.0)));
    }
}

use crate::math::{Point3, Vector3, TOLERANCE};

/// An axis-aligned bounding box.
///
/// All queries are padded by the global tolerance, so boxes that merely
/// touch still count as overlapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    min: Point3,
    max: Point3,
}

impl Bounds {
    /// Creates a bounding box from its extreme corners.
    #[must_use]
    pub fn new(min: Point3, max: Point3) -> Self {
        Self { min, max }
    }

    /// Tight bounding box of a set of points, or `None` when it is empty.
    #[must_use]
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Point3>,
    {
        let mut points = points.into_iter();
        let first = points.next()?;
        let mut bounds = Self {
            min: *first,
            max: *first,
        };
        for point in points {
            bounds.expand(point);
        }
        Some(bounds)
    }

    /// Tight bounding box of a triangle.
    #[must_use]
    pub fn from_triangle(a: &Point3, b: &Point3, c: &Point3) -> Self {
        let mut bounds = Self { min: *a, max: *a };
        bounds.expand(b);
        bounds.expand(c);
        bounds
    }

    /// Returns the minimum corner.
    #[must_use]
    pub fn min(&self) -> &Point3 {
        &self.min
    }

    /// Returns the maximum corner.
    #[must_use]
    pub fn max(&self) -> &Point3 {
        &self.max
    }

    /// Returns the center point of the box.
    #[must_use]
    pub fn center(&self) -> Point3 {
        Point3::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
            (self.min.z + self.max.z) / 2.0,
        )
    }

    /// Grows the box to include the point.
    pub fn expand(&mut self, point: &Point3) {
        for i in 0..3 {
            self.min[i] = self.min[i].min(point[i]);
            self.max[i] = self.max[i].max(point[i]);
        }
    }

    /// Grows the box to include another box.
    pub fn merge(&mut self, other: &Bounds) {
        self.expand(&other.min);
        self.expand(&other.max);
    }

    /// Checks whether the two boxes overlap, within tolerance.
    #[must_use]
    pub fn overlaps(&self, other: &Bounds) -> bool {
        (0..3).all(|i| {
            self.min[i] <= other.max[i] + TOLERANCE && self.max[i] >= other.min[i] - TOLERANCE
        })
    }

    /// Checks whether the point lies inside the box, within tolerance.
    #[must_use]
    pub fn contains_point(&self, point: &Point3) -> bool {
        (0..3).all(|i| point[i] >= self.min[i] - TOLERANCE && point[i] <= self.max[i] + TOLERANCE)
    }

    /// Checks whether `other` lies entirely inside this box.
    #[must_use]
    pub fn contains(&self, other: &Bounds) -> bool {
        (0..3).all(|i| other.min[i] >= self.min[i] && other.max[i] <= self.max[i])
    }

    /// Checks whether a ray starting at `origin` along `direction` passes
    /// through the box. Uses the slab test; the box is padded by tolerance
    /// so grazing rays count as hits.
    #[must_use]
    pub fn intersects_ray(&self, origin: &Point3, direction: &Vector3) -> bool {
        let mut t_min = 0.0_f64;
        let mut t_max = f64::INFINITY;

        for i in 0..3 {
            let inv_d = 1.0 / direction[i];
            let mut t0 = (self.min[i] - TOLERANCE - origin[i]) * inv_d;
            let mut t1 = (self.max[i] + TOLERANCE - origin[i]) * inv_d;
            if inv_d < 0.0 {
                std::mem::swap(&mut t0, &mut t1);
            }
            // f64::max/min ignore NaN, which arises when a zero direction
            // component meets a zero numerator.
            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_max < t_min {
                return false;
            }
        }
        true
    }
}

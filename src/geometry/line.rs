use rand::rngs::StdRng;
use rand::Rng;

use crate::error::{GeometryError, Result};
use crate::math::{Point3, Vector3, TOLERANCE};

/// An infinite line defined by an origin point and a unit direction vector.
///
/// The parametric form is: `P(t) = origin + t * direction`. Since the
/// direction is unit length, `t` is the signed distance from the origin.
#[derive(Debug, Clone)]
pub struct Line {
    origin: Point3,
    direction: Vector3,
}

impl Line {
    /// Creates a new line from an origin and direction.
    ///
    /// # Errors
    ///
    /// Returns an error if the direction vector is zero-length.
    pub fn new(origin: Point3, direction: Vector3) -> Result<Self> {
        let len = direction.norm();
        if len < TOLERANCE {
            return Err(GeometryError::ZeroVector.into());
        }
        Ok(Self {
            origin,
            direction: direction / len,
        })
    }

    /// Returns the origin point of the line.
    #[must_use]
    pub fn origin(&self) -> &Point3 {
        &self.origin
    }

    /// Returns the unit direction vector of the line.
    #[must_use]
    pub fn direction(&self) -> &Vector3 {
        &self.direction
    }

    /// Returns the point at parameter `t`.
    #[must_use]
    pub fn point_at(&self, t: f64) -> Point3 {
        self.origin + self.direction * t
    }

    /// Signed distance of the point's projection onto the line, measured
    /// from the origin along the direction.
    #[must_use]
    pub fn signed_distance(&self, point: &Point3) -> f64 {
        (point - self.origin).dot(&self.direction)
    }

    /// Nudges the direction by a random amount up to `magnitude` per
    /// component, then renormalizes. Used to escape configurations where
    /// the line grazes a plane.
    pub fn perturb(&mut self, magnitude: f64, rng: &mut StdRng) {
        self.direction.x += magnitude * rng.gen::<f64>();
        self.direction.y += magnitude * rng.gen::<f64>();
        self.direction.z += magnitude * rng.gen::<f64>();
        self.direction.normalize_mut();
    }
}

use crate::error::{GeometryError, Result};
use crate::math::{Point3, Vector3, TOLERANCE};

/// An oriented infinite plane in Hessian normal form.
///
/// Points `p` on the plane satisfy `normal · p = offset`. The signed
/// distance of a point is positive on the side the normal points to.
#[derive(Debug, Clone, Copy)]
pub struct Plane {
    normal: Vector3,
    offset: f64,
}

impl Plane {
    /// Creates the plane spanned by three points, oriented by their winding
    /// (counter-clockwise seen from the front).
    ///
    /// # Errors
    ///
    /// Returns an error if the points are collinear (degenerate plane).
    pub fn from_points(a: &Point3, b: &Point3, c: &Point3) -> Result<Self> {
        let normal = (b - a).cross(&(c - a));
        let len = normal.norm();
        if len < TOLERANCE {
            return Err(GeometryError::Degenerate("plane from collinear points".into()).into());
        }
        let normal = normal / len;

        Ok(Self {
            normal,
            offset: normal.dot(&a.coords),
        })
    }

    /// Creates a plane from a point on it and a normal vector.
    ///
    /// # Errors
    ///
    /// Returns an error if the normal vector is zero-length.
    pub fn from_normal(origin: &Point3, normal: &Vector3) -> Result<Self> {
        let len = normal.norm();
        if len < TOLERANCE {
            return Err(GeometryError::ZeroVector.into());
        }
        let normal = normal / len;

        Ok(Self {
            normal,
            offset: normal.dot(&origin.coords),
        })
    }

    /// Returns the unit normal vector of the plane.
    #[must_use]
    pub fn normal(&self) -> &Vector3 {
        &self.normal
    }

    /// Returns the plane offset along the normal.
    #[must_use]
    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Signed distance from the point to the plane, positive on the normal
    /// side.
    #[must_use]
    pub fn signed_distance(&self, point: &Point3) -> f64 {
        self.normal.dot(&point.coords) - self.offset
    }
}

use crate::error::{GeometryError, Result};
use crate::math::{Point2, Point3, Vector3, TOLERANCE};

/// An infinite plane in 3D space with an orthonormal in-plane frame.
///
/// Parametric form: `P(u, v) = origin + u * u_dir + v * v_dir`.
#[derive(Debug, Clone)]
pub struct Plane {
    origin: Point3,
    u_dir: Vector3,
    v_dir: Vector3,
    normal: Vector3,
}

impl Plane {
    /// Creates a plane from an origin and a normal vector.
    ///
    /// The U and V directions are computed automatically.
    ///
    /// # Errors
    ///
    /// Returns an error if the normal vector is zero-length.
    pub fn from_normal(origin: Point3, normal: Vector3) -> Result<Self> {
        let len = normal.norm();
        if len < TOLERANCE {
            return Err(GeometryError::ZeroVector.into());
        }
        let normal = normal / len;

        // Reference vector not parallel to the normal
        let reference = if normal.x.abs() < 0.9 {
            Vector3::new(1.0, 0.0, 0.0)
        } else {
            Vector3::new(0.0, 1.0, 0.0)
        };

        let u_dir = normal.cross(&reference).normalize();
        let v_dir = normal.cross(&u_dir);

        Ok(Self {
            origin,
            u_dir,
            v_dir,
            normal,
        })
    }

    /// Creates the plane `a*x + b*y + c*z + d = 0`.
    ///
    /// # Errors
    ///
    /// Returns an error if `(a, b, c)` is zero-length.
    pub fn from_coefficients(a: f64, b: f64, c: f64, d: f64) -> Result<Self> {
        let normal = Vector3::new(a, b, c);
        let len_sq = normal.norm_squared();
        if len_sq < TOLERANCE * TOLERANCE {
            return Err(GeometryError::ZeroVector.into());
        }
        let origin = Point3::from(normal * (-d / len_sq));
        Self::from_normal(origin, normal)
    }

    /// Returns the origin point of the plane.
    #[must_use]
    pub fn origin(&self) -> &Point3 {
        &self.origin
    }

    /// Returns the U direction vector.
    #[must_use]
    pub fn u_dir(&self) -> &Vector3 {
        &self.u_dir
    }

    /// Returns the V direction vector.
    #[must_use]
    pub fn v_dir(&self) -> &Vector3 {
        &self.v_dir
    }

    /// Returns the unit normal of the plane.
    #[must_use]
    pub fn plane_normal(&self) -> &Vector3 {
        &self.normal
    }

    /// Signed distance from `p` to the plane, positive on the normal side.
    #[must_use]
    pub fn signed_distance(&self, p: &Point3) -> f64 {
        (p - self.origin).dot(&self.normal)
    }

    /// Projects `p` into the plane's (u, v) frame.
    #[must_use]
    pub fn project(&self, p: &Point3) -> Point2 {
        let d = p - self.origin;
        Point2::new(d.dot(&self.u_dir), d.dot(&self.v_dir))
    }

    /// Maps in-plane coordinates back to 3D.
    #[must_use]
    pub fn evaluate(&self, uv: &Point2) -> Point3 {
        self.origin + self.u_dir * uv.x + self.v_dir * uv.y
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn coefficients_define_offset_plane() {
        let plane = Plane::from_coefficients(0.0, 0.0, 2.0, -4.0).unwrap();
        assert_relative_eq!(plane.origin().z, 2.0);
        assert_relative_eq!(plane.signed_distance(&Point3::new(5.0, -1.0, 3.0)), 1.0);
    }

    #[test]
    fn frame_is_orthonormal() {
        let plane = Plane::from_normal(Point3::origin(), Vector3::new(1.0, 2.0, 3.0)).unwrap();
        assert_relative_eq!(plane.u_dir().norm(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(plane.v_dir().norm(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(plane.u_dir().dot(plane.v_dir()), 0.0, epsilon = 1e-12);
        assert_relative_eq!(plane.u_dir().dot(plane.plane_normal()), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn project_then_evaluate() {
        let plane = Plane::from_coefficients(1.0, 1.0, 0.0, -1.0).unwrap();
        let uv = Point2::new(0.25, -2.0);
        let p = plane.evaluate(&uv);
        assert_relative_eq!(plane.signed_distance(&p), 0.0, epsilon = 1e-12);
        let back = plane.project(&p);
        assert_relative_eq!(back.x, uv.x, epsilon = 1e-12);
        assert_relative_eq!(back.y, uv.y, epsilon = 1e-12);
    }

    #[test]
    fn zero_normal_is_rejected() {
        assert!(Plane::from_coefficients(0.0, 0.0, 0.0, 1.0).is_err());
    }
}

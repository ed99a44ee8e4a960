use nalgebra::{Point3, Rotation3, Unit, Vector3};

/// Angle at `b` formed by `a-b-c`, in degrees.
pub fn angle(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>) -> f64 {
    (a - b).angle(&(c - b)).to_degrees()
}

/// Dihedral angle `p0-p1-p2-p3` in degrees, in (-180, 180].
///
/// Rotating `p3` by `+x` degrees about the `p1 -> p2` axis (right-handed)
/// increases the angle by `x`.
pub fn dihedral(p0: &Point3<f64>, p1: &Point3<f64>, p2: &Point3<f64>, p3: &Point3<f64>) -> f64 {
    let b1 = p1 - p0;
    let b2 = p2 - p1;
    let b3 = p3 - p2;
    let y = b2.norm() * b1.dot(&b2.cross(&b3));
    let x = b1.cross(&b2).dot(&b2.cross(&b3));
    wrap_degrees(y.atan2(x).to_degrees())
}

/// Maps any angle onto (-180, 180].
pub fn wrap_degrees(deg: f64) -> f64 {
    let mut a = deg % 360.0;
    if a > 180.0 {
        a -= 360.0;
    } else if a <= -180.0 {
        a += 360.0;
    }
    a
}

/// Smallest difference between two angles, in [0, 180].
pub fn angular_difference(a: f64, b: f64) -> f64 {
    wrap_degrees(a - b).abs()
}

/// Rotates `points[first_moved..]` by `degrees` about the axis running from
/// `points[axis_from]` to `points[axis_to]`. A zero-length axis leaves the
/// points untouched.
pub fn rotate_about_bond(
    points: &mut [Point3<f64>],
    axis_from: usize,
    axis_to: usize,
    first_moved: usize,
    degrees: f64,
) {
    let origin = points[axis_from];
    let Some(axis) = Unit::try_new(points[axis_to] - origin, 1e-12) else {
        return;
    };
    let rotation = Rotation3::from_axis_angle(&axis, degrees.to_radians());
    for p in points.iter_mut().skip(first_moved) {
        *p = origin + rotation * (*p - origin);
    }
}

/// Geometric test for ring closure between the two ends of a chain.
///
/// Each end is described by two points: the inner atom that will carry the
/// new bond (`h1`, `t1`) and the outer attractor that marks where the bond
/// partner should sit (`h2`, `t2`). The ring closes when each attractor
/// overlaps the opposite inner atom within a tolerance, and the two bond
/// directions point at each other.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosureConditions {
    pub max_h1_t2: f64,
    pub max_h2_t1: f64,
    pub max_h2_t2: f64,
    pub max_dot: f64,
}

impl ClosureConditions {
    /// The overlap tolerance is the mean length of the two end bonds times
    /// `tolerance_factor`.
    pub fn from_ends(
        h2: &Point3<f64>,
        h1: &Point3<f64>,
        t1: &Point3<f64>,
        t2: &Point3<f64>,
        tolerance_factor: f64,
        max_dot: f64,
    ) -> Self {
        let len_h = (h2 - h1).norm();
        let len_t = (t2 - t1).norm();
        let tol = (len_h + len_t) / 2.0 * tolerance_factor;
        Self {
            max_h1_t2: tol,
            max_h2_t1: tol,
            max_h2_t2: len_h + len_t,
            max_dot,
        }
    }

    pub fn is_satisfied(
        &self,
        h2: &Point3<f64>,
        h1: &Point3<f64>,
        t1: &Point3<f64>,
        t2: &Point3<f64>,
    ) -> bool {
        if (h1 - t2).norm() >= self.max_h1_t2 || (h2 - t1).norm() >= self.max_h2_t1 {
            return false;
        }
        if (h2 - t2).norm() >= self.max_h2_t2 {
            return false;
        }
        let h: Vector3<f64> = h2 - h1;
        let t: Vector3<f64> = t2 - t1;
        match (h.try_normalize(1e-12), t.try_normalize(1e-12)) {
            (Some(h), Some(t)) => h.dot(&t) <= self.max_dot,
            _ => false,
        }
    }
}

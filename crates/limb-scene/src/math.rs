//! Matrix helpers shared by evaluation and the transform operations
//!
//! Matrices are column-major and act on column vectors; rotations use the
//! XYZ order (X applied first) with angles in degrees at the attribute level.

use crate::error::{SceneError, SceneResult};
use nalgebra::{Matrix3, Matrix4, Point3, Rotation3, Vector3};

const SCALE_EPSILON: f64 = 1e-12;

/// Rotation from XYZ Euler angles in degrees
#[must_use]
pub fn rotation_from_degrees(angles: &Vector3<f64>) -> Rotation3<f64> {
    Rotation3::from_euler_angles(
        angles.x.to_radians(),
        angles.y.to_radians(),
        angles.z.to_radians(),
    )
}

/// XYZ Euler angles in degrees of a rotation
#[must_use]
pub fn degrees_from_rotation(rotation: &Rotation3<f64>) -> Vector3<f64> {
    let (x, y, z) = rotation.euler_angles();
    Vector3::new(x.to_degrees(), y.to_degrees(), z.to_degrees())
}

/// Upper-left 3x3 block
#[must_use]
pub fn linear_part(m: &Matrix4<f64>) -> Matrix3<f64> {
    m.fixed_view::<3, 3>(0, 0).into_owned()
}

/// Translation column
#[must_use]
pub fn translation_part(m: &Matrix4<f64>) -> Vector3<f64> {
    m.fixed_view::<3, 1>(0, 3).into_owned()
}

/// Homogeneous matrix from a linear block and a translation
#[must_use]
pub fn from_parts(linear: &Matrix3<f64>, translation: &Vector3<f64>) -> Matrix4<f64> {
    let mut m = linear.to_homogeneous();
    m.fixed_view_mut::<3, 1>(0, 3).copy_from(translation);
    m
}

/// Split a linear block into rotation and per-axis scale (no shear)
#[must_use]
pub fn split_rotation_scale(linear: &Matrix3<f64>) -> (Rotation3<f64>, Vector3<f64>) {
    let mut scale = Vector3::new(
        linear.column(0).norm(),
        linear.column(1).norm(),
        linear.column(2).norm(),
    );
    if linear.determinant() < 0.0 {
        scale.x = -scale.x;
    }
    let mut unit = *linear;
    for (i, s) in scale.iter().enumerate() {
        let divisor = if s.abs() < SCALE_EPSILON { 1.0 } else { *s };
        unit.column_mut(i).unscale_mut(divisor);
    }
    (orthonormalize(&unit), scale)
}

/// Closest right-handed rotation by Gram-Schmidt on the first two columns
#[must_use]
pub fn orthonormalize(m: &Matrix3<f64>) -> Rotation3<f64> {
    let x = m
        .column(0)
        .into_owned()
        .try_normalize(SCALE_EPSILON)
        .unwrap_or_else(Vector3::x);
    let column = m.column(1).into_owned();
    let y = (column - x * x.dot(&column))
        .try_normalize(SCALE_EPSILON)
        .unwrap_or_else(|| perpendicular(&x));
    let z = x.cross(&y);
    Rotation3::from_matrix_unchecked(Matrix3::from_columns(&[x, y, z]))
}

fn perpendicular(v: &Vector3<f64>) -> Vector3<f64> {
    v.cross(&Vector3::z())
        .try_normalize(SCALE_EPSILON)
        .or_else(|| v.cross(&Vector3::y()).try_normalize(SCALE_EPSILON))
        .unwrap_or_else(Vector3::y)
}

/// Translate, rotate (degrees), scale of a matrix
#[must_use]
pub fn decompose(m: &Matrix4<f64>) -> (Vector3<f64>, Vector3<f64>, Vector3<f64>) {
    let (rotation, scale) = split_rotation_scale(&linear_part(m));
    (translation_part(m), degrees_from_rotation(&rotation), scale)
}

/// Rotation of a matrix with scale removed
#[must_use]
pub fn rotation_part(m: &Matrix4<f64>) -> Rotation3<f64> {
    split_rotation_scale(&linear_part(m)).0
}

/// Inverse, or `SingularMatrix` naming what was being evaluated
pub fn invert(m: &Matrix4<f64>, context: &str) -> SceneResult<Matrix4<f64>> {
    m.try_inverse()
        .ok_or_else(|| SceneError::SingularMatrix(context.to_string()))
}

/// Apply a homogeneous matrix to a point
#[must_use]
pub fn transform_point(m: &Matrix4<f64>, p: &Point3<f64>) -> Point3<f64> {
    m.transform_point(p)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn euler_round_trip_xyz_order() {
        let angles = Vector3::new(10.0, -20.0, 45.0);
        let back = degrees_from_rotation(&rotation_from_degrees(&angles));
        assert!(close(back.x, 10.0) && close(back.y, -20.0) && close(back.z, 45.0));
    }

    #[test]
    fn rotation_about_z_moves_x_to_y() {
        let r = rotation_from_degrees(&Vector3::new(0.0, 0.0, 90.0));
        let v = r * Vector3::x();
        assert!(close(v.y, 1.0) && close(v.x, 0.0));
    }

    #[test]
    fn decompose_recovers_components() {
        let r = rotation_from_degrees(&Vector3::new(0.0, 30.0, 0.0));
        let linear = r.matrix() * Matrix3::from_diagonal(&Vector3::new(2.0, 1.0, 3.0));
        let m = from_parts(&linear, &Vector3::new(1.0, 2.0, 3.0));
        let (t, rot, s) = decompose(&m);
        assert!(close(t.z, 3.0));
        assert!(close(rot.y, 30.0));
        assert!(close(s.x, 2.0) && close(s.z, 3.0));
    }

    #[test]
    fn half_turn_survives_decomposition() {
        let r = rotation_from_degrees(&Vector3::new(0.0, 0.0, 180.0));
        let (back, scale) = split_rotation_scale(r.matrix());
        assert!((back.matrix() - r.matrix()).norm() < 1e-9);
        assert!(close(scale.x, 1.0));
    }

    #[test]
    fn singular_matrix_reports_context() {
        let err = invert(&Matrix4::zeros(), "probe").unwrap_err();
        assert_eq!(err, SceneError::SingularMatrix("probe".into()));
    }
}

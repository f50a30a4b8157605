//! Control curve shapes

use limb_scene::CurveShape;
use nalgebra::{Point3, Vector3};
use std::f64::consts::TAU;

/// Closed circle of `sections` points around `normal`
#[must_use]
pub fn circle(radius: f64, normal: &Vector3<f64>, sections: usize, degree: u8) -> CurveShape {
    let n = normal.normalize();
    let reference = if n.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    let u = n.cross(&reference).normalize();
    let v = n.cross(&u);
    #[allow(clippy::cast_precision_loss)]
    let step = TAU / sections as f64;
    let points = (0..sections)
        .map(|i| {
            #[allow(clippy::cast_precision_loss)]
            let angle = step * i as f64;
            Point3::from((u * angle.cos() + v * angle.sin()) * radius)
        })
        .collect();
    CurveShape::closed(points, degree)
}

/// Three-axis cross used for the pole-vector control
#[must_use]
pub fn cross() -> CurveShape {
    let points = [
        [0.0, 1.0, 0.0],
        [0.0, -1.0, 0.0],
        [0.0, 0.0, 0.0],
        [-1.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [0.0, 0.0, 0.0],
        [0.0, 0.0, -1.0],
        [0.0, 0.0, 1.0],
    ];
    CurveShape::open(points.iter().map(|p| Point3::from(*p)).collect(), 1)
}

/// Flat plus sign used for the settings control
#[must_use]
pub fn plus() -> CurveShape {
    const A: f64 = 0.333;
    let points = [
        [-A, A],
        [-A, 1.0],
        [A, 1.0],
        [A, A],
        [1.0, A],
        [1.0, -A],
        [A, -A],
        [A, -1.0],
        [-A, -1.0],
        [-A, -A],
        [-1.0, -A],
        [-1.0, A],
        [-A, A],
    ];
    CurveShape::open(
        points.iter().map(|[x, y]| Point3::new(*x, *y, 0.0)).collect(),
        1,
    )
}

/// Two-point polyline
#[must_use]
pub fn line(start: Point3<f64>, end: Point3<f64>) -> CurveShape {
    CurveShape::open(vec![start, end], 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn circle_lies_in_plane_of_normal() {
        for normal in [Vector3::x(), Vector3::y(), -Vector3::z()] {
            let shape = circle(2.5, &normal, 8, 3);
            assert_eq!(shape.points.len(), 8);
            assert!(shape.closed);
            for p in &shape.points {
                assert!(p.coords.dot(&normal).abs() < 1e-12);
                assert!((p.coords.norm() - 2.5).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn fixed_shapes_have_expected_point_counts() {
        assert_eq!(cross().points.len(), 8);
        assert_eq!(plus().points.len(), 13);
        assert_eq!(plus().points.first(), plus().points.last());
    }
}

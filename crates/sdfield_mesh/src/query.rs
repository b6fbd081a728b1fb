//! Point and ray queries against single triangles.

use nalgebra::{Point3, Vector3};

/// Finds the point on the triangle `(a, b, c)` closest to the given point, by
/// determining which Voronoi region of the triangle the point falls in.
pub fn closest_point_on_triangle(
    point: &Point3<f64>,
    a: &Point3<f64>,
    b: &Point3<f64>,
    c: &Point3<f64>,
) -> Point3<f64> {
    let ab = b - a;
    let ac = c - a;

    let ap = point - a;
    let d1 = ab.dot(&ap);
    let d2 = ac.dot(&ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return *a;
    }

    let bp = point - b;
    let d3 = ab.dot(&bp);
    let d4 = ac.dot(&bp);
    if d3 >= 0.0 && d4 <= d3 {
        return *b;
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        return a + ab * (d1 / (d1 - d3));
    }

    let cp = point - c;
    let d5 = ab.dot(&cp);
    let d6 = ac.dot(&cp);
    if d6 >= 0.0 && d5 <= d6 {
        return *c;
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        return a + ac * (d2 / (d2 - d6));
    }

    let va = d3 * d6 - d5 * d4;
    let d43 = d4 - d3;
    let d56 = d5 - d6;
    if va <= 0.0 && d43 >= 0.0 && d56 >= 0.0 {
        return b + (c - b) * (d43 / (d43 + d56));
    }

    let denom = (va + vb + vc).recip();
    a + ab * (vb * denom) + ac * (vc * denom)
}

/// Squared distance from the point to the closest point on the triangle.
pub fn squared_distance_to_triangle(
    point: &Point3<f64>,
    a: &Point3<f64>,
    b: &Point3<f64>,
    c: &Point3<f64>,
) -> f64 {
    (closest_point_on_triangle(point, a, b, c) - point).norm_squared()
}

/// Whether the ray from `origin` along `direction` crosses the triangle
/// `(a, b, c)` in front of the origin (Möller-Trumbore). Rays parallel to the
/// triangle plane never cross it.
pub fn ray_crosses_triangle(
    origin: &Point3<f64>,
    direction: &Vector3<f64>,
    a: &Point3<f64>,
    b: &Point3<f64>,
    c: &Point3<f64>,
) -> bool {
    const EPSILON: f64 = 1e-12;

    let edge_ab = b - a;
    let edge_ac = c - a;

    let h = direction.cross(&edge_ac);
    let det = edge_ab.dot(&h);
    if det.abs() < EPSILON {
        return false;
    }
    let inverse_det = det.recip();

    let s = origin - a;
    let u = inverse_det * s.dot(&h);
    if !(0.0..=1.0).contains(&u) {
        return false;
    }

    let q = s.cross(&edge_ab);
    let v = inverse_det * direction.dot(&q);
    if v < 0.0 || u + v > 1.0 {
        return false;
    }

    inverse_det * edge_ac.dot(&q) > EPSILON
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    fn triangle() -> [Point3<f64>; 3] {
        [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(0.0, 2.0, 0.0),
        ]
    }

    #[test]
    fn should_project_point_above_face_onto_face() {
        let [a, b, c] = triangle();
        let closest = closest_point_on_triangle(&Point3::new(0.5, 0.5, 3.0), &a, &b, &c);
        assert_abs_diff_eq!(closest, Point3::new(0.5, 0.5, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn should_snap_to_vertices_in_vertex_regions() {
        let [a, b, c] = triangle();
        assert_eq!(
            closest_point_on_triangle(&Point3::new(-1.0, -1.0, 1.0), &a, &b, &c),
            a
        );
        assert_eq!(
            closest_point_on_triangle(&Point3::new(3.0, -0.5, 0.0), &a, &b, &c),
            b
        );
        assert_eq!(
            closest_point_on_triangle(&Point3::new(-0.5, 3.0, 0.0), &a, &b, &c),
            c
        );
    }

    #[test]
    fn should_project_onto_edges_in_edge_regions() {
        let [a, b, c] = triangle();
        assert_abs_diff_eq!(
            closest_point_on_triangle(&Point3::new(1.0, -1.0, 0.0), &a, &b, &c),
            Point3::new(1.0, 0.0, 0.0),
            epsilon = 1e-12
        );
        assert_abs_diff_eq!(
            closest_point_on_triangle(&Point3::new(-1.0, 1.0, 0.0), &a, &b, &c),
            Point3::new(0.0, 1.0, 0.0),
            epsilon = 1e-12
        );
        assert_abs_diff_eq!(
            closest_point_on_triangle(&Point3::new(2.0, 2.0, 0.0), &a, &b, &c),
            Point3::new(1.0, 1.0, 0.0),
            epsilon = 1e-12
        );
    }

    #[test]
    fn should_detect_ray_crossing_triangle() {
        let [a, b, c] = triangle();
        let direction = Vector3::z();
        assert!(ray_crosses_triangle(
            &Point3::new(0.5, 0.5, -1.0),
            &direction,
            &a,
            &b,
            &c
        ));
        assert!(!ray_crosses_triangle(
            &Point3::new(0.5, 0.5, 1.0),
            &direction,
            &a,
            &b,
            &c
        ));
        assert!(!ray_crosses_triangle(
            &Point3::new(1.5, 1.5, -1.0),
            &direction,
            &a,
            &b,
            &c
        ));
    }

    #[test]
    fn should_ignore_ray_parallel_to_triangle() {
        let [a, b, c] = triangle();
        assert!(!ray_crosses_triangle(
            &Point3::new(-1.0, 0.5, 0.0),
            &Vector3::x(),
            &a,
            &b,
            &c
        ));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(128))]

        #[test]
        fn closest_point_is_no_farther_than_any_vertex(
            x in -5.0..5.0_f64,
            y in -5.0..5.0_f64,
            z in -5.0..5.0_f64,
        ) {
            let [a, b, c] = triangle();
            let point = Point3::new(x, y, z);
            let distance = squared_distance_to_triangle(&point, &a, &b, &c);
            for vertex in [a, b, c] {
                prop_assert!(distance <= (vertex - point).norm_squared() + 1e-12);
            }
            prop_assert!(distance >= z * z - 1e-12);
        }
    }
}

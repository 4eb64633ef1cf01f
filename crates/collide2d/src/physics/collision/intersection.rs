//! Narrow-phase intersection tests
//!
//! Pure functions over world-space points. Polygons are ordered vertex lists
//! and are always treated as closed (the last vertex connects back to the
//! first). Nothing here allocates or keeps state.

use crate::foundation::math::Point2;

/// Ray-casting parity test: is `point` strictly inside `polygon`?
///
/// A horizontal ray is cast from `point` towards +x and edge crossings are
/// counted. Polygons with fewer than three vertices have no interior; passing
/// one is a caller bug and trips a debug assertion.
pub fn point_in_polygon(point: &Point2, polygon: &[Point2]) -> bool {
    debug_assert!(
        polygon.len() >= 3,
        "point_in_polygon called with a degenerate polygon ({} vertices)",
        polygon.len()
    );
    if polygon.len() < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let (pi, pj) = (&polygon[i], &polygon[j]);
        // The straddle check guarantees pj.y != pi.y, so the division is safe
        if (pi.y > point.y) != (pj.y > point.y)
            && point.x < (pj.x - pi.x) * (point.y - pi.y) / (pj.y - pi.y) + pi.x
        {
            inside = !inside;
        }
        j = i;
    }

    inside
}

/// Parametric segment-segment intersection test
///
/// Returns true when both parametric coefficients lie in `[0, 1]`, so
/// segments that merely touch at an endpoint intersect. Parallel and
/// collinear segments never intersect, even when they overlap.
#[allow(clippy::float_cmp)]
pub fn segments_intersect(a1: &Point2, a2: &Point2, b1: &Point2, b2: &Point2) -> bool {
    let ua_num = (b2.x - b1.x) * (a1.y - b1.y) - (b2.y - b1.y) * (a1.x - b1.x);
    let ub_num = (a2.x - a1.x) * (a1.y - b1.y) - (a2.y - a1.y) * (a1.x - b1.x);
    let denominator = (b2.y - b1.y) * (a2.x - a1.x) - (b2.x - b1.x) * (a2.y - a1.y);

    if denominator == 0.0 {
        return false;
    }

    let ua = ua_num / denominator;
    let ub = ub_num / denominator;
    (0.0..=1.0).contains(&ua) && (0.0..=1.0).contains(&ub)
}

/// Does the segment `a`-`b` cross any edge of `polygon`?
pub fn segment_intersects_polygon(a: &Point2, b: &Point2, polygon: &[Point2]) -> bool {
    polygon_edges(polygon).any(|(c, d)| segments_intersect(a, b, c, d))
}

/// Polygon-polygon overlap
///
/// True when any edge of `a` crosses an edge of `b`, or when either polygon
/// contains a vertex of the other. The containment checks catch the case
/// where one polygon lies entirely inside the other and no edges cross.
pub fn polygon_polygon(a: &[Point2], b: &[Point2]) -> bool {
    if polygon_edges(a).any(|(a1, a2)| segment_intersects_polygon(a1, a2, b)) {
        return true;
    }

    b.iter().any(|vertex| point_in_polygon(vertex, a))
        || a.iter().any(|vertex| point_in_polygon(vertex, b))
}

/// Circle-circle overlap
///
/// Circles whose boundaries only touch (distance exactly equal to the sum
/// of the radii) do not overlap.
pub fn circle_circle(center_a: &Point2, radius_a: f32, center_b: &Point2, radius_b: f32) -> bool {
    nalgebra::distance(center_a, center_b) < radius_a + radius_b
}

/// Distance from `point` to the line or segment through `start` and `end`
///
/// With `clamp_to_segment` the projection is clamped onto the segment;
/// without it the distance is to the infinite line. A zero-length segment
/// measures the distance to `start` in both modes.
#[allow(clippy::float_cmp)]
pub fn point_segment_distance(
    point: &Point2,
    start: &Point2,
    end: &Point2,
    clamp_to_segment: bool,
) -> f32 {
    let direction = end - start;
    let length_squared = direction.norm_squared();
    if length_squared == 0.0 {
        return nalgebra::distance(point, start);
    }

    let mut t = (point - start).dot(&direction) / length_squared;
    if clamp_to_segment {
        t = t.clamp(0.0, 1.0);
    }

    let projection = start + direction * t;
    nalgebra::distance(point, &projection)
}

/// Polygon-circle overlap
///
/// True when the circle's center is inside the polygon, or when any polygon
/// edge passes closer to the center than the radius.
pub fn polygon_circle(polygon: &[Point2], center: &Point2, radius: f32) -> bool {
    if point_in_polygon(center, polygon) {
        return true;
    }

    polygon_edges(polygon)
        .any(|(start, end)| point_segment_distance(center, start, end, true) < radius)
}

/// Consecutive vertex pairs of a closed polygon, wrapping last to first
fn polygon_edges(polygon: &[Point2]) -> impl Iterator<Item = (&Point2, &Point2)> + '_ {
    polygon
        .iter()
        .zip(polygon.iter().cycle().skip(1))
}

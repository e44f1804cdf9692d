//! Point/line/circle/polygon math on top of kurbo

use kurbo::{Affine, Line, Point, Rect, Vec2};
use shared::Point2D;

// ============================================================================
// Conversions
// ============================================================================

/// Convert a scene point to a kurbo Point
pub fn to_point(p: Point2D) -> Point {
    Point::new(p.x, p.y)
}

/// Convert a kurbo Point back to a scene point
pub fn from_point(p: Point) -> Point2D {
    Point2D::new(p.x, p.y)
}

// ============================================================================
// Lines
// ============================================================================

/// Signed area of (a, b, p): positive when `p` is strictly left of the
/// directed line a→b, negative when strictly right, zero when collinear
pub fn side_of_line(a: Point, b: Point, p: Point) -> f64 {
    (b - a).cross(p - a)
}

/// Distance from `p` to the closed segment
pub fn distance_to_segment(p: Point, line: Line) -> f64 {
    let d = line.p1 - line.p0;
    let len2 = d.hypot2();
    if len2 == 0.0 {
        return p.distance(line.p0);
    }
    let t = ((p - line.p0).dot(d) / len2).clamp(0.0, 1.0);
    p.distance(line.p0 + d * t)
}

fn within_box(line: Line, p: Point) -> bool {
    p.x >= line.p0.x.min(line.p1.x)
        && p.x <= line.p0.x.max(line.p1.x)
        && p.y >= line.p0.y.min(line.p1.y)
        && p.y <= line.p0.y.max(line.p1.y)
}

/// Closed segment–segment intersection (touching counts)
pub fn segments_intersect(l1: Line, l2: Line) -> bool {
    let d1 = side_of_line(l2.p0, l2.p1, l1.p0);
    let d2 = side_of_line(l2.p0, l2.p1, l1.p1);
    let d3 = side_of_line(l1.p0, l1.p1, l2.p0);
    let d4 = side_of_line(l1.p0, l1.p1, l2.p1);

    let straddles = |a: f64, b: f64| (a > 0.0 && b < 0.0) || (a < 0.0 && b > 0.0);
    if straddles(d1, d2) && straddles(d3, d4) {
        return true;
    }

    // Collinear endpoint cases
    (d1 == 0.0 && within_box(l2, l1.p0))
        || (d2 == 0.0 && within_box(l2, l1.p1))
        || (d3 == 0.0 && within_box(l1, l2.p0))
        || (d4 == 0.0 && within_box(l1, l2.p1))
}

/// Segment passes strictly closer than `radius` to `center`
pub fn segment_intersects_circle(line: Line, center: Point, radius: f64) -> bool {
    distance_to_segment(center, line) < radius
}

/// Winding contribution of the directed segment a→b for point `q`,
/// counting crossings of the horizontal ray from `q` towards +x.
///
/// +1 when the segment crosses upward with `q` strictly left of it,
/// -1 when it crosses downward with `q` strictly right of it, else 0.
/// The half-open rule on y makes contributions additive over a chain of
/// segments, so a closing edge can be subtracted and re-added exactly.
pub fn winding_contribution(a: Point, b: Point, q: Point) -> i32 {
    if a.y <= q.y {
        if b.y > q.y && side_of_line(a, b, q) > 0.0 {
            return 1;
        }
    } else if b.y <= q.y && side_of_line(a, b, q) < 0.0 {
        return -1;
    }
    0
}

// ============================================================================
// Polygons
// ============================================================================

/// Iterate the closed edges of a polygon (last vertex back to first)
pub fn polygon_edges(polygon: &[Point]) -> impl Iterator<Item = Line> + '_ {
    let n = polygon.len();
    (0..n).map(move |i| Line::new(polygon[i], polygon[(i + 1) % n]))
}

/// Winding number of a closed polygon around `q`
pub fn winding_number(q: Point, polygon: &[Point]) -> i32 {
    polygon_edges(polygon)
        .map(|edge| winding_contribution(edge.p0, edge.p1, q))
        .sum()
}

/// Point-in-polygon test (non-zero winding rule)
pub fn point_in_polygon(q: Point, polygon: &[Point]) -> bool {
    polygon.len() >= 3 && winding_number(q, polygon) != 0
}

/// Polygons overlap: an edge pair crosses or one contains the other
pub fn polygons_intersect(a: &[Point], b: &[Point]) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    if let (Some(ra), Some(rb)) = (bounding_rect(a), bounding_rect(b)) {
        if !rects_overlap(ra, rb) {
            return false;
        }
    }
    for ea in polygon_edges(a) {
        if polygon_edges(b).any(|eb| segments_intersect(ea, eb)) {
            return true;
        }
    }
    point_in_polygon(a[0], b) || point_in_polygon(b[0], a)
}

/// Circle overlaps polygon: centre inside, or an edge strictly inside the
/// circle (covers a polygon lying entirely within the circle)
pub fn circle_intersects_polygon(center: Point, radius: f64, polygon: &[Point]) -> bool {
    if polygon.is_empty() {
        return false;
    }
    if point_in_polygon(center, polygon) {
        return true;
    }
    if polygon.len() == 1 {
        return center.distance(polygon[0]) < radius;
    }
    polygon_edges(polygon).any(|e| segment_intersects_circle(e, center, radius))
}

/// Open polyline segments
pub fn polyline_segments(points: &[Point]) -> impl Iterator<Item = Line> + '_ {
    points.windows(2).map(|w| Line::new(w[0], w[1]))
}

/// Distance from `p` to an open polyline
pub fn distance_to_polyline(p: Point, points: &[Point]) -> f64 {
    match points {
        [] => f64::INFINITY,
        [single] => p.distance(*single),
        _ => polyline_segments(points)
            .map(|seg| distance_to_segment(p, seg))
            .fold(f64::INFINITY, f64::min),
    }
}

/// Distance between two closed segments, zero when they touch
pub fn segment_distance(l1: Line, l2: Line) -> f64 {
    if segments_intersect(l1, l2) {
        return 0.0;
    }
    distance_to_segment(l1.p0, l2)
        .min(distance_to_segment(l1.p1, l2))
        .min(distance_to_segment(l2.p0, l1))
        .min(distance_to_segment(l2.p1, l1))
}

/// Polyline stroked with `half_width` overlaps the polygon: it starts
/// inside, crosses an edge, or passes strictly closer than `half_width`
pub fn polyline_intersects_polygon(points: &[Point], half_width: f64, polygon: &[Point]) -> bool {
    let Some(first) = points.first() else {
        return false;
    };
    if points.len() == 1 {
        return circle_intersects_polygon(*first, half_width, polygon);
    }
    if point_in_polygon(*first, polygon) {
        return true;
    }
    polyline_segments(points).any(|seg| {
        polygon_edges(polygon).any(|e| segments_intersect(seg, e) || segment_distance(seg, e) < half_width)
    })
}

/// Quad covering a segment of the given stroke width
pub fn thick_segment(a: Point, b: Point, width: f64) -> Vec<Point> {
    let half = width * 0.5;
    let d = b - a;
    let len = d.hypot();
    let n = if len > 0.0 {
        Vec2::new(-d.y / len, d.x / len) * half
    } else {
        Vec2::new(0.0, half)
    };
    let along = if len > 0.0 {
        Vec2::ZERO
    } else {
        Vec2::new(half, 0.0)
    };
    vec![a - n - along, b - n + along, b + n + along, a + n - along]
}

/// Convex hull (Andrew's monotone chain), counter-clockwise, without
/// repeated end point. Fewer than three distinct points are returned as-is.
pub fn convex_hull(points: &[Point]) -> Vec<Point> {
    let mut pts: Vec<Point> = points.to_vec();
    pts.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    pts.dedup();
    if pts.len() < 3 {
        return pts;
    }

    let mut lower: Vec<Point> = Vec::new();
    for p in &pts {
        while lower.len() >= 2 && side_of_line(lower[lower.len() - 2], lower[lower.len() - 1], *p) <= 0.0 {
            lower.pop();
        }
        lower.push(*p);
    }
    let mut upper: Vec<Point> = Vec::new();
    for p in pts.iter().rev() {
        while upper.len() >= 2 && side_of_line(upper[upper.len() - 2], upper[upper.len() - 1], *p) <= 0.0 {
            upper.pop();
        }
        upper.push(*p);
    }
    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

// ============================================================================
// Rectangles
// ============================================================================

pub fn bounding_rect(points: &[Point]) -> Option<Rect> {
    let (first, rest) = points.split_first()?;
    Some(
        rest.iter()
            .fold(Rect::from_points(*first, *first), |r, p| r.union_pt(*p)),
    )
}

/// Closed rectangle overlap (touching counts)
pub fn rects_overlap(a: Rect, b: Rect) -> bool {
    a.x0 <= b.x1 && b.x0 <= a.x1 && a.y0 <= b.y1 && b.y0 <= a.y1
}

/// Axis-aligned rectangle as a counter-clockwise polygon
pub fn rect_polygon(a: Point, b: Point) -> Vec<Point> {
    let r = Rect::from_points(a, b);
    vec![
        Point::new(r.x0, r.y0),
        Point::new(r.x1, r.y0),
        Point::new(r.x1, r.y1),
        Point::new(r.x0, r.y1),
    ]
}

// ============================================================================
// Circles and transforms
// ============================================================================

/// Point on the circle's edge closest to `p`
pub fn closest_point_on_circle(center: Point, radius: f64, p: Point) -> Point {
    let v = p - center;
    let len = v.hypot();
    if len == 0.0 {
        return center + Vec2::new(radius, 0.0);
    }
    center + v * (radius / len)
}

/// Rotate `p` about `center` by `angle` radians (counter-clockwise)
pub fn rotate_about(p: Point, center: Point, angle: f64) -> Point {
    let c = center.to_vec2();
    let transform = Affine::translate(c) * Affine::rotate(angle) * Affine::translate(-c);
    transform * p
}

/// Mirror `p` across the infinite line through `axis`
pub fn reflect_across(p: Point, axis: Line) -> Point {
    let d = axis.p1 - axis.p0;
    let len2 = d.hypot2();
    if len2 == 0.0 {
        // Degenerate axis: point reflection through p0
        return axis.p0 + (axis.p0 - p);
    }
    let t = (p - axis.p0).dot(d) / len2;
    let foot = axis.p0 + d * t;
    foot + (foot - p)
}

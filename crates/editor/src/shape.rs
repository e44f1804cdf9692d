//! Hit shapes of scene objects
//!
//! Every selectable entry is reduced to one [`Shape`] for hit-testing.
//! Hidden entries collapse to a small proxy circle at their midpoint so
//! they can still be picked without their full outline taking part.

use kurbo::{Point, Rect, Vec2};
use shared::{
    Annotation, ControlPointId, EdgeId, IntermolecularEdge, IntermolecularRef, ObjectRef, Point2D,
    Scene, Spline, Structure, StructureCircle,
};

use crate::geometry::{bounding_rect, convex_hull, from_point, thick_segment, to_point};
use crate::state::settings::HitSettings;

/// Representative shape of a selectable object
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Circle { center: Point, radius: f64 },
    Polygon(Vec<Point>),
    Polyline { points: Vec<Point>, half_width: f64 },
}

impl Shape {
    /// Single-point stand-in used for hidden objects
    pub fn proxy(at: Point, hit: &HitSettings) -> Shape {
        Shape::Circle {
            center: at,
            radius: hit.hidden_proxy_radius,
        }
    }

    /// Point that stands for the whole shape in winding tests
    pub fn anchor(&self) -> Point {
        match self {
            Shape::Circle { center, .. } => *center,
            Shape::Polygon(points) => vertex_mean(points),
            Shape::Polyline { points, .. } => polyline_middle(points),
        }
    }

    pub fn bounds(&self) -> Rect {
        match self {
            Shape::Circle { center, radius } => {
                Rect::from_center_size(*center, (radius * 2.0, radius * 2.0))
            }
            Shape::Polygon(points) => bounding_rect(points).unwrap_or(Rect::ZERO),
            Shape::Polyline { points, half_width } => bounding_rect(points)
                .map(|r| r.inflate(*half_width, *half_width))
                .unwrap_or(Rect::ZERO),
        }
    }
}

fn vertex_mean(points: &[Point]) -> Point {
    if points.is_empty() {
        return Point::ZERO;
    }
    let sum = points.iter().fold(Vec2::ZERO, |acc, p| acc + p.to_vec2());
    (sum / points.len() as f64).to_point()
}

fn polyline_middle(points: &[Point]) -> Point {
    let n = points.len();
    match n {
        0 => Point::ZERO,
        _ if n % 2 == 1 => points[n / 2],
        _ => points[n / 2 - 1].midpoint(points[n / 2]),
    }
}

// ============================================================================
// Per-object shapes
// ============================================================================

pub fn atom_shape(structure: &Structure, atom_id: u32, hit: &HitSettings) -> Option<Shape> {
    let atom = structure.atoms.get(atom_id)?;
    let center = to_point(atom.position);
    if atom.hidden {
        return Some(Shape::proxy(center, hit));
    }
    Some(Shape::Circle {
        center,
        radius: hit.atom_radius,
    })
}

pub fn edge_shape(structure: &Structure, edge_id: EdgeId, hit: &HitSettings) -> Option<Shape> {
    let edge = structure.edges.get(edge_id)?;
    let (a, b) = structure.edge_segment(edge_id)?;
    let (a, b) = (to_point(a), to_point(b));
    if edge.hidden {
        return Some(Shape::proxy(a.midpoint(b), hit));
    }
    Some(Shape::Polygon(thick_segment(a, b, hit.edge_width)))
}

/// Circle of a structure currently displayed in simplified form
pub fn circle_shape(structure: &Structure) -> Option<Shape> {
    let circle = structure.circle.filter(|c| c.active)?;
    Some(Shape::Circle {
        center: to_point(circle.center),
        radius: circle.radius,
    })
}

pub fn annotation_shape(annotation: &Annotation, hit: &HitSettings) -> Shape {
    if annotation.hidden {
        return Shape::proxy(to_point(annotation.position), hit);
    }
    Shape::Polygon(annotation.corners().iter().copied().map(to_point).collect())
}

pub fn intermolecular_shape(scene: &Scene, r: IntermolecularRef, hit: &HitSettings) -> Option<Shape> {
    let edge = scene.intermolecular.get(r)?;
    let (a, b) = scene.intermolecular_segment(r)?;
    let (a, b) = (to_point(a), to_point(b));
    if edge.hidden {
        return Some(Shape::proxy(a.midpoint(b), hit));
    }
    Some(Shape::Polyline {
        points: vec![a, b],
        half_width: hit.intermolecular_width * 0.5,
    })
}

pub fn control_point_shape(spline: &Spline, point_id: ControlPointId, hit: &HitSettings) -> Option<Shape> {
    let cp = spline.control_points.get(point_id)?;
    Some(Shape::Circle {
        center: to_point(cp.position),
        radius: hit.control_point_radius,
    })
}

pub fn spline_path_shape(spline: &Spline, hit: &HitSettings) -> Option<Shape> {
    let points: Vec<Point> = spline.path().into_iter().map(to_point).collect();
    if points.is_empty() {
        return None;
    }
    if spline.hidden {
        return Some(Shape::proxy(polyline_middle(&points), hit));
    }
    Some(Shape::Polyline {
        points,
        half_width: hit.spline_width * 0.5,
    })
}

// ============================================================================
// Liveness
// ============================================================================

/// Inter-structure edge that can currently be seen: enabled, and every
/// structure it touches is enabled and visible
pub fn intermolecular_is_live(scene: &Scene, edge: &IntermolecularEdge) -> bool {
    edge.enabled
        && edge
            .structure_ids()
            .all(|sid| scene.structure(sid).is_some_and(Structure::is_live))
}

/// Spline whose control points can be picked
pub fn spline_handles_live(spline: &Spline) -> bool {
    spline.enabled && !spline.hidden
}

/// Every selectable object with its shape, in paint order: structures
/// (circle, or atoms then bonds), annotations, inter-structure edges,
/// spline control points
pub fn selectable_shapes(scene: &Scene, hit: &HitSettings) -> Vec<(ObjectRef, Shape)> {
    let mut out = Vec::new();

    for (structure_id, s) in scene.structures.iter() {
        if !s.is_live() {
            continue;
        }
        if let Some(shape) = circle_shape(s) {
            out.push((ObjectRef::Structure { structure_id }, shape));
            continue;
        }
        for atom_id in s.atoms.ids() {
            if let Some(shape) = atom_shape(s, atom_id, hit) {
                out.push((
                    ObjectRef::Atom {
                        structure_id,
                        atom_id,
                    },
                    shape,
                ));
            }
        }
        for edge_id in s.edges.ids() {
            if let Some(shape) = edge_shape(s, edge_id, hit) {
                out.push((
                    ObjectRef::Edge {
                        structure_id,
                        edge_id,
                    },
                    shape,
                ));
            }
        }
    }

    for (annotation_id, a) in scene.annotations.iter() {
        if a.enabled {
            out.push((ObjectRef::Annotation { annotation_id }, annotation_shape(a, hit)));
        }
    }

    for (r, e) in scene.intermolecular.iter() {
        if !intermolecular_is_live(scene, e) {
            continue;
        }
        if let Some(shape) = intermolecular_shape(scene, r, hit) {
            out.push((r.into(), shape));
        }
    }

    for (spline_id, sp) in scene.splines.iter() {
        if !spline_handles_live(sp) {
            continue;
        }
        for point_id in sp.control_points.ids() {
            if let Some(shape) = control_point_shape(sp, point_id, hit) {
                out.push((
                    ObjectRef::ControlPoint {
                        spline_id,
                        point_id,
                    },
                    shape,
                ));
            }
        }
    }

    out
}

// ============================================================================
// Structure outline
// ============================================================================

/// Convex hull of a structure's atom coordinates
pub fn structure_boundary(structure: &Structure) -> Vec<Point2D> {
    let points: Vec<Point> = structure.atoms.values().map(|a| to_point(a.position)).collect();
    convex_hull(&points).into_iter().map(from_point).collect()
}

/// Broad-phase rectangle of a structure, grown by the hit sizes
pub fn structure_bounds(structure: &Structure, hit: &HitSettings) -> Option<Rect> {
    if let Some(Shape::Circle { center, radius }) = circle_shape(structure) {
        return Some(Rect::from_center_size(center, (radius * 2.0, radius * 2.0)));
    }
    let outline: Vec<Point> = if structure.boundary.is_empty() {
        structure.atoms.values().map(|a| to_point(a.position)).collect()
    } else {
        structure.boundary.iter().copied().map(to_point).collect()
    };
    let margin = hit.atom_radius.max(hit.edge_width * 0.5);
    bounding_rect(&outline).map(|r| r.inflate(margin, margin))
}

/// Simplified circle enclosing every atom of the structure
pub fn enclosing_circle(structure: &Structure, padding: f64, hit: &HitSettings) -> Option<StructureCircle> {
    let center = structure.center()?;
    let reach = structure
        .atoms
        .values()
        .map(|a| a.position.distance(center))
        .fold(0.0, f64::max);
    Some(StructureCircle {
        center,
        radius: reach + hit.atom_radius + padding,
        active: false,
    })
}

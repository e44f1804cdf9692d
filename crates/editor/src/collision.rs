//! Collision engine
//!
//! A [`CollisionQuery`] is built once per pointer event (a single point for
//! clicks, a polygon for rectangle and lasso selection) and then tested
//! against the hit shape of every candidate. Atoms, bonds and structure
//! circles report the first match; annotations and inter-structure edges
//! report the last match, because later entries are painted on top.

use std::collections::{BTreeMap, BTreeSet};

use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use shared::{
    AnnotationId, AtomId, ControlPointId, EdgeId, IntermolecularId, IntermolecularKind,
    IntermolecularRef, ObjectRef, Point2D, Scene, SplineId, Structure, StructureId,
};

use crate::geometry::{
    bounding_rect, circle_intersects_polygon, distance_to_polyline, point_in_polygon,
    polygons_intersect, polyline_intersects_polygon, rect_polygon, rects_overlap, to_point,
};
use crate::shape::{
    annotation_shape, atom_shape, circle_shape, control_point_shape, edge_shape,
    intermolecular_is_live, intermolecular_shape, selectable_shapes, spline_handles_live,
    spline_path_shape, structure_bounds, Shape,
};
use crate::state::settings::HitSettings;

#[derive(Debug, Clone)]
enum QueryKind {
    Empty,
    Point(Point),
    Polygon { vertices: Vec<Point>, bounds: Rect },
}

/// Prepared hit-test predicate
#[derive(Debug, Clone)]
pub struct CollisionQuery {
    kind: QueryKind,
}

impl CollisionQuery {
    /// Query for a single pointer position
    pub fn point(p: Point2D) -> Self {
        Self {
            kind: QueryKind::Point(to_point(p)),
        }
    }

    /// Query for a closed polygon (rectangle or lasso outline)
    pub fn polygon(vertices: &[Point2D]) -> Self {
        let vertices: Vec<Point> = vertices.iter().copied().map(to_point).collect();
        let kind = match vertices.len() {
            0 => QueryKind::Empty,
            1 => QueryKind::Point(vertices[0]),
            _ => match bounding_rect(&vertices) {
                Some(bounds) => QueryKind::Polygon { vertices, bounds },
                None => QueryKind::Empty,
            },
        };
        Self { kind }
    }

    /// Axis-aligned rectangle spanned by two corners
    pub fn rectangle(a: Point2D, b: Point2D) -> Self {
        let vertices = rect_polygon(to_point(a), to_point(b));
        let bounds = Rect::from_points(to_point(a), to_point(b));
        Self {
            kind: QueryKind::Polygon { vertices, bounds },
        }
    }

    /// Rectangle covering the query, `None` for an empty polygon
    pub fn bounds(&self) -> Option<Rect> {
        match &self.kind {
            QueryKind::Empty => None,
            QueryKind::Point(p) => Some(Rect::from_points(*p, *p)),
            QueryKind::Polygon { bounds, .. } => Some(*bounds),
        }
    }

    /// Circle test: strict distance for a point, overlap for a polygon
    pub fn test_circle(&self, center: Point, radius: f64) -> bool {
        match &self.kind {
            QueryKind::Empty => false,
            QueryKind::Point(p) => p.distance(center) < radius,
            QueryKind::Polygon { vertices, bounds } => {
                let circle_bounds = Rect::from_center_size(center, (radius * 2.0, radius * 2.0));
                rects_overlap(*bounds, circle_bounds)
                    && circle_intersects_polygon(center, radius, vertices)
            }
        }
    }

    pub fn test_polygon(&self, polygon: &[Point]) -> bool {
        match &self.kind {
            QueryKind::Empty => false,
            QueryKind::Point(p) => point_in_polygon(*p, polygon),
            QueryKind::Polygon { vertices, bounds } => {
                bounding_rect(polygon).is_some_and(|r| rects_overlap(*bounds, r))
                    && polygons_intersect(vertices, polygon)
            }
        }
    }

    pub fn test_polyline(&self, points: &[Point], half_width: f64) -> bool {
        match &self.kind {
            QueryKind::Empty => false,
            QueryKind::Point(p) => distance_to_polyline(*p, points) < half_width,
            QueryKind::Polygon { vertices, bounds } => {
                bounding_rect(points).is_some_and(|r| {
                    rects_overlap(*bounds, r.inflate(half_width, half_width))
                }) && polyline_intersects_polygon(points, half_width, vertices)
            }
        }
    }

    pub fn test(&self, shape: &Shape) -> bool {
        match shape {
            Shape::Circle { center, radius } => self.test_circle(*center, *radius),
            Shape::Polygon(points) => self.test_polygon(points),
            Shape::Polyline { points, half_width } => self.test_polyline(points, *half_width),
        }
    }

    /// Structure broad-phase
    fn may_touch(&self, structure: &Structure, hit: &HitSettings) -> bool {
        match (self.bounds(), structure_bounds(structure, hit)) {
            (Some(q), Some(s)) => rects_overlap(q, s),
            _ => false,
        }
    }
}

// ============================================================================
// Results
// ============================================================================

/// A single resolved hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Hit {
    Atom {
        structure_id: StructureId,
        atom_id: AtomId,
    },
    Edge {
        structure_id: StructureId,
        edge_id: EdgeId,
    },
    StructureCircle {
        structure_id: StructureId,
    },
    Annotation {
        annotation_id: AnnotationId,
    },
    Intermolecular {
        kind: IntermolecularKind,
        id: IntermolecularId,
    },
    SplineControlPoint {
        spline_id: SplineId,
        point_id: ControlPointId,
    },
    SplinePath {
        spline_id: SplineId,
    },
}

impl Hit {
    /// Selection entry this hit stands for
    pub fn object_ref(&self) -> ObjectRef {
        match *self {
            Hit::Atom {
                structure_id,
                atom_id,
            } => ObjectRef::Atom {
                structure_id,
                atom_id,
            },
            Hit::Edge {
                structure_id,
                edge_id,
            } => ObjectRef::Edge {
                structure_id,
                edge_id,
            },
            Hit::StructureCircle { structure_id } => ObjectRef::Structure { structure_id },
            Hit::Annotation { annotation_id } => ObjectRef::Annotation { annotation_id },
            Hit::Intermolecular { kind, id } => ObjectRef::Intermolecular { kind, id },
            Hit::SplineControlPoint {
                spline_id,
                point_id,
            } => ObjectRef::ControlPoint {
                spline_id,
                point_id,
            },
            Hit::SplinePath { spline_id } => ObjectRef::Spline { spline_id },
        }
    }
}

/// Structure-level collisions grouped by owning structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Collisions {
    pub atoms: BTreeMap<StructureId, BTreeSet<AtomId>>,
    pub edges: BTreeMap<StructureId, BTreeSet<EdgeId>>,
    pub structure_circles: BTreeSet<StructureId>,
}

impl Collisions {
    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty() && self.edges.is_empty() && self.structure_circles.is_empty()
    }

    /// Flatten into selection entries
    pub fn object_refs(&self) -> Vec<ObjectRef> {
        let mut out: Vec<ObjectRef> = self
            .structure_circles
            .iter()
            .map(|&structure_id| ObjectRef::Structure { structure_id })
            .collect();
        for (&structure_id, atoms) in &self.atoms {
            out.extend(atoms.iter().map(|&atom_id| ObjectRef::Atom {
                structure_id,
                atom_id,
            }));
        }
        for (&structure_id, edges) in &self.edges {
            out.extend(edges.iter().map(|&edge_id| ObjectRef::Edge {
                structure_id,
                edge_id,
            }));
        }
        out
    }
}

// ============================================================================
// Lookups
// ============================================================================

/// Every atom, bond and structure circle the query touches
pub fn find_collisions(scene: &Scene, query: &CollisionQuery, hit: &HitSettings) -> Collisions {
    let mut found = Collisions::default();

    for (structure_id, s) in scene.structures.iter() {
        if !s.is_live() || !query.may_touch(s, hit) {
            continue;
        }
        if let Some(circle) = circle_shape(s) {
            if query.test(&circle) {
                found.structure_circles.insert(structure_id);
            }
            continue;
        }

        let atoms: BTreeSet<AtomId> = s
            .atoms
            .ids()
            .filter(|id| atom_shape(s, *id, hit).is_some_and(|shape| query.test(&shape)))
            .collect();
        if !atoms.is_empty() {
            found.atoms.insert(structure_id, atoms);
        }

        let edges: BTreeSet<EdgeId> = s
            .edges
            .ids()
            .filter(|id| edge_shape(s, *id, hit).is_some_and(|shape| query.test(&shape)))
            .collect();
        if !edges.is_empty() {
            found.edges.insert(structure_id, edges);
        }
    }

    found
}

/// First atom, bond or structure circle hit, in structure order
/// (atoms before bonds within a structure)
pub fn find_first_structure_collision(
    scene: &Scene,
    query: &CollisionQuery,
    hit: &HitSettings,
) -> Option<Hit> {
    for (structure_id, s) in scene.structures.iter() {
        if !s.is_live() || !query.may_touch(s, hit) {
            continue;
        }
        if let Some(circle) = circle_shape(s) {
            if query.test(&circle) {
                return Some(Hit::StructureCircle { structure_id });
            }
            continue;
        }
        if let Some(atom_id) = s
            .atoms
            .ids()
            .find(|id| atom_shape(s, *id, hit).is_some_and(|shape| query.test(&shape)))
        {
            return Some(Hit::Atom {
                structure_id,
                atom_id,
            });
        }
        if let Some(edge_id) = s
            .edges
            .ids()
            .find(|id| edge_shape(s, *id, hit).is_some_and(|shape| query.test(&shape)))
        {
            return Some(Hit::Edge {
                structure_id,
                edge_id,
            });
        }
    }
    None
}

/// Topmost (last painted) inter-structure edge hit
pub fn find_last_intermolecular_collision(
    scene: &Scene,
    query: &CollisionQuery,
    hit: &HitSettings,
) -> Option<Hit> {
    scene
        .intermolecular
        .iter()
        .rev()
        .filter(|(_, e)| intermolecular_is_live(scene, e))
        .find(|(r, _)| intermolecular_shape(scene, *r, hit).is_some_and(|shape| query.test(&shape)))
        .map(|(IntermolecularRef { kind, id }, _)| Hit::Intermolecular { kind, id })
}

/// Topmost (last declared) annotation hit
pub fn find_last_collision_annotation(
    scene: &Scene,
    query: &CollisionQuery,
    hit: &HitSettings,
) -> Option<Hit> {
    scene
        .annotations
        .iter()
        .rev()
        .filter(|(_, a)| a.enabled)
        .find(|(_, a)| query.test(&annotation_shape(a, hit)))
        .map(|(annotation_id, _)| Hit::Annotation { annotation_id })
}

/// First spline control point hit
pub fn find_first_collision_splines(
    scene: &Scene,
    query: &CollisionQuery,
    hit: &HitSettings,
) -> Option<Hit> {
    for (spline_id, sp) in scene.splines.iter() {
        if !spline_handles_live(sp) {
            continue;
        }
        if let Some(point_id) = sp
            .control_points
            .ids()
            .find(|id| control_point_shape(sp, *id, hit).is_some_and(|shape| query.test(&shape)))
        {
            return Some(Hit::SplineControlPoint {
                spline_id,
                point_id,
            });
        }
    }
    None
}

/// First spline whose drawn path is hit
pub fn find_first_collision_spline_path(
    scene: &Scene,
    query: &CollisionQuery,
    hit: &HitSettings,
) -> Option<Hit> {
    scene
        .splines
        .iter()
        .filter(|(_, sp)| sp.enabled)
        .find(|(_, sp)| spline_path_shape(sp, hit).is_some_and(|shape| query.test(&shape)))
        .map(|(spline_id, _)| Hit::SplinePath { spline_id })
}

/// Click resolution: annotations, then inter-structure edges, spline
/// control points, spline paths and finally structures
pub fn find_topmost_hit(scene: &Scene, query: &CollisionQuery, hit: &HitSettings) -> Option<Hit> {
    find_last_collision_annotation(scene, query, hit)
        .or_else(|| find_last_intermolecular_collision(scene, query, hit))
        .or_else(|| find_first_collision_splines(scene, query, hit))
        .or_else(|| find_first_collision_spline_path(scene, query, hit))
        .or_else(|| find_first_structure_collision(scene, query, hit))
}

/// Every selectable object the query touches, in paint order
pub fn find_all_collisions(scene: &Scene, query: &CollisionQuery, hit: &HitSettings) -> Vec<ObjectRef> {
    selectable_shapes(scene, hit)
        .into_iter()
        .filter(|(_, shape)| query.test(shape))
        .map(|(target, _)| target)
        .collect()
}

//! Closest-object finder
//!
//! Nearest enabled, visible structure / atom / ring / spline control point
//! to a point. Ties go to the first candidate in catalog order.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use shared::{
    AtomId, ControlPointId, Point2D, RingId, Scene, SplineId, Structure, StructureCircle,
    StructureId,
};

use crate::geometry::{closest_point_on_circle, from_point, to_point};

/// How a structure displayed as its simplified circle takes part in a search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircleMode {
    /// The point on the circle's edge closest to the query stands in
    #[default]
    Edge,
    /// The circle centre stands in
    Center,
    /// Skip the structure entirely
    Exclude,
    /// Ignore the circle and use the real coordinates
    Detailed,
}

impl CircleMode {
    /// Parse a mode name; unknown names fall back to the default
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "edge" => CircleMode::Edge,
            "center" | "centre" => CircleMode::Center,
            "exclude" => CircleMode::Exclude,
            "detailed" => CircleMode::Detailed,
            other => {
                tracing::warn!("Unknown circle mode '{}', using {:?}", other, CircleMode::default());
                CircleMode::default()
            }
        }
    }
}

/// Optional allow-list of identifiers
pub type IdFilter<'a> = Option<&'a BTreeSet<u32>>;

fn allowed(filter: IdFilter<'_>, id: u32) -> bool {
    filter.map_or(true, |ids| ids.contains(&id))
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClosestStructure {
    pub structure_id: StructureId,
    pub position: Point2D,
    pub distance: f64,
    /// Found through the simplified circle
    pub via_circle: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClosestAtom {
    pub structure_id: StructureId,
    pub atom_id: AtomId,
    pub position: Point2D,
    pub distance: f64,
    pub via_circle: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClosestRing {
    pub structure_id: StructureId,
    pub ring_id: RingId,
    pub position: Point2D,
    pub distance: f64,
    pub via_circle: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClosestControlPoint {
    pub spline_id: SplineId,
    pub point_id: ControlPointId,
    pub position: Point2D,
    pub distance: f64,
}

/// What a structure contributes to a search
#[derive(Clone, Copy)]
enum Representation {
    /// Real coordinates
    Detailed,
    /// One stand-in point for the structure and all its members
    StandIn(Point2D),
    Skip,
}

fn representation(structure: &Structure, point: Point2D, mode: CircleMode) -> Representation {
    let Some(circle) = structure.circle.filter(|c| c.active) else {
        return Representation::Detailed;
    };
    match mode {
        CircleMode::Edge => Representation::StandIn(circle_edge(&circle, point)),
        CircleMode::Center => Representation::StandIn(circle.center),
        CircleMode::Exclude => Representation::Skip,
        CircleMode::Detailed => Representation::Detailed,
    }
}

fn circle_edge(circle: &StructureCircle, point: Point2D) -> Point2D {
    from_point(closest_point_on_circle(
        to_point(circle.center),
        circle.radius,
        to_point(point),
    ))
}

/// Strict `<` keeps the earliest candidate on ties
fn nearest<T>(point: Point2D, candidates: impl Iterator<Item = (T, Point2D)>) -> Option<(T, Point2D, f64)> {
    let mut best: Option<(T, Point2D, f64)> = None;
    for (item, position) in candidates {
        let d = point.distance(position);
        if best.as_ref().map_or(true, |(_, _, bd)| d < *bd) {
            best = Some((item, position, d));
        }
    }
    best
}

fn live_structures<'a>(
    scene: &'a Scene,
    filter: IdFilter<'a>,
) -> impl Iterator<Item = (StructureId, &'a Structure)> + 'a {
    scene
        .structures
        .iter()
        .filter(move |(id, s)| s.is_live() && allowed(filter, *id))
}

pub fn closest_enabled_structure(
    scene: &Scene,
    point: Point2D,
    filter: IdFilter<'_>,
    mode: CircleMode,
) -> Option<ClosestStructure> {
    let candidates = live_structures(scene, filter).filter_map(|(id, s)| {
        match representation(s, point, mode) {
            Representation::Detailed => s.center().map(|c| ((id, false), c)),
            Representation::StandIn(p) => Some(((id, true), p)),
            Representation::Skip => None,
        }
    });
    nearest(point, candidates).map(|((structure_id, via_circle), position, distance)| ClosestStructure {
        structure_id,
        position,
        distance,
        via_circle,
    })
}

pub fn closest_enabled_atom(
    scene: &Scene,
    point: Point2D,
    filter: IdFilter<'_>,
    mode: CircleMode,
) -> Option<ClosestAtom> {
    let mut candidates: Vec<((StructureId, AtomId, bool), Point2D)> = Vec::new();
    for (sid, s) in live_structures(scene, filter) {
        let rep = representation(s, point, mode);
        for (aid, atom) in s.atoms.iter() {
            if atom.hidden {
                continue;
            }
            match rep {
                Representation::Detailed => candidates.push(((sid, aid, false), atom.position)),
                Representation::StandIn(p) => candidates.push(((sid, aid, true), p)),
                Representation::Skip => {}
            }
        }
    }
    nearest(point, candidates.into_iter()).map(|((structure_id, atom_id, via_circle), position, distance)| {
        ClosestAtom {
            structure_id,
            atom_id,
            position,
            distance,
            via_circle,
        }
    })
}

pub fn closest_enabled_ring(
    scene: &Scene,
    point: Point2D,
    filter: IdFilter<'_>,
    mode: CircleMode,
) -> Option<ClosestRing> {
    let mut candidates: Vec<((StructureId, RingId, bool), Point2D)> = Vec::new();
    for (sid, s) in live_structures(scene, filter) {
        let rep = representation(s, point, mode);
        for rid in s.rings.ids() {
            match rep {
                Representation::Detailed => {
                    if let Some(c) = s.ring_center(rid) {
                        candidates.push(((sid, rid, false), c));
                    }
                }
                Representation::StandIn(p) => candidates.push(((sid, rid, true), p)),
                Representation::Skip => {}
            }
        }
    }
    nearest(point, candidates.into_iter()).map(|((structure_id, ring_id, via_circle), position, distance)| {
        ClosestRing {
            structure_id,
            ring_id,
            position,
            distance,
            via_circle,
        }
    })
}

/// Circle mode has no effect on splines; the parameter keeps the four
/// searches interchangeable
pub fn closest_enabled_spline_control_point(
    scene: &Scene,
    point: Point2D,
    filter: IdFilter<'_>,
    _mode: CircleMode,
) -> Option<ClosestControlPoint> {
    let candidates = scene
        .splines
        .iter()
        .filter(|(id, sp)| sp.enabled && !sp.hidden && allowed(filter, *id))
        .flat_map(|(spline_id, sp)| {
            sp.control_points
                .iter()
                .map(move |(point_id, cp)| ((spline_id, point_id), cp.position))
        });
    nearest(point, candidates).map(|((spline_id, point_id), position, distance)| ClosestControlPoint {
        spline_id,
        point_id,
        position,
        distance,
    })
}

/// Nearest atom when some structures are collapsed into circles.
///
/// A detailed search over expanded structures is compared with a search
/// over circle edges; if a circle is nearer, the detailed search is redone
/// scoped to that one structure with its real coordinates.
pub fn closest_atom_resolving_circles(
    scene: &Scene,
    point: Point2D,
    filter: IdFilter<'_>,
) -> Option<ClosestAtom> {
    let detailed = closest_enabled_atom(scene, point, filter, CircleMode::Exclude);

    let circle_ids: BTreeSet<StructureId> = live_structures(scene, filter)
        .filter(|(_, s)| s.is_circle_mode())
        .map(|(id, _)| id)
        .collect();
    if circle_ids.is_empty() {
        return detailed;
    }
    let simplified = closest_enabled_structure(scene, point, Some(&circle_ids), CircleMode::Edge);

    match (detailed, simplified) {
        (d, Some(s)) if d.map_or(true, |d| s.distance < d.distance) => {
            let scope: BTreeSet<StructureId> = [s.structure_id].into_iter().collect();
            closest_enabled_atom(scene, point, Some(&scope), CircleMode::Detailed)
        }
        (d, _) => d,
    }
}

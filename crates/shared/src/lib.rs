use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

mod catalog;

pub use catalog::{ColorEntry, ColorState, SceneError};

/// Identifier of a structure in the scene catalog
pub type StructureId = u32;
/// Identifier of an atom, unique within its owning structure
pub type AtomId = u32;
/// Identifier of a bond, unique within its owning structure
pub type EdgeId = u32;
/// Identifier of a ring, unique within its owning structure
pub type RingId = u32;
pub type AnnotationId = u32;
pub type SplineId = u32;
/// Identifier of a spline control point, unique within its spline
pub type ControlPointId = u32;
/// Identifier of an inter-structure edge, unique within its kind
pub type IntermolecularId = u32;

/// 2D point in diagram coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: Point2D) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn midpoint(&self, other: Point2D) -> Point2D {
        Point2D::new((self.x + other.x) * 0.5, (self.y + other.y) * 0.5)
    }

    pub fn offset(&self, dx: f64, dy: f64) -> Point2D {
        Point2D::new(self.x + dx, self.y + dy)
    }
}

/// Mean of a set of points, `None` for an empty set
pub fn centroid<I: IntoIterator<Item = Point2D>>(points: I) -> Option<Point2D> {
    let mut sum = Point2D::default();
    let mut count = 0usize;
    for p in points {
        sum.x += p.x;
        sum.y += p.y;
        count += 1;
    }
    if count == 0 {
        return None;
    }
    Some(Point2D::new(sum.x / count as f64, sum.y / count as f64))
}

// ============================================================================
// Collections
// ============================================================================

/// Id-keyed collection with monotonic identifiers.
///
/// Identifiers are handed out from `next_id` and never recycled: removing an
/// entry leaves a gap. Iteration follows identifier order, which is also the
/// order in which entries were declared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection<T> {
    #[serde(default)]
    next_id: u32,
    entries: BTreeMap<u32, T>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self {
            next_id: 0,
            entries: BTreeMap::new(),
        }
    }
}

impl<T> Collection<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value under a freshly allocated identifier
    pub fn insert(&mut self, value: T) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.insert(id, value);
        id
    }

    /// Insert under an explicit identifier (used by loaders and fixtures).
    /// Bumps the allocator past `id` so it is never handed out again.
    pub fn insert_with_id(&mut self, id: u32, value: T) -> Option<T> {
        self.next_id = self.next_id.max(id + 1);
        self.entries.insert(id, value)
    }

    pub fn get(&self, id: u32) -> Option<&T> {
        self.entries.get(&id)
    }

    pub fn get_mut(&mut self, id: u32) -> Option<&mut T> {
        self.entries.get_mut(&id)
    }

    pub fn remove(&mut self, id: u32) -> Option<T> {
        self.entries.remove(&id)
    }

    pub fn contains(&self, id: u32) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Identifier the next `insert` will use
    pub fn next_id(&self) -> u32 {
        self.next_id
    }

    pub fn ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.entries.keys().copied()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (u32, &T)> + '_ {
        self.entries.iter().map(|(id, v)| (*id, v))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (u32, &mut T)> + '_ {
        self.entries.iter_mut().map(|(id, v)| (*id, v))
    }

    pub fn values(&self) -> impl Iterator<Item = &T> + '_ {
        self.entries.values()
    }

    /// Repair the allocator after deserialization of hand-written data
    pub(crate) fn normalize(&mut self) {
        if let Some(max) = self.entries.keys().next_back() {
            self.next_id = self.next_id.max(max + 1);
        }
    }
}

// ============================================================================
// Structures
// ============================================================================

/// Atom of a structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Atom {
    pub element: String,
    pub position: Point2D,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Bond between two atoms of the same structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub from: AtomId,
    pub to: AtomId,
    #[serde(default = "default_bond_order")]
    pub order: u8,
    #[serde(default)]
    pub hidden: bool,
}

fn default_bond_order() -> u8 {
    1
}

/// Ring perceived on a structure (ordered atom cycle)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ring {
    pub atoms: Vec<AtomId>,
    #[serde(default)]
    pub aromatic: bool,
}

/// Simplified circle standing in for a whole structure
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StructureCircle {
    pub center: Point2D,
    pub radius: f64,
    /// true while the structure is displayed as this circle
    #[serde(default)]
    pub active: bool,
}

fn default_true() -> bool {
    true
}

/// Connected molecular graph plus its derived metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Structure {
    pub name: String,
    #[serde(default)]
    pub atoms: Collection<Atom>,
    #[serde(default)]
    pub edges: Collection<Edge>,
    #[serde(default)]
    pub rings: Collection<Ring>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub circle: Option<StructureCircle>,
    /// Cached outline (convex hull of atom positions)
    #[serde(default)]
    pub boundary: Vec<Point2D>,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// History step that created this structure (None = loaded with the scene)
    #[serde(skip)]
    pub created_at_step: Option<usize>,
    #[serde(default)]
    pub annotation_ids: BTreeSet<AnnotationId>,
    #[serde(default)]
    pub spline_ids: BTreeSet<SplineId>,
    #[serde(default)]
    pub intermolecular_ids: BTreeSet<IntermolecularRef>,
}

impl Structure {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            atoms: Collection::new(),
            edges: Collection::new(),
            rings: Collection::new(),
            circle: None,
            boundary: Vec::new(),
            hidden: false,
            enabled: true,
            color: None,
            created_at_step: None,
            annotation_ids: BTreeSet::new(),
            spline_ids: BTreeSet::new(),
            intermolecular_ids: BTreeSet::new(),
        }
    }

    /// Enabled and not hidden
    pub fn is_live(&self) -> bool {
        self.enabled && !self.hidden
    }

    /// Displaying the simplified circle instead of atoms and bonds
    pub fn is_circle_mode(&self) -> bool {
        self.circle.is_some_and(|c| c.active)
    }

    pub fn atom_position(&self, atom_id: AtomId) -> Option<Point2D> {
        self.atoms.get(atom_id).map(|a| a.position)
    }

    /// Endpoints of a bond
    pub fn edge_segment(&self, edge_id: EdgeId) -> Option<(Point2D, Point2D)> {
        let edge = self.edges.get(edge_id)?;
        Some((self.atom_position(edge.from)?, self.atom_position(edge.to)?))
    }

    pub fn ring_center(&self, ring_id: RingId) -> Option<Point2D> {
        let ring = self.rings.get(ring_id)?;
        centroid(ring.atoms.iter().filter_map(|a| self.atom_position(*a)))
    }

    /// Mean atom position
    pub fn center(&self) -> Option<Point2D> {
        centroid(self.atoms.values().map(|a| a.position))
    }
}

// ============================================================================
// Annotations and splines
// ============================================================================

/// Free text label, drawn as a box centered on `position`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub text: String,
    pub position: Point2D,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip)]
    pub created_at_step: Option<usize>,
    /// Structures this label is attached to
    #[serde(default)]
    pub structure_ids: BTreeSet<StructureId>,
}

impl Annotation {
    /// Corner points of the label box, counter-clockwise
    pub fn corners(&self) -> [Point2D; 4] {
        let hw = self.width * 0.5;
        let hh = self.height * 0.5;
        let c = self.position;
        [
            c.offset(-hw, -hh),
            c.offset(hw, -hh),
            c.offset(hw, hh),
            c.offset(-hw, hh),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlPoint {
    pub position: Point2D,
}

/// Curved contact connector approximated by its control points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spline {
    #[serde(default)]
    pub control_points: Collection<ControlPoint>,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip)]
    pub created_at_step: Option<usize>,
    /// Structures this contact runs between
    #[serde(default)]
    pub structure_ids: BTreeSet<StructureId>,
}

impl Spline {
    /// Control point positions in path order
    pub fn path(&self) -> Vec<Point2D> {
        self.control_points.values().map(|c| c.position).collect()
    }
}

// ============================================================================
// Inter-structure edges
// ============================================================================

/// The five categories of edges drawn between structures
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntermolecularKind {
    /// Atom to atom interaction (hydrogen bond, salt bridge, ...)
    AtomPair,
    /// Ring to ring stacking
    PiStacking,
    /// Ring to atom (cation) interaction
    CationPi,
    /// Free distance measurement
    Distance,
    /// Free connector line
    Line,
}

impl IntermolecularKind {
    /// All kinds, in paint order
    pub const ALL: [IntermolecularKind; 5] = [
        IntermolecularKind::AtomPair,
        IntermolecularKind::PiStacking,
        IntermolecularKind::CationPi,
        IntermolecularKind::Distance,
        IntermolecularKind::Line,
    ];

    /// Whether the endpoint pair is legal for this kind
    pub fn accepts(&self, from: &Endpoint, to: &Endpoint) -> bool {
        match self {
            IntermolecularKind::AtomPair => {
                matches!((from, to), (Endpoint::Atom { .. }, Endpoint::Atom { .. }))
            }
            IntermolecularKind::PiStacking => {
                matches!((from, to), (Endpoint::Ring { .. }, Endpoint::Ring { .. }))
            }
            IntermolecularKind::CationPi => matches!(
                (from, to),
                (Endpoint::Ring { .. }, Endpoint::Atom { .. })
                    | (Endpoint::Atom { .. }, Endpoint::Ring { .. })
            ),
            IntermolecularKind::Distance | IntermolecularKind::Line => true,
        }
    }
}

/// One end of an inter-structure edge
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Endpoint {
    Atom {
        structure_id: StructureId,
        atom_id: AtomId,
    },
    Ring {
        structure_id: StructureId,
        ring_id: RingId,
    },
    Point {
        position: Point2D,
    },
}

impl Endpoint {
    pub fn structure_id(&self) -> Option<StructureId> {
        match self {
            Endpoint::Atom { structure_id, .. } | Endpoint::Ring { structure_id, .. } => {
                Some(*structure_id)
            }
            Endpoint::Point { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntermolecularEdge {
    pub from: Endpoint,
    pub to: Endpoint,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip)]
    pub created_at_step: Option<usize>,
}

impl IntermolecularEdge {
    pub fn new(from: Endpoint, to: Endpoint) -> Self {
        Self {
            from,
            to,
            hidden: false,
            enabled: true,
            color: None,
            created_at_step: None,
        }
    }

    /// Structures touched by either endpoint
    pub fn structure_ids(&self) -> impl Iterator<Item = StructureId> {
        self.from.structure_id().into_iter().chain(self.to.structure_id())
    }
}

/// Address of an inter-structure edge across the five collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct IntermolecularRef {
    pub kind: IntermolecularKind,
    pub id: IntermolecularId,
}

/// The five inter-structure edge collections
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct IntermolecularEdges {
    #[serde(default)]
    pub atom_pair: Collection<IntermolecularEdge>,
    #[serde(default)]
    pub pi_stacking: Collection<IntermolecularEdge>,
    #[serde(default)]
    pub cation_pi: Collection<IntermolecularEdge>,
    #[serde(default)]
    pub distance: Collection<IntermolecularEdge>,
    #[serde(default)]
    pub line: Collection<IntermolecularEdge>,
}

impl IntermolecularEdges {
    pub fn of_kind(&self, kind: IntermolecularKind) -> &Collection<IntermolecularEdge> {
        match kind {
            IntermolecularKind::AtomPair => &self.atom_pair,
            IntermolecularKind::PiStacking => &self.pi_stacking,
            IntermolecularKind::CationPi => &self.cation_pi,
            IntermolecularKind::Distance => &self.distance,
            IntermolecularKind::Line => &self.line,
        }
    }

    pub fn of_kind_mut(&mut self, kind: IntermolecularKind) -> &mut Collection<IntermolecularEdge> {
        match kind {
            IntermolecularKind::AtomPair => &mut self.atom_pair,
            IntermolecularKind::PiStacking => &mut self.pi_stacking,
            IntermolecularKind::CationPi => &mut self.cation_pi,
            IntermolecularKind::Distance => &mut self.distance,
            IntermolecularKind::Line => &mut self.line,
        }
    }

    pub fn get(&self, r: IntermolecularRef) -> Option<&IntermolecularEdge> {
        self.of_kind(r.kind).get(r.id)
    }

    pub fn get_mut(&mut self, r: IntermolecularRef) -> Option<&mut IntermolecularEdge> {
        self.of_kind_mut(r.kind).get_mut(r.id)
    }

    /// Every edge in paint order (kind order, then identifier order)
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (IntermolecularRef, &IntermolecularEdge)> + '_ {
        IntermolecularKind::ALL.into_iter().flat_map(move |kind| {
            self.of_kind(kind)
                .iter()
                .map(move |(id, e)| (IntermolecularRef { kind, id }, e))
        })
    }

    pub fn len(&self) -> usize {
        IntermolecularKind::ALL
            .iter()
            .map(|k| self.of_kind(*k).len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ============================================================================
// Object references and the scene
// ============================================================================

/// Address of any selectable entry in the scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ObjectRef {
    Structure {
        structure_id: StructureId,
    },
    Atom {
        structure_id: StructureId,
        atom_id: AtomId,
    },
    Edge {
        structure_id: StructureId,
        edge_id: EdgeId,
    },
    Ring {
        structure_id: StructureId,
        ring_id: RingId,
    },
    Annotation {
        annotation_id: AnnotationId,
    },
    Intermolecular {
        kind: IntermolecularKind,
        id: IntermolecularId,
    },
    Spline {
        spline_id: SplineId,
    },
    ControlPoint {
        spline_id: SplineId,
        point_id: ControlPointId,
    },
}

impl ObjectRef {
    /// Structure owning this entry, if it lives inside one
    pub fn owning_structure(&self) -> Option<StructureId> {
        match self {
            ObjectRef::Structure { structure_id }
            | ObjectRef::Atom { structure_id, .. }
            | ObjectRef::Edge { structure_id, .. }
            | ObjectRef::Ring { structure_id, .. } => Some(*structure_id),
            _ => None,
        }
    }
}

impl From<IntermolecularRef> for ObjectRef {
    fn from(r: IntermolecularRef) -> Self {
        ObjectRef::Intermolecular {
            kind: r.kind,
            id: r.id,
        }
    }
}

fn default_version() -> u32 {
    1
}

/// Scene catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    /// Format version
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub structures: Collection<Structure>,
    #[serde(default)]
    pub annotations: Collection<Annotation>,
    #[serde(default)]
    pub splines: Collection<Spline>,
    #[serde(default)]
    pub intermolecular: IntermolecularEdges,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            version: 1,
            structures: Collection::new(),
            annotations: Collection::new(),
            splines: Collection::new(),
            intermolecular: IntermolecularEdges::default(),
        }
    }
}

//! Incremental lasso selector
//!
//! The lasso outline is treated as a polygon closed by an implicit edge
//! from the last vertex back to the first. Each pointer move only has to
//! update the winding number of every candidate by the delta of three
//! edges (old closing edge out, new segment and new closing edge in), so
//! the cost per move is independent of the outline length.
//!
//! Objects touched by a real segment of the outline are committed at once
//! and never revisited. Objects merely enclosed, or touched only by the
//! closing edge, are temporarily selected and re-evaluated on every move.

use std::collections::{BTreeSet, HashMap};

use kurbo::Point;
use shared::{ObjectRef, Point2D, Scene};

use crate::collision::CollisionQuery;
use crate::geometry::{from_point, to_point, winding_contribution};
use crate::shape::{selectable_shapes, Shape};
use crate::state::settings::HitSettings;

struct Candidate {
    target: ObjectRef,
    shape: Shape,
    anchor: Point,
}

/// Active lasso gesture
pub struct LassoSelector {
    vertices: Vec<Point>,
    candidates: Vec<Candidate>,
    winding: HashMap<ObjectRef, i32>,
    committed: BTreeSet<ObjectRef>,
    temporary: BTreeSet<ObjectRef>,
}

impl LassoSelector {
    /// Start a gesture at `start`, capturing the live candidates of `scene`
    pub fn begin(scene: &Scene, hit: &HitSettings, start: Point2D) -> Self {
        let candidates = selectable_shapes(scene, hit)
            .into_iter()
            .map(|(target, shape)| Candidate {
                target,
                anchor: shape.anchor(),
                shape,
            })
            .collect();
        Self {
            vertices: vec![to_point(start)],
            candidates,
            winding: HashMap::new(),
            committed: BTreeSet::new(),
            temporary: BTreeSet::new(),
        }
    }

    /// Append a vertex to the outline and update the selection
    pub fn extend(&mut self, p: Point2D) {
        let p = to_point(p);
        let (Some(&first), Some(&last)) = (self.vertices.first(), self.vertices.last()) else {
            return;
        };
        if p == last {
            return;
        }

        let segment = [from_point(last), from_point(p)];
        let closing = [from_point(p), from_point(first)];
        let segment_query = CollisionQuery::polygon(&segment);
        let closing_query = CollisionQuery::polygon(&closing);

        self.temporary.clear();
        for c in &self.candidates {
            if self.committed.contains(&c.target) {
                continue;
            }

            let q = c.anchor;
            let delta = winding_contribution(last, p, q) + winding_contribution(p, first, q)
                - winding_contribution(last, first, q);
            let winding = self.winding.entry(c.target).or_insert(0);
            *winding += delta;

            if segment_query.test(&c.shape) {
                self.committed.insert(c.target);
                self.winding.remove(&c.target);
            } else if *winding != 0 || closing_query.test(&c.shape) {
                self.temporary.insert(c.target);
            }
        }

        self.vertices.push(p);
    }

    /// Winding number of an object's anchor around the closed outline
    pub fn winding_number(&self, target: ObjectRef) -> i32 {
        self.winding.get(&target).copied().unwrap_or(0)
    }

    pub fn is_selected(&self, target: ObjectRef) -> bool {
        self.committed.contains(&target) || self.temporary.contains(&target)
    }

    /// Objects touched by the outline so far
    pub fn committed(&self) -> &BTreeSet<ObjectRef> {
        &self.committed
    }

    /// Objects selected only as of the current frame
    pub fn temporary(&self) -> &BTreeSet<ObjectRef> {
        &self.temporary
    }

    /// Outline vertices, first to last
    pub fn vertices(&self) -> Vec<Point2D> {
        self.vertices.iter().copied().map(from_point).collect()
    }

    /// End the gesture, promoting temporary objects
    pub fn finish(mut self) -> BTreeSet<ObjectRef> {
        let temporary = std::mem::take(&mut self.temporary);
        self.committed.extend(temporary);
        tracing::debug!(
            "Lasso finished with {} vertices, {} objects",
            self.vertices.len(),
            self.committed.len()
        );
        self.committed
    }

    /// Abandon the gesture without selecting anything
    pub fn cancel(self) {
        tracing::debug!("Lasso cancelled");
    }
}

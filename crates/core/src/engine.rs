use crate::error::{LayoutAnomaly, StructureError};
use crate::geometry::{child_spans, place_enclosed, place_outermost, size_loop, LoopGeometry};
use crate::log;
use crate::loops::{decompose, Loop, LoopTree, StemId};
use crate::partners::Partners;
use crate::props::{
    GeneralLayoutProps, OutermostLoopShape, PerBaseLayoutProps, ResolvedProps,
};
use crate::stem::{layout_stem, StemFrame};
use crate::types::{LoopMetadata, Point, StemMetadata, StrictLayout};

/// Compute the layout of a structure from scratch.
///
/// Fails only if `partners` cannot be decomposed; parameter problems are
/// recovered from and listed in [`StrictLayout::anomalies`].
pub fn compute_layout(
    partners: &Partners,
    general: &GeneralLayoutProps,
    per_base: &PerBaseLayoutProps,
) -> Result<StrictLayout, StructureError> {
    let tree = decompose(partners)?;
    Ok(layout_tree(&tree, general, per_base))
}

/// Layout engine that keeps the loop tree of the last structure it saw.
///
/// Re-laying out the same partners with new parameters (stretch, flips,
/// rotation, loop shapes) skips decomposition. Results are identical to
/// [`compute_layout`].
#[derive(Debug, Default)]
pub struct LayoutEngine {
    cache: Option<(Partners, LoopTree)>,
}

impl LayoutEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compute(
        &mut self,
        partners: &Partners,
        general: &GeneralLayoutProps,
        per_base: &PerBaseLayoutProps,
    ) -> Result<StrictLayout, StructureError> {
        let tree = match self.cache.take() {
            Some((cached, tree)) if cached == *partners => tree,
            _ => {
                log::debug!(len = partners.len(), "partners changed, decomposing");
                decompose(partners)?
            }
        };
        let layout = layout_tree(&tree, general, per_base);
        self.cache = Some((partners.clone(), tree));
        Ok(layout)
    }

    /// The loop tree reused by the next call with the same partners.
    pub fn cached_tree(&self) -> Option<&LoopTree> {
        self.cache.as_ref().map(|(_, tree)| tree)
    }

    pub fn clear(&mut self) {
        self.cache = None;
    }
}

/// Lay out an already decomposed structure.
pub fn layout_tree(
    tree: &LoopTree,
    general: &GeneralLayoutProps,
    per_base: &PerBaseLayoutProps,
) -> StrictLayout {
    let n = tree.sequence_len();
    let mut anomalies = Vec::new();
    let props = ResolvedProps::new(general, per_base, n, &mut anomalies);
    if n == 0 {
        return StrictLayout {
            anomalies,
            ..StrictLayout::default()
        };
    }

    let flipped = flip_states(tree, &props, &mut anomalies);

    // Bottom-up: every loop is sized from its children's footprints alone.
    let mut geometries = vec![LoopGeometry::Collapsed; tree.loops.len()];
    for (id, lp) in tree.loops.iter().enumerate().rev() {
        geometries[id] = size_loop(lp, tree, &props);
    }
    for (id, geometry) in geometries.iter().enumerate() {
        if geometry.is_degenerate() {
            log::warn!(
                loop_index = id,
                radius = geometry.radius(),
                "loop cannot close, clamping radius"
            );
            anomalies.push(LayoutAnomaly::DegenerateGeometry {
                loop_index: id,
                radius: geometry.radius(),
            });
        }
    }

    // Top-down: place the outermost loop, then each stem and the loop it closes.
    let mut coords = vec![Point::ORIGIN; n];
    let mut centers: Vec<Option<Point>> = vec![None; tree.loops.len()];
    let mut stem_angles = vec![0.0; tree.stems.len()];

    let outer = LoopTree::OUTERMOST;
    let placement = place_outermost(&tree.loops[outer], &geometries[outer], &props, &mut coords);
    centers[outer] = placement.center;
    let mut pending: Vec<(StemId, StemFrame)> = placement.child_frames;
    pending.reverse();

    while let Some((id, frame)) = pending.pop() {
        let frame = if flipped[id] { frame.flipped() } else { frame };
        let node = &tree.stems[id];
        let stem = layout_stem(&node.stem, frame.angle, frame.handedness, &props.general);
        for (p, offset) in node.stem.side5().zip(&stem.side5) {
            coords[p - 1] = frame.origin + *offset;
        }
        for (p, offset) in node.stem.side3().zip(&stem.side3) {
            coords[p - 1] = frame.origin + *offset;
        }
        stem_angles[id] = frame.angle;

        let top = StemFrame::new(
            frame.origin + stem.exit_offset,
            stem.exit_angle,
            frame.handedness,
        );
        let enclosed = node.enclosed_loop;
        let placement = place_enclosed(
            &tree.loops[enclosed],
            &geometries[enclosed],
            top,
            &props,
            &mut coords,
        );
        centers[enclosed] = placement.center;
        pending.extend(placement.child_frames.into_iter().rev());
    }

    // Centre the drawing, then rotate it about the origin.
    let shift = -bounding_box_center(&coords);
    let rotation = props.general.rotation;
    let transform = |p: Point| (p + shift).rotated(rotation);
    for c in coords.iter_mut() {
        *c = transform(*c);
    }

    let stems = tree
        .stems
        .iter()
        .enumerate()
        .map(|(id, node)| StemMetadata {
            position5: node.stem.position5,
            position3: node.stem.position3,
            size: node.stem.size,
            flipped: flipped[id],
            angle: stem_angles[id] + rotation,
        })
        .collect();

    let loops = tree
        .loops
        .iter()
        .zip(&geometries)
        .zip(&centers)
        .map(|((lp, geometry), center)| loop_metadata(lp, geometry, center.map(transform)))
        .collect();

    log::debug!(
        len = n,
        anomalies = anomalies.len(),
        "layout complete"
    );

    StrictLayout {
        coordinates: coords,
        stems,
        loops,
        anomalies,
    }
}

/// A stem is flipped when any of its positions asks for it.
///
/// Only stems standing on a flat outermost loop can flip. Requests on stems
/// inside a round loop are dropped and recorded.
fn flip_states(
    tree: &LoopTree,
    props: &ResolvedProps,
    anomalies: &mut Vec<LayoutAnomaly>,
) -> Vec<bool> {
    let flat = props.general.outermost_loop_shape == OutermostLoopShape::Flat;
    tree.stems
        .iter()
        .map(|node| {
            let stem = &node.stem;
            if !stem.side5().chain(stem.side3()).any(|p| props.flip_stem(p)) {
                return false;
            }
            if flat && node.parent_loop == LoopTree::OUTERMOST {
                return true;
            }
            log::warn!(
                position = stem.position5,
                "ignoring flip of a stem inside a round loop"
            );
            anomalies.push(LayoutAnomaly::IgnoredFlip {
                position5: stem.position5,
            });
            false
        })
        .collect()
}

fn bounding_box_center(coords: &[Point]) -> Point {
    let mut min_x = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for c in coords {
        min_x = min_x.min(c.x);
        max_x = max_x.max(c.x);
        min_y = min_y.min(c.y);
        max_y = max_y.max(c.y);
    }
    if coords.is_empty() {
        return Point::ORIGIN;
    }
    Point::new(0.5 * (min_x + max_x), 0.5 * (min_y + max_y))
}

fn loop_metadata(lp: &Loop, geometry: &LoopGeometry, center: Option<Point>) -> LoopMetadata {
    let spans = match (lp, geometry) {
        (Loop::Outermost { .. }, _) => Vec::new(),
        (_, LoopGeometry::Round(sizing)) => child_spans(lp, sizing),
        _ => Vec::new(),
    };
    LoopMetadata {
        kind: lp.kind(),
        closing_stem: lp.closing_stem(),
        child_stems: lp.child_stems(),
        center,
        radius: geometry.radius(),
        spans,
    }
}

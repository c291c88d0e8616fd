//! Loop sizing and placement.
//!
//! Sizing is bottom-up and only depends on what a loop demands of its
//! perimeter: one chord of `base_pair_spacing` per bounding pair and one gap
//! per backbone step. Placement is top-down and turns a sized loop plus the
//! frame of its closing stem into base coordinates and child stem frames.

use std::f64::consts::{FRAC_PI_2, PI};

use crate::loops::{Loop, LoopChild, LoopTree, StemId};
use crate::partners::Linker;
use crate::props::{LoopShape, OutermostLoopShape, ResolvedProps};
use crate::stem::StemFrame;
use crate::types::{Point, TWO_PI};

const MAX_ITERATIONS: usize = 64;
const TOLERANCE: f64 = 1e-12;

/// Radius and angular allocation of a circular loop.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundSizing {
    pub radius: f64,
    /// Angle subtended by each pair chord
    pub pair_angle: f64,
    /// Angle of each gap, in walk order
    pub gap_angles: Vec<f64>,
    /// The radius equation had no solution and the minimum was used
    pub degenerate: bool,
}

impl RoundSizing {
    /// Distance from the centre to the midpoint of a pair chord.
    pub fn chord_height(&self, chord: f64) -> f64 {
        let half = chord / 2.0;
        (self.radius * self.radius - half * half).max(0.0).sqrt()
    }
}

/// Size of a loop, computed before anything is placed.
#[derive(Debug, Clone, PartialEq)]
pub enum LoopGeometry {
    /// Hairpin without unpaired bases: nothing beyond the closing pair
    Collapsed,
    Round(RoundSizing),
    /// Hairpin bases along two sides of an isosceles triangle
    Triangle { height: f64, gaps: Vec<f64> },
    /// Outermost loop along a straight axis
    Flat { gaps: Vec<f64> },
}

impl LoopGeometry {
    pub fn radius(&self) -> f64 {
        match self {
            LoopGeometry::Round(sizing) => sizing.radius,
            _ => 0.0,
        }
    }

    pub fn is_degenerate(&self) -> bool {
        matches!(self, LoopGeometry::Round(sizing) if sizing.degenerate)
    }
}

/// Something placed along the outermost loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OutermostItem {
    Base(usize),
    Pair(StemId),
}

/// Solve `pairs · 2·asin(chord / 2r) + arc / r = 2π` for `r`.
///
/// The left-hand side decreases in `r`. Its root is bracketed below by the
/// radius at which chords would be arcs and above by the radius at which every
/// pair angle reaches its `π·chord / 2r` bound. Newton steps that leave the
/// bracket are replaced by bisection. Returns `None` when even the smallest
/// admissible radius (`chord / 2`) leaves the loop unclosed.
pub fn solve_radius(pairs: usize, chord: f64, arc: f64) -> Option<f64> {
    let np = pairs as f64;
    let half = chord / 2.0;
    if pairs == 0 {
        return (arc > 0.0).then(|| arc / TWO_PI);
    }

    let f = |r: f64| np * 2.0 * (half / r).min(1.0).asin() + arc / r - TWO_PI;

    let mut lo = ((np * chord + arc) / TWO_PI).max(half);
    if f(lo) < 0.0 {
        return None;
    }
    let mut hi = ((np * PI * half + arc) / TWO_PI).max(lo);

    let mut r = lo;
    for _ in 0..MAX_ITERATIONS {
        let fr = f(r);
        if fr.abs() < TOLERANCE {
            break;
        }
        if fr > 0.0 {
            lo = r;
        } else {
            hi = r;
        }
        let s = (half / r).min(1.0);
        let df = -np * 2.0 * half / (r * r * (1.0 - s * s).sqrt()) - arc / (r * r);
        let mut next = r - fr / df;
        if !next.is_finite() || next <= lo || next >= hi {
            next = 0.5 * (lo + hi);
        }
        r = next;
    }
    Some(r)
}

/// Size a circular loop from its pair count and demanded gap lengths.
///
/// The radius is the root of the closure equation, floored at
/// `max(min_radius, chord / 2)`. At that radius each pair takes its chord
/// angle and the rest of the circle is shared among the gaps in proportion
/// to their demanded lengths.
pub fn size_round(pairs: usize, gaps: &[f64], chord: f64, min_radius: f64) -> RoundSizing {
    let arc: f64 = gaps.iter().sum();
    let floor = min_radius.max(chord / 2.0);
    let solved = solve_radius(pairs, chord, arc);
    let radius = match solved {
        Some(r) if r >= floor => r,
        _ => floor,
    };
    let pair_angle = if pairs == 0 {
        0.0
    } else {
        2.0 * (chord / (2.0 * radius)).min(1.0).asin()
    };
    let remaining = (TWO_PI - pairs as f64 * pair_angle).max(0.0);
    let gap_angles = if arc > 0.0 {
        gaps.iter().map(|g| remaining * g / arc).collect()
    } else {
        let share = remaining / gaps.len().max(1) as f64;
        vec![share; gaps.len()]
    };
    RoundSizing {
        radius,
        pair_angle,
        gap_angles,
        degenerate: solved.is_none(),
    }
}

/// Give every outermost gap but the last (the termini) its demanded arc and
/// leave the rest of the circle to the termini.
///
/// At the solved radius this changes nothing. When the radius was floored,
/// the bases keep their spacing and the free ends open wider instead, so a
/// floored outermost loop is never degenerate.
fn open_termini(mut sizing: RoundSizing, pairs: usize, gaps: &[f64]) -> RoundSizing {
    let Some((_, inner)) = gaps.split_last() else {
        return sizing;
    };
    let radius = sizing.radius;
    let mut used = pairs as f64 * sizing.pair_angle;
    for (angle, gap) in sizing.gap_angles.iter_mut().zip(inner) {
        *angle = gap / radius;
        used += *angle;
    }
    if let Some(termini) = sizing.gap_angles.last_mut() {
        *termini = (TWO_PI - used).max(0.0);
    }
    sizing.degenerate = false;
    sizing
}

/// Demanded gaps around an enclosed loop: `size + 1` per linker.
fn linker_gaps(children: &[LoopChild], props: &ResolvedProps) -> Vec<f64> {
    let mut gaps = Vec::new();
    for child in children {
        if let LoopChild::Linker(linker) = child {
            gaps.extend((linker.upstream..linker.downstream).map(|p| props.gap_after(p)));
        }
    }
    gaps
}

/// Bases and stems of the outermost loop in 5' to 3' order.
pub(crate) fn outermost_items(children: &[LoopChild]) -> Vec<OutermostItem> {
    let mut items = Vec::new();
    for child in children {
        match child {
            LoopChild::Linker(linker) => items.extend(linker.positions().map(OutermostItem::Base)),
            LoopChild::Stem(id) => items.push(OutermostItem::Pair(*id)),
        }
    }
    items
}

/// Demanded gap following each outermost item (the last item has none).
fn outermost_gaps(items: &[OutermostItem], tree: &LoopTree, props: &ResolvedProps) -> Vec<f64> {
    items
        .windows(2)
        .map(|w| match w[0] {
            OutermostItem::Base(p) => props.gap_after(p),
            OutermostItem::Pair(id) => props.gap_after(tree.stem(id).position3),
        })
        .collect()
}

/// Size one loop. Children are never consulted beyond their footprint.
pub(crate) fn size_loop(lp: &Loop, tree: &LoopTree, props: &ResolvedProps) -> LoopGeometry {
    let general = &props.general;
    let chord = general.base_pair_spacing;

    match lp {
        Loop::Hairpin { closing, linker } => {
            if linker.size() == 0 {
                return LoopGeometry::Collapsed;
            }
            let gaps = linker_gaps(&[LoopChild::Linker(*linker)], props);
            let inner5 = tree.stem(*closing).innermost_pair().0;
            if props.loop_shape(inner5) == LoopShape::Triangle {
                if let Some(height) = triangle_height(&gaps, chord) {
                    return LoopGeometry::Triangle { height, gaps };
                }
            }
            LoopGeometry::Round(size_round(1, &gaps, chord, general.min_loop_radius))
        }
        Loop::Internal { .. } | Loop::Multibranch { .. } => {
            let children = lp.children();
            let gaps = linker_gaps(&children, props);
            let pairs = 1 + lp.child_stems().len();
            LoopGeometry::Round(size_round(pairs, &gaps, chord, general.min_loop_radius))
        }
        Loop::Outermost { children } => {
            let items = outermost_items(children);
            let mut gaps = outermost_gaps(&items, tree, props);
            match general.outermost_loop_shape {
                OutermostLoopShape::Flat => {
                    let first_pair = items
                        .iter()
                        .position(|it| matches!(it, OutermostItem::Pair(_)));
                    let last_pair = items
                        .iter()
                        .rposition(|it| matches!(it, OutermostItem::Pair(_)));
                    if let (Some(first), Some(last)) = (first_pair, last_pair) {
                        if first > 0 {
                            gaps[first - 1] += general.termini_gap;
                        }
                        if last + 1 < items.len() {
                            gaps[last] += general.termini_gap;
                        }
                    }
                    LoopGeometry::Flat { gaps }
                }
                OutermostLoopShape::Round => {
                    gaps.push(general.base_stacking_spacing + general.termini_gap);
                    let pairs = lp.child_stems().len();
                    let sizing = size_round(pairs, &gaps, chord, general.min_loop_radius);
                    LoopGeometry::Round(open_termini(sizing, pairs, &gaps))
                }
            }
        }
    }
}

/// Apex height of a triangle whose two sides share the linker's length, or
/// `None` if the sides are too short to span the closing pair.
fn triangle_height(gaps: &[f64], chord: f64) -> Option<f64> {
    let side = gaps.iter().sum::<f64>() / 2.0;
    let half = chord / 2.0;
    (side > half + TOLERANCE).then(|| (side * side - half * half).sqrt())
}

/// Angle taken by each child of a round enclosed loop, 5' to 3'.
///
/// Together with the closing pair's angle the spans cover the full circle.
pub(crate) fn child_spans(lp: &Loop, sizing: &RoundSizing) -> Vec<f64> {
    let mut gap = 0;
    lp.children()
        .iter()
        .map(|child| match child {
            LoopChild::Stem(_) => sizing.pair_angle,
            LoopChild::Linker(linker) => {
                let count = linker.size() + 1;
                let span = sizing.gap_angles[gap..gap + count].iter().sum();
                gap += count;
                span
            }
        })
        .collect()
}

/// Result of placing one loop.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Placement {
    pub center: Option<Point>,
    /// Frames of the child stems, before their own flips are applied
    pub child_frames: Vec<(StemId, StemFrame)>,
}

/// Place a loop enclosed by a stem whose innermost pair has midpoint `top`.
///
/// Positions are written into `coords` (index `p - 1`).
pub(crate) fn place_enclosed(
    lp: &Loop,
    geometry: &LoopGeometry,
    top: StemFrame,
    props: &ResolvedProps,
    coords: &mut [Point],
) -> Placement {
    match geometry {
        LoopGeometry::Collapsed => Placement::default(),
        LoopGeometry::Triangle { height, gaps } => {
            let Loop::Hairpin { linker, .. } = lp else {
                return Placement::default();
            };
            place_triangle(linker, *height, gaps, top, props, coords)
        }
        LoopGeometry::Round(sizing) => place_round_enclosed(lp, sizing, top, props, coords),
        LoopGeometry::Flat { .. } => Placement::default(),
    }
}

fn place_round_enclosed(
    lp: &Loop,
    sizing: &RoundSizing,
    top: StemFrame,
    props: &ResolvedProps,
    coords: &mut [Point],
) -> Placement {
    let chord = props.general.base_pair_spacing;
    let s = top.handedness;
    let height = sizing.chord_height(chord);
    let center = top.origin + Point::polar(height, top.angle);

    // Walk from the inner 5' base of the closing pair, turning by `s`.
    let mut angle = top.angle + PI + s * sizing.pair_angle / 2.0;
    let mut gaps = sizing.gap_angles.iter();
    let mut child_frames = Vec::new();

    for child in lp.children() {
        match child {
            LoopChild::Linker(linker) => {
                for p in linker.positions() {
                    angle += s * gaps.next().copied().unwrap_or(0.0);
                    coords[p - 1] = center + Point::polar(sizing.radius, angle);
                }
                angle += s * gaps.next().copied().unwrap_or(0.0);
            }
            LoopChild::Stem(id) => {
                let mid = angle + s * sizing.pair_angle / 2.0;
                let origin = center + Point::polar(height, mid);
                child_frames.push((id, StemFrame::new(origin, mid, s)));
                angle += s * sizing.pair_angle;
            }
        }
    }

    Placement {
        center: Some(center),
        child_frames,
    }
}

fn place_triangle(
    linker: &Linker,
    height: f64,
    gaps: &[f64],
    top: StemFrame,
    props: &ResolvedProps,
    coords: &mut [Point],
) -> Placement {
    let across = Point::polar(
        props.general.base_pair_spacing / 2.0,
        top.angle - top.handedness * FRAC_PI_2,
    );
    let start = top.origin + across;
    let end = top.origin - across;
    let apex = top.origin + Point::polar(height, top.angle);
    let side = gaps.iter().sum::<f64>() / 2.0;

    let mut travelled = 0.0;
    for (p, gap) in linker.positions().zip(gaps) {
        travelled += gap;
        coords[p - 1] = if travelled <= side {
            start.lerp(apex, travelled / side)
        } else {
            apex.lerp(end, (travelled - side) / side)
        };
    }

    Placement {
        center: Some(apex),
        child_frames: Vec::new(),
    }
}

/// Place the outermost loop around the origin.
pub(crate) fn place_outermost(
    lp: &Loop,
    geometry: &LoopGeometry,
    props: &ResolvedProps,
    coords: &mut [Point],
) -> Placement {
    let items = outermost_items(&lp.children());
    let chord = props.general.base_pair_spacing;

    match geometry {
        LoopGeometry::Flat { gaps } => {
            let mut x = 0.0;
            let mut child_frames = Vec::new();
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    x += gaps[i - 1];
                }
                match *item {
                    OutermostItem::Base(p) => coords[p - 1] = Point::new(x, 0.0),
                    OutermostItem::Pair(id) => {
                        let origin = Point::new(x + chord / 2.0, 0.0);
                        child_frames.push((id, StemFrame::new(origin, -FRAC_PI_2, 1.0)));
                        x += chord;
                    }
                }
            }
            Placement {
                center: None,
                child_frames,
            }
        }
        LoopGeometry::Round(sizing) => {
            let height = sizing.chord_height(chord);
            let wrap = sizing.gap_angles.last().copied().unwrap_or(0.0);
            // Termini gap centred at the bottom of the circle.
            let mut angle = FRAC_PI_2 + wrap / 2.0;
            let mut child_frames = Vec::new();
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    angle += sizing.gap_angles[i - 1];
                }
                match *item {
                    OutermostItem::Base(p) => {
                        coords[p - 1] = Point::polar(sizing.radius, angle);
                    }
                    OutermostItem::Pair(id) => {
                        let mid = angle + sizing.pair_angle / 2.0;
                        let origin = Point::polar(height, mid);
                        child_frames.push((id, StemFrame::new(origin, mid, 1.0)));
                        angle += sizing.pair_angle;
                    }
                }
            }
            Placement {
                center: Some(Point::ORIGIN),
                child_frames,
            }
        }
        LoopGeometry::Collapsed | LoopGeometry::Triangle { .. } => Placement::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn closure(pairs: usize, chord: f64, arc: f64, r: f64) -> f64 {
        pairs as f64 * 2.0 * (chord / (2.0 * r)).asin() + arc / r
    }

    #[test]
    fn test_solve_radius_closes_circle() {
        for &(pairs, arc) in &[(1, 4.0), (2, 3.0), (3, 3.0), (4, 8.0), (6, 6.0)] {
            let r = solve_radius(pairs, 1.0, arc).unwrap();
            assert!(
                (closure(pairs, 1.0, arc, r) - TWO_PI).abs() < 1e-9,
                "pairs={pairs} arc={arc} r={r}"
            );
        }
    }

    #[test]
    fn test_solve_radius_no_pairs() {
        let r = solve_radius(0, 1.0, TWO_PI).unwrap();
        assert!((r - 1.0).abs() < 1e-12);
        assert_eq!(solve_radius(0, 1.0, 0.0), None);
    }

    #[test]
    fn test_solve_radius_unsolvable() {
        // a single pair and a very short arc cannot close a circle
        assert_eq!(solve_radius(1, 1.0, 0.5), None);
    }

    #[test]
    fn test_solve_radius_grows_with_arc() {
        let mut prev = 0.0;
        for arc in [2.0, 4.0, 8.0, 16.0] {
            let r = solve_radius(3, 1.0, arc).unwrap();
            assert!(r > prev);
            prev = r;
        }
    }

    #[test]
    fn test_size_round_covers_circle() {
        let sizing = size_round(3, &[1.0, 2.0, 1.0, 3.0], 1.0, 0.0);
        let total: f64 = 3.0 * sizing.pair_angle + sizing.gap_angles.iter().sum::<f64>();
        assert!((total - TWO_PI).abs() < 1e-9);
        assert!(!sizing.degenerate);
        // natural radius: each gap angle is its length over the radius
        assert!((sizing.gap_angles[1] - 2.0 / sizing.radius).abs() < 1e-9);
    }

    #[test]
    fn test_size_round_clamps_to_minimum() {
        let sizing = size_round(3, &[1.0, 1.0, 1.0], 1.0, 5.0);
        assert_eq!(sizing.radius, 5.0);
        let total: f64 = 3.0 * sizing.pair_angle + sizing.gap_angles.iter().sum::<f64>();
        assert!((total - TWO_PI).abs() < 1e-9);
        // equal demands, equal shares
        assert!((sizing.gap_angles[0] - sizing.gap_angles[2]).abs() < 1e-12);
    }

    #[test]
    fn test_size_round_degenerate() {
        let sizing = size_round(1, &[0.25], 1.0, 0.0);
        assert!(sizing.degenerate);
        assert_eq!(sizing.radius, 0.5);
        assert!((sizing.pair_angle - PI).abs() < 1e-12);
        assert!((sizing.gap_angles[0] - PI).abs() < 1e-12);
    }

    #[test]
    fn test_open_termini_takes_slack() {
        let gaps = [1.0, 1.0, 1.0];
        let sizing = open_termini(size_round(1, &gaps, 1.0, 5.0), 1, &gaps);
        assert_eq!(sizing.radius, 5.0);
        assert!((sizing.gap_angles[0] - 0.2).abs() < 1e-12);
        assert!((sizing.gap_angles[1] - 0.2).abs() < 1e-12);
        let total: f64 = sizing.pair_angle + sizing.gap_angles.iter().sum::<f64>();
        assert!((total - TWO_PI).abs() < 1e-9);

        // a lone stem with no tails cannot close at its chord radius
        let sizing = open_termini(size_round(1, &[1.0], 1.0, 0.0), 1, &[1.0]);
        assert!(!sizing.degenerate);
        assert!((sizing.gap_angles[0] - PI).abs() < 1e-12);
    }

    #[test]
    fn test_open_termini_keeps_solved_radius() {
        let gaps = [1.0, 2.0, 1.5];
        let solved = size_round(2, &gaps, 1.0, 0.0);
        let opened = open_termini(solved.clone(), 2, &gaps);
        for (a, b) in solved.gap_angles.iter().zip(&opened.gap_angles) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn test_triangle_height() {
        // sides of 2.5 over a base of 3 (half 1.5): height 2
        let h = triangle_height(&[1.0, 2.0, 2.0], 3.0).unwrap();
        assert!((h - 2.0).abs() < 1e-12);
        assert_eq!(triangle_height(&[0.5, 0.4], 1.0), None);
    }
}

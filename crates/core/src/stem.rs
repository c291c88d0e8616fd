use std::f64::consts::{FRAC_PI_2, PI};

use crate::partners::Stem;
use crate::props::GeneralLayoutProps;
use crate::types::Point;

/// Where a stem starts and which way it runs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StemFrame {
    /// Midpoint of the outermost pair
    pub origin: Point,
    /// Direction from the outermost pair toward the enclosed loop
    pub angle: f64,
    /// `1.0` or `-1.0`; the 5' side lies at `angle - handedness * π/2`
    pub handedness: f64,
}

impl StemFrame {
    pub fn new(origin: Point, angle: f64, handedness: f64) -> Self {
        Self {
            origin,
            angle,
            handedness,
        }
    }

    /// Mirror image across the axis of the outermost pair.
    ///
    /// The outermost pair stays in place; everything above it is reflected.
    pub fn flipped(self) -> Self {
        Self {
            origin: self.origin,
            angle: self.angle + PI,
            handedness: -self.handedness,
        }
    }
}

/// Stem coordinates relative to the frame origin.
#[derive(Debug, Clone, PartialEq)]
pub struct StemLayout {
    /// 5' side, outermost pair first
    pub side5: Vec<Point>,
    /// 3' side; `side3[k]` pairs with `side5[k]`
    pub side3: Vec<Point>,
    /// Direction in which the enclosed loop continues
    pub exit_angle: f64,
    /// Midpoint of the innermost pair
    pub exit_offset: Point,
}

/// Lay out a stem as two antiparallel rows.
///
/// Pair `k` is centred `k` stacking spacings along the entry angle; its bases
/// sit half a pair spacing to either side.
pub fn layout_stem(
    stem: &Stem,
    entry_angle: f64,
    handedness: f64,
    props: &GeneralLayoutProps,
) -> StemLayout {
    let across = Point::polar(
        props.base_pair_spacing / 2.0,
        entry_angle - handedness * FRAC_PI_2,
    );
    let mut side5 = Vec::with_capacity(stem.size);
    let mut side3 = Vec::with_capacity(stem.size);
    for k in 0..stem.size {
        let center = Point::polar(k as f64 * props.base_stacking_spacing, entry_angle);
        side5.push(center + across);
        side3.push(center - across);
    }
    let exit_offset = Point::polar(
        stem.size.saturating_sub(1) as f64 * props.base_stacking_spacing,
        entry_angle,
    );
    StemLayout {
        side5,
        side3,
        exit_angle: entry_angle,
        exit_offset,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Point, b: Point) -> bool {
        a.distance(b) < 1e-9
    }

    #[test]
    fn test_rows_are_parallel() {
        let props = GeneralLayoutProps {
            base_pair_spacing: 2.0,
            base_stacking_spacing: 1.5,
            ..GeneralLayoutProps::default()
        };
        let layout = layout_stem(&Stem::new(1, 10, 3), 0.7, 1.0, &props);
        assert_eq!(layout.side5.len(), 3);
        for k in 0..3 {
            assert!((layout.side5[k].distance(layout.side3[k]) - 2.0).abs() < 1e-9);
        }
        for k in 1..3 {
            assert!((layout.side5[k].distance(layout.side5[k - 1]) - 1.5).abs() < 1e-9);
            assert!((layout.side3[k].distance(layout.side3[k - 1]) - 1.5).abs() < 1e-9);
        }
        assert!(close(layout.exit_offset, Point::polar(3.0, 0.7)));
        assert_eq!(layout.exit_angle, 0.7);
    }

    #[test]
    fn test_five_prime_side_follows_handedness() {
        let props = GeneralLayoutProps::default();
        // running along +x, right-handed: 5' side toward -y
        let right = layout_stem(&Stem::new(1, 4, 2), 0.0, 1.0, &props);
        assert!(close(right.side5[0], Point::new(0.0, -0.5)));
        let left = layout_stem(&Stem::new(1, 4, 2), 0.0, -1.0, &props);
        assert!(close(left.side5[0], Point::new(0.0, 0.5)));
    }

    #[test]
    fn test_flip_keeps_outermost_pair() {
        let props = GeneralLayoutProps::default();
        let frame = StemFrame::new(Point::new(2.0, 3.0), 0.4, 1.0);
        let flipped = frame.flipped();
        let a = layout_stem(&Stem::new(1, 8, 3), frame.angle, frame.handedness, &props);
        let b = layout_stem(
            &Stem::new(1, 8, 3),
            flipped.angle,
            flipped.handedness,
            &props,
        );
        assert!(close(a.side5[0], b.side5[0]));
        assert!(close(a.side3[0], b.side3[0]));
        assert!(close(a.exit_offset, -b.exit_offset));
        assert_eq!(flipped.flipped().handedness, frame.handedness);
    }
}

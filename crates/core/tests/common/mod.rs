#![allow(dead_code)]

use rnalayout_core::{
    compute_layout, GeneralLayoutProps, Partners, PerBaseLayoutProps, Point, StrictLayout,
};

pub const TOLERANCE: f64 = 1e-6;

/// Partners from dot-bracket notation.
pub fn partners(structure: &str) -> Partners {
    let mut table = vec![0; structure.len()];
    let mut stack = Vec::new();
    for (i, ch) in structure.chars().enumerate() {
        match ch {
            '(' => stack.push(i + 1),
            ')' => {
                let open = stack.pop().expect("balanced structure");
                table[open - 1] = i + 1;
                table[i] = open;
            }
            _ => {}
        }
    }
    assert!(stack.is_empty(), "balanced structure");
    Partners::new(table)
}

pub fn layout(structure: &str) -> StrictLayout {
    layout_with(structure, &GeneralLayoutProps::default(), &PerBaseLayoutProps::default())
}

pub fn layout_with(
    structure: &str,
    general: &GeneralLayoutProps,
    per_base: &PerBaseLayoutProps,
) -> StrictLayout {
    compute_layout(&partners(structure), general, per_base).expect("valid structure")
}

pub fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < TOLERANCE
}

pub fn close_points(a: Point, b: Point) -> bool {
    a.distance(b) < TOLERANCE
}

/// Distance between two 1-indexed positions.
pub fn gap(layout: &StrictLayout, p: usize, q: usize) -> f64 {
    layout.coordinates[p - 1].distance(layout.coordinates[q - 1])
}

/// Smallest distance between any two of `positions`.
pub fn min_separation(layout: &StrictLayout, positions: impl IntoIterator<Item = usize>) -> f64 {
    let points: Vec<Point> = positions
        .into_iter()
        .map(|p| layout.coordinates[p - 1])
        .collect();
    let mut min = f64::INFINITY;
    for (i, a) in points.iter().enumerate() {
        for b in &points[i + 1..] {
            min = min.min(a.distance(*b));
        }
    }
    min
}

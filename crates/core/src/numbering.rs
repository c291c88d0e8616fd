//! Numbering labels.
//!
//! Numbering is decoration computed from a finished layout. Nothing here is an
//! input to the layout itself, so changing how bases are numbered never moves
//! a base.

use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_2;

use crate::partners::Partners;
use crate::types::Point;

/// Which positions get a number, and how far from the base it sits.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct NumberingProps {
    /// Added to a position to get its displayed number (default: 0)
    pub offset: i64,
    /// A displayed number that is always labelled (default: 1)
    pub anchor: i64,
    /// Spacing between labelled numbers (default: 20)
    pub increment: u32,
    /// Distance from the base centre to the label anchor (default: 1.5)
    pub padding: f64,
}

impl Default for NumberingProps {
    fn default() -> Self {
        Self {
            offset: 0,
            anchor: 1,
            increment: 20,
            padding: 1.5,
        }
    }
}

impl NumberingProps {
    /// Displayed number of a 1-indexed position.
    pub fn number_of(&self, position: usize) -> i64 {
        position as i64 + self.offset
    }

    pub fn is_numbered(&self, position: usize) -> bool {
        let increment = i64::from(self.increment.max(1));
        (self.number_of(position) - self.anchor).rem_euclid(increment) == 0
    }
}

/// A number to draw next to a base.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct NumberingLabel {
    pub position: usize,
    pub number: i64,
    /// Direction from the base toward the label
    pub angle: f64,
    pub point: Point,
}

/// Labels for every numbered position of a layout.
///
/// Each label points away from the base's backbone neighbours and pairing
/// partner, so it lands on the open side of the base.
pub fn numbering_labels(
    coordinates: &[Point],
    partners: &Partners,
    props: &NumberingProps,
) -> Vec<NumberingLabel> {
    (1..=coordinates.len())
        .filter(|&p| props.is_numbered(p))
        .map(|p| {
            let angle = outward_angle(coordinates, partners, p);
            NumberingLabel {
                position: p,
                number: props.number_of(p),
                angle,
                point: coordinates[p - 1] + Point::polar(props.padding, angle),
            }
        })
        .collect()
}

fn outward_angle(coordinates: &[Point], partners: &Partners, p: usize) -> f64 {
    let at = |q: usize| q.checked_sub(1).and_then(|i| coordinates.get(i)).copied();
    let here = coordinates[p - 1];
    let prev = at(p - 1);
    let next = at(p + 1);

    let mut away = Point::ORIGIN;
    for neighbor in [prev, next, partners.partner_of(p).and_then(at)]
        .into_iter()
        .flatten()
    {
        let d = here - neighbor;
        let len = d.length();
        if len > 1e-9 {
            away += d * (1.0 / len);
        }
    }
    if away.length() > 1e-9 {
        return away.angle();
    }

    // Neighbours cancel out (a straight run): label beside the backbone.
    match (prev, next) {
        (Some(a), Some(b)) => (b - a).angle() - FRAC_PI_2,
        (Some(a), None) => (here - a).angle() - FRAC_PI_2,
        (None, Some(b)) => (b - here).angle() - FRAC_PI_2,
        (None, None) => -FRAC_PI_2,
    }
}

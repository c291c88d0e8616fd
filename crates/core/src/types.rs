use serde::Serialize;
use std::f64::consts::PI;
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

use crate::error::LayoutAnomaly;
use crate::partners::Stem;

pub(crate) const TWO_PI: f64 = 2.0 * PI;

/// A point (or displacement) in the drawing plane.
///
/// `+x` points right and `+y` points down; angles run from `+x` toward `+y`.
#[derive(Serialize, Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// The displacement of length `length` in direction `angle`.
    pub fn polar(length: f64, angle: f64) -> Self {
        Self {
            x: length * angle.cos(),
            y: length * angle.sin(),
        }
    }

    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn distance(self, other: Point) -> f64 {
        (self - other).length()
    }

    /// Direction of this displacement; `0.0` for the zero vector.
    pub fn angle(self) -> f64 {
        self.y.atan2(self.x)
    }

    /// Rotate about the origin.
    pub fn rotated(self, angle: f64) -> Self {
        let (sin_a, cos_a) = angle.sin_cos();
        Self {
            x: self.x * cos_a - self.y * sin_a,
            y: self.x * sin_a + self.y * cos_a,
        }
    }

    /// Interpolate toward `other` by fraction `t`.
    pub fn lerp(self, other: Point, t: f64) -> Self {
        self + (other - self) * t
    }
}

impl Add for Point {
    type Output = Point;
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Point {
    fn add_assign(&mut self, rhs: Point) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Neg for Point {
    type Output = Point;
    fn neg(self) -> Point {
        Point::new(-self.x, -self.y)
    }
}

impl Mul<f64> for Point {
    type Output = Point;
    fn mul(self, rhs: f64) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

/// Loop classification
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum LoopKind {
    Hairpin,
    Internal,
    Multibranch,
    Outermost,
}

/// Per-stem layout metadata for editing collaborators.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct StemMetadata {
    /// 5' position of the outermost pair
    pub position5: usize,
    /// 3' position of the outermost pair
    pub position3: usize,
    /// Number of base pairs
    pub size: usize,
    /// Whether the stem was drawn mirrored
    pub flipped: bool,
    /// Final direction from the outermost pair toward the enclosed loop
    pub angle: f64,
}

impl StemMetadata {
    /// The stem this metadata describes, e.g. for
    /// [`PerBaseLayoutProps::toggle_flip_stem`](crate::PerBaseLayoutProps::toggle_flip_stem).
    pub fn stem(&self) -> Stem {
        Stem::new(self.position5, self.position3, self.size)
    }

    pub fn contains(&self, position: usize) -> bool {
        (self.position5..self.position5 + self.size).contains(&position)
            || (self.position3 + 1 - self.size..=self.position3).contains(&position)
    }
}

/// Per-loop layout metadata.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct LoopMetadata {
    pub kind: LoopKind,
    /// Index into `StrictLayout::stems` of the enclosing stem
    pub closing_stem: Option<usize>,
    /// Indices into `StrictLayout::stems`, in 5' to 3' order
    pub child_stems: Vec<usize>,
    /// Circle centre (round loops) or apex (triangle loops)
    pub center: Option<Point>,
    /// Zero for collapsed, triangle and flat loops
    pub radius: f64,
    /// Angle taken by each child (linkers and stems, 5' to 3'); empty unless round
    pub spans: Vec<f64>,
}

/// Final layout: one coordinate per sequence position plus metadata
#[derive(Serialize, Clone, Debug, Default, PartialEq)]
pub struct StrictLayout {
    /// `coordinates[p - 1]` is the centre of the base at position `p`
    pub coordinates: Vec<Point>,
    pub stems: Vec<StemMetadata>,
    pub loops: Vec<LoopMetadata>,
    /// Parameter problems that were recovered from
    pub anomalies: Vec<LayoutAnomaly>,
}

impl StrictLayout {
    pub fn len(&self) -> usize {
        self.coordinates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coordinates.is_empty()
    }

    /// Coordinate of a 1-indexed position.
    pub fn coordinate(&self, position: usize) -> Option<Point> {
        position
            .checked_sub(1)
            .and_then(|i| self.coordinates.get(i))
            .copied()
    }

    /// The stem a position belongs to, if it is paired.
    pub fn stem_containing(&self, position: usize) -> Option<&StemMetadata> {
        self.stems.iter().find(|st| st.contains(position))
    }
}

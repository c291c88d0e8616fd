//! Layout parameters.
//!
//! Both parameter sets are plain data owned by the caller and passed to every
//! layout call. Nothing here is global.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::LayoutAnomaly;
use crate::log;
use crate::partners::Stem;

/// Shape of a hairpin loop.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum LoopShape {
    #[default]
    Round,
    /// Unpaired bases along two straight sides meeting at an apex
    Triangle,
}

/// How the free 5' and 3' ends and top-level stems are arranged.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum OutermostLoopShape {
    /// Along a straight horizontal axis with stems standing on it
    #[default]
    Flat,
    /// Around a circle, like any other loop
    Round,
}

/// Drawing-wide layout parameters.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct GeneralLayoutProps {
    /// Rotation of the whole drawing in radians (default: 0.0)
    pub rotation: f64,
    /// Extra spacing between the free ends in the outermost loop (default: 0.0)
    pub termini_gap: f64,
    /// Distance between the two bases of a pair (default: 1.0)
    pub base_pair_spacing: f64,
    /// Backbone distance between consecutive bases (default: 1.0)
    pub base_stacking_spacing: f64,
    /// Shape of loops without a per-base override (default: round)
    pub default_loop_shape: LoopShape,
    /// Arrangement of the outermost loop (default: flat)
    pub outermost_loop_shape: OutermostLoopShape,
    /// Smallest radius of a round loop (default: 0.5)
    pub min_loop_radius: f64,
}

impl Default for GeneralLayoutProps {
    fn default() -> Self {
        Self {
            rotation: 0.0,
            termini_gap: 0.0,
            base_pair_spacing: 1.0,
            base_stacking_spacing: 1.0,
            default_loop_shape: LoopShape::Round,
            outermost_loop_shape: OutermostLoopShape::Flat,
            min_loop_radius: 0.5,
        }
    }
}

impl GeneralLayoutProps {
    /// Replace values outside their domain with defaults, recording each one.
    pub fn sanitized(&self, anomalies: &mut Vec<LayoutAnomaly>) -> Self {
        let defaults = Self::default();
        let mut props = self.clone();
        let mut reject = |name: &'static str, value: &mut f64, fallback: f64| {
            log::warn!(name, value = *value, "invalid layout parameter");
            anomalies.push(LayoutAnomaly::InvalidParameter { name });
            *value = fallback;
        };

        if !props.rotation.is_finite() {
            reject("rotation", &mut props.rotation, defaults.rotation);
        }
        // Same constraint as an entered termini gap: finite and non-negative.
        if !props.termini_gap.is_finite() || props.termini_gap < 0.0 {
            reject("termini_gap", &mut props.termini_gap, 0.0);
        }
        if !props.base_pair_spacing.is_finite() || props.base_pair_spacing <= 0.0 {
            reject(
                "base_pair_spacing",
                &mut props.base_pair_spacing,
                defaults.base_pair_spacing,
            );
        }
        if !props.base_stacking_spacing.is_finite() || props.base_stacking_spacing <= 0.0 {
            reject(
                "base_stacking_spacing",
                &mut props.base_stacking_spacing,
                defaults.base_stacking_spacing,
            );
        }
        if !props.min_loop_radius.is_finite() || props.min_loop_radius < 0.0 {
            reject(
                "min_loop_radius",
                &mut props.min_loop_radius,
                defaults.min_loop_radius,
            );
        }
        props
    }
}

/// Overrides stored at a single position.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq)]
#[serde(default)]
pub struct BaseLayoutProps {
    /// Multiplier on the backbone gap following this position (default: 1.0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stretch: Option<f64>,
    /// `true` asks for the stem containing this position to be flipped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flip_stem: Option<bool>,
    /// Shape of the loop closed by the pair whose 5' base is this position
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loop_shape: Option<LoopShape>,
}

impl BaseLayoutProps {
    pub fn is_empty(&self) -> bool {
        self.stretch.is_none() && self.flip_stem.is_none() && self.loop_shape.is_none()
    }
}

/// Sparse per-position overrides, keyed by 1-indexed position.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(transparent)]
pub struct PerBaseLayoutProps(BTreeMap<usize, BaseLayoutProps>);

impl PerBaseLayoutProps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, position: usize) -> Option<&BaseLayoutProps> {
        self.0.get(&position)
    }

    /// The entry at `position`, created empty if absent.
    pub fn get_or_insert(&mut self, position: usize) -> &mut BaseLayoutProps {
        self.0.entry(position).or_default()
    }

    pub fn insert(&mut self, position: usize, props: BaseLayoutProps) {
        self.0.insert(position, props);
    }

    pub fn remove(&mut self, position: usize) -> Option<BaseLayoutProps> {
        self.0.remove(&position)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &BaseLayoutProps)> {
        self.0.iter().map(|(&p, props)| (p, props))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn set_stretch(&mut self, position: usize, stretch: f64) {
        self.get_or_insert(position).stretch = Some(stretch);
    }

    pub fn set_loop_shape(&mut self, position: usize, shape: LoopShape) {
        self.get_or_insert(position).loop_shape = Some(shape);
    }

    pub fn set_flip_stem(&mut self, position: usize, flip: bool) {
        self.get_or_insert(position).flip_stem = Some(flip);
    }

    /// Whether any position of `stem` asks for it to be flipped.
    pub fn is_stem_flipped(&self, stem: &Stem) -> bool {
        stem.side5()
            .chain(stem.side3())
            .any(|p| self.get(p).and_then(|props| props.flip_stem) == Some(true))
    }

    /// Flip or unflip `stem`.
    ///
    /// Flipping stores the flag at the stem's 5' position. Unflipping clears
    /// the flag from every position of the stem, so a flag set directly on
    /// any base is undone as well.
    pub fn toggle_flip_stem(&mut self, stem: &Stem) {
        if !self.is_stem_flipped(stem) {
            self.set_flip_stem(stem.position5, true);
            return;
        }
        for p in stem.side5().chain(stem.side3()) {
            let emptied = match self.0.get_mut(&p) {
                Some(props) => {
                    props.flip_stem = None;
                    props.is_empty()
                }
                None => false,
            };
            if emptied {
                self.0.remove(&p);
            }
        }
    }

    /// Dense props for positions `1..=len`, dropping out-of-range entries and
    /// invalid stretches.
    pub(crate) fn resolve(
        &self,
        len: usize,
        anomalies: &mut Vec<LayoutAnomaly>,
    ) -> Vec<BaseLayoutProps> {
        let mut dense = vec![BaseLayoutProps::default(); len];
        for (position, props) in self.iter() {
            if position == 0 || position > len {
                log::warn!(position, "ignoring out-of-range per-base props");
                anomalies.push(LayoutAnomaly::OutOfRangeOverride { position });
                continue;
            }
            let mut props = *props;
            if let Some(stretch) = props.stretch {
                if !stretch.is_finite() || stretch < 0.0 {
                    anomalies.push(LayoutAnomaly::InvalidParameter { name: "stretch" });
                    props.stretch = None;
                }
            }
            dense[position - 1] = props;
        }
        dense
    }
}

/// Sanitised parameters used by one layout run.
#[derive(Clone, Debug)]
pub(crate) struct ResolvedProps {
    pub general: GeneralLayoutProps,
    per_base: Vec<BaseLayoutProps>,
}

impl ResolvedProps {
    pub fn new(
        general: &GeneralLayoutProps,
        per_base: &PerBaseLayoutProps,
        len: usize,
        anomalies: &mut Vec<LayoutAnomaly>,
    ) -> Self {
        Self {
            general: general.sanitized(anomalies),
            per_base: per_base.resolve(len, anomalies),
        }
    }

    fn at(&self, position: usize) -> Option<&BaseLayoutProps> {
        position.checked_sub(1).and_then(|i| self.per_base.get(i))
    }

    pub fn stretch(&self, position: usize) -> f64 {
        self.at(position).and_then(|p| p.stretch).unwrap_or(1.0)
    }

    pub fn flip_stem(&self, position: usize) -> bool {
        self.at(position).and_then(|p| p.flip_stem).unwrap_or(false)
    }

    pub fn loop_shape(&self, position: usize) -> LoopShape {
        self.at(position)
            .and_then(|p| p.loop_shape)
            .unwrap_or(self.general.default_loop_shape)
    }

    /// Demanded length of the backbone gap following `position`.
    pub fn gap_after(&self, position: usize) -> f64 {
        self.general.base_stacking_spacing * self.stretch(position)
    }
}

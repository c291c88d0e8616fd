//! Strict layout of RNA secondary structures.
//!
//! Given which positions pair with which ([`Partners`]) and a set of layout
//! parameters, [`compute_layout`] places every base in the plane: stems as two
//! antiparallel rows, enclosed loops on circles (or triangles) sized to fit
//! their bases, and the outermost loop along a line or circle.
//!
//! ```
//! use rnalayout_core::{compute_layout, GeneralLayoutProps, Partners, PerBaseLayoutProps};
//!
//! let partners = Partners::new(vec![6, 5, 0, 0, 2, 1]);
//! let layout = compute_layout(
//!     &partners,
//!     &GeneralLayoutProps::default(),
//!     &PerBaseLayoutProps::default(),
//! )
//! .unwrap();
//! assert_eq!(layout.coordinates.len(), 6);
//! ```

mod engine;
mod error;
mod geometry;
mod log;
mod loops;
mod numbering;
mod partners;
mod props;
mod stem;
mod types;

pub use engine::{compute_layout, layout_tree, LayoutEngine};
pub use error::{LayoutAnomaly, StructureError};
pub use loops::{decompose, Loop, LoopChild, LoopId, LoopTree, StemId, StemNode};
pub use numbering::{numbering_labels, NumberingLabel, NumberingProps};
pub use partners::{Linker, Partners, Stem};
pub use props::{
    BaseLayoutProps, GeneralLayoutProps, LoopShape, OutermostLoopShape, PerBaseLayoutProps,
};
pub use stem::{layout_stem, StemFrame, StemLayout};
pub use types::*;

/// Compute a layout and serialise it as JSON.
pub fn layout_json(
    partners: &Partners,
    general: &GeneralLayoutProps,
    per_base: &PerBaseLayoutProps,
) -> Result<String, StructureError> {
    let layout = compute_layout(partners, general, per_base)?;
    // Serialising plain numbers and strings cannot fail.
    Ok(serde_json::to_string(&layout).unwrap_or_default())
}

use rnalayout_core::{
    decompose, numbering_labels, GeneralLayoutProps, LayoutEngine, NumberingProps, Partners,
    PerBaseLayoutProps,
};
use serde::de::DeserializeOwned;
use wasm_bindgen::prelude::*;

/// Parse JSON, treating an empty string as the type's default.
fn from_json<T: DeserializeOwned + Default>(json: &str, what: &str) -> Result<T, JsError> {
    if json.trim().is_empty() {
        return Ok(T::default());
    }
    serde_json::from_str(json).map_err(|e| JsError::new(&format!("invalid {what}: {e}")))
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, JsError> {
    serde_json::to_string(value).map_err(|e| JsError::new(&e.to_string()))
}

/// Compute a strict layout and return it as JSON.
///
/// `partners_json` is a 1-indexed partners array (`0` = unpaired). The two
/// props arguments may be empty, in which case defaults are used.
#[wasm_bindgen]
pub fn compute_layout(
    partners_json: &str,
    general_json: &str,
    per_base_json: &str,
) -> Result<String, JsError> {
    let partners: Partners = from_json(partners_json, "partners")?;
    let general: GeneralLayoutProps = from_json(general_json, "layout props")?;
    let per_base: PerBaseLayoutProps = from_json(per_base_json, "per-base layout props")?;
    let layout = rnalayout_core::compute_layout(&partners, &general, &per_base)?;
    to_json(&layout)
}

/// Flip or unflip the stem containing `position` and return the updated
/// per-base props.
#[wasm_bindgen]
pub fn toggle_flip_stem(
    partners_json: &str,
    per_base_json: &str,
    position: usize,
) -> Result<String, JsError> {
    let partners: Partners = from_json(partners_json, "partners")?;
    let mut per_base: PerBaseLayoutProps = from_json(per_base_json, "per-base layout props")?;
    let tree = decompose(&partners)?;
    let stem = tree
        .stem_containing(position)
        .ok_or_else(|| JsError::new(&format!("position {position} is not in a stem")))?;
    per_base.toggle_flip_stem(stem);
    to_json(&per_base)
}

/// Numbering labels for a layout's coordinates, as JSON.
#[wasm_bindgen]
pub fn numbering(
    partners_json: &str,
    general_json: &str,
    per_base_json: &str,
    numbering_json: &str,
) -> Result<String, JsError> {
    let partners: Partners = from_json(partners_json, "partners")?;
    let general: GeneralLayoutProps = from_json(general_json, "layout props")?;
    let per_base: PerBaseLayoutProps = from_json(per_base_json, "per-base layout props")?;
    let props: NumberingProps = from_json(numbering_json, "numbering props")?;
    let layout = rnalayout_core::compute_layout(&partners, &general, &per_base)?;
    to_json(&numbering_labels(&layout.coordinates, &partners, &props))
}

/// A layout engine that reuses its decomposition while the partners are
/// unchanged, for interactive editing of flips and stretches.
#[wasm_bindgen]
#[derive(Default)]
pub struct Layouter {
    engine: LayoutEngine,
}

#[wasm_bindgen]
impl Layouter {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compute(
        &mut self,
        partners_json: &str,
        general_json: &str,
        per_base_json: &str,
    ) -> Result<String, JsError> {
        let partners: Partners = from_json(partners_json, "partners")?;
        let general: GeneralLayoutProps = from_json(general_json, "layout props")?;
        let per_base: PerBaseLayoutProps = from_json(per_base_json, "per-base layout props")?;
        let layout = self.engine.compute(&partners, &general, &per_base)?;
        to_json(&layout)
    }
}

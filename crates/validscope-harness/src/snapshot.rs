#![forbid(unsafe_code)]

//! Stable text renderings for assertions.

use validscope_core::ValidityMap;

/// Render `map` as compact JSON with identifiers in sorted order.
///
/// `{"a":"valid","b":"disabled"}`
#[must_use]
pub fn map_snapshot_json(map: &ValidityMap) -> String {
    serde_json::to_string(map).unwrap_or_else(|err| format!("<unserializable: {err}>"))
}

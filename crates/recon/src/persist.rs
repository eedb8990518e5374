//! Render run outputs as JSON documents.
//!
//! Pure: returns strings, the caller decides where they go.

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::error::ReconError;
use crate::model::{serialize_by_name, EntityRecord, ReconResult};

fn pretty<T: Serialize + ?Sized>(what: &str, value: &T) -> Result<String, ReconError> {
    serde_json::to_string_pretty(value).map_err(|e| ReconError::Serialize(format!("{what}: {e}")))
}

/// `{ target_id: display_record }`
pub fn render_dataset(result: &ReconResult) -> Result<String, ReconError> {
    pretty("dataset", &result.dataset)
}

/// `{ source_name: raw_record }`, in source order.
pub fn render_unmatched(result: &ReconResult) -> Result<String, ReconError> {
    struct ByName<'a>(&'a [EntityRecord]);

    impl Serialize for ByName<'_> {
        fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            serialize_by_name(self.0, serializer)
        }
    }

    pretty("unmatched", &ByName(&result.unmatched))
}

/// `{ catalog_name: { "target_id": id } }`, in catalog order.
pub fn render_unused(result: &ReconResult) -> Result<String, ReconError> {
    let map: Map<String, Value> = result
        .unused
        .iter()
        .map(|entry| (entry.name.clone(), json!({ "target_id": entry.target_id })))
        .collect();
    pretty("unused", &map)
}

/// The whole result: meta, summary, matches, conflicts, dataset, residuals.
pub fn render_report(result: &ReconResult) -> Result<String, ReconError> {
    pretty("report", result)
}

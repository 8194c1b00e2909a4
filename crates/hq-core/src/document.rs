//! Field-path updates shared by the document store plugins.

use serde_json::{Map, Value};

use crate::error::{StoreError, StoreResult};

/// Merges `fields` into `doc`.
///
/// A key such as `characters.hu-tao` addresses a nested field; intermediate
/// objects are created when missing. Top-level keys replace whole values.
pub fn apply_update(doc: &mut Value, fields: &Map<String, Value>) -> StoreResult<()> {
    for (path, value) in fields {
        let mut segments = path.split('.').peekable();
        let mut cursor = &mut *doc;
        while let Some(segment) = segments.next() {
            let object = cursor
                .as_object_mut()
                .ok_or_else(|| StoreError::Malformed(format!("'{path}' crosses a non-object field")))?;
            if segments.peek().is_none() {
                object.insert(segment.to_string(), value.clone());
                break;
            }
            cursor = object
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
        }
    }
    Ok(())
}

/// Single-entry field map, the common shape of repository updates.
pub fn field(path: impl Into<String>, value: Value) -> Map<String, Value> {
    let mut fields = Map::new();
    fields.insert(path.into(), value);
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_path_replaces_only_that_entry() {
        let mut doc = json!({
            "id": "1",
            "characters": { "xiao": { "status": "Built" }, "hu-tao": { "status": "WIP" } }
        });
        apply_update(&mut doc, &field("characters.hu-tao", json!({ "status": "Built" }))).unwrap();
        assert_eq!(doc["characters"]["hu-tao"]["status"], "Built");
        assert_eq!(doc["characters"]["xiao"]["status"], "Built");
    }

    #[test]
    fn missing_intermediate_objects_are_created() {
        let mut doc = json!({ "id": "1" });
        apply_update(&mut doc, &field("characters.kafka", json!({ "eidolon": 2 }))).unwrap();
        assert_eq!(doc["characters"]["kafka"]["eidolon"], 2);
    }

    #[test]
    fn scalar_in_the_way_is_malformed() {
        let mut doc = json!({ "name": "Aria" });
        let err = apply_update(&mut doc, &field("name.first", json!("A"))).unwrap_err();
        assert!(matches!(err, StoreError::Malformed(_)));
    }
}

//! Path-based field access on serialized instances
//!
//! Flattened fields keep the path of struct names leading to them, so a
//! nested child can be read and written without runtime type lookup.

use serde_json::{Map, Value};

/// Read the value at `path`, if every segment exists
pub fn read_path<'v>(value: &'v Value, path: &[&str]) -> Option<&'v Value> {
    path.iter().try_fold(value, |current, segment| current.get(*segment))
}

/// Write `new_value` at `path`, creating intermediate objects as needed
pub fn write_path(value: &mut Value, path: &[&str], new_value: Value) {
    let Some((last, parents)) = path.split_last() else {
        *value = new_value;
        return;
    };

    let mut current = value;
    for segment in parents {
        if !current.is_object() {
            *current = Value::Object(Map::new());
        }
        current = match current {
            Value::Object(map) => map
                .entry((*segment).to_string())
                .or_insert_with(|| Value::Object(Map::new())),
            _ => return,
        };
    }

    if !current.is_object() {
        *current = Value::Object(Map::new());
    }
    if let Value::Object(map) = current {
        map.insert((*last).to_string(), new_value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_read_nested() {
        let doc = json!({"profile": {"age": 31}});
        assert_eq!(read_path(&doc, &["profile", "age"]), Some(&json!(31)));
        assert_eq!(read_path(&doc, &["profile", "name"]), None);
    }

    #[test]
    fn test_write_creates_parents() {
        let mut doc = json!({"profile": null});
        write_path(&mut doc, &["profile", "age"], json!(7));
        assert_eq!(doc, json!({"profile": {"age": 7}}));
    }
}

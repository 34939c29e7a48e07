use fastnbt::Value;
use serde_json::{Map, Number, Value as JsonValue};

pub fn nbt_to_json(nbt: &Value) -> JsonValue {
    match nbt {
        Value::Compound(c) => {
            let mut map = Map::new();
            for (k, v) in c {
                map.insert(k.clone(), nbt_to_json(v));
            }
            JsonValue::Object(map)
        }
        Value::List(l) => JsonValue::Array(l.iter().map(nbt_to_json).collect()),
        Value::String(s) => JsonValue::String(s.clone()),
        Value::Byte(b) => JsonValue::Number((*b).into()),
        Value::Short(s) => JsonValue::Number((*s).into()),
        Value::Int(i) => JsonValue::Number((*i).into()),
        Value::Long(l) => JsonValue::Number((*l).into()),
        Value::Float(f) => JsonValue::Number(Number::from_f64(*f as f64).unwrap_or(Number::from(0))),
        Value::Double(d) => JsonValue::Number(Number::from_f64(*d).unwrap_or(Number::from(0))),
        Value::ByteArray(ba) => JsonValue::Array(ba.iter().map(|&b| JsonValue::Number(b.into())).collect()),
        Value::IntArray(ia) => JsonValue::Array(ia.iter().map(|&i| JsonValue::Number(i.into())).collect()),
        Value::LongArray(la) => JsonValue::Array(la.iter().map(|&l| JsonValue::Number(l.into())).collect()),
    }
}

/// The subset of a chunk the index queries:
/// `{"xPos", "zPos", "sections": [{"Y", "biomes": {"palette"}}], "structures": {"starts": {..}}}`.
///
/// Block states, heightmaps and entities are dropped; they dominate the row size.
pub fn index_document(root: &Value) -> JsonValue {
    let Value::Compound(root) = root else {
        return JsonValue::Null;
    };
    let body = match root.get("Level") {
        Some(Value::Compound(level)) => level,
        _ => root,
    };

    let mut doc = Map::new();
    for key in ["xPos", "zPos"] {
        if let Some(v) = root.get(key).or_else(|| body.get(key)) {
            doc.insert(key.to_string(), nbt_to_json(v));
        }
    }

    let sections = match body.get("sections").or_else(|| body.get("Sections")) {
        Some(Value::List(sections)) => sections
            .iter()
            .filter_map(|section| match section {
                Value::Compound(section) => {
                    let mut out = Map::new();
                    if let Some(y) = section.get("Y") {
                        out.insert("Y".to_string(), nbt_to_json(y));
                    }
                    if let Some(Value::Compound(biomes)) = section.get("biomes") {
                        if let Some(palette) = biomes.get("palette") {
                            let mut b = Map::new();
                            b.insert("palette".to_string(), nbt_to_json(palette));
                            out.insert("biomes".to_string(), JsonValue::Object(b));
                        }
                    }
                    Some(JsonValue::Object(out))
                }
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    };
    doc.insert("sections".to_string(), JsonValue::Array(sections));

    let starts = match body.get("structures").or_else(|| body.get("Structures")) {
        Some(Value::Compound(structures)) => structures.get("starts").or_else(|| structures.get("Starts")),
        _ => None,
    };
    let mut starts_doc = Map::new();
    if let Some(Value::Compound(starts)) = starts {
        for (name, start) in starts {
            let id = match start {
                Value::Compound(start) => start.get("id").map(nbt_to_json),
                _ => None,
            };
            let mut entry = Map::new();
            entry.insert("id".to_string(), id.unwrap_or(JsonValue::Null));
            starts_doc.insert(name.clone(), JsonValue::Object(entry));
        }
    }
    let mut structures = Map::new();
    structures.insert("starts".to_string(), JsonValue::Object(starts_doc));
    doc.insert("structures".to_string(), JsonValue::Object(structures));

    JsonValue::Object(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fastnbt::LongArray;
    use std::collections::HashMap;

    fn compound(entries: Vec<(&str, Value)>) -> Value {
        Value::Compound(entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }

    #[test]
    fn test_scalars_and_arrays() {
        let nbt = compound(vec![
            ("b", Value::Byte(-1)),
            ("s", Value::String("x".into())),
            ("la", Value::LongArray(LongArray::new(vec![1, 2, 4096]))),
        ]);
        assert_eq!(
            nbt_to_json(&nbt),
            serde_json::json!({"b": -1, "s": "x", "la": [1, 2, 4096]})
        );
    }

    #[test]
    fn test_index_document_keeps_only_queried_fields() {
        let section = compound(vec![
            ("Y", Value::Byte(-4)),
            ("block_states", compound(vec![("data", Value::LongArray(LongArray::new(vec![7; 256])))])),
            ("biomes", compound(vec![("palette", Value::List(vec![Value::String("minecraft:plains".into())]))])),
        ]);
        let starts = compound(vec![
            ("minecraft:igloo", compound(vec![("id", Value::String("minecraft:igloo".into()))])),
        ]);
        let root = compound(vec![
            ("xPos", Value::Int(3)),
            ("zPos", Value::Int(-2)),
            ("sections", Value::List(vec![section])),
            ("structures", compound(vec![("starts", starts)])),
            ("Heightmaps", Value::Compound(HashMap::new())),
        ]);

        assert_eq!(
            index_document(&root),
            serde_json::json!({
                "xPos": 3,
                "zPos": -2,
                "sections": [{"Y": -4, "biomes": {"palette": ["minecraft:plains"]}}],
                "structures": {"starts": {"minecraft:igloo": {"id": "minecraft:igloo"}}}
            })
        );
    }

    #[test]
    fn test_index_document_legacy_level() {
        let root = compound(vec![(
            "Level",
            compound(vec![("xPos", Value::Int(1)), ("zPos", Value::Int(1))]),
        )]);
        let doc = index_document(&root);
        assert_eq!(doc["xPos"], 1);
        assert_eq!(doc["sections"], serde_json::json!([]));
        assert_eq!(doc["structures"]["starts"], serde_json::json!({}));
    }
}

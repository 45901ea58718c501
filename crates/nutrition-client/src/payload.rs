//! Tolerant parsing of FSVO API payloads.
//!
//! Search responses come either as a top-level list or as an object
//! wrapping the list under `foods`, `results`, `data` or `items`. Entries
//! name the food with `foodName` or `name` and identify it with `id` or
//! `dbid`, optionally inside a nested `food` object.
//!
//! Detail responses carry a `values` array of `{component: {name}, value}`
//! entries. Payloads with flat `"Protein (g)"` style keys, at the top
//! level or under `food`, are accepted too.

use crate::error::{LookupError, Result};
use data_loader::MacroTarget;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoodMatch {
    pub name: String,
    pub id: u64,
}

const LIST_KEYS: [&str; 4] = ["foods", "results", "data", "items"];

/// Component names in the `values` array, with the flat key fallback.
const ENERGY: (&str, &str) = ("Energy, kilocalories", "Energy, kilocalories (kcal)");
const PROTEIN: (&str, &str) = ("Protein", "Protein (g)");
const FAT: (&str, &str) = ("Fat, total", "Fat, total (g)");
const CARBS: (&str, &str) = ("Carbohydrates, available", "Carbohydrates, available (g)");

fn as_id(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn name_of(obj: &Map<String, Value>) -> Option<String> {
    ["foodName", "name"]
        .iter()
        .find_map(|k| obj.get(*k).and_then(Value::as_str))
        .map(str::to_string)
}

fn id_of(obj: &Map<String, Value>) -> Option<u64> {
    ["id", "dbid"].iter().find_map(|k| obj.get(*k).and_then(as_id))
}

fn parse_entry(item: &Value) -> Option<FoodMatch> {
    let obj = item.as_object()?;
    let mut name = name_of(obj);
    let mut id = id_of(obj);

    // Nested values win over top-level ones
    if let Some(food) = obj.get("food").and_then(Value::as_object) {
        name = name_of(food).or(name);
        id = id_of(food).or(id);
    }

    Some(FoodMatch { name: name?, id: id? })
}

/// Extract search hits in payload order. Entries without both a name and
/// an id are skipped; unknown shapes yield an empty list.
pub fn parse_search(payload: &Value) -> Vec<FoodMatch> {
    let items = match payload {
        Value::Array(items) => items,
        Value::Object(obj) => match LIST_KEYS
            .iter()
            .find_map(|k| obj.get(*k).and_then(Value::as_array))
        {
            Some(items) => items,
            None => return Vec::new(),
        },
        _ => return Vec::new(),
    };
    items.iter().filter_map(parse_entry).collect()
}

fn from_values(values: &[Value], component: &str) -> Result<Option<f64>> {
    for entry in values {
        let name = entry
            .get("component")
            .and_then(|c| c.get("name"))
            .and_then(Value::as_str);
        if name != Some(component) {
            continue;
        }
        return match entry.get("value") {
            Some(v) => as_f64(v)
                .map(Some)
                .ok_or_else(|| LookupError::Payload(format!("invalid value for '{}': {}", component, v))),
            None => Ok(None),
        };
    }
    Ok(None)
}

fn from_flat(obj: &Map<String, Value>, key: &str) -> Option<f64> {
    obj.get(key)
        .or_else(|| obj.get("food").and_then(|f| f.get(key)))
        .and_then(as_f64)
}

/// Extract energy and macros per 100 g from a detail payload.
pub fn parse_details(id: u64, payload: &Value) -> Result<MacroTarget> {
    let obj = payload
        .as_object()
        .ok_or_else(|| LookupError::Payload("detail payload is not an object".to_string()))?;

    let values = match obj.get("values") {
        Some(Value::Array(values)) => Some(values.as_slice()),
        Some(_) => return Err(LookupError::Payload("'values' is not a list".to_string())),
        None => None,
    };

    let mut found = [None; 4];
    let mut missing = Vec::new();
    for (slot, (label, (component, flat_key))) in found.iter_mut().zip([
        ("kcal", ENERGY),
        ("protein", PROTEIN),
        ("fat", FAT),
        ("carbs", CARBS),
    ]) {
        *slot = match values {
            Some(values) => from_values(values, component)?,
            None => from_flat(obj, flat_key),
        };
        if slot.is_none() {
            missing.push(label);
        }
    }

    match found {
        [Some(kcal), Some(protein), Some(fat), Some(carbs)] => {
            Ok(MacroTarget::new(kcal, protein, fat, carbs))
        }
        _ => Err(LookupError::MissingMacros { id, missing }),
    }
}

/// How well `name` matches `query`, in `[0, 1]`.
///
/// A name containing the whole query scores 1. Otherwise the score is the
/// share of query words found in the name.
pub fn similarity(query: &str, name: &str) -> f64 {
    let query = query.trim().to_lowercase();
    let name = name.to_lowercase();
    if query.is_empty() {
        return 0.0;
    }
    if name.contains(&query) {
        return 1.0;
    }
    let words: Vec<&str> = query.split_whitespace().collect();
    let hits = words.iter().filter(|w| name.contains(*w)).count();
    hits as f64 / words.len() as f64
}

/// Order hits by descending similarity, keeping payload order for ties.
pub fn rank_matches(query: &str, matches: &mut [FoodMatch]) {
    matches.sort_by(|a, b| similarity(query, &b.name).total_cmp(&similarity(query, &a.name)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_search_nested() {
        let payload = json!([
            {"food": {"name": "Chicken Breast", "dbid": 123}},
            {"food": {"name": "Chicken Thigh", "dbid": 124}}
        ]);
        let hits = parse_search(&payload);
        assert_eq!(
            hits,
            vec![
                FoodMatch { name: "Chicken Breast".to_string(), id: 123 },
                FoodMatch { name: "Chicken Thigh".to_string(), id: 124 },
            ]
        );
    }

    #[test]
    fn test_parse_search_flat_and_wrapped() {
        let flat = json!([{"foodName": "Apple", "id": 456}, {"name": "Banana", "dbid": "457"}]);
        let hits = parse_search(&flat);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[1].id, 457);

        let wrapped = json!({"results": [{"foodName": "Apple", "id": 456}]});
        assert_eq!(parse_search(&wrapped)[0].name, "Apple");
    }

    #[test]
    fn test_parse_search_skips_incomplete() {
        let payload = json!([{"name": "No id"}, {"id": 1}, "junk", {"name": "Pear", "id": 2}]);
        let hits = parse_search(&payload);
        assert_eq!(hits, vec![FoodMatch { name: "Pear".to_string(), id: 2 }]);

        assert!(parse_search(&json!([])).is_empty());
        assert!(parse_search(&json!({"unexpected": true})).is_empty());
        assert!(parse_search(&json!(42)).is_empty());
    }

    #[test]
    fn test_parse_details_values_array() {
        let payload = json!({
            "id": 123,
            "values": [
                {"component": {"name": "Energy, kilocalories"}, "value": 165.0},
                {"component": {"name": "Protein"}, "value": 31.0},
                {"component": {"name": "Fat, total"}, "value": "3.6"},
                {"component": {"name": "Carbohydrates, available"}, "value": 0.0},
                {"component": {"name": "Water"}, "value": 65.0}
            ]
        });
        let macros = parse_details(123, &payload).unwrap();
        assert_eq!(macros, MacroTarget::new(165.0, 31.0, 3.6, 0.0));
    }

    #[test]
    fn test_parse_details_flat_keys() {
        let payload = json!({
            "food": {
                "name": "Chicken Breast",
                "Energy, kilocalories (kcal)": 165.0,
                "Protein (g)": 31.0,
                "Fat, total (g)": 3.6,
                "Carbohydrates, available (g)": 0.0
            }
        });
        assert_eq!(
            parse_details(123, &payload).unwrap(),
            MacroTarget::new(165.0, 31.0, 3.6, 0.0)
        );
    }

    #[test]
    fn test_parse_details_missing_macro() {
        let payload = json!({
            "values": [
                {"component": {"name": "Energy, kilocalories"}, "value": 165.0},
                {"component": {"name": "Fat, total"}, "value": 3.6},
                {"component": {"name": "Carbohydrates, available"}, "value": 0.0}
            ]
        });
        match parse_details(7, &payload) {
            Err(LookupError::MissingMacros { id, missing }) => {
                assert_eq!(id, 7);
                assert_eq!(missing, vec!["protein"]);
            }
            other => panic!("expected MissingMacros, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_details_bad_shapes() {
        assert!(matches!(
            parse_details(1, &json!({"values": "nope"})),
            Err(LookupError::Payload(_))
        ));
        assert!(matches!(parse_details(1, &json!([])), Err(LookupError::Payload(_))));
        assert!(matches!(
            parse_details(
                1,
                &json!({"values": [{"component": {"name": "Protein"}, "value": "n/a"}]})
            ),
            Err(LookupError::Payload(_))
        ));
    }

    #[test]
    fn test_rank_matches() {
        let mut hits = vec![
            FoodMatch { name: "Milk chocolate".to_string(), id: 1 },
            FoodMatch { name: "Chicken, breast, raw".to_string(), id: 2 },
            FoodMatch { name: "Chicken soup".to_string(), id: 3 },
        ];
        rank_matches("chicken soup", &mut hits);
        let ids: Vec<u64> = hits.iter().map(|h| h.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }
}

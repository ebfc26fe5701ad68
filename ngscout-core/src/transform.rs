//! JSON to TypeScript interface generation.
//!
//! Objects become `export interface` blocks; nested objects are hoisted
//! into named child interfaces emitted after their parent. Output is
//! deterministic: keys sorted, names deduplicated with numeric suffixes.

use crate::{Result, ScoutError};
use serde_json::Value;
use std::collections::BTreeMap;
use std::collections::HashSet;

/// Generate TypeScript interfaces for a JSON document. The root value must
/// be an object (or an array whose first element is one).
pub fn json_to_interfaces(root_name: &str, json_text: &str) -> Result<String> {
    let value: Value = serde_json::from_str(json_text)?;
    let object = match &value {
        Value::Object(map) => map,
        Value::Array(items) => match items.first() {
            Some(Value::Object(map)) => map,
            _ => {
                return Err(ScoutError::Transform(
                    "top-level array must contain objects".to_string(),
                ))
            }
        },
        _ => {
            return Err(ScoutError::Transform(
                "top-level JSON value must be an object".to_string(),
            ))
        }
    };

    let mut generator = Generator::default();
    let root = generator.claim_name(&pascal_case(root_name));
    generator.emit_interface(&root, object);
    Ok(generator.interfaces.join("\n\n") + "\n")
}

#[derive(Default)]
struct Generator {
    interfaces: Vec<String>,
    used_names: HashSet<String>,
}

impl Generator {
    /// Reserve a unique interface name, suffixing on collision.
    fn claim_name(&mut self, base: &str) -> String {
        let base = if base.is_empty() { "Root" } else { base };
        let mut candidate = base.to_string();
        let mut counter = 2;
        while !self.used_names.insert(candidate.clone()) {
            candidate = format!("{base}{counter}");
            counter += 1;
        }
        candidate
    }

    fn emit_interface(&mut self, name: &str, object: &serde_json::Map<String, Value>) {
        // Reserve this interface's slot so parents precede children.
        let slot = self.interfaces.len();
        self.interfaces.push(String::new());

        let sorted: BTreeMap<&String, &Value> = object.iter().collect();
        let mut body = format!("export interface {name} {{\n");
        for (key, value) in sorted {
            let ty = self.type_for(key, value);
            body.push_str(&format!("  {}: {};\n", property_name(key), ty));
        }
        body.push('}');
        self.interfaces[slot] = body;
    }

    fn type_for(&mut self, key: &str, value: &Value) -> String {
        match value {
            Value::Null => "any".to_string(),
            Value::Bool(_) => "boolean".to_string(),
            Value::Number(_) => "number".to_string(),
            Value::String(_) => "string".to_string(),
            Value::Array(items) => {
                // Element type comes from the first element only.
                match items.first() {
                    Some(element) => format!("{}[]", self.type_for(key, element)),
                    None => "any[]".to_string(),
                }
            }
            Value::Object(map) => {
                let child = self.claim_name(&pascal_case(key));
                self.emit_interface(&child, map);
                child
            }
        }
    }
}

fn pascal_case(input: &str) -> String {
    input
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

/// Quote property names that are not plain identifiers.
fn property_name(key: &str) -> String {
    let plain = !key.is_empty()
        && key
            .chars()
            .enumerate()
            .all(|(i, c)| c == '_' || c == '$' || c.is_ascii_alphabetic() || (i > 0 && c.is_ascii_digit()));
    if plain {
        key.to_string()
    } else {
        format!("'{key}'")
    }
}

//! Merging of sibling JSON-Schema fragments
//!
//! Fragments are `Option<Json>`: `None` means the node cannot be described,
//! `true` (or `{}`) matches anything and `false` matches nothing.

use crate::exporter::Target;
use serde_json::{json, Map as JsonMap, Value as Json};
use std::collections::{BTreeMap, BTreeSet};

/// Whether `schema` accepts every instance
pub fn is_anything(schema: &Json) -> bool {
    match schema {
        Json::Bool(b) => *b,
        Json::Object(object) => object.is_empty(),
        _ => false,
    }
}

/// Combine alternatives into one fragment.
///
/// Literal alternatives are folded into a single `const`/`enum`, bare types
/// into a single `type`, nested `anyOf`s are flattened.
pub fn any_of(schemas: impl IntoIterator<Item = Option<Json>>, target: Target) -> Option<Json> {
    let mut alternatives = Alternatives::default();
    for schema in schemas.into_iter().flatten() {
        alternatives.add(schema);
    }
    alternatives.finish(target)
}

/// Combine requirements into one fragment.
///
/// Bare types already implied by another requirement are dropped and every
/// `not` is merged into one `not: anyOf`.
pub fn all_of(schemas: impl IntoIterator<Item = Option<Json>>, target: Target) -> Option<Json> {
    let mut requirements = Requirements::default();
    for schema in schemas.into_iter().flatten() {
        requirements.add(schema);
    }
    requirements.finish(target)
}

#[derive(Default)]
struct Alternatives {
    any_of: Vec<Json>,
    constants: Vec<Json>,
    types: BTreeSet<String>,
    has_true: bool,
    has_false: bool,
    has_null: bool,
    anything: bool,
}

impl Alternatives {
    fn add(&mut self, schema: Json) {
        let mut object = match schema {
            Json::Object(object) if !object.is_empty() => object,
            other => {
                self.anything |= is_anything(&other);
                return;
            }
        };
        if object.get("nullable") == Some(&Json::Bool(true)) {
            self.has_null = true;
            object.remove("nullable");
        }

        if only(&object, "const") || only(&object, "enum") {
            let values = match (object.remove("enum"), object.remove("const")) {
                (Some(Json::Array(values)), _) => values,
                (Some(value), _) | (None, Some(value)) => vec![value],
                (None, None) => Vec::new(),
            };
            for value in values {
                match value {
                    Json::Bool(true) => self.has_true = true,
                    Json::Bool(false) => self.has_false = true,
                    Json::Null => self.has_null = true,
                    other if !self.constants.contains(&other) => self.constants.push(other),
                    _ => {}
                }
            }
        } else if only(&object, "type") {
            self.types.extend(type_names(&object["type"]));
        } else if only(&object, "anyOf") {
            if let Some(Json::Array(items)) = object.remove("anyOf") {
                for item in items {
                    self.add(item);
                }
            }
        } else if !object.is_empty() {
            self.any_of.push(Json::Object(object));
        }
    }

    fn finish(mut self, target: Target) -> Option<Json> {
        if self.anything {
            return Some(Json::Bool(true));
        }
        if self.types.remove("boolean") {
            self.has_true = true;
            self.has_false = true;
        }
        if self.types.remove("null") {
            self.has_null = true;
        }

        match target {
            Target::JsonSchema => {
                if self.has_true == self.has_false && self.constants.is_empty() {
                    if self.has_true {
                        self.types.insert("boolean".to_string());
                    }
                    if self.has_null {
                        self.types.insert("null".to_string());
                    }
                } else {
                    self.push_flags(true);
                }
                if !self.types.is_empty() {
                    let types: Vec<String> = self.types.iter().cloned().collect();
                    self.any_of.push(json!({ "type": single_or_list(types) }));
                }
                match self.constants.len() {
                    0 => {}
                    1 => self.any_of.push(json!({ "const": self.constants[0] })),
                    _ => self.any_of.push(json!({ "enum": self.constants })),
                }
                collapse(self.any_of)
            }
            Target::OpenApi => {
                if self.has_true && self.has_false && self.constants.is_empty() {
                    self.types.insert("boolean".to_string());
                } else {
                    self.push_flags(false);
                }
                for ty in &self.types {
                    self.any_of.push(json!({ "type": ty }));
                }
                if !self.constants.is_empty() {
                    self.any_of.push(json!({ "enum": self.constants }));
                }
                if !self.has_null {
                    return collapse(self.any_of);
                }
                match self.any_of.len() {
                    0 => Some(json!({ "enum": [null] })),
                    1 => {
                        let mut only = self.any_of.remove(0);
                        if let Json::Object(object) = &mut only {
                            object.insert("nullable".to_string(), Json::Bool(true));
                        }
                        Some(only)
                    }
                    _ => Some(json!({ "anyOf": self.any_of, "nullable": true })),
                }
            }
        }
    }

    fn push_flags(&mut self, with_null: bool) {
        if self.has_true {
            self.constants.push(Json::Bool(true));
        }
        if self.has_false {
            self.constants.push(Json::Bool(false));
        }
        if with_null && self.has_null {
            self.constants.push(Json::Null);
        }
    }
}

#[derive(Default)]
struct Requirements {
    all_of: Vec<Json>,
    /// Bare type requirements; `false` once another fragment implies the type
    types: BTreeMap<Vec<String>, bool>,
    negated: Vec<Option<Json>>,
    nothing: bool,
    anything: bool,
}

impl Requirements {
    fn add(&mut self, schema: Json) {
        let mut object = match schema {
            Json::Bool(false) => {
                self.nothing = true;
                return;
            }
            Json::Object(object) if !object.is_empty() => object,
            other => {
                self.anything |= is_anything(&other);
                return;
            }
        };

        if object.keys().all(|key| key == "allOf" || key == "not") {
            if let Some(Json::Array(items)) = object.remove("allOf") {
                for item in items {
                    self.add(item);
                }
            }
            if let Some(negated) = object.remove("not") {
                self.negated.push(Some(negated));
            }
        } else if only(&object, "type") {
            let types = sorted_types(&object["type"]);
            if !types.is_empty() {
                self.types.entry(types).or_insert(true);
            }
        } else {
            if let Some(ty) = object.get("type") {
                self.types.insert(sorted_types(ty), false);
            }
            self.all_of.push(Json::Object(object));
        }
    }

    fn finish(mut self, target: Target) -> Option<Json> {
        if self.nothing {
            return Some(Json::Bool(false));
        }
        for (types, keep) in std::mem::take(&mut self.types) {
            if keep {
                self.all_of.push(json!({ "type": single_or_list(types) }));
            }
        }

        let negated = any_of(self.negated, target);
        if negated.as_ref().is_some_and(is_anything) {
            return Some(Json::Bool(false));
        }

        match (self.all_of.len(), negated) {
            (0, None) if self.anything => Some(Json::Bool(true)),
            (0, None) => None,
            (0, Some(negated)) => Some(json!({ "not": negated })),
            (_, Some(negated)) => Some(json!({ "allOf": self.all_of, "not": negated })),
            (1, None) => self.all_of.pop(),
            (_, None) => Some(json!({ "allOf": self.all_of })),
        }
    }
}

fn only(object: &JsonMap<String, Json>, key: &str) -> bool {
    object.len() == 1 && object.contains_key(key)
}

fn type_names(ty: &Json) -> Vec<String> {
    match ty {
        Json::String(name) => vec![name.clone()],
        Json::Array(names) => names
            .iter()
            .filter_map(|name| name.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

fn sorted_types(ty: &Json) -> Vec<String> {
    let set: BTreeSet<String> = type_names(ty).into_iter().collect();
    set.into_iter().collect()
}

fn single_or_list(mut types: Vec<String>) -> Json {
    if types.len() == 1 {
        Json::String(types.remove(0))
    } else {
        json!(types)
    }
}

fn collapse(mut any_of: Vec<Json>) -> Option<Json> {
    match any_of.len() {
        0 => None,
        1 => any_of.pop(),
        _ => Some(json!({ "anyOf": any_of })),
    }
}

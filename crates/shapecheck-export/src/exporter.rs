//! Schema tree to JSON-Schema conversion

use crate::error::{ExportError, Result};
use crate::merge;
use serde_json::{json, Map as JsonMap, Value as Json};
use shapecheck_core::{ContainerKind, Key, MapSchema, Schema, SchemaKind, SeqSchema, Value, ValueType};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// `$schema` URI of exported documents
pub const DRAFT_07: &str = "http://json-schema.org/draft-07/schema#";

/// Flavour of the generated schema
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Target {
    /// JSON-Schema draft-07: `const`, type lists, `null` as a type
    #[default]
    JsonSchema,
    /// OpenAPI 3.0 schema object: `enum` only, one type per entry, `nullable`
    OpenApi,
}

/// Converts schema trees into JSON-Schema
#[derive(Debug, Clone, Default)]
pub struct JsonSchemaExporter {
    target: Target,
}

/// Value schemas collected for one property slot; forbidden keys are negated
#[derive(Default)]
struct Slot {
    allowed: Vec<Option<Json>>,
    forbidden: Vec<Option<Json>>,
}

#[derive(Default)]
struct Properties {
    named: BTreeMap<String, Slot>,
    patterns: BTreeMap<String, Slot>,
    additional: Slot,
    required: BTreeSet<String>,
}

impl JsonSchemaExporter {
    pub fn new(target: Target) -> Self {
        Self { target }
    }

    pub fn target(&self) -> Target {
        self.target
    }

    /// Export `schema`.
    ///
    /// `Some(true)` matches anything, `Some(false)` nothing, and `None` means
    /// the schema cannot be described.
    pub fn export(&self, schema: &Schema) -> Result<Option<Json>> {
        debug!(flavour = ?self.target, schema = %schema, "exporting schema");
        self.node(schema, false)
    }

    /// Export `schema` as a standalone document with `id` and `$schema`
    pub fn export_document(&self, schema: &Schema, id: &str) -> Result<Json> {
        let mut document = match self.export(schema)? {
            Some(Json::Bool(true)) => JsonMap::new(),
            Some(Json::Object(object)) => object,
            _ => {
                return Err(ExportError::NotAnObject {
                    schema: schema.to_string(),
                })
            }
        };
        document.insert("id".to_string(), Json::String(id.to_string()));
        document.insert("$schema".to_string(), Json::String(DRAFT_07.to_string()));
        Ok(Json::Object(document))
    }

    fn node(&self, schema: &Schema, ignore_extra: bool) -> Result<Option<Json>> {
        if let Some(fragment) = schema.json_schema_override() {
            return match fragment {
                Json::Bool(_) | Json::Object(_) => Ok(Some(fragment.clone())),
                other => Err(ExportError::InvalidOverride {
                    schema: schema.to_string(),
                    found: other.to_string(),
                }),
            };
        }
        let ignore_extra = schema
            .options()
            .map_or(ignore_extra, |options| options.ignore_extra_keys);

        let mut fragment = match schema.kind() {
            SchemaKind::Literal(value) => Some(self.literal(value)?),
            SchemaKind::Type(ty) => Some(type_fragment(*ty)),
            SchemaKind::Predicate(_) | SchemaKind::Use(_) => None,
            SchemaKind::Validator(validator) => validator.json_schema(),
            SchemaKind::Sequence(seq) => self.sequence(seq, ignore_extra)?,
            SchemaKind::Mapping(map) => Some(self.mapping(map, ignore_extra)?),
            SchemaKind::And(schemas) => merge::all_of(self.nodes(schemas, ignore_extra)?, self.target),
            SchemaKind::Or(or) => merge::any_of(self.nodes(or.branches(), ignore_extra)?, self.target),
            SchemaKind::Not(inner) => self.node(inner, ignore_extra)?.map(negate),
            SchemaKind::Const(inner) => self.node(inner, ignore_extra)?,
        };

        if let (Some(description), Some(Json::Object(object))) = (schema.description(), fragment.as_mut()) {
            object.insert("description".to_string(), Json::String(description.to_string()));
        }
        Ok(fragment)
    }

    fn nodes(&self, schemas: &[Schema], ignore_extra: bool) -> Result<Vec<Option<Json>>> {
        schemas.iter().map(|schema| self.node(schema, ignore_extra)).collect()
    }

    fn literal(&self, value: &Value) -> Result<Json> {
        let value = serde_json::to_value(value)?;
        Ok(match self.target {
            Target::JsonSchema => json!({ "const": value }),
            Target::OpenApi => json!({ "enum": [value] }),
        })
    }

    fn sequence(&self, seq: &SeqSchema, ignore_extra: bool) -> Result<Option<Json>> {
        let items = match seq.elements() {
            [] => Some(Json::Bool(true)),
            [single] => self.node(single, ignore_extra)?,
            many => merge::any_of(self.nodes(many, ignore_extra)?, self.target),
        };
        let Some(items) = items else {
            return Ok(None);
        };

        let mut object = JsonMap::new();
        object.insert("type".to_string(), json!("array"));
        if !merge::is_anything(&items) {
            object.insert("items".to_string(), items);
        }
        if seq.kind() == Some(ContainerKind::Set) {
            object.insert("uniqueItems".to_string(), Json::Bool(true));
        }
        if seq.min_length() > 0 {
            object.insert("minItems".to_string(), json!(seq.min_length()));
        }
        if let Some(max) = seq.max_length() {
            object.insert("maxItems".to_string(), json!(max));
        }
        Ok(Some(Json::Object(object)))
    }

    fn mapping(&self, map: &MapSchema, inherited: bool) -> Result<Json> {
        let ignore_extra = map.extra_keys_policy().unwrap_or(inherited);
        let mut properties = Properties::default();

        for (key, value) in map.entries() {
            let key_fragment = self.node(key.schema(), ignore_extra)?;
            let value_fragment = if key.is_forbidden() {
                Some(Json::Bool(true))
            } else {
                match self.node(value, ignore_extra)? {
                    None | Some(Json::Bool(false)) => continue,
                    fragment => fragment,
                }
            };
            place(key, key_fragment, value_fragment, key.is_required(), &mut properties);
        }

        let mut object = JsonMap::new();
        object.insert("type".to_string(), json!("object"));
        if !properties.required.is_empty() {
            object.insert("required".to_string(), json!(properties.required));
        }
        let named = self.slots(properties.named);
        if !named.is_empty() {
            object.insert("properties".to_string(), Json::Object(named));
        }
        let patterns = self.slots(properties.patterns);
        if !patterns.is_empty() {
            object.insert("patternProperties".to_string(), Json::Object(patterns));
        }
        let additional = if ignore_extra {
            Json::Bool(true)
        } else {
            self.slot(properties.additional)
        };
        object.insert("additionalProperties".to_string(), additional);
        if map.min_length() > 0 {
            object.insert("minProperties".to_string(), json!(map.min_length()));
        }
        if let Some(max) = map.max_length() {
            object.insert("maxProperties".to_string(), json!(max));
        }
        Ok(Json::Object(object))
    }

    /// Slots that can never match are dropped unless a forbidden key names them
    fn slots(&self, slots: BTreeMap<String, Slot>) -> JsonMap<String, Json> {
        slots
            .into_iter()
            .filter_map(|(name, slot)| {
                let forbidden = !slot.forbidden.is_empty();
                let fragment = self.slot(slot);
                (forbidden || fragment != Json::Bool(false)).then_some((name, fragment))
            })
            .collect()
    }

    fn slot(&self, slot: Slot) -> Json {
        let allowed = merge::any_of(slot.allowed, self.target);
        let forbidden = merge::any_of(slot.forbidden, self.target);
        match (allowed, forbidden) {
            (_, Some(forbidden)) if merge::is_anything(&forbidden) => Json::Bool(false),
            (None, _) | (Some(Json::Bool(false)), _) => Json::Bool(false),
            (Some(allowed), None) => allowed,
            (Some(Json::Object(mut allowed)), Some(forbidden)) if allowed.len() == 1 && allowed.contains_key("anyOf") => {
                allowed.insert("not".to_string(), forbidden);
                Json::Object(allowed)
            }
            (Some(allowed), Some(forbidden)) => json!({ "allOf": [allowed], "not": forbidden }),
        }
    }
}

/// Route a `(key, value)` pair to the property slot its key fragment implies
fn place(key: &Key, key_fragment: Option<Json>, value: Option<Json>, required: bool, properties: &mut Properties) {
    let slot_of = |slot: &mut Slot| {
        if key.is_forbidden() {
            slot.forbidden.push(value.clone());
        } else {
            slot.allowed.push(value.clone());
        }
    };

    let object = match key_fragment {
        None | Some(Json::Bool(false)) => return,
        Some(fragment) if merge::is_anything(&fragment) => {
            slot_of(&mut properties.additional);
            return;
        }
        Some(Json::Object(object)) => object,
        Some(_) => return,
    };

    if let Some(ty) = object.get("type") {
        match ty {
            Json::Array(types) => {
                for ty in types {
                    place(key, Some(json!({ "type": ty })), value.clone(), false, properties);
                }
            }
            Json::String(ty) if ty == "string" => match object.get("pattern").and_then(Json::as_str) {
                Some(pattern) => slot_of(properties.patterns.entry(pattern.to_string()).or_default()),
                None => slot_of(&mut properties.additional),
            },
            Json::String(ty) if ty == "boolean" => {
                slot_of(properties.patterns.entry("^(true|false)$".to_string()).or_default())
            }
            Json::String(ty) if ty == "integer" => {
                let minimum = object
                    .get("minimum")
                    .and_then(Json::as_i64)
                    .or_else(|| object.get("exclusiveMinimum").and_then(Json::as_i64).map(|m| m + 1));
                let pattern = match minimum {
                    Some(0) => "^([1-9][0-9]*|0)$",
                    Some(1) => "^([1-9][0-9]*)$",
                    _ => "^(-?[1-9][0-9]*|0)$",
                };
                slot_of(properties.patterns.entry(pattern.to_string()).or_default())
            }
            _ => {}
        }
    } else if object.len() == 1 && object.contains_key("anyOf") {
        if let Some(Json::Array(items)) = object.get("anyOf") {
            for item in items {
                place(key, Some(item.clone()), value.clone(), false, properties);
            }
        }
    } else if object.len() == 1 && (object.contains_key("const") || object.contains_key("enum")) {
        let constants = match (object.get("enum"), object.get("const")) {
            (Some(Json::Array(values)), _) => values.clone(),
            (Some(value), _) | (None, Some(value)) => vec![value.clone()],
            (None, None) => Vec::new(),
        };
        let single = constants.len() == 1;
        for constant in constants {
            let name = match constant {
                Json::String(name) => name,
                Json::Bool(flag) => flag.to_string(),
                Json::Number(number) if number.is_i64() || number.is_u64() => number.to_string(),
                _ => return,
            };
            slot_of(properties.named.entry(name.clone()).or_default());
            if required && single {
                properties.required.insert(name);
            }
        }
    }
}

fn type_fragment(ty: ValueType) -> Json {
    match ty {
        ValueType::Null => json!({ "type": "null" }),
        ValueType::Bool => json!({ "type": "boolean" }),
        ValueType::Int => json!({ "type": "integer" }),
        ValueType::Float | ValueType::Number => json!({ "type": "number" }),
        ValueType::Str => json!({ "type": "string" }),
        ValueType::List | ValueType::Tuple | ValueType::Set => json!({ "type": "array" }),
        ValueType::Map => json!({ "type": "object" }),
        ValueType::Any => Json::Bool(true),
    }
}

/// Consecutive negations cancel out
fn negate(fragment: Json) -> Json {
    match fragment {
        Json::Bool(b) => Json::Bool(!b),
        Json::Object(object) if object.is_empty() => Json::Bool(false),
        Json::Object(mut object) if object.len() == 1 && object.contains_key("not") => {
            object.remove("not").unwrap_or(Json::Bool(false))
        }
        other => json!({ "not": other }),
    }
}

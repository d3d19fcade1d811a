//! Export of a realistic service schema to both targets

use serde_json::json;
use shapecheck_core::{Key, MapSchema, RegexSchema, Schema, Value, ValueType};
use shapecheck_export::{ExportError, JsonSchemaExporter, Target, DRAFT_07};

fn service_schema() -> Schema {
    let port = Schema::or([Schema::of_type(ValueType::Int), Schema::literal(Value::Null)]);
    MapSchema::new()
        .entry(
            "name",
            Schema::from(RegexSchema::new("^[a-z]+$").unwrap()).with_description("service name"),
        )
        .entry(Key::optional("port"), port)
        .entry(Key::optional("tags"), Schema::set([ValueType::Str]))
        .entry(Key::optional("mode"), Schema::or(["fast", "safe"]))
        .entry(Key::optional("token"), Schema::predicate("non_empty", |v| v.len().is_some_and(|n| n > 0)))
        .entry(Key::forbidden("password"), ValueType::Any)
        .into()
}

#[test]
fn test_json_schema_document() {
    let doc = JsonSchemaExporter::new(Target::JsonSchema)
        .export_document(&service_schema(), "service.json")
        .unwrap();

    assert_eq!(doc["$schema"], json!(DRAFT_07));
    assert_eq!(doc["id"], json!("service.json"));
    assert_eq!(doc["type"], json!("object"));
    assert_eq!(doc["required"], json!(["name"]));
    assert_eq!(doc["additionalProperties"], json!(false));

    let properties = &doc["properties"];
    assert_eq!(
        properties["name"],
        json!({ "type": "string", "pattern": "^[a-z]+$", "description": "service name" })
    );
    assert_eq!(properties["port"], json!({ "type": ["integer", "null"] }));
    assert_eq!(
        properties["tags"],
        json!({ "type": "array", "items": { "type": "string" }, "uniqueItems": true })
    );
    assert_eq!(properties["mode"], json!({ "enum": ["fast", "safe"] }));
    assert_eq!(properties["password"], json!(false));
    assert!(properties.get("token").is_none());
}

#[test]
fn test_openapi_rendered_as_yaml() {
    let exporter = JsonSchemaExporter::new(Target::OpenApi);
    let fragment = exporter.export(&service_schema()).unwrap().unwrap();

    assert_eq!(fragment["properties"]["port"], json!({ "type": "integer", "nullable": true }));

    let yaml = serde_yaml::to_string(&fragment).unwrap();
    assert!(yaml.contains("nullable: true"));
    assert!(yaml.contains("uniqueItems: true"));
}

#[test]
fn test_ignore_extra_keys_opens_document() {
    let schema = service_schema().ignore_extra_keys(true);
    let fragment = JsonSchemaExporter::default().export(&schema).unwrap().unwrap();
    assert_eq!(fragment["additionalProperties"], json!(true));
}

#[test]
fn test_override_must_be_schema_shaped() {
    let schema = Schema::of_type(ValueType::Int).with_json_schema(json!("integer"));
    let err = JsonSchemaExporter::default().export(&schema).unwrap_err();
    assert!(matches!(err, ExportError::InvalidOverride { .. }));
}

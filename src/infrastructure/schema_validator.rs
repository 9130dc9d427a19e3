use anyhow::{anyhow, Result};
use jsonschema::{Draft, JSONSchema};
use once_cell::sync::Lazy;
use serde_json::Value;

static BOOKMARKS_SCHEMA: Lazy<JSONSchema> = Lazy::new(|| {
    let schema_content = include_str!("../schemas/bookmarks_schema.json");
    let schema: Value = serde_json::from_str(schema_content).expect("Invalid bookmarks schema");
    JSONSchema::options()
        .with_draft(Draft::Draft7)
        .compile(&schema)
        .expect("Failed to compile bookmarks schema")
});

static NAV_STATE_SCHEMA: Lazy<JSONSchema> = Lazy::new(|| {
    let schema_content = include_str!("../schemas/nav_state_schema.json");
    let schema: Value = serde_json::from_str(schema_content).expect("Invalid nav state schema");
    JSONSchema::options()
        .with_draft(Draft::Draft7)
        .compile(&schema)
        .expect("Failed to compile nav state schema")
});

/// Validate a whole bookmarks file (roots + every nested node).
pub fn validate_bookmarks_file(bookmarks: &Value) -> Result<()> {
    check(&BOOKMARKS_SCHEMA, bookmarks, "Bookmarks file")
}

/// Validate a persisted navigator state record.
pub fn validate_nav_state(state: &Value) -> Result<()> {
    check(&NAV_STATE_SCHEMA, state, "Navigator state")
}

fn check(schema: &JSONSchema, value: &Value, what: &str) -> Result<()> {
    match schema.validate(value) {
        Ok(()) => Ok(()),
        Err(errors) => {
            let error_list: Vec<String> = errors.map(|e| e.to_string()).collect();
            Err(anyhow!(
                "{what} validation failed:\n{}",
                error_list.join("\n")
            ))
        }
    }
}

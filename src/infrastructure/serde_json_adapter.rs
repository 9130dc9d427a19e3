use crate::infrastructure::schema_validator::validate_bookmarks_file;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use tokio::fs;

/// On-disk `Bookmarks` file written by Chromium-family browsers.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BookmarksFileDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,

    #[serde(default)]
    pub roots: BTreeMap<String, BookmarkNodeDto>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BookmarkNodeDto {
    #[serde(rename = "type")]
    pub node_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<BookmarkNodeDto>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl BookmarkNodeDto {
    pub fn is_url(&self) -> bool {
        self.node_type == "url"
    }

    pub fn is_folder(&self) -> bool {
        self.node_type == "folder"
    }
}

/// Read, schema-check and parse a bookmarks file.
pub async fn read_bookmarks_file(path: impl AsRef<Path>) -> Result<BookmarksFileDto> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    parse_bookmarks(&raw).with_context(|| format!("parsing {}", path.display()))
}

pub fn parse_bookmarks(raw: &str) -> Result<BookmarksFileDto> {
    let value: Value = serde_json::from_str(raw)?;
    validate_bookmarks_file(&value)?;
    let dto: BookmarksFileDto = serde_json::from_value(value)?;
    Ok(dto)
}

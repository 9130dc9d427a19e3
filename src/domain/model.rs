use crate::domain::error::NavError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Id of the synthetic root folder, as in the Chromium bookmarks API.
pub const ROOT_FOLDER_ID: &str = "0";

/// Label shown for the root in breadcrumbs.
pub const ROOT_LABEL: &str = "root";

pub const MIN_SAMPLE_SIZE: u8 = 1;
pub const MAX_SAMPLE_SIZE: u8 = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderEntry {
    pub id: String,
    pub name: String,
}

impl FolderEntry {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Path from the root (exclusive) to the folder being viewed.
///
/// The empty chain is the root itself. Every entry is expected to be a child
/// of the entry before it; the navigator drops the whole chain when the store
/// disagrees.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FolderChain(Vec<FolderEntry>);

impl FolderChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: FolderEntry) {
        self.0.push(entry);
    }

    pub fn pop(&mut self) -> Option<FolderEntry> {
        self.0.pop()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn entries(&self) -> &[FolderEntry] {
        &self.0
    }

    pub fn leaf(&self) -> Option<&FolderEntry> {
        self.0.last()
    }

    /// Second-to-last entry. `None` for chains of depth 0 or 1, whose leaf
    /// hangs directly off the root.
    pub fn leaf_parent(&self) -> Option<&FolderEntry> {
        self.0.len().checked_sub(2).map(|i| &self.0[i])
    }

    pub fn current_folder_id(&self) -> &str {
        self.leaf().map_or(ROOT_FOLDER_ID, |e| e.id.as_str())
    }

    pub fn breadcrumb(&self) -> Breadcrumb {
        let mut segments = Vec::with_capacity(self.0.len() + 1);
        segments.push(ROOT_LABEL.to_string());
        segments.extend(self.0.iter().map(|e| e.name.clone()));
        Breadcrumb { segments }
    }
}

impl From<Vec<FolderEntry>> for FolderChain {
    fn from(entries: Vec<FolderEntry>) -> Self {
        Self(entries)
    }
}

/// How many URLs one sample draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct SampleSize(u8);

impl SampleSize {
    pub fn new(n: u8) -> Result<Self, NavError> {
        if (MIN_SAMPLE_SIZE..=MAX_SAMPLE_SIZE).contains(&n) {
            Ok(Self(n))
        } else {
            Err(NavError::InvalidSampleSize(i64::from(n)))
        }
    }

    /// Parse user input such as `"12"`. Out-of-range and non-numeric input
    /// are both rejected.
    pub fn parse(raw: &str) -> Result<Self, NavError> {
        let raw = raw.trim();
        let n: i64 = raw
            .parse()
            .map_err(|_| NavError::NotASampleSize(raw.to_string()))?;
        u8::try_from(n)
            .map_err(|_| NavError::InvalidSampleSize(n))
            .and_then(Self::new)
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn as_usize(self) -> usize {
        usize::from(self.0)
    }
}

impl Default for SampleSize {
    fn default() -> Self {
        Self(MIN_SAMPLE_SIZE)
    }
}

impl TryFrom<u8> for SampleSize {
    type Error = NavError;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        Self::new(n)
    }
}

impl From<SampleSize> for u8 {
    fn from(size: SampleSize) -> Self {
        size.0
    }
}

impl fmt::Display for SampleSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Record kept by the state channel across UI sessions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "NavStateRecord")]
pub struct NavState {
    pub folder_chain: FolderChain,
    pub sample_size: SampleSize,
}

/// On-disk shape. Older records call the size `index`; `sampleSize` wins
/// when both are present.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NavStateRecord {
    #[serde(default)]
    folder_chain: FolderChain,

    #[serde(default)]
    sample_size: Option<SampleSize>,

    #[serde(default)]
    index: Option<SampleSize>,
}

impl From<NavStateRecord> for NavState {
    fn from(record: NavStateRecord) -> Self {
        Self {
            folder_chain: record.folder_chain,
            sample_size: record.sample_size.or(record.index).unwrap_or_default(),
        }
    }
}

/// One child of a folder as reported by the bookmark store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookmarkChild {
    pub id: String,
    pub title: String,
    pub url: Option<String>,
}

impl BookmarkChild {
    pub fn folder(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            url: None,
        }
    }

    pub fn link(id: impl Into<String>, title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            url: Some(url.into()),
        }
    }

    pub fn is_folder(&self) -> bool {
        self.url.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeInfo {
    pub id: String,
    pub parent_id: Option<String>,
}

/// Change notifications fired by a bookmark store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoreEvent {
    Created {
        id: String,
        parent_id: String,
    },
    Removed {
        id: String,
        parent_id: String,
    },
    Changed {
        id: String,
    },
    Moved {
        id: String,
        old_parent_id: String,
        parent_id: String,
    },
    ImportEnded,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FolderOption {
    pub id: String,
    pub title: String,
}

/// Children of the current folder split into sub-folders and URLs,
/// each in store order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderListing {
    pub folders: Vec<FolderOption>,
    pub urls: Vec<String>,
}

impl FolderListing {
    pub fn partition(children: Vec<BookmarkChild>) -> Self {
        let mut listing = Self::default();
        for child in children {
            match child.url {
                Some(url) => listing.urls.push(url),
                None => listing.folders.push(FolderOption {
                    id: child.id,
                    title: child.title,
                }),
            }
        }
        listing
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breadcrumb {
    segments: Vec<String>,
}

impl Breadcrumb {
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Markup form: every segment escaped, joined with an arrow entity,
    /// last segment in `<strong>`.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        let last = self.segments.len().saturating_sub(1);
        for (i, seg) in self.segments.iter().enumerate() {
            if i == last {
                out.push_str("<strong>");
                out.push_str(&escape_html(seg));
                out.push_str("</strong>");
            } else {
                out.push_str(&escape_html(seg));
                out.push_str(" &rarr; ");
            }
        }
        out
    }

    /// Terminal form. Control characters are stripped from names so a folder
    /// title cannot smuggle escape sequences; `emphasize` bolds the last segment.
    pub fn to_terminal(&self, emphasize: bool) -> String {
        let mut parts: Vec<String> = self
            .segments
            .iter()
            .map(|s| s.chars().filter(|c| !c.is_control()).collect())
            .collect();
        if emphasize {
            if let Some(last) = parts.last_mut() {
                *last = format!("\x1b[1m{last}\x1b[0m");
            }
        }
        parts.join(" → ")
    }
}

impl fmt::Display for Breadcrumb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join(" → "))
    }
}

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

//! In-memory bookmark store built from a bookmarks file.
//!
//! Nodes live in an arena; a synthetic root with id `"0"` holds the file's
//! root containers (`bookmark_bar`, `other`, `synced`) in key order. Every
//! mutation fires a [`StoreEvent`] to all subscribers.

use crate::domain::error::StoreError;
use crate::domain::model::{BookmarkChild, NodeInfo, StoreEvent, ROOT_FOLDER_ID, ROOT_LABEL};
use crate::domain::traits::BookmarkStore;
use crate::infrastructure::serde_json_adapter::{BookmarkNodeDto, BookmarksFileDto};
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Handle(usize);

const ROOT: Handle = Handle(0);

#[derive(Debug, Clone)]
struct TreeNode {
    id: String,
    title: String,
    url: Option<String>,
    parent: Option<Handle>,
    children: Vec<Handle>,
    deleted: bool,
}

#[derive(Debug)]
pub struct BookmarkTree {
    nodes: Vec<TreeNode>,
    index: HashMap<String, Handle>,
    next_id: u64,
    subscribers: Vec<mpsc::UnboundedSender<StoreEvent>>,
}

impl BookmarkTree {
    pub fn from_dto(dto: &BookmarksFileDto) -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            index: HashMap::new(),
            next_id: 1,
            subscribers: Vec::new(),
        };
        tree.load(dto);
        tree
    }

    /// Receive every change notification from now on.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<StoreEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    /// Number of live folders and URLs, the synthetic root excluded.
    pub fn counts(&self) -> (usize, usize) {
        self.nodes
            .iter()
            .skip(1)
            .filter(|n| !n.deleted)
            .fold((0, 0), |(folders, urls), n| match n.url {
                Some(_) => (folders, urls + 1),
                None => (folders + 1, urls),
            })
    }

    /// Add a folder (`url == None`) or URL at the end of `parent_id`.
    pub fn create(
        &mut self,
        parent_id: &str,
        title: &str,
        url: Option<&str>,
    ) -> Result<String, StoreError> {
        let parent = self.folder(parent_id)?;
        let id = self.fresh_id();
        let handle = self.alloc(id.clone(), title.to_string(), url.map(str::to_string), parent);
        self.nodes[parent.0].children.push(handle);

        self.notify(StoreEvent::Created {
            id: id.clone(),
            parent_id: parent_id.to_string(),
        });
        Ok(id)
    }

    /// Remove a node and its whole subtree.
    pub fn remove(&mut self, id: &str) -> Result<(), StoreError> {
        let handle = self.live(id)?;
        let parent = self.nodes[handle.0]
            .parent
            .ok_or_else(|| StoreError::Protected(id.to_string()))?;

        self.nodes[parent.0].children.retain(|&h| h != handle);

        let mut stack = vec![handle];
        while let Some(h) = stack.pop() {
            let node = &mut self.nodes[h.0];
            node.deleted = true;
            self.index.remove(&node.id);
            stack.extend(node.children.iter().copied());
        }

        let parent_id = self.nodes[parent.0].id.clone();
        self.notify(StoreEvent::Removed {
            id: id.to_string(),
            parent_id,
        });
        Ok(())
    }

    /// Update a node's title and, for URL nodes, its URL.
    pub fn change(&mut self, id: &str, title: Option<&str>, url: Option<&str>) -> Result<(), StoreError> {
        let handle = self.live(id)?;
        if handle == ROOT {
            return Err(StoreError::Protected(id.to_string()));
        }

        let node = &mut self.nodes[handle.0];
        if url.is_some() && node.url.is_none() {
            return Err(StoreError::NotAUrl(id.to_string()));
        }
        if let Some(title) = title {
            node.title = title.to_string();
        }
        if let Some(url) = url {
            node.url = Some(url.to_string());
        }

        self.notify(StoreEvent::Changed { id: id.to_string() });
        Ok(())
    }

    /// Move a node under `parent_id` at `index` (end when `None` or past the end).
    pub fn move_node(
        &mut self,
        id: &str,
        parent_id: &str,
        index: Option<usize>,
    ) -> Result<(), StoreError> {
        let handle = self.live(id)?;
        let old_parent = self.nodes[handle.0]
            .parent
            .ok_or_else(|| StoreError::Protected(id.to_string()))?;
        let target = self.folder(parent_id)?;

        // Refuse to move a folder into itself or below itself.
        let mut cursor = Some(target);
        while let Some(h) = cursor {
            if h == handle {
                return Err(StoreError::InvalidMove {
                    id: id.to_string(),
                    target: parent_id.to_string(),
                });
            }
            cursor = self.nodes[h.0].parent;
        }

        self.nodes[old_parent.0].children.retain(|&h| h != handle);
        let siblings = &mut self.nodes[target.0].children;
        let at = index.unwrap_or(siblings.len()).min(siblings.len());
        siblings.insert(at, handle);
        self.nodes[handle.0].parent = Some(target);

        let old_parent_id = self.nodes[old_parent.0].id.clone();
        self.notify(StoreEvent::Moved {
            id: id.to_string(),
            old_parent_id,
            parent_id: parent_id.to_string(),
        });
        Ok(())
    }

    /// Replace the whole tree, e.g. after the file changed on disk.
    pub fn import(&mut self, dto: &BookmarksFileDto) {
        self.load(dto);
        self.notify(StoreEvent::ImportEnded);
    }

    fn load(&mut self, dto: &BookmarksFileDto) {
        self.nodes.clear();
        self.index.clear();
        self.next_id = 1;

        let root = self.alloc(ROOT_FOLDER_ID.to_string(), ROOT_LABEL.to_string(), None, ROOT);
        self.nodes[root.0].parent = None;

        // Stable iteration over roots (BTreeMap). Root containers are always
        // folders, whatever their `type` says.
        let mut stack: Vec<(Handle, String, &BookmarkNodeDto)> = Vec::new();
        for (root_key, container) in dto.roots.iter() {
            let title = container.name.clone().unwrap_or_else(|| root_key.clone());
            let id = self.claim_id(container.id.as_deref(), root_key);
            let h = self.alloc(id, title, None, ROOT);
            self.nodes[ROOT.0].children.push(h);
            stack.push((h, root_key.clone(), container));
        }

        // Iterative expansion (no recursion); children keep file order.
        while let Some((parent, parent_path, dto_node)) = stack.pop() {
            for (i, child) in dto_node.children.iter().enumerate() {
                let path = format!("{parent_path}/{i}");
                let url = if child.is_url() {
                    child.url.clone()
                } else if child.is_folder() {
                    None
                } else {
                    debug!(node_type = %child.node_type, %path, "skipping unsupported bookmark node");
                    continue;
                };

                let id = self.claim_id(child.id.as_deref(), &path);
                let title = child.name.clone().unwrap_or_default();
                let is_folder = url.is_none();
                let h = self.alloc(id, title, url, parent);
                self.nodes[parent.0].children.push(h);

                if is_folder {
                    stack.push((h, path, child));
                }
            }
        }
    }

    fn alloc(&mut self, id: String, title: String, url: Option<String>, parent: Handle) -> Handle {
        let handle = Handle(self.nodes.len());
        if let Ok(n) = id.parse::<u64>() {
            self.next_id = self.next_id.max(n.saturating_add(1));
        }
        self.index.insert(id.clone(), handle);
        self.nodes.push(TreeNode {
            id,
            title,
            url,
            parent: Some(parent),
            children: Vec::new(),
            deleted: false,
        });
        handle
    }

    /// The file's id when usable, otherwise the node's path. Paths are unique
    /// by construction but a file id could collide with one; then fall back
    /// to a fresh numeric id.
    fn claim_id(&mut self, wanted: Option<&str>, path: &str) -> String {
        match wanted {
            Some(id) if !id.is_empty() && !self.index.contains_key(id) => id.to_string(),
            _ if !self.index.contains_key(path) => path.to_string(),
            _ => self.fresh_id(),
        }
    }

    fn fresh_id(&mut self) -> String {
        loop {
            let id = self.next_id.to_string();
            // Past u64::MAX, start over from 1 and skip taken ids.
            self.next_id = self.next_id.checked_add(1).unwrap_or(1);
            if !self.index.contains_key(&id) {
                return id;
            }
        }
    }

    fn live(&self, id: &str) -> Result<Handle, StoreError> {
        self.index
            .get(id)
            .copied()
            .filter(|h| !self.nodes[h.0].deleted)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn folder(&self, id: &str) -> Result<Handle, StoreError> {
        let handle = self.live(id)?;
        if self.nodes[handle.0].url.is_some() {
            return Err(StoreError::NotAFolder(id.to_string()));
        }
        Ok(handle)
    }

    fn notify(&mut self, event: StoreEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

impl BookmarkStore for BookmarkTree {
    fn get_children(&self, folder_id: &str) -> Result<Vec<BookmarkChild>, StoreError> {
        let handle = self.folder(folder_id)?;
        Ok(self.nodes[handle.0]
            .children
            .iter()
            .map(|h| {
                let node = &self.nodes[h.0];
                BookmarkChild {
                    id: node.id.clone(),
                    title: node.title.clone(),
                    url: node.url.clone(),
                }
            })
            .collect())
    }

    fn get_node(&self, id: &str) -> Result<NodeInfo, StoreError> {
        let handle = self.live(id)?;
        let node = &self.nodes[handle.0];
        Ok(NodeInfo {
            id: node.id.clone(),
            parent_id: node.parent.map(|p| self.nodes[p.0].id.clone()),
        })
    }
}

//! Route tree traversal.
//!
//! # Responsibilities
//! - Walk the scan root depth-first into an immutable `TreeNode` tree
//! - Keep only files with a recognized extension; keep every directory
//!
//! # Design Decisions
//! - Children are sorted by name so discovery order is stable across platforms
//! - Hidden entries (leading `.`) are never routes
//! - A missing root is not an error here; it simply yields no tree

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures_util::future::{BoxFuture, FutureExt};
use serde::Serialize;

/// Kind of a discovered node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    File,
    Directory,
}

/// One file or directory found under the scan root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
    pub absolute_path: PathBuf,
    pub name: String,
    pub kind: NodeKind,
    /// Always `None` for files.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<TreeNode>>,
}

impl TreeNode {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        let absolute_path = path.into();
        Self {
            name: base_name(&absolute_path),
            absolute_path,
            kind: NodeKind::File,
            children: None,
        }
    }

    pub fn directory(path: impl Into<PathBuf>, children: Vec<TreeNode>) -> Self {
        let absolute_path = path.into();
        Self {
            name: base_name(&absolute_path),
            absolute_path,
            kind: NodeKind::Directory,
            children: Some(children),
        }
    }

    pub fn is_file(&self) -> bool {
        self.kind == NodeKind::File
    }

    pub fn children(&self) -> &[TreeNode] {
        self.children.as_deref().unwrap_or_default()
    }

    /// All file nodes, depth-first, children in stored order.
    pub fn files(&self) -> Vec<&TreeNode> {
        let mut out = Vec::new();
        self.collect_files(&mut out);
        out
    }

    fn collect_files<'a>(&'a self, out: &mut Vec<&'a TreeNode>) {
        if self.is_file() {
            out.push(self);
            return;
        }
        for child in self.children() {
            child.collect_files(out);
        }
    }
}

fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Produces the tree of candidate route files under a root.
#[async_trait]
pub trait TreeScanner: Send + Sync {
    /// Scan `root`, keeping files whose extension is in `extensions`.
    ///
    /// Returns `Ok(None)` when the root does not exist or is not a directory.
    async fn scan(&self, root: &Path, extensions: &[String]) -> io::Result<Option<TreeNode>>;
}

/// Filesystem scanner backed by `tokio::fs`.
#[derive(Debug, Clone, Default)]
pub struct FsScanner;

#[async_trait]
impl TreeScanner for FsScanner {
    async fn scan(&self, root: &Path, extensions: &[String]) -> io::Result<Option<TreeNode>> {
        match tokio::fs::metadata(root).await {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => return Ok(None),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        }

        let tree = scan_dir(root.to_path_buf(), extensions.to_vec()).await?;
        tracing::debug!(
            root = %root.display(),
            files = tree.files().len(),
            "Route tree scanned"
        );
        Ok(Some(tree))
    }
}

fn scan_dir(dir: PathBuf, extensions: Vec<String>) -> BoxFuture<'static, io::Result<TreeNode>> {
    async move {
        let mut entries = Vec::new();
        let mut reader = tokio::fs::read_dir(&dir).await?;
        while let Some(entry) = reader.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }
            entries.push((name, entry.path()));
        }
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        let mut children = Vec::with_capacity(entries.len());
        for (_, path) in entries {
            // Follows symlinks.
            let meta = tokio::fs::metadata(&path).await?;
            if meta.is_dir() {
                children.push(scan_dir(path, extensions.clone()).await?);
            } else if meta.is_file() && has_extension(&path, &extensions) {
                children.push(TreeNode::file(path));
            }
        }

        Ok(TreeNode::directory(dir, children))
    }
    .boxed()
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| extensions.iter().any(|want| want.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn exts(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_scan_filters_and_orders() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("users/[id]")).unwrap();
        fs::create_dir_all(root.join("empty")).unwrap();
        fs::write(root.join("index.toml"), "").unwrap();
        fs::write(root.join("README.md"), "").unwrap();
        fs::write(root.join(".hidden.toml"), "").unwrap();
        fs::write(root.join("users/list.toml"), "").unwrap();
        fs::write(root.join("users/[id]/index.toml"), "").unwrap();

        let tree = FsScanner.scan(root, &exts(&["toml"])).await.unwrap().unwrap();
        assert_eq!(tree.kind, NodeKind::Directory);

        let names: Vec<&str> = tree.children().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["empty", "index.toml", "users"]);
        assert!(tree.children()[0].children().is_empty());

        let files: Vec<PathBuf> = tree
            .files()
            .iter()
            .map(|f| f.absolute_path.strip_prefix(root).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            files,
            vec![
                PathBuf::from("index.toml"),
                PathBuf::from("users/[id]/index.toml"),
                PathBuf::from("users/list.toml"),
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_root_yields_none() {
        let tree = FsScanner
            .scan(Path::new("/definitely/not/here"), &exts(&["rs"]))
            .await
            .unwrap();
        assert!(tree.is_none());
    }

    #[test]
    fn test_file_nodes_have_no_children() {
        let node = TreeNode::file("/srv/routes/a.rs");
        assert_eq!(node.name, "a.rs");
        assert!(node.children.is_none());
        let value = serde_json::to_value(&node).unwrap();
        assert!(value.get("children").is_none());
        assert_eq!(value["absolutePath"], "/srv/routes/a.rs");
        assert_eq!(value["kind"], "file");
    }
}

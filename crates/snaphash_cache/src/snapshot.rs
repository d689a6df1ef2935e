//! Immutable snapshots of file-system locations.
//!
//! A snapshot captures what a location looked like at one point in time:
//! a regular file with its content hash, a directory with its children, or
//! a location that did not exist. Every snapshot carries an identity: a
//! structural digest of its kind, name and content. Equal identities mean
//! content-equal snapshots as far as caching is concerned.

use std::path::{Path, PathBuf};

use snaphash_common::{Fingerprint, Hasher};
use tracing::trace;

use crate::error::CacheError;

/// The kind of location a snapshot describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotKind {
    /// A regular file.
    RegularFile,
    /// A directory.
    Directory,
    /// Nothing existed at the location.
    Missing,
}

/// A captured, immutable view of a file-system location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileSystemLocationSnapshot {
    /// A regular file.
    RegularFile(RegularFileSnapshot),
    /// A directory and its captured children.
    Directory(DirectorySnapshot),
    /// A location with nothing in it.
    Missing(MissingFileSnapshot),
}

/// Snapshot of a regular file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegularFileSnapshot {
    path: PathBuf,
    name: String,
    content_hash: Fingerprint,
    identity: Fingerprint,
}

/// Snapshot of a directory. Children are kept sorted by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectorySnapshot {
    path: PathBuf,
    name: String,
    children: Vec<FileSystemLocationSnapshot>,
    identity: Fingerprint,
}

/// Snapshot of a location that did not exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingFileSnapshot {
    path: PathBuf,
    name: String,
    identity: Fingerprint,
}

fn name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

impl FileSystemLocationSnapshot {
    /// Builds a regular-file snapshot from the hash of its raw bytes.
    pub fn regular_file(path: impl Into<PathBuf>, content_hash: Fingerprint) -> Self {
        let path = path.into();
        let name = name_of(&path);
        let mut hasher = Hasher::new();
        hasher.put_str("file");
        hasher.put_str(&name);
        hasher.put_fingerprint(&content_hash);
        Self::RegularFile(RegularFileSnapshot {
            path,
            name,
            content_hash,
            identity: hasher.finish(),
        })
    }

    /// Builds a directory snapshot. Children are sorted by name.
    pub fn directory(
        path: impl Into<PathBuf>,
        mut children: Vec<FileSystemLocationSnapshot>,
    ) -> Self {
        let path = path.into();
        let name = name_of(&path);
        children.sort_by(|a, b| a.name().cmp(b.name()));
        let mut hasher = Hasher::new();
        hasher.put_str("directory");
        hasher.put_str(&name);
        hasher.put_len(children.len());
        for child in &children {
            hasher.put_fingerprint(&child.identity());
        }
        Self::Directory(DirectorySnapshot {
            path,
            name,
            children,
            identity: hasher.finish(),
        })
    }

    /// Builds a snapshot for a location that does not exist.
    pub fn missing(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = name_of(&path);
        let mut hasher = Hasher::new();
        hasher.put_str("missing");
        hasher.put_str(&name);
        Self::Missing(MissingFileSnapshot {
            path,
            name,
            identity: hasher.finish(),
        })
    }

    /// The stable identity used as the snapshot half of a cache key.
    pub fn identity(&self) -> Fingerprint {
        match self {
            Self::RegularFile(f) => f.identity,
            Self::Directory(d) => d.identity,
            Self::Missing(m) => m.identity,
        }
    }

    /// Absolute or caller-relative path the snapshot was taken at.
    pub fn path(&self) -> &Path {
        match self {
            Self::RegularFile(f) => &f.path,
            Self::Directory(d) => &d.path,
            Self::Missing(m) => &m.path,
        }
    }

    /// Final path component, or an empty string for roots.
    pub fn name(&self) -> &str {
        match self {
            Self::RegularFile(f) => &f.name,
            Self::Directory(d) => &d.name,
            Self::Missing(m) => &m.name,
        }
    }

    /// The kind of location.
    pub fn kind(&self) -> SnapshotKind {
        match self {
            Self::RegularFile(_) => SnapshotKind::RegularFile,
            Self::Directory(_) => SnapshotKind::Directory,
            Self::Missing(_) => SnapshotKind::Missing,
        }
    }

    /// Hash of the raw bytes for regular files.
    pub fn content_hash(&self) -> Option<Fingerprint> {
        match self {
            Self::RegularFile(f) => Some(f.content_hash),
            _ => None,
        }
    }

    /// Captured children for directories; empty otherwise.
    pub fn children(&self) -> &[FileSystemLocationSnapshot] {
        match self {
            Self::Directory(d) => &d.children,
            _ => &[],
        }
    }

    /// Returns this snapshot and all descendants in pre-order.
    pub fn descendants(&self) -> Vec<&FileSystemLocationSnapshot> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(node.children().iter().rev());
        }
        out
    }
}

/// Captures snapshots from the local file system.
pub struct Snapshotter;

impl Snapshotter {
    /// Snapshots the tree rooted at `path`.
    ///
    /// Regular files are read once to compute their content hash. A path
    /// that does not exist yields a [`FileSystemLocationSnapshot::Missing`]
    /// rather than an error.
    pub fn snapshot(path: &Path) -> Result<FileSystemLocationSnapshot, CacheError> {
        Self::capture(path, &[])
    }

    /// Like [`snapshot`](Self::snapshot), but leaves out any descendant whose
    /// canonical path is in `excluded`. The root itself is always captured.
    pub fn snapshot_excluding(
        path: &Path,
        excluded: &[PathBuf],
    ) -> Result<FileSystemLocationSnapshot, CacheError> {
        let excluded: Vec<PathBuf> = excluded
            .iter()
            .filter_map(|p| std::fs::canonicalize(p).ok())
            .collect();
        Self::capture(path, &excluded)
    }

    fn capture(
        path: &Path,
        excluded: &[PathBuf],
    ) -> Result<FileSystemLocationSnapshot, CacheError> {
        let read_error = |source| CacheError::ContentRead {
            path: path.to_path_buf(),
            source,
        };
        let metadata = match std::fs::metadata(path) {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(FileSystemLocationSnapshot::missing(path));
            }
            Err(e) => return Err(read_error(e)),
        };

        if metadata.is_dir() {
            let mut children = Vec::new();
            for entry in std::fs::read_dir(path).map_err(read_error)? {
                let child = entry.map_err(read_error)?.path();
                if !excluded.is_empty()
                    && std::fs::canonicalize(&child).is_ok_and(|c| excluded.contains(&c))
                {
                    trace!(path = %child.display(), "excluded from snapshot");
                    continue;
                }
                children.push(Self::capture(&child, excluded)?);
            }
            Ok(FileSystemLocationSnapshot::directory(path, children))
        } else {
            let content = std::fs::read(path).map_err(read_error)?;
            Ok(FileSystemLocationSnapshot::regular_file(
                path,
                Fingerprint::from_bytes(&content),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(path: &str, content: &[u8]) -> FileSystemLocationSnapshot {
        FileSystemLocationSnapshot::regular_file(path, Fingerprint::from_bytes(content))
    }

    #[test]
    fn identity_depends_on_content() {
        assert_eq!(file("a.txt", b"x").identity(), file("a.txt", b"x").identity());
        assert_ne!(file("a.txt", b"x").identity(), file("a.txt", b"y").identity());
    }

    #[test]
    fn identity_depends_on_name_not_parent() {
        assert_ne!(file("a.txt", b"x").identity(), file("b.txt", b"x").identity());
        assert_eq!(
            file("one/a.txt", b"x").identity(),
            file("two/a.txt", b"x").identity()
        );
    }

    #[test]
    fn kinds_never_collide() {
        let f = file("a", b"");
        let d = FileSystemLocationSnapshot::directory("a", vec![]);
        let m = FileSystemLocationSnapshot::missing("a");
        assert_ne!(f.identity(), d.identity());
        assert_ne!(d.identity(), m.identity());
        assert_ne!(f.identity(), m.identity());
        assert_eq!(m.kind(), SnapshotKind::Missing);
    }

    #[test]
    fn directory_children_sorted() {
        let d = FileSystemLocationSnapshot::directory(
            "root",
            vec![file("root/b", b"b"), file("root/a", b"a")],
        );
        let names: Vec<&str> = d.children().iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn directory_identity_ignores_child_order() {
        let d1 = FileSystemLocationSnapshot::directory(
            "root",
            vec![file("root/a", b"a"), file("root/b", b"b")],
        );
        let d2 = FileSystemLocationSnapshot::directory(
            "root",
            vec![file("root/b", b"b"), file("root/a", b"a")],
        );
        assert_eq!(d1.identity(), d2.identity());
    }

    #[test]
    fn directory_identity_tracks_children() {
        let d1 = FileSystemLocationSnapshot::directory("root", vec![file("root/a", b"a")]);
        let d2 = FileSystemLocationSnapshot::directory("root", vec![file("root/a", b"A")]);
        assert_ne!(d1.identity(), d2.identity());
    }

    #[test]
    fn descendants_preorder() {
        let tree = FileSystemLocationSnapshot::directory(
            "root",
            vec![
                FileSystemLocationSnapshot::directory("root/sub", vec![file("root/sub/c", b"c")]),
                file("root/a", b"a"),
            ],
        );
        let names: Vec<&str> = tree.descendants().iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["root", "a", "sub", "c"]);
    }

    #[test]
    fn snapshot_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "alpha").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested").join("b.txt"), "beta").unwrap();

        let snap = Snapshotter::snapshot(dir.path()).unwrap();
        assert_eq!(snap.kind(), SnapshotKind::Directory);
        assert_eq!(snap.descendants().len(), 4);

        let a = &snap.children()[0];
        assert_eq!(a.name(), "a.txt");
        assert_eq!(a.content_hash(), Some(Fingerprint::from_bytes(b"alpha")));
    }

    #[test]
    fn snapshot_is_stable_across_captures() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "alpha").unwrap();
        let s1 = Snapshotter::snapshot(dir.path()).unwrap();
        let s2 = Snapshotter::snapshot(dir.path()).unwrap();
        assert_eq!(s1.identity(), s2.identity());

        std::fs::write(dir.path().join("a.txt"), "changed").unwrap();
        let s3 = Snapshotter::snapshot(dir.path()).unwrap();
        assert_ne!(s1.identity(), s3.identity());
    }

    #[test]
    fn snapshot_excluding_skips_listed_descendants() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "alpha").unwrap();
        let before = Snapshotter::snapshot(dir.path()).unwrap();

        let cache = dir.path().join(".cache");
        std::fs::create_dir(&cache).unwrap();
        std::fs::write(cache.join("entry"), "noise").unwrap();

        let excluded = [dir.path().join("./.cache")];
        let snap = Snapshotter::snapshot_excluding(dir.path(), &excluded).unwrap();
        assert_eq!(snap.children().len(), 1);
        assert_eq!(snap.identity(), before.identity());
        assert_ne!(Snapshotter::snapshot(dir.path()).unwrap().identity(), before.identity());
    }

    #[test]
    fn snapshot_excluding_ignores_nonexistent_exclusions() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "alpha").unwrap();
        let excluded = [dir.path().join("not-there")];
        assert_eq!(
            Snapshotter::snapshot_excluding(dir.path(), &excluded)
                .unwrap()
                .identity(),
            Snapshotter::snapshot(dir.path()).unwrap().identity()
        );
    }

    #[test]
    fn snapshot_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let snap = Snapshotter::snapshot(&dir.path().join("nope")).unwrap();
        assert_eq!(snap.kind(), SnapshotKind::Missing);
        assert_eq!(snap.name(), "nope");
        assert!(snap.content_hash().is_none());
    }
}

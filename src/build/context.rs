//! Build context packaging.
//!
//! A context directory is serialized into a gzip-compressed tar archive in
//! memory. Entries are walked in file-name order so the same tree always
//! produces the same entry sequence.

use std::fs::Metadata;
use std::path::{Component, Path, PathBuf};

use bytes::Bytes;
use flate2::Compression;
use flate2::write::GzEncoder;
use walkdir::WalkDir;

use crate::build::error::{BuildError, Result};

/// What an archive entry is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    /// Stored as a link, never followed.
    Symlink,
}

/// One entry of a [`BuildContextArchive`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Path relative to the context root.
    pub path: PathBuf,
    pub kind: EntryKind,
    /// Permission bits.
    pub mode: u32,
    /// Content length; zero for directories and links.
    pub size: u64,
}

/// A directory tree packaged for submission to the engine.
#[derive(Debug, Clone)]
pub struct BuildContextArchive {
    entries: Vec<ArchiveEntry>,
    bytes: Bytes,
}

impl BuildContextArchive {
    /// Archive everything under `root`. The root itself is not an entry.
    pub fn from_dir(root: &Path) -> Result<Self> {
        let encoder = GzEncoder::new(Vec::new(), Compression::default());
        let mut builder = tar::Builder::new(encoder);
        builder.follow_symlinks(false);

        let mut entries = Vec::new();
        let walker = WalkDir::new(root)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name();

        for entry in walker {
            let entry = entry.map_err(|e| BuildError::Archive {
                path: e.path().unwrap_or(root).to_path_buf(),
                reason: e.to_string(),
            })?;
            let path = entry.path();
            let relative = relative_path(root, path)?;
            let metadata = entry.metadata().map_err(|e| archive_error(path, e))?;

            builder
                .append_path_with_name(path, relative)
                .map_err(|e| archive_error(path, e))?;

            entries.push(describe(relative, &metadata));
        }

        let encoder = builder.into_inner().map_err(|e| archive_error(root, e))?;
        let bytes = encoder.finish().map_err(|e| archive_error(root, e))?;

        tracing::debug!(
            "Archived {} entries from {} ({} bytes compressed)",
            entries.len(),
            root.display(),
            bytes.len()
        );

        Ok(Self {
            entries,
            bytes: Bytes::from(bytes),
        })
    }

    /// Entries in archive order.
    pub fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    /// Compressed size in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }
}

fn archive_error(path: &Path, e: impl std::fmt::Display) -> BuildError {
    BuildError::Archive {
        path: path.to_path_buf(),
        reason: e.to_string(),
    }
}

/// `path` relative to `root`, rejecting anything that would land outside it.
fn relative_path<'a>(root: &Path, path: &'a Path) -> Result<&'a Path> {
    let relative = path
        .strip_prefix(root)
        .map_err(|e| archive_error(path, e))?;
    if relative
        .components()
        .all(|c| matches!(c, Component::Normal(_)))
    {
        Ok(relative)
    } else {
        Err(archive_error(path, "path escapes the context root"))
    }
}

fn describe(relative: &Path, metadata: &Metadata) -> ArchiveEntry {
    let file_type = metadata.file_type();
    let kind = if file_type.is_symlink() {
        EntryKind::Symlink
    } else if file_type.is_dir() {
        EntryKind::Directory
    } else {
        EntryKind::File
    };

    ArchiveEntry {
        path: relative.to_path_buf(),
        kind,
        mode: file_mode(metadata),
        size: if kind == EntryKind::File {
            metadata.len()
        } else {
            0
        },
    }
}

#[cfg(unix)]
fn file_mode(metadata: &Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
fn file_mode(metadata: &Metadata) -> u32 {
    if metadata.is_dir() {
        0o755
    } else if metadata.permissions().readonly() {
        0o444
    } else {
        0o644
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::io::Read;

    use flate2::read::GzDecoder;
    use pretty_assertions::assert_eq;

    use super::*;

    fn unpack(archive: BuildContextArchive) -> Vec<(PathBuf, tar::EntryType, Vec<u8>)> {
        let bytes = archive.into_bytes();
        let mut tar = tar::Archive::new(GzDecoder::new(&bytes[..]));
        tar.entries()
            .unwrap()
            .map(|entry| {
                let mut entry = entry.unwrap();
                let path = entry.path().unwrap().into_owned();
                let kind = entry.header().entry_type();
                let mut content = Vec::new();
                entry.read_to_end(&mut content).unwrap();
                (path, kind, content)
            })
            .collect()
    }

    #[test]
    fn test_archive_is_relative_and_sorted() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Dockerfile"), "FROM alpine\n").unwrap();
        fs::create_dir(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/main.sh"), "echo hi\n").unwrap();
        fs::write(dir.path().join("README"), "docs").unwrap();

        let archive = BuildContextArchive::from_dir(dir.path()).unwrap();

        let paths: Vec<_> = archive.entries().iter().map(|e| e.path.clone()).collect();
        assert_eq!(
            paths,
            vec![
                PathBuf::from("Dockerfile"),
                PathBuf::from("README"),
                PathBuf::from("src"),
                PathBuf::from("src/main.sh"),
            ]
        );
        assert_eq!(archive.entries()[0].size, 12);
        assert_eq!(archive.entries()[2].kind, EntryKind::Directory);

        let unpacked = unpack(archive);
        assert_eq!(unpacked.len(), 4);
        assert_eq!(unpacked[0].0, PathBuf::from("Dockerfile"));
        assert_eq!(unpacked[0].2, b"FROM alpine\n");
        assert_eq!(unpacked[3].0, PathBuf::from("src/main.sh"));
        assert_eq!(unpacked[3].2, b"echo hi\n");
    }

    #[test]
    fn test_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let archive = BuildContextArchive::from_dir(dir.path()).unwrap();

        assert!(archive.is_empty());
        assert!(!archive.into_bytes().is_empty());
    }

    #[test]
    fn test_missing_directory_is_archive_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");

        let err = BuildContextArchive::from_dir(&missing).unwrap_err();
        assert!(matches!(err, BuildError::Archive { ref path, .. } if path == &missing));
    }

    #[cfg(unix)]
    #[test]
    fn test_permissions_preserved() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("entrypoint.sh");
        fs::write(&script, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        let archive = BuildContextArchive::from_dir(dir.path()).unwrap();
        assert_eq!(archive.entries()[0].mode, 0o755);

        let bytes = archive.into_bytes();
        let mut tar = tar::Archive::new(GzDecoder::new(&bytes[..]));
        let entry = tar.entries().unwrap().next().unwrap().unwrap();
        assert_eq!(entry.header().mode().unwrap() & 0o777, 0o755);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_are_not_followed() {
        let outside = tempfile::tempdir().unwrap();
        fs::write(outside.path().join("secret"), "do not ship").unwrap();

        let dir = tempfile::tempdir().unwrap();
        std::os::unix::fs::symlink(outside.path().join("secret"), dir.path().join("link"))
            .unwrap();

        let archive = BuildContextArchive::from_dir(dir.path()).unwrap();
        assert_eq!(archive.entries()[0].kind, EntryKind::Symlink);
        assert_eq!(archive.entries()[0].size, 0);

        let unpacked = unpack(archive);
        assert_eq!(unpacked.len(), 1);
        assert_eq!(unpacked[0].1, tar::EntryType::Symlink);
        assert!(unpacked[0].2.is_empty());
    }
}

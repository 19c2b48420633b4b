//! File and directory handles inside a library.

use std::fmt;
use std::path::{Path, PathBuf};

use futures::StreamExt;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::client::SeafileClient;
use crate::endpoint::ApiUrl;
use crate::error::{Result, SeafileError};
use crate::models::{format_size, EntryKind, RawDirEntry};

pub(crate) const FILE_NOT_FOUND: &str = "The requested file does not exist";
pub(crate) const DIR_NOT_FOUND: &str = "The requested dir does not exist";

/// Join a library path and an entry name the way POSIX paths join.
pub(crate) fn join_path(dir: &str, name: &str) -> String {
    if name.starts_with('/') {
        name.to_string()
    } else if dir.is_empty() || dir.ends_with('/') {
        format!("{}{}", dir, name)
    } else {
        format!("{}/{}", dir, name)
    }
}

fn base_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// A file in a library.
#[derive(Clone)]
pub struct SeafFile {
    client: SeafileClient,
    repo_id: String,
    path: String,
    id: String,
    size: u64,
}

impl SeafFile {
    pub(crate) fn new(
        client: SeafileClient,
        repo_id: &str,
        path: String,
        id: String,
        size: u64,
    ) -> Self {
        Self {
            client,
            repo_id: repo_id.to_string(),
            path,
            id,
            size,
        }
    }

    pub fn repo_id(&self) -> &str {
        &self.repo_id
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn name(&self) -> &str {
        base_name(&self.path)
    }

    /// Get a one-off download URL for this file.
    pub async fn get_download_link(&self) -> Result<String> {
        let url = ApiUrl::new(format!("/api2/repos/{}/file/", self.repo_id)).query("p", &self.path);
        self.client
            .get_quoted_link(&url)
            .await
            .map_err(|e| e.or_not_found(FILE_NOT_FOUND))
    }

    /// Fetch the whole file into memory.
    pub async fn get_content(&self) -> Result<Vec<u8>> {
        let link = self.get_download_link().await?;
        let response = self.client.get(&ApiUrl::new(link)).await?;
        Ok(response.bytes().await?.to_vec())
    }

    /// Download the file to a local path.
    ///
    /// If `destination` is an existing directory the file keeps its name
    /// inside it. Returns the path that was written.
    pub async fn download_to<P: AsRef<Path>>(&self, destination: P) -> Result<PathBuf> {
        let destination = destination.as_ref();
        let final_path = if destination.is_dir() {
            destination.join(self.name())
        } else {
            destination.to_path_buf()
        };

        let link = self.get_download_link().await?;
        let response = self.client.get(&ApiUrl::new(link)).await?;

        // Stream into a sibling file so a failed transfer never leaves a
        // truncated file at the destination
        let partial_path = final_path.with_file_name(format!(
            ".{}.part",
            final_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| self.name().to_string())
        ));

        let written = async {
            let mut file = File::create(&partial_path).await?;
            let mut stream = response.bytes_stream();

            while let Some(chunk) = stream.next().await {
                let chunk = chunk?;
                file.write_all(&chunk).await?;
            }

            file.flush().await?;
            Ok::<(), SeafileError>(())
        }
        .await;

        if let Err(e) = written {
            let _ = tokio::fs::remove_file(&partial_path).await;
            return Err(e);
        }

        tokio::fs::rename(&partial_path, &final_path).await?;
        info!(path = %self.path, local = %final_path.display(), "downloaded file");

        Ok(final_path)
    }
}

impl PartialEq for SeafFile {
    fn eq(&self, other: &Self) -> bool {
        self.repo_id == other.repo_id
            && self.path == other.path
            && self.id == other.id
            && self.size == other.size
    }
}

impl fmt::Debug for SeafFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeafFile")
            .field("repo_id", &self.repo_id)
            .field("path", &self.path)
            .field("id", &self.id)
            .field("size", &self.size)
            .finish()
    }
}

impl fmt::Display for SeafFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}\t{}", self.id, format_size(self.size), self.path)
    }
}

/// A directory in a library, with the entries returned by its listing.
#[derive(Clone)]
pub struct SeafDir {
    client: SeafileClient,
    repo_id: String,
    path: String,
    id: String,
    entries: Vec<DirEntry>,
}

/// One child of a [`SeafDir`].
#[derive(Debug, Clone, PartialEq)]
pub enum DirEntry {
    File(SeafFile),
    Dir(SeafDir),
}

impl SeafDir {
    pub(crate) fn new(client: SeafileClient, repo_id: &str, path: String, id: String) -> Self {
        Self {
            client,
            repo_id: repo_id.to_string(),
            path,
            id,
            entries: Vec::new(),
        }
    }

    pub fn repo_id(&self) -> &str {
        &self.repo_id
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        base_name(&self.path)
    }

    /// Populate entries from a directory listing body.
    ///
    /// Child directories are created without their own entries.
    pub fn load_entries(&mut self, listing: serde_json::Value) -> Result<()> {
        let raw: Vec<RawDirEntry> = serde_json::from_value(listing)
            .map_err(|e| SeafileError::MalformedResponse(e.to_string()))?;

        self.entries = raw
            .into_iter()
            .map(|entry| {
                let path = join_path(&self.path, &entry.name);
                match entry.kind {
                    EntryKind::Dir => DirEntry::Dir(SeafDir::new(
                        self.client.clone(),
                        &self.repo_id,
                        path,
                        entry.id,
                    )),
                    EntryKind::File => DirEntry::File(SeafFile::new(
                        self.client.clone(),
                        &self.repo_id,
                        path,
                        entry.id,
                        entry.size,
                    )),
                }
            })
            .collect();

        Ok(())
    }

    pub fn entries(&self) -> &[DirEntry] {
        &self.entries
    }

    pub fn files(&self) -> impl Iterator<Item = &SeafFile> {
        self.entries.iter().filter_map(|entry| match entry {
            DirEntry::File(file) => Some(file),
            DirEntry::Dir(_) => None,
        })
    }

    pub fn dirs(&self) -> impl Iterator<Item = &SeafDir> {
        self.entries.iter().filter_map(|entry| match entry {
            DirEntry::Dir(dir) => Some(dir),
            DirEntry::File(_) => None,
        })
    }
}

impl PartialEq for SeafDir {
    fn eq(&self, other: &Self) -> bool {
        self.repo_id == other.repo_id
            && self.path == other.path
            && self.id == other.id
            && self.entries == other.entries
    }
}

impl fmt::Debug for SeafDir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeafDir")
            .field("repo_id", &self.repo_id)
            .field("path", &self.path)
            .field("id", &self.id)
            .field("entries", &self.entries)
            .finish()
    }
}

impl fmt::Display for SeafDir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t-\t{}/", self.id, self.path.trim_end_matches('/'))
    }
}

impl fmt::Display for DirEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DirEntry::File(file) => fmt::Display::fmt(file, f),
            DirEntry::Dir(dir) => fmt::Display::fmt(dir, f),
        }
    }
}

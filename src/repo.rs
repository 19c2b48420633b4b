//! A single Seafile library and the operations scoped to it.

use std::fmt;
use std::path::Path;

use reqwest::multipart::{Form, Part};
use reqwest::Body;
use serde::Deserialize;
use tokio::fs::File;
use tokio_util::io::ReaderStream;
use tracing::{info, warn};

use crate::client::SeafileClient;
use crate::endpoint::ApiUrl;
use crate::error::{Result, SeafileError};
use crate::files::{join_path, SeafDir, SeafFile, DIR_NOT_FOUND, FILE_NOT_FOUND};
use crate::models::{FileDetail, RepoRecord, ShareLinkDetails, UploadedFile};
use crate::url_parser::{check_share_token, extract_share_token};

/// Permission character that grants write access.
const WRITE_MARKER: char = 'w';

/// Library preferences.
///
/// Return type of [`Repository::get_settings`], which has no endpoint yet and
/// always fails with [`SeafileError::NotImplemented`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[non_exhaustive]
pub struct RepoSettings {
    /// Days of history to keep.
    pub history_limit: i64,
}

/// What a share link points at.
#[derive(Debug, Clone, PartialEq)]
pub enum SeafElement {
    File(SeafFile),
    Dir(SeafDir),
}

impl fmt::Display for SeafElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeafElement::File(file) => fmt::Display::fmt(file, f),
            SeafElement::Dir(dir) => fmt::Display::fmt(dir, f),
        }
    }
}

/// A Seafile library.
#[derive(Clone)]
pub struct Repository {
    client: SeafileClient,
    id: String,
    name: String,
    encrypted: bool,
    owner: String,
    permission: String,
}

fn check_path(path: &str) -> Result<()> {
    if path.starts_with('/') {
        Ok(())
    } else {
        Err(SeafileError::InvalidArgument(format!(
            "path must start with '/': {:?}",
            path
        )))
    }
}

impl Repository {
    /// Build a repository from one record of a library listing.
    pub fn from_json(client: SeafileClient, json: &serde_json::Value) -> Result<Self> {
        let record = RepoRecord::deserialize(json)
            .map_err(|e| SeafileError::MalformedResponse(e.to_string()))?;
        Ok(Self::from_record(client, record))
    }

    pub fn from_record(client: SeafileClient, record: RepoRecord) -> Self {
        Self {
            client,
            id: record.id,
            name: record.name,
            encrypted: record.encrypted,
            owner: record.owner,
            permission: record.permission,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn encrypted(&self) -> bool {
        self.encrypted
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn permission(&self) -> &str {
        &self.permission
    }

    pub fn is_readonly(&self) -> bool {
        !self.permission.contains(WRITE_MARKER)
    }

    /// Get the file located at `path` in this library.
    ///
    /// `path` must be absolute within the library (start with `/`).
    pub async fn get_file(&self, path: &str) -> Result<SeafFile> {
        check_path(path)?;
        let url = ApiUrl::new(format!("/api2/repos/{}/file/detail/", self.id)).query("p", path);

        let response = self
            .client
            .get(&url)
            .await
            .map_err(|e| e.or_not_found(FILE_NOT_FOUND))?;
        let detail: FileDetail = SeafileClient::decode(response).await?;

        Ok(SeafFile::new(
            self.client.clone(),
            &self.id,
            path.to_string(),
            detail.id,
            detail.size,
        ))
    }

    /// Get the directory located at `path` in this library, with its entries.
    pub async fn get_dir(&self, path: &str) -> Result<SeafDir> {
        check_path(path)?;
        let mut url = ApiUrl::new(format!("/api2/repos/{}/dir/", self.id));
        // The root is addressed by leaving the query out
        if path != "/" {
            url = url.query("p", path);
        }

        let response = self
            .client
            .get(&url)
            .await
            .map_err(|e| e.or_not_found(DIR_NOT_FOUND))?;

        let dir_id = response
            .headers()
            .get("oid")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| SeafileError::MalformedResponse("missing oid header".to_string()))?;
        let listing: serde_json::Value = SeafileClient::decode(response).await?;

        let mut dir = SeafDir::new(self.client.clone(), &self.id, path.to_string(), dir_id);
        dir.load_entries(listing)?;
        Ok(dir)
    }

    /// Upload a file into this library.
    ///
    /// # Arguments
    /// * `fileobj` - File content: bytes, a string, or a streaming [`Body`]
    /// * `filename` - Name of the file on the server
    /// * `filepath` - Directory to upload into; missing sub-folders are
    ///   created by the server
    ///
    /// Returns the newly uploaded file as reported by a fresh lookup.
    pub async fn upload_file(
        &self,
        fileobj: impl Into<Body>,
        filename: &str,
        filepath: &str,
    ) -> Result<SeafFile> {
        let part = Part::stream(fileobj).file_name(filename.to_string());
        self.upload_part(part, filename, filepath).await
    }

    /// Upload a local file, keeping its file name.
    pub async fn upload_local_file<P: AsRef<Path>>(
        &self,
        local_path: P,
        filepath: &str,
    ) -> Result<SeafFile> {
        let local_path = local_path.as_ref();
        let filename = local_path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                SeafileError::InvalidArgument(format!("not a file: {}", local_path.display()))
            })?
            .to_string();

        let file = File::open(local_path).await?;
        let length = file.metadata().await?.len();
        let body = Body::wrap_stream(ReaderStream::new(file));
        let part = Part::stream_with_length(body, length).file_name(filename.clone());

        self.upload_part(part, &filename, filepath).await
    }

    async fn upload_part(&self, part: Part, filename: &str, filepath: &str) -> Result<SeafFile> {
        let mime_type = mime_guess::from_path(filename).first_or_octet_stream();
        let part = part.mime_str(mime_type.as_ref())?;

        let upload_link = self.get_upload_link().await?;
        let url = ApiUrl::new(upload_link).query("ret-json", "1");

        let form = Form::new()
            .part("file", part)
            .text("parent_dir", "/")
            .text("relative_path", filepath.to_string());

        info!(repo_id = %self.id, %filename, %filepath, "uploading file");
        let response = self.client.post_multipart(&url, form).await?;
        let uploaded: Vec<UploadedFile> = SeafileClient::decode(response).await?;

        let name = uploaded
            .into_iter()
            .next()
            .map(|file| file.name)
            .ok_or_else(|| {
                SeafileError::MalformedResponse("upload response lists no files".to_string())
            })?;

        let parent = format!("/{}", filepath.trim_start_matches('/'));
        self.get_file(&join_path(&parent, &name)).await
    }

    async fn get_upload_link(&self) -> Result<String> {
        let url = ApiUrl::new(format!("/api2/repos/{}/upload-link/", self.id));
        self.client.get_quoted_link(&url).await
    }

    /// Look up share link metadata by token.
    pub async fn get_share_link_details(&self, token: &str) -> Result<ShareLinkDetails> {
        check_share_token(token)?;
        let url = ApiUrl::new(format!("/api/v2.1/share-links/{}/", token));
        let response = self.client.get(&url).await?;
        SeafileClient::decode(response).await
    }

    /// Resolve a share link such as `https://host/d/<token>/` to the file or
    /// directory it points at.
    pub async fn get_element_by_share_link(&self, share_link: &str) -> Result<SeafElement> {
        let token = extract_share_token(share_link)?;
        let details = self.get_share_link_details(&token).await?;

        if details.is_dir {
            Ok(SeafElement::Dir(self.get_dir(&details.path).await?))
        } else {
            Ok(SeafElement::File(self.get_file(&details.path).await?))
        }
    }

    /// Remove this library. Only the owner may do this; the server enforces it.
    pub async fn delete(&self) -> Result<()> {
        let url = ApiUrl::new(format!("/api2/repos/{}", self.id));
        self.client.delete(&url).await?;
        info!(repo_id = %self.id, "deleted library");
        Ok(())
    }

    /// Rename this library. Returns the library under its new name.
    pub async fn update(&self, name: &str) -> Result<Repository> {
        let url = ApiUrl::new(format!("/api2/repos/{}/", self.id)).query("op", "rename");
        self.client.post_form(&url, &[("repo_name", name)]).await?;
        info!(repo_id = %self.id, old = %self.name, new = %name, "renamed library");

        Ok(Repository {
            name: name.to_string(),
            ..self.clone()
        })
    }

    pub async fn list_history(&self) -> Result<Vec<RepoRevision<'_>>> {
        warn!(repo_id = %self.id, "list_history is not implemented");
        Err(SeafileError::NotImplemented("list_history"))
    }

    pub async fn get_settings(&self) -> Result<RepoSettings> {
        warn!(repo_id = %self.id, "get_settings is not implemented");
        Err(SeafileError::NotImplemented("get_settings"))
    }

    /// Revert the library to `commit_id`.
    pub async fn restore(&self, commit_id: &str) -> Result<()> {
        warn!(repo_id = %self.id, %commit_id, "restore is not implemented");
        Err(SeafileError::NotImplemented("restore"))
    }

    /// A handle on one commit of this library.
    pub fn revision(&self, commit_id: impl Into<String>) -> RepoRevision<'_> {
        RepoRevision {
            repo: self,
            commit_id: commit_id.into(),
        }
    }
}

impl PartialEq for Repository {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.encrypted == other.encrypted
            && self.owner == other.owner
            && self.permission == other.permission
    }
}

impl fmt::Debug for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("encrypted", &self.encrypted)
            .field("owner", &self.owner)
            .field("permission", &self.permission)
            .finish()
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flags = match (self.encrypted, self.is_readonly()) {
            (true, true) => "enc,ro",
            (true, false) => "enc",
            (false, true) => "ro",
            (false, false) => "-",
        };
        write!(f, "{}\t{}\t{}\t{}", self.id, flags, self.owner, self.name)
    }
}

/// One historical commit of a library.
#[derive(Debug, Clone)]
pub struct RepoRevision<'a> {
    repo: &'a Repository,
    commit_id: String,
}

impl RepoRevision<'_> {
    pub fn commit_id(&self) -> &str {
        &self.commit_id
    }

    /// Restore the library to this revision.
    pub async fn restore(&self) -> Result<()> {
        self.repo.restore(&self.commit_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Authenticator;
    use serde_json::json;

    fn repo(permission: &str) -> Repository {
        let client = SeafileClient::new("http://127.0.0.1:9", Authenticator::with_token("t"));
        Repository::from_json(
            client,
            &json!({
                "id": "r1",
                "name": "My Library",
                "encrypted": false,
                "permission": permission,
                "owner": "me@example.com"
            }),
        )
        .unwrap()
    }

    #[test]
    fn test_from_json_keeps_fields() {
        let repo = repo("rw");
        assert_eq!(repo.id(), "r1");
        assert_eq!(repo.name(), "My Library");
        assert!(!repo.encrypted());
        assert_eq!(repo.owner(), "me@example.com");
        assert_eq!(repo.permission(), "rw");
    }

    #[test]
    fn test_from_json_missing_field() {
        let client = SeafileClient::new("http://127.0.0.1:9", Authenticator::with_token("t"));
        let err = Repository::from_json(client, &json!({"id": "r1", "name": "x"})).unwrap_err();
        assert!(matches!(err, SeafileError::MalformedResponse(_)));
    }

    #[test]
    fn test_is_readonly() {
        assert!(!repo("rw").is_readonly());
        assert!(!repo("w").is_readonly());
        assert!(repo("r").is_readonly());
        assert!(repo("").is_readonly());
    }

    #[test]
    fn test_check_path() {
        assert!(check_path("/").is_ok());
        assert!(check_path("/a/b").is_ok());
        assert!(matches!(
            check_path("a/b"),
            Err(SeafileError::InvalidArgument(_))
        ));
        assert!(check_path("").is_err());
    }

    // The client points at a closed port, so any network call would fail
    // with HttpError instead of InvalidArgument.
    #[tokio::test]
    async fn test_relative_paths_rejected_before_request() {
        let repo = repo("rw");
        assert!(matches!(
            repo.get_file("a.txt").await,
            Err(SeafileError::InvalidArgument(_))
        ));
        assert!(matches!(
            repo.get_dir("docs").await,
            Err(SeafileError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn test_bad_share_link_rejected_before_request() {
        let err = repo("rw")
            .get_element_by_share_link("https://host/d")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid argument: Invalid share link");
    }

    #[tokio::test]
    async fn test_unimplemented_operations() {
        let repo = repo("rw");
        assert!(matches!(
            repo.list_history().await,
            Err(SeafileError::NotImplemented("list_history"))
        ));
        assert!(matches!(
            repo.get_settings().await,
            Err(SeafileError::NotImplemented("get_settings"))
        ));
        assert!(matches!(
            repo.revision("c0ffee").restore().await,
            Err(SeafileError::NotImplemented("restore"))
        ));
    }

    #[test]
    fn test_display_flags() {
        assert!(repo("r").to_string().contains("\tro\t"));
        assert!(repo("rw").to_string().contains("\t-\t"));
    }
}

//! Data models for Seafile API responses.

use serde::{Deserialize, Serialize};

/// A library record as returned by `/api2/repos/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoRecord {
    pub id: String,
    pub name: String,
    pub encrypted: bool,
    pub permission: String,
    pub owner: String,
}

/// Response of `/api2/repos/{id}/file/detail/`.
#[derive(Debug, Deserialize)]
pub struct FileDetail {
    pub id: String,
    pub size: u64,
}

/// Kind of a directory listing entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Dir,
}

/// One element of a directory listing.
#[derive(Debug, Deserialize)]
pub struct RawDirEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub name: String,
    #[serde(default)]
    pub size: u64,
}

/// Share link metadata from `/api/v2.1/share-links/{token}/`.
///
/// Only `path` and `is_dir` are needed to resolve the link; everything else
/// the server sends is kept in `extra`.
#[derive(Debug, Clone, Deserialize)]
pub struct ShareLinkDetails {
    pub path: String,
    #[serde(default)]
    pub is_dir: bool,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Element of the `ret-json=1` upload response.
#[derive(Debug, Deserialize)]
pub struct UploadedFile {
    pub name: String,
}

/// Response of `POST /api2/repos/`.
#[derive(Debug, Deserialize)]
pub struct CreatedRepo {
    pub repo_id: String,
}

/// Response of `POST /api2/auth-token/`.
#[derive(Debug, Deserialize)]
pub struct AuthTokenResponse {
    pub token: String,
}

/// Format bytes into human-readable size.
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    match bytes {
        b if b >= GB => format!("{:.2} GB", b as f64 / GB as f64),
        b if b >= MB => format!("{:.2} MB", b as f64 / MB as f64),
        b if b >= KB => format!("{:.2} KB", b as f64 / KB as f64),
        b => format!("{} B", b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(500), "500 B");
        assert_eq!(format_size(1024), "1.00 KB");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(1048576), "1.00 MB");
        assert_eq!(format_size(1073741824), "1.00 GB");
    }

    #[test]
    fn test_dir_entry_deserialize() {
        let json = r#"[
            {"id": "d1", "type": "dir", "name": "photos", "mtime": 1},
            {"id": "f1", "type": "file", "name": "a.txt", "size": 12}
        ]"#;

        let entries: Vec<RawDirEntry> = serde_json::from_str(json).unwrap();
        assert_eq!(entries[0].kind, EntryKind::Dir);
        assert_eq!(entries[0].size, 0);
        assert_eq!(entries[1].kind, EntryKind::File);
        assert_eq!(entries[1].size, 12);
    }

    #[test]
    fn test_share_link_details_keeps_extra_fields() {
        let json = r#"{"path": "/x", "is_dir": true, "token": "abc", "view_cnt": 3}"#;

        let details: ShareLinkDetails = serde_json::from_str(json).unwrap();
        assert_eq!(details.path, "/x");
        assert!(details.is_dir);
        assert_eq!(details.extra["token"], "abc");
        assert_eq!(details.extra["view_cnt"], 3);
    }

    #[test]
    fn test_repo_record_missing_field() {
        let json = r#"{"id": "r1", "name": "n", "encrypted": false, "owner": "o"}"#;
        let err = serde_json::from_str::<RepoRecord>(json).unwrap_err();
        assert!(err.to_string().contains("permission"));
    }
}

//! seafile_api - A client for the Seafile web API.
//!
//! This library provides functionality to:
//! - List, create, rename and delete libraries
//! - Look up files and directories inside a library
//! - Upload and download files
//! - Resolve share links to the file or directory they point at
//!
//! # Example
//!
//! ```no_run
//! use seafile_api::{Authenticator, SeafileClient};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = SeafileClient::new(
//!         "https://cloud.example.com",
//!         Authenticator::with_token("api-token"),
//!     );
//!
//!     for repo in client.list_repos(None).await? {
//!         let root = repo.get_dir("/").await?;
//!         for entry in root.entries() {
//!             println!("{}", entry);
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod endpoint;
pub mod error;
pub mod files;
pub mod models;
pub mod repo;
pub mod url_parser;

// Re-exports for convenience
pub use auth::Authenticator;
pub use client::SeafileClient;
pub use endpoint::ApiUrl;
pub use error::{Result, SeafileError};
pub use files::{DirEntry, SeafDir, SeafFile};
pub use repo::{RepoRevision, RepoSettings, Repository, SeafElement};
pub use url_parser::extract_share_token;

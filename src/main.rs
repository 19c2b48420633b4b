//! seafile CLI - Interact with a Seafile server.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use glob::glob;
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use seafile_api::{Authenticator, Repository, SeafElement, SeafileClient};

/// CLI tool for interacting with a Seafile server.
#[derive(Parser)]
#[command(name = "seafile")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Server base URL, e.g. https://cloud.example.com
    #[arg(long, env = "SEAFILE_SERVER")]
    server: String,

    /// API token. Takes precedence over username/password.
    #[arg(long, env = "SEAFILE_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Account name used to obtain a token.
    #[arg(long, env = "SEAFILE_USERNAME")]
    username: Option<String>,

    /// Account password used to obtain a token.
    #[arg(long, env = "SEAFILE_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List libraries.
    Repos {
        /// Only list libraries of this type (mine, shared, group, org).
        #[arg(long = "type")]
        kind: Option<String>,
    },

    /// List a directory.
    Ls {
        /// Library ID.
        repo: String,

        /// Directory path inside the library.
        #[arg(default_value = "/")]
        path: String,
    },

    /// Show file details.
    Stat {
        /// Library ID.
        repo: String,

        /// File path inside the library.
        path: String,
    },

    /// Upload files to a library.
    Upload {
        /// Library ID.
        repo: String,

        /// File patterns to upload (supports glob patterns like *.tar, file_{1,2,3}.txt).
        #[arg(required = true)]
        patterns: Vec<String>,

        /// Destination directory inside the library; created if missing.
        #[arg(long, short = 't', default_value = "")]
        to: String,
    },

    /// Download a file to local filesystem.
    Download {
        /// Library ID.
        repo: String,

        /// File path inside the library.
        path: String,

        /// Local destination path (file or directory).
        #[arg(long, short = 't', default_value = ".")]
        to: PathBuf,
    },

    /// Show what a share link points at.
    Resolve {
        /// Library ID.
        repo: String,

        /// Share link, e.g. https://cloud.example.com/d/<token>/
        link: String,
    },

    /// Create a library.
    CreateRepo {
        /// Library name.
        name: String,

        /// Encrypt the library with this password.
        #[arg(long)]
        library_password: Option<String>,
    },

    /// Rename a library.
    RenameRepo {
        /// Library ID.
        repo: String,

        /// New name.
        name: String,
    },

    /// Delete a library.
    DeleteRepo {
        /// Library ID.
        repo: String,
    },
}

async fn build_client(cli: &Cli) -> Result<SeafileClient> {
    match (&cli.token, &cli.username, &cli.password) {
        (Some(token), _, _) => Ok(SeafileClient::new(
            cli.server.as_str(),
            Authenticator::with_token(token.as_str()),
        )),
        (None, Some(username), Some(password)) => {
            SeafileClient::connect(&cli.server, username, password)
                .await
                .with_context(|| format!("Failed to log in to {} as {}", cli.server, username))
        }
        _ => bail!("Either --token or both --username and --password are required"),
    }
}

async fn open_repo(client: &SeafileClient, repo_id: &str) -> Result<Repository> {
    client
        .get_repo(repo_id)
        .await
        .with_context(|| format!("Failed to open library: {}", repo_id))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "seafile_api=info,seafile=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let client = build_client(&cli).await?;

    match cli.command {
        Commands::Repos { kind } => {
            let repos = client
                .list_repos(kind.as_deref())
                .await
                .context("Failed to list libraries")?;

            if repos.is_empty() {
                println!("No libraries found.");
            } else {
                println!("{:<36}\t{:<6}\t{:<24}\t{}", "ID", "FLAGS", "OWNER", "NAME");
                println!("{}", "-".repeat(100));
                for repo in repos {
                    println!("{}", repo);
                }
            }
        }

        Commands::Ls { repo, path } => {
            let repo = open_repo(&client, &repo).await?;
            let dir = repo
                .get_dir(&path)
                .await
                .with_context(|| format!("Failed to list directory: {}", path))?;

            if dir.entries().is_empty() {
                println!("Empty directory.");
            } else {
                for entry in dir.entries() {
                    println!("{}", entry);
                }
            }
        }

        Commands::Stat { repo, path } => {
            let repo = open_repo(&client, &repo).await?;
            let file = repo
                .get_file(&path)
                .await
                .with_context(|| format!("Failed to stat file: {}", path))?;
            println!("{}", file);
        }

        Commands::Upload { repo, patterns, to } => {
            let repo = open_repo(&client, &repo).await?;

            let mut files_to_upload: Vec<PathBuf> = Vec::new();

            for pattern in &patterns {
                for expanded_pattern in expand_braces(pattern) {
                    let matches: Vec<PathBuf> = glob(&expanded_pattern)
                        .with_context(|| format!("Invalid glob pattern: {}", expanded_pattern))?
                        .filter_map(|r| r.ok())
                        .filter(|p| p.is_file())
                        .collect();

                    if matches.is_empty() {
                        // Not a glob match; fall back to a literal path
                        let path = PathBuf::from(&expanded_pattern);
                        if path.is_file() {
                            files_to_upload.push(path);
                        } else {
                            warn!(pattern = %expanded_pattern, "no files matched pattern");
                        }
                    } else {
                        files_to_upload.extend(matches);
                    }
                }
            }

            files_to_upload.sort();
            files_to_upload.dedup();

            if files_to_upload.is_empty() {
                bail!("No files to upload");
            }

            println!(
                "Uploading {} file(s) to {}:/{}...",
                files_to_upload.len(),
                repo.name(),
                to.trim_start_matches('/')
            );

            let total = files_to_upload.len();
            let mut failed = 0;
            for (idx, file_path) in files_to_upload.iter().enumerate() {
                let filename = file_path.file_name().unwrap_or_default().to_string_lossy();
                print!("[{}/{}] Uploading {}... ", idx + 1, total, filename);

                match repo.upload_local_file(file_path, &to).await {
                    Ok(file) => println!("OK ({})", file.id()),
                    Err(e) => {
                        failed += 1;
                        println!("FAILED");
                        eprintln!("  Error: {}", e);
                    }
                }
            }

            if failed > 0 {
                bail!("{} of {} upload(s) failed", failed, total);
            }
            println!("Done.");
        }

        Commands::Download { repo, path, to } => {
            let repo = open_repo(&client, &repo).await?;
            let file = repo
                .get_file(&path)
                .await
                .with_context(|| format!("Failed to find file: {}", path))?;

            if to.is_dir() || to.to_string_lossy().ends_with('/') {
                std::fs::create_dir_all(&to)
                    .with_context(|| format!("Failed to create directory: {:?}", to))?;
            } else if let Some(parent) = to.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)
                        .with_context(|| format!("Failed to create directory: {:?}", parent))?;
                }
            }

            print!("Downloading {}... ", file.path());
            let saved = file
                .download_to(&to)
                .await
                .with_context(|| format!("Failed to download file: {}", path))?;

            println!("OK");
            println!("Saved to: {:?}", saved);
        }

        Commands::Resolve { repo, link } => {
            let repo = open_repo(&client, &repo).await?;
            let element = repo
                .get_element_by_share_link(&link)
                .await
                .with_context(|| format!("Failed to resolve share link: {}", link))?;

            println!("{}", element);
            if let SeafElement::Dir(dir) = element {
                for entry in dir.entries() {
                    println!("  {}", entry);
                }
            }
        }

        Commands::CreateRepo {
            name,
            library_password,
        } => {
            let repo = client
                .create_repo(&name, library_password.as_deref())
                .await
                .with_context(|| format!("Failed to create library: {}", name))?;
            println!("{}", repo);
        }

        Commands::RenameRepo { repo, name } => {
            let repo = open_repo(&client, &repo).await?;
            let renamed = repo
                .update(&name)
                .await
                .with_context(|| format!("Failed to rename library: {}", repo.id()))?;
            println!("{}", renamed);
        }

        Commands::DeleteRepo { repo } => {
            let repo = open_repo(&client, &repo).await?;
            repo.delete()
                .await
                .with_context(|| format!("Failed to delete library: {}", repo.id()))?;
            println!("Deleted {} ({})", repo.name(), repo.id());
        }
    }

    Ok(())
}

/// Expand brace patterns like file_{1,2,3}.txt into multiple patterns.
fn expand_braces(pattern: &str) -> Vec<String> {
    let Some(start) = pattern.find('{') else {
        return vec![pattern.to_string()];
    };
    let Some(len) = pattern[start..].find('}') else {
        return vec![pattern.to_string()];
    };

    let end = start + len;
    let (prefix, suffix) = (&pattern[..start], &pattern[end + 1..]);

    pattern[start + 1..end]
        .split(',')
        .flat_map(|alt| expand_braces(&format!("{}{}{}", prefix, alt.trim(), suffix)))
        .collect()
}

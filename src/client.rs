//! HTTP transport for the Seafile web API.

use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::multipart::Form;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::auth::Authenticator;
use crate::endpoint::ApiUrl;
use crate::error::{Result, SeafileError};
use crate::models::CreatedRepo;
use crate::repo::Repository;
use crate::url_parser::unquote_link;

/// Client for a single Seafile server.
///
/// Cheap to clone: clones share the connection pool and the cached token.
#[derive(Clone)]
pub struct SeafileClient {
    server: String,
    auth: Authenticator,
    http: Client,
}

impl std::fmt::Debug for SeafileClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeafileClient")
            .field("server", &self.server)
            .finish_non_exhaustive()
    }
}

impl SeafileClient {
    /// Create a new SeafileClient.
    ///
    /// # Arguments
    /// * `server` - Base URL of the server, e.g. `https://cloud.example.com`
    /// * `auth` - Authenticator for obtaining the API token
    pub fn new(server: impl Into<String>, auth: Authenticator) -> Self {
        Self {
            server: server.into().trim_end_matches('/').to_string(),
            auth,
            http: Client::new(),
        }
    }

    /// Log in with account credentials and return a ready client.
    ///
    /// The token is fetched eagerly so bad credentials fail here rather than
    /// on the first API call.
    pub async fn connect(server: &str, username: &str, password: &str) -> Result<Self> {
        let client = Self::new(server, Authenticator::with_password(username, password));
        client.auth.get_token(&client.http, &client.server).await?;
        Ok(client)
    }

    /// Get the server base URL.
    pub fn server(&self) -> &str {
        &self.server
    }

    pub async fn get(&self, url: &ApiUrl) -> Result<Response> {
        let request = self.request(Method::GET, url).await?;
        self.send(request).await
    }

    pub async fn post_form(&self, url: &ApiUrl, fields: &[(&str, &str)]) -> Result<Response> {
        let request = self.request(Method::POST, url).await?.form(fields);
        self.send(request).await
    }

    pub async fn post_multipart(&self, url: &ApiUrl, form: Form) -> Result<Response> {
        let request = self.request(Method::POST, url).await?.multipart(form);
        self.send(request).await
    }

    pub async fn delete(&self, url: &ApiUrl) -> Result<Response> {
        let request = self.request(Method::DELETE, url).await?;
        self.send(request).await
    }

    async fn request(&self, method: Method, url: &ApiUrl) -> Result<RequestBuilder> {
        let token = self.auth.get_token(&self.http, &self.server).await?;
        let url = url.resolve(&self.server);
        debug!(%method, %url, "sending request");

        Ok(self
            .http
            .request(method, url)
            .header(AUTHORIZATION, format!("Token {}", token))
            .header(ACCEPT, "application/json"))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await?;
        let status = response.status();
        debug!(status = status.as_u16(), url = %response.url(), "received response");

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SeafileError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response)
    }

    /// Decode a JSON body. Bodies that are not JSON at all surface as
    /// [`SeafileError::JsonError`]; JSON that lacks required fields as
    /// [`SeafileError::MalformedResponse`].
    pub(crate) async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        let body = response.text().await?;
        let value: serde_json::Value = serde_json::from_str(&body)?;
        serde_json::from_value(value).map_err(|e| SeafileError::MalformedResponse(e.to_string()))
    }

    /// GET an endpoint whose body is a quoted URL and return the URL.
    pub(crate) async fn get_quoted_link(&self, url: &ApiUrl) -> Result<String> {
        let body = self.get(url).await?.text().await?;
        unquote_link(&body)
    }

    /// List the libraries visible to the current account.
    ///
    /// # Arguments
    /// * `kind` - Optional `type` filter understood by the server (`mine`, `shared`, ...)
    pub async fn list_repos(&self, kind: Option<&str>) -> Result<Vec<Repository>> {
        let url = ApiUrl::new("/api2/repos/").query_opt("type", kind);
        let response = self.get(&url).await?;
        let records: Vec<serde_json::Value> = Self::decode(response).await?;

        records
            .iter()
            .map(|record| Repository::from_json(self.clone(), record))
            .collect()
    }

    /// Get a library by id.
    pub async fn get_repo(&self, repo_id: &str) -> Result<Repository> {
        let url = ApiUrl::new(format!("/api2/repos/{}/", repo_id));
        let response = self.get(&url).await?;
        let record: serde_json::Value = Self::decode(response).await?;
        Repository::from_json(self.clone(), &record)
    }

    /// Create a library, optionally encrypted with `password`.
    pub async fn create_repo(&self, name: &str, password: Option<&str>) -> Result<Repository> {
        let mut fields = vec![("name", name)];
        if let Some(password) = password {
            fields.push(("passwd", password));
        }

        let response = self
            .post_form(&ApiUrl::new("/api2/repos/"), &fields)
            .await?;
        let created: CreatedRepo = Self::decode(response).await?;
        info!(repo_id = %created.repo_id, %name, "created library");

        self.get_repo(&created.repo_id).await
    }
}

//! HTTP client for the daemon's `/admin` namespace

use reqwest::{Client, Method, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use warden::admin::{
    ADMIN_KEY_HEADER, BlocksResponse, KillState, StatsResponse, TestAlertResponse,
};

use crate::error::{CliError, CliResult};

pub struct AdminClient {
    client: Client,
    base: Url,
    admin_key: Option<String>,
}

impl AdminClient {
    pub fn new(base_url: &str, admin_key: Option<String>) -> CliResult<Self> {
        let mut base = Url::parse(base_url)?;
        // Url::join replaces the last segment unless the path ends with '/'
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        Ok(Self {
            client: Client::new(),
            base,
            admin_key,
        })
    }

    fn request(&self, method: Method, path: &str) -> CliResult<RequestBuilder> {
        let url = self.base.join(path)?;
        let mut builder = self.client.request(method, url);
        if let Some(key) = &self.admin_key {
            builder = builder.header(ADMIN_KEY_HEADER, key);
        }
        Ok(builder)
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> CliResult<T> {
        let response = builder.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body: serde_json::Value = response.json().await.unwrap_or_default();
            let message = body
                .get("error")
                .and_then(|e| e.as_str())
                .unwrap_or("no error message");
            let hint = if status == reqwest::StatusCode::UNAUTHORIZED {
                " (check --admin-key or WARDEN_ADMIN_KEY)"
            } else {
                ""
            };
            return Err(CliError(format!("Daemon returned {status}: {message}{hint}")));
        }

        Ok(response.json().await?)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> CliResult<T> {
        let builder = self.request(Method::GET, path)?;
        self.send(builder).await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> CliResult<T> {
        let builder = self.request(Method::POST, path)?.json(body);
        self.send(builder).await
    }

    pub async fn kill_status(&self) -> CliResult<KillState> {
        self.get("admin/kill").await
    }

    pub async fn set_kill(&self, enabled: bool) -> CliResult<KillState> {
        self.post("admin/kill", &KillState { enabled }).await
    }

    pub async fn stats(&self) -> CliResult<StatsResponse> {
        self.get("admin/stats").await
    }

    pub async fn blocks(&self, limit: usize) -> CliResult<BlocksResponse> {
        self.get(&format!("admin/blocks?limit={limit}")).await
    }

    pub async fn test_alert(&self) -> CliResult<TestAlertResponse> {
        self.post("admin/test", &serde_json::json!({})).await
    }
}

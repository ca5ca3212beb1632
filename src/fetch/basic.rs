use super::client::HttpClient;
use async_trait::async_trait;

pub struct BasicClient(reqwest::Client);

impl BasicClient {
    pub fn new() -> Self {
        Self(reqwest::Client::new())
    }

    /// Client that identifies as a regular browser. The election source
    /// serves an error page to default library user agents.
    pub fn with_user_agent(ua: &str) -> reqwest::Result<Self> {
        Ok(Self(reqwest::Client::builder().user_agent(ua).build()?))
    }
}

impl Default for BasicClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for BasicClient {
    async fn execute(&self, req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        self.0.execute(req).await
    }
}

/// Client that skips certificate verification, for the INE endpoints whose
/// chain does not validate. The policy is scoped to this instance; clients
/// that can verify keep verifying.
pub struct InsecureClient(reqwest::Client);

impl InsecureClient {
    pub fn new() -> reqwest::Result<Self> {
        Ok(Self(
            reqwest::Client::builder()
                .danger_accept_invalid_certs(true)
                .build()?,
        ))
    }
}

#[async_trait]
impl HttpClient for InsecureClient {
    async fn execute(&self, req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        self.0.execute(req).await
    }
}

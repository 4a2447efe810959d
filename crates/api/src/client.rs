use crate::config::FeedConfig;
use crate::FeedApi;
use async_trait::async_trait;
use magnet_feed_core::error::Result;
use magnet_feed_core::{FeedError, FileEntry, Location, LocationAssignment};
use serde::de::DeserializeOwned;
use std::time::Instant;
use surf::http::Method;
use surf::Url;

pub struct HttpFeedClient {
    client: surf::Client,
    base_url: Url,
}

impl HttpFeedClient {
    pub fn new(config: &FeedConfig) -> Self {
        Self::with_base_url(config.base_url.clone())
    }

    pub fn with_base_url(base_url: Url) -> Self {
        Self {
            client: surf::Client::new().with(RequestLog),
            base_url,
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Append path segments to the base URL, keeping any prefix it carries.
    /// Segments are percent-encoded, so ids containing `/` stay one segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                FeedError::Config(format!("{} cannot be used as a base URL", self.base_url))
            })?;
            path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }

    async fn execute(&self, request: surf::Request) -> Result<surf::Response> {
        let method = request.method().to_string();
        let path = request.url().path().to_string();

        let response = self
            .client
            .send(request)
            .await
            .map_err(FeedError::transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Response {
                method,
                path,
                status: status.into(),
            });
        }
        Ok(response)
    }

    async fn fetch<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T> {
        let url = self.endpoint(segments)?;
        let mut response = self
            .execute(surf::Request::builder(Method::Get, url).build())
            .await?;
        response.body_json::<T>().await.map_err(FeedError::body)
    }

    async fn command(&self, method: Method, segments: &[&str]) -> Result<()> {
        let url = self.endpoint(segments)?;
        self.execute(surf::Request::builder(method, url).build())
            .await
            .map(|_| ())
    }
}

#[async_trait]
impl FeedApi for HttpFeedClient {
    async fn list_files(&self) -> Result<Vec<FileEntry>> {
        self.fetch(&["api", "files"]).await
    }

    async fn remove_file(&self, id: &str) -> Result<()> {
        self.command(Method::Delete, &["api", "files", id]).await
    }

    async fn refresh_file(&self, id: &str) -> Result<()> {
        self.command(Method::Patch, &["api", "files", id, "refresh"])
            .await
    }

    async fn refresh_all(&self) -> Result<()> {
        self.command(Method::Patch, &["api", "files", "refresh"]).await
    }

    async fn list_locations(&self) -> Result<Vec<Location>> {
        self.fetch(&["api", "file-locations"]).await
    }

    async fn assign_location(&self, assignment: &LocationAssignment) -> Result<()> {
        let url = self.endpoint(&["api", "file-locations"])?;
        let body = surf::Body::from_json(assignment).map_err(FeedError::body)?;
        self.execute(surf::Request::builder(Method::Post, url).body(body).build())
            .await
            .map(|_| ())
    }
}

/// Logs one line per request: method, URL, status and elapsed time.
struct RequestLog;

#[surf::utils::async_trait]
impl surf::middleware::Middleware for RequestLog {
    async fn handle(
        &self,
        req: surf::Request,
        client: surf::Client,
        next: surf::middleware::Next<'_>,
    ) -> surf::Result<surf::Response> {
        let method = req.method();
        let url = req.url().clone();
        let started = Instant::now();

        let result = next.run(req, client).await;

        match &result {
            Ok(response) if response.status().is_success() => {
                log::debug!(
                    "{} {} -> {} in {:?}",
                    method,
                    url,
                    response.status(),
                    started.elapsed()
                );
            }
            Ok(response) => {
                log::warn!(
                    "{} {} -> {} in {:?}",
                    method,
                    url,
                    response.status(),
                    started.elapsed()
                );
            }
            Err(e) => {
                log::warn!("{} {} failed after {:?}: {}", method, url, started.elapsed(), e);
            }
        }

        result
    }
}

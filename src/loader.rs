use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, StatusCode};

use crate::config::ClientConfig;
use crate::resource::{ContentKind, ObjectUrlRegistry, ProfileResource};
use crate::session::Session;
use crate::{ProfileError, Result, LOAD_PROFILE_ROUTE, LOGOUT_ROUTE};

/// Fetches the profile picture of the session's user and classifies it.
pub struct ProfileLoader {
    client: Client,
    config: ClientConfig,
    registry: Arc<ObjectUrlRegistry>,
}

impl ProfileLoader {
    pub fn new(config: ClientConfig) -> Result<Self> {
        Self::with_registry(config, ObjectUrlRegistry::new())
    }

    pub fn with_registry(
        config: ClientConfig,
        registry: Arc<ObjectUrlRegistry>,
    ) -> Result<Self> {
        let mut header = HeaderMap::new();
        header.insert(
            "User-Agent",
            HeaderValue::from_str(&config.user_agent).map_err(|_| {
                ProfileError::Config(format!(
                    "invalid user agent: {}",
                    config.user_agent
                ))
            })?,
        );
        let client = Client::builder()
            .default_headers(header)
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            client,
            config,
            registry,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<ObjectUrlRegistry> {
        &self.registry
    }

    /// Load the profile picture. Every failure degrades to
    /// [ProfileResource::Absent], a missing picture is never fatal.
    pub async fn load(&self, session: &Session) -> ProfileResource {
        match self.try_load(session).await {
            Ok(resource) => resource,
            Err(e) if e.is_local() => {
                log::debug!("profile not loaded: {}", e);
                ProfileResource::Absent
            }
            Err(e) => {
                log::warn!("profile not loaded: {}", e);
                ProfileResource::Absent
            }
        }
    }

    /// Blocking version of [ProfileLoader::load]
    pub fn load_synced(&self, session: &Session) -> Result<ProfileResource> {
        let runtime = tokio::runtime::Runtime::new()?;
        Ok(runtime.block_on(self.load(session)))
    }

    /// Same as [ProfileLoader::load] but reports why nothing was loaded
    pub async fn try_load(&self, session: &Session) -> Result<ProfileResource> {
        let bearer = session.bearer().ok_or(ProfileError::Unauthenticated)?;
        let url = self.config.route(LOAD_PROFILE_ROUTE)?;
        log::debug!("requesting profile of {}", session.display_name());

        let response = self
            .client
            .get(url)
            .header(AUTHORIZATION, bearer)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            log::debug!("profile request answered {}: {}", status, body);
            return Err(ProfileError::Status(status.as_u16()));
        }

        let kind = ContentKind::parse(
            response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|value| value.to_str().ok()),
        );
        match kind {
            ContentKind::Image(media_type) => {
                let data = response.bytes().await?;
                if data.is_empty() {
                    return Err(ProfileError::EmptyBody);
                }
                let handle = self.registry.create(media_type, data.to_vec());
                if handle.format().is_none() {
                    log::debug!(
                        "{} does not look like a known image format",
                        handle.url()
                    );
                }
                Ok(ProfileResource::Image(handle))
            }
            ContentKind::Text(_) => {
                let text = response.text().await?;
                let url = text.trim();
                if url.is_empty() {
                    return Err(ProfileError::EmptyBody);
                }
                Ok(ProfileResource::TextUrl(url.to_string()))
            }
            other => Err(ProfileError::UnrecognizedRepresentation(
                other.to_string(),
            )),
        }
    }

    /// Tell the server the session is over
    pub async fn logout(&self, session: &Session) -> Result<()> {
        let bearer = session.bearer().ok_or(ProfileError::Unauthenticated)?;
        let url = self.config.route(LOGOUT_ROUTE)?;

        let response = self
            .client
            .get(url)
            .header(AUTHORIZATION, bearer)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProfileError::Status(status.as_u16()));
        }
        log::info!("{} logged out", session.display_name());
        Ok(())
    }
}

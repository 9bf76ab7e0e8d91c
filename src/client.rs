//! The SFS client façade.
//!
//! [`SfsClient`] is the only surface application code talks to. It validates
//! inputs, drives the two-phase resolve-then-download-info sequence over the
//! retrying connection, and assembles the public value objects in
//! [`crate::types`].
//!
//! # Examples
//!
//! ## Resolving the latest version of a product
//!
//! ```no_run
//! use sfs_client::{ClientConfig, ProductRequest, RequestParams, SfsClient};
//!
//! # async fn example() -> Result<(), sfs_client::SfsError> {
//! let client = SfsClient::new(ClientConfig {
//!     account_id: "msedge".to_string(),
//!     ..Default::default()
//! })?;
//!
//! let requests = vec![ProductRequest::new("msedge-stable-win-x64")];
//! let contents = client
//!     .get_latest_download_info(&requests, &RequestParams::default())
//!     .await?;
//! for file in contents[0].files() {
//!     println!("{} <- {}", file.file_id(), file.url());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Carrying targeting attributes and a caller correlation vector
//!
//! ```no_run
//! use sfs_client::{ProductRequest, RequestParams};
//!
//! let requests = vec![
//!     ProductRequest::new("myProduct").with_attribute("ring", "canary"),
//! ];
//! let params = RequestParams {
//!     base_correlation_vector: Some("PmvzQKgYek6Sdk/T.0".to_string()),
//! };
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::connection::{
    ConnectionConfig, ConnectionManager, SfsConnection, MAX_RETRIES_BOUND,
};
use crate::correlation::CorrelationContext;
use crate::entity::{self, ContentIdEntity, FileEntity, VersionEntity};
use crate::error::{Result, SfsError};
use crate::logging::{log_error, log_info, log_warn, LogHandler, LoggingCallback};
use crate::types::{AppContent, AppFile, Content, ContentId, File};
use crate::url_builder::SfsUrlBuilder;

const DEFAULT_INSTANCE_ID: &str = "default";
const DEFAULT_NAMESPACE: &str = "default";
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client construction options.
///
/// Only `account_id` is required; everything else has a production default.
///
/// # Examples
///
/// ```
/// use sfs_client::{ClientConfig, ConnectionConfig};
///
/// let config = ClientConfig {
///     account_id: "myaccount".to_string(),
///     connection: ConnectionConfig {
///         max_retries: 2,
///         ..Default::default()
///     },
///     ..Default::default()
/// };
/// ```
pub struct ClientConfig {
    /// Account identifier, embedded in the service hostname. Required.
    pub account_id: String,
    /// Service instance identifier.
    pub instance_id: String,
    /// Content namespace.
    pub namespace: String,
    /// Structured logging hook; see [`crate::logging`].
    pub logging_callback: Option<LoggingCallback>,
    /// Retry and timing configuration.
    pub connection: ConnectionConfig,
    /// Routes all requests to an explicit base URL instead of the production
    /// host. Available in test builds only.
    #[cfg(any(test, feature = "test-overrides"))]
    pub base_url: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            account_id: String::new(),
            instance_id: DEFAULT_INSTANCE_ID.to_string(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            logging_callback: None,
            connection: ConnectionConfig::default(),
            #[cfg(any(test, feature = "test-overrides"))]
            base_url: None,
        }
    }
}

/// One product to resolve, with optional targeting attributes.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProductRequest {
    product: String,
    targeting_attributes: BTreeMap<String, String>,
}

impl ProductRequest {
    /// Request the given product with no targeting attributes.
    pub fn new(product: impl Into<String>) -> Self {
        ProductRequest {
            product: product.into(),
            targeting_attributes: BTreeMap::new(),
        }
    }

    /// Add one targeting attribute.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.targeting_attributes.insert(key.into(), value.into());
        self
    }

    /// The product name.
    pub fn product(&self) -> &str {
        &self.product
    }

    /// The targeting attributes, in key order.
    pub fn targeting_attributes(&self) -> &BTreeMap<String, String> {
        &self.targeting_attributes
    }
}

/// Per-call options.
#[derive(Debug, Clone, Default)]
pub struct RequestParams {
    /// Base correlation vector to thread through the exchange. When absent a
    /// fresh vector is generated. Validated before any request is sent.
    pub base_correlation_vector: Option<String>,
}

/// The SFS client.
///
/// Holds no mutable per-request state: one instance may serve concurrent
/// logical requests from different threads, each request owning its own
/// correlation context internally.
pub struct SfsClient {
    url_builder: SfsUrlBuilder,
    connection: SfsConnection,
    log: Arc<LogHandler>,
    _manager: ConnectionManager,
}

impl std::fmt::Debug for SfsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SfsClient").finish_non_exhaustive()
    }
}

impl SfsClient {
    /// Build a client.
    ///
    /// # Errors
    ///
    /// - [`SfsError::InvalidArgument`] on an empty account id or
    ///   out-of-range connection configuration
    /// - [`SfsError::ConnectionSetupFailed`] when the transport layer cannot
    ///   be brought up
    /// - [`SfsError::ConnectionUrlSetupFailed`] when the service hostname is
    ///   malformed
    pub fn new(config: ClientConfig) -> Result<Self> {
        let log = Arc::new(LogHandler::new(config.logging_callback.clone()));
        let result = Self::build(config, Arc::clone(&log));
        match &result {
            Ok(_) => log_info!(log, "SFS client initialized"),
            Err(err) => log_error!(log, "client construction failed: {err}"),
        }
        result
    }

    fn build(config: ClientConfig, log: Arc<LogHandler>) -> Result<Self> {
        if config.account_id.is_empty() {
            return Err(SfsError::InvalidArgument(
                "accountId cannot be empty".to_string(),
            ));
        }
        config.connection.validate()?;

        let mut connection_config = config.connection.clone();
        if connection_config.max_retries > MAX_RETRIES_BOUND {
            log_warn!(
                log,
                "maxRetries {} clamped to {MAX_RETRIES_BOUND}",
                connection_config.max_retries
            );
            connection_config.max_retries = MAX_RETRIES_BOUND;
        }

        #[cfg(any(test, feature = "test-overrides"))]
        if let Some(delay) = crate::test_overrides::retry_delay_override() {
            log_warn!(
                log,
                "retry delay overridden to {delay:?} via {}",
                crate::test_overrides::RETRY_DELAY_ENV
            );
            connection_config.retry_delay = delay;
        }

        #[cfg(any(test, feature = "test-overrides"))]
        let base_url = config
            .base_url
            .clone()
            .or_else(crate::test_overrides::base_url_override);
        #[cfg(not(any(test, feature = "test-overrides")))]
        let base_url: Option<String> = None;

        let url_builder = match base_url {
            Some(base) => {
                SfsUrlBuilder::with_base_url(&base, &config.instance_id, &config.namespace)?
            }
            None => {
                SfsUrlBuilder::new(&config.account_id, &config.instance_id, &config.namespace)?
            }
        };

        let manager = ConnectionManager::new(DEFAULT_REQUEST_TIMEOUT)?;
        let connection =
            SfsConnection::new(manager.make_transport(), connection_config, Arc::clone(&log));

        Ok(SfsClient {
            url_builder,
            connection,
            log,
            _manager: manager,
        })
    }

    /// Resolve the latest version of the requested products and fetch their
    /// download info.
    ///
    /// Exactly one product per call is supported at the moment; the result
    /// vector mirrors the request vector's order.
    ///
    /// # Errors
    ///
    /// - [`SfsError::InvalidArgument`] on an empty request list, an empty
    ///   product name, or a malformed base correlation vector
    /// - [`SfsError::NotImplemented`] when more than one product is requested
    /// - [`SfsError::HttpNotFound`] when the product is not registered
    /// - [`SfsError::ServiceInvalidResponse`] when a response fails schema
    ///   validation
    /// - retriable transport failures, once the retry budget is exhausted
    pub async fn get_latest_download_info(
        &self,
        requests: &[ProductRequest],
        params: &RequestParams,
    ) -> Result<Vec<Content>> {
        let result = self.latest_download_info(requests, params).await;
        self.finish("GetLatestDownloadInfo", result)
    }

    /// Fetch download info for an explicitly pinned product version.
    ///
    /// Phase 1 confirms the version exists (a missing version surfaces as
    /// [`SfsError::HttpNotFound`]); phase 2 fetches the file listing.
    pub async fn get_download_info(
        &self,
        product: &str,
        version: &str,
        params: &RequestParams,
    ) -> Result<Content> {
        let result = self.pinned_download_info(product, version, params).await;
        self.finish("GetDownloadInfo", result)
    }

    /// Resolve the latest version of the requested app products and fetch
    /// their download info, including update id, prerequisites, and
    /// per-file applicability details.
    pub async fn get_latest_app_download_info(
        &self,
        requests: &[ProductRequest],
        params: &RequestParams,
    ) -> Result<Vec<AppContent>> {
        let result = self.latest_app_download_info(requests, params).await;
        self.finish("GetLatestAppDownloadInfo", result)
    }

    /// Boundary logging: every failure is logged before it crosses back to
    /// the caller.
    fn finish<T>(&self, operation: &str, result: Result<T>) -> Result<T> {
        if let Err(err) = &result {
            log_error!(self.log, "{operation} failed: {err}");
        }
        result
    }

    async fn latest_download_info(
        &self,
        requests: &[ProductRequest],
        params: &RequestParams,
    ) -> Result<Vec<Content>> {
        let request = validate_single_request(requests)?;
        let mut correlation = correlation_context(params)?;

        let content_id = self.resolve_latest_version(request, &mut correlation).await?;
        let file_entities = self
            .generate_download_info(&content_id.name, &content_id.version, &mut correlation)
            .await?;

        let mut files = Vec::with_capacity(file_entities.len());
        for file in file_entities {
            match file {
                FileEntity::Generic(file) => files.push(File::from_entity(file)?),
                FileEntity::App(file) => {
                    return Err(SfsError::ServiceInvalidResponse(format!(
                        "Response contains app file '{}' for a generic product",
                        file.file_moniker
                    )))
                }
            }
        }

        let content = Content::new(
            ContentId::from_entity(content_id)?,
            correlation.latest(),
            files,
        )?;
        Ok(vec![content])
    }

    async fn pinned_download_info(
        &self,
        product: &str,
        version: &str,
        params: &RequestParams,
    ) -> Result<Content> {
        if product.is_empty() {
            return Err(SfsError::InvalidArgument(
                "product cannot be empty".to_string(),
            ));
        }
        if version.is_empty() {
            return Err(SfsError::InvalidArgument(
                "version cannot be empty".to_string(),
            ));
        }
        let mut correlation = correlation_context(params)?;

        let url = self.url_builder.specific_version_url(product, version)?;
        let body = self.connection.get(&url, &mut correlation).await?;
        let value = entity::parse_json_body(&body)?;
        let version_entity = entity::parse_specific_version(&value)?;

        let file_entities = self
            .generate_download_info(product, version, &mut correlation)
            .await?;
        let mut files = Vec::with_capacity(file_entities.len());
        for file in file_entities {
            match file {
                FileEntity::Generic(file) => files.push(File::from_entity(file)?),
                FileEntity::App(file) => {
                    return Err(SfsError::ServiceInvalidResponse(format!(
                        "Response contains app file '{}' for a generic product",
                        file.file_moniker
                    )))
                }
            }
        }

        Content::new(
            ContentId::from_entity(version_entity.content_id)?,
            correlation.latest(),
            files,
        )
    }

    async fn latest_app_download_info(
        &self,
        requests: &[ProductRequest],
        params: &RequestParams,
    ) -> Result<Vec<AppContent>> {
        let request = validate_single_request(requests)?;
        let mut correlation = correlation_context(params)?;

        let url = self.url_builder.latest_version_url(request.product())?;
        let body = serde_json::json!({
            "TargetingAttributes": request.targeting_attributes()
        });
        let response = self.connection.post(&url, body, &mut correlation).await?;
        let value = entity::parse_json_body(&response)?;

        let app = match VersionEntity::from_json(&value)? {
            VersionEntity::App(app) => app,
            VersionEntity::Generic(_) => {
                return Err(SfsError::ServiceInvalidResponse(format!(
                    "Response does not contain an app version entry for '{}'",
                    request.product()
                )))
            }
        };
        if app.content_id.name != request.product() {
            return Err(SfsError::ServiceInvalidResponse(format!(
                "Response is for product '{}', expected '{}'",
                app.content_id.name,
                request.product()
            )));
        }

        let file_entities = self
            .generate_download_info(&app.content_id.name, &app.content_id.version, &mut correlation)
            .await?;
        let mut files = Vec::with_capacity(file_entities.len());
        for file in file_entities {
            match file {
                FileEntity::App(file) => files.push(AppFile::from_entity(file)?),
                FileEntity::Generic(file) => {
                    return Err(SfsError::ServiceInvalidResponse(format!(
                        "Response contains non-app file '{}' for an app product",
                        file.file_id
                    )))
                }
            }
        }

        let mut prerequisites = Vec::with_capacity(app.prerequisites.len());
        for prerequisite in app.prerequisites {
            prerequisites.push(ContentId::from_entity(prerequisite.content_id)?);
        }

        let content = AppContent::new(
            ContentId::from_entity(app.content_id)?,
            correlation.latest(),
            app.update_id,
            prerequisites,
            files,
        )?;
        Ok(vec![content])
    }

    /// Phase 1 for the generic flow: the batched latest-version lookup.
    async fn resolve_latest_version(
        &self,
        request: &ProductRequest,
        correlation: &mut CorrelationContext,
    ) -> Result<ContentIdEntity> {
        let url = self.url_builder.latest_version_batch_url()?;
        let body = serde_json::to_value(std::slice::from_ref(request)).map_err(|err| {
            SfsError::Unexpected(format!("failed to serialize request body: {err}"))
        })?;
        let response = self.connection.post(&url, body, correlation).await?;
        let value = entity::parse_json_body(&response)?;
        let entities = entity::parse_version_entities(&value)?;
        let entity = entities
            .into_iter()
            .find(|entity| entity.content_id().name == request.product())
            .ok_or_else(|| {
                SfsError::ServiceInvalidResponse(format!(
                    "Response does not contain the requested product '{}'",
                    request.product()
                ))
            })?;
        Ok(entity.into_content_id())
    }

    /// Phase 2: the file listing for a resolved version.
    async fn generate_download_info(
        &self,
        product: &str,
        version: &str,
        correlation: &mut CorrelationContext,
    ) -> Result<Vec<FileEntity>> {
        let url = self.url_builder.download_info_url(product, version)?;
        let response = self
            .connection
            .post(&url, serde_json::json!({}), correlation)
            .await?;
        let value = entity::parse_json_body(&response)?;
        entity::parse_file_entities(&value)
    }
}

fn validate_single_request(requests: &[ProductRequest]) -> Result<&ProductRequest> {
    if requests.is_empty() {
        return Err(SfsError::InvalidArgument(
            "productRequests cannot be empty".to_string(),
        ));
    }
    if requests.len() > 1 {
        return Err(SfsError::NotImplemented(
            "There cannot be more than 1 productRequest at the moment".to_string(),
        ));
    }
    let request = &requests[0];
    if request.product().is_empty() {
        return Err(SfsError::InvalidArgument(
            "product cannot be empty".to_string(),
        ));
    }
    Ok(request)
}

fn correlation_context(params: &RequestParams) -> Result<CorrelationContext> {
    let mut context = CorrelationContext::new();
    if let Some(base) = &params.base_correlation_vector {
        context.set_base(base)?;
    }
    Ok(context)
}

//! The search cluster client

use eswrap_core::{Config, Result, ResultExt};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::info;

use crate::decoder::{JsonDecoder, ResponseDecoder};
use crate::dispatch::dispatch;
use crate::error::ClientError;
use crate::request::PendingRequest;
use crate::transport::{HeaderInjector, ReqwestTransport, Transport};

/// Client for one search cluster
///
/// Cheap to clone; clones share the transport and its connection pool.
#[derive(Clone)]
pub struct EsClient {
    transport: Arc<dyn Transport>,
    injectors: Vec<Arc<dyn HeaderInjector>>,
}

impl EsClient {
    /// Creates a client backed by a [`ReqwestTransport`]
    pub fn new(config: &Config) -> Result<Self> {
        let transport = ReqwestTransport::new(&config.client)?;
        Ok(Self::with_transport(Arc::new(transport)))
    }

    /// Creates a client and registers the configured stored scripts when
    /// `scripts.register_on_startup` is set
    pub async fn connect(config: &Config) -> Result<Self> {
        let client = Self::new(config)?;
        if config.scripts.register_on_startup && !config.scripts.stored.is_empty() {
            let registered = client
                .register_scripts(&config.scripts.stored)
                .await
                .context("Failed to register stored scripts")?;
            info!("Registered {registered} stored scripts");
        }
        Ok(client)
    }

    /// Creates a client on top of any transport
    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            injectors: Vec::new(),
        }
    }

    /// Adds an injector whose headers are applied to every request
    pub fn with_header_injector(mut self, injector: Arc<dyn HeaderInjector>) -> Self {
        self.injectors.push(injector);
        self
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Executes `request` once, decoding a 2xx body with `decoder`
    pub async fn send<E, D>(
        &self,
        mut request: PendingRequest,
        decoder: D,
    ) -> std::result::Result<D::Output, ClientError<E>>
    where
        E: DeserializeOwned,
        D: ResponseDecoder,
    {
        for injector in &self.injectors {
            injector.inject(request.headers_mut());
        }
        dispatch(self.transport.as_ref(), request, decoder).await
    }

    /// Executes `request` once, decoding a 2xx body as JSON into `T`
    pub async fn send_json<T, E>(
        &self,
        request: PendingRequest,
    ) -> std::result::Result<T, ClientError<E>>
    where
        T: DeserializeOwned,
        E: DeserializeOwned,
    {
        self.send(request, JsonDecoder::<T>::new()).await
    }
}

/// Path segments for an index-scoped endpoint; an empty index targets all
pub(crate) fn index_path(index: &str, endpoint: &str) -> Vec<String> {
    if index.is_empty() {
        vec![endpoint.to_string()]
    } else {
        vec![index.to_string(), endpoint.to_string()]
    }
}

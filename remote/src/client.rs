use std::{future::Future, time::Duration};

use tracing::{debug, warn};
use url::Url;

use tower_common::{
    parse_setting, ActionError, ClientConfig, ControllerEndpoint, RequestError, SettingName,
};

use crate::store::BaseUrlStore;

/// One logical call against the controller. Every call is a plain `GET`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerRequest {
    Read(SettingName),
    Write(SettingName, u32),
    Blink,
}

impl ControllerRequest {
    pub fn resolve(&self, endpoint: &ControllerEndpoint) -> Result<Url, RequestError> {
        match *self {
            Self::Read(name) => endpoint.read_url(name),
            Self::Write(name, value) => endpoint.write_url(name, value),
            Self::Blink => endpoint.blink_url(),
        }
    }
}

/// Transport seam between the synchronizer/tracker and the controller.
pub trait ControllerApi: Clone + Send + Sync + 'static {
    /// Issues the request and returns the raw success body.
    fn call(
        &self,
        request: ControllerRequest,
    ) -> impl Future<Output = Result<String, RequestError>> + Send;

    fn read_setting(
        &self,
        name: SettingName,
    ) -> impl Future<Output = Result<u32, ActionError>> + Send {
        async move {
            let body = self.call(ControllerRequest::Read(name)).await?;
            Ok(parse_setting(&body, name)?)
        }
    }

    fn write_setting(
        &self,
        name: SettingName,
        value: u32,
    ) -> impl Future<Output = Result<(), RequestError>> + Send {
        async move {
            self.call(ControllerRequest::Write(name, value)).await?;
            Ok(())
        }
    }

    fn trigger_blink(&self) -> impl Future<Output = Result<(), RequestError>> + Send {
        async move {
            self.call(ControllerRequest::Blink).await?;
            Ok(())
        }
    }
}

/// HTTP implementation backed by `reqwest`.
///
/// The base URL is read from the store each time a request is built, so a
/// change only affects requests issued after it.
#[derive(Clone)]
pub struct ControllerClient {
    http: reqwest::Client,
    store: BaseUrlStore,
    timeout: Duration,
}

impl ControllerClient {
    pub fn new(store: BaseUrlStore, config: &ClientConfig) -> Result<Self, RequestError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|err| RequestError::Transport(err.to_string()))?;
        Ok(Self {
            http,
            store,
            timeout: Duration::from_millis(config.request_timeout_ms),
        })
    }
}

impl ControllerApi for ControllerClient {
    async fn call(&self, request: ControllerRequest) -> Result<String, RequestError> {
        let endpoint = self.store.get().await;
        let url = request.resolve(&endpoint)?;
        debug!(%url, "controller request");

        let response = self
            .http
            .get(url.clone())
            .timeout(self.timeout)
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        let body = response.text().await.map_err(classify)?;

        if !status.is_success() {
            warn!(%url, status = status.as_u16(), "controller rejected request");
            return Err(RequestError::controller(status.as_u16(), &body));
        }

        Ok(body)
    }
}

fn classify(err: reqwest::Error) -> RequestError {
    if err.is_timeout() {
        RequestError::Timeout
    } else {
        warn!("controller transport error: {err}");
        RequestError::Transport(err.to_string())
    }
}

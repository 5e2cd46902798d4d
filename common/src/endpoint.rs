use serde::{Deserialize, Serialize};
use url::Url;

use crate::{
    error::RequestError,
    types::SettingName,
    wire::{DEFAULT_BASE_URL, PATH_BLINK, PATH_CONFIG, QUERY_NAME, QUERY_VALUE},
};

/// Base URL of the controller as the user entered it.
///
/// The empty string means "not configured yet", which is reported separately
/// from a value that does not parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ControllerEndpoint(String);

impl Default for ControllerEndpoint {
    fn default() -> Self {
        Self(DEFAULT_BASE_URL.to_string())
    }
}

impl ControllerEndpoint {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into().trim().to_string())
    }

    pub fn unconfigured() -> Self {
        Self(String::new())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_configured(&self) -> bool {
        !self.0.is_empty()
    }

    pub fn base(&self) -> Result<Url, RequestError> {
        if !self.is_configured() {
            return Err(RequestError::Unconfigured);
        }
        let url = Url::parse(&self.0).map_err(|_| self.invalid())?;
        if url.cannot_be_a_base() {
            return Err(self.invalid());
        }
        Ok(url)
    }

    /// Resolves an absolute `path` against the base and appends `query` in
    /// order. Any path prefix on the base is replaced, as in standard URL
    /// resolution.
    pub fn resolve(&self, path: &str, query: &[(&str, String)]) -> Result<Url, RequestError> {
        let mut url = self.base()?.join(path).map_err(|_| self.invalid())?;
        url.set_query(None);
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    pub fn read_url(&self, name: SettingName) -> Result<Url, RequestError> {
        self.resolve(PATH_CONFIG, &[(QUERY_NAME, name.as_str().to_string())])
    }

    pub fn write_url(&self, name: SettingName, value: u32) -> Result<Url, RequestError> {
        self.resolve(
            PATH_CONFIG,
            &[
                (QUERY_NAME, name.as_str().to_string()),
                (QUERY_VALUE, value.to_string()),
            ],
        )
    }

    pub fn blink_url(&self) -> Result<Url, RequestError> {
        self.resolve(PATH_BLINK, &[])
    }

    fn invalid(&self) -> RequestError {
        RequestError::InvalidEndpoint {
            base: self.0.clone(),
        }
    }
}

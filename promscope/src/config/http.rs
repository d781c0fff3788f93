//! HTTP client configuration
//!
//! A YAML file describing how to reach a protected target: authentication,
//! TLS trust, proxying, redirects and extra request headers. Loading it
//! produces an [`HttpTransport`], the client every scrape request is sent
//! through.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use reqwest::{
    RequestBuilder,
    header::{HeaderMap, HeaderName, HeaderValue},
    redirect,
};
use rustc_hash::FxHashMap;
use serde::Deserialize;
use tracing::debug;

/// Errors produced by [`HttpClientConfig`]
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Error reading a configuration or secret file
    #[error("Failed to read {path:?}: {source}")]
    Read {
        /// File path
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: Box<io::Error>,
    },
    /// Error for a serde [`serde_yaml`].
    #[error("Failed to deserialize yaml: {0}")]
    SerdeYaml(#[from] serde_yaml::Error),
    /// Two options that exclude each other were both set
    #[error("At most one of {0} may be configured")]
    Conflicting(&'static str),
    /// An extra header has an invalid name or value
    #[error("Invalid header {0:?}")]
    InvalidHeader(String),
    /// The client could not be built from the configuration
    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
/// Credentials for HTTP basic authentication
pub struct BasicAuth {
    /// The user name
    pub username: String,
    /// The password
    pub password: Option<String>,
    /// A file holding the password
    pub password_file: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
/// TLS trust settings
pub struct TlsConfig {
    /// A PEM file of additional root certificates
    pub ca_file: Option<PathBuf>,
    /// Disable verification of the target's certificate
    #[serde(default)]
    pub insecure_skip_verify: bool,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
#[serde(rename_all = "snake_case")]
/// Configuration of the client used to scrape a target
pub struct HttpClientConfig {
    /// HTTP basic authentication
    pub basic_auth: Option<BasicAuth>,
    /// A bearer token sent in the `Authorization` header
    pub bearer_token: Option<String>,
    /// A file holding the bearer token
    pub bearer_token_file: Option<PathBuf>,
    /// TLS trust settings
    pub tls_config: Option<TlsConfig>,
    /// Proxy all requests through this URL
    pub proxy_url: Option<String>,
    /// Whether to follow redirects, defaults to true
    #[serde(default = "default_follow_redirects")]
    pub follow_redirects: bool,
    /// Extra headers sent with every request
    #[serde(default)]
    pub headers: FxHashMap<String, String>,
}

fn default_follow_redirects() -> bool {
    true
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            basic_auth: None,
            bearer_token: None,
            bearer_token_file: None,
            tls_config: None,
            proxy_url: None,
            follow_redirects: default_follow_redirects(),
            headers: FxHashMap::default(),
        }
    }
}

/// Credentials attached to every request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Auth {
    /// HTTP basic authentication
    Basic {
        /// The user name
        username: String,
        /// The password, if any
        password: Option<String>,
    },
    /// Bearer token authentication
    Bearer(String),
}

/// A client and the credentials to present with each request
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
    auth: Option<Auth>,
}

impl HttpTransport {
    /// Start a GET request to `url`, credentials attached
    #[must_use]
    pub fn get(&self, url: &str) -> RequestBuilder {
        let request = self.client.get(url);
        match &self.auth {
            Some(Auth::Basic { username, password }) => {
                request.basic_auth(username, password.as_deref())
            }
            Some(Auth::Bearer(token)) => request.bearer_auth(token),
            None => request,
        }
    }
}

impl HttpClientConfig {
    /// Load a configuration from the YAML file at `path`
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or does not hold a valid
    /// configuration.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let contents = read(path)?;
        let config: Self = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject options that exclude each other
    ///
    /// # Errors
    ///
    /// Returns [`Error::Conflicting`] naming the offending options.
    pub fn validate(&self) -> Result<(), Error> {
        let has_bearer = self.bearer_token.is_some() || self.bearer_token_file.is_some();
        if self.basic_auth.is_some() && has_bearer {
            return Err(Error::Conflicting("basic_auth and bearer_token"));
        }
        if self.bearer_token.is_some() && self.bearer_token_file.is_some() {
            return Err(Error::Conflicting("bearer_token and bearer_token_file"));
        }
        if self
            .basic_auth
            .as_ref()
            .is_some_and(|basic| basic.password.is_some() && basic.password_file.is_some())
        {
            return Err(Error::Conflicting("password and password_file"));
        }
        Ok(())
    }

    /// Build the transport described by this configuration. Secret files
    /// are read here.
    ///
    /// # Errors
    ///
    /// Fails if the configuration is inconsistent, a referenced file cannot
    /// be read, or the client cannot be built.
    pub fn into_transport(self) -> Result<HttpTransport, Error> {
        self.validate()?;

        let mut headers = HeaderMap::new();
        for (name, value) in &self.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| Error::InvalidHeader(name.clone()))?;
            let header_value =
                HeaderValue::from_str(value).map_err(|_| Error::InvalidHeader(name.clone()))?;
            headers.insert(header_name, header_value);
        }

        let mut builder = reqwest::Client::builder()
            .default_headers(headers)
            .redirect(if self.follow_redirects {
                redirect::Policy::default()
            } else {
                redirect::Policy::none()
            });
        if let Some(tls) = &self.tls_config {
            if let Some(ca_file) = &tls.ca_file {
                let pem = fs::read(ca_file).map_err(|source| Error::Read {
                    path: ca_file.clone(),
                    source: Box::new(source),
                })?;
                builder = builder.add_root_certificate(reqwest::Certificate::from_pem(&pem)?);
            }
            builder = builder.danger_accept_invalid_certs(tls.insecure_skip_verify);
        }
        if let Some(proxy_url) = &self.proxy_url {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
        }

        let auth = match (&self.basic_auth, &self.bearer_token, &self.bearer_token_file) {
            (Some(basic), _, _) => {
                let password = match (&basic.password, &basic.password_file) {
                    (Some(password), _) => Some(password.clone()),
                    (None, Some(file)) => Some(read(file)?.trim().to_string()),
                    (None, None) => None,
                };
                Some(Auth::Basic {
                    username: basic.username.clone(),
                    password,
                })
            }
            (None, Some(token), _) => Some(Auth::Bearer(token.clone())),
            (None, None, Some(file)) => Some(Auth::Bearer(read(file)?.trim().to_string())),
            (None, None, None) => None,
        };
        debug!(
            auth = auth.is_some(),
            proxy = self.proxy_url.is_some(),
            extra_headers = self.headers.len(),
            "built HTTP transport"
        );

        Ok(HttpTransport {
            client: builder.build()?,
            auth,
        })
    }
}

fn read(path: &Path) -> Result<String, Error> {
    fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source: Box::new(source),
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use warp::Filter;

    fn yaml_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn full_config_deserializes() {
        let contents = r"
basic_auth:
  username: scraper
  password: hunter2
tls_config:
  insecure_skip_verify: true
proxy_url: http://proxy:3128
follow_redirects: false
headers:
  X-Scope-OrgID: tenant-1
";
        let config: HttpClientConfig = serde_yaml::from_str(contents).unwrap();
        assert_eq!(
            config.basic_auth,
            Some(BasicAuth {
                username: "scraper".to_string(),
                password: Some("hunter2".to_string()),
                password_file: None,
            })
        );
        assert!(config.tls_config.unwrap().insecure_skip_verify);
        assert!(!config.follow_redirects);
        assert_eq!(config.headers["X-Scope-OrgID"], "tenant-1");
    }

    #[test]
    fn redirects_are_followed_by_default() {
        let config: HttpClientConfig = serde_yaml::from_str("bearer_token: abc").unwrap();
        assert!(config.follow_redirects);
        let empty: HttpClientConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(empty, HttpClientConfig::default());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let file = yaml_file("bearer_tokn: abc\n");
        assert!(matches!(
            HttpClientConfig::load(file.path()),
            Err(Error::SerdeYaml(_))
        ));
    }

    #[test]
    fn conflicting_options_are_rejected() {
        let file = yaml_file("bearer_token: abc\nbearer_token_file: /tmp/token\n");
        assert!(matches!(
            HttpClientConfig::load(file.path()),
            Err(Error::Conflicting(_))
        ));

        let config = HttpClientConfig {
            basic_auth: Some(BasicAuth {
                username: "u".to_string(),
                password: None,
                password_file: None,
            }),
            bearer_token: Some("t".to_string()),
            ..HttpClientConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::Conflicting(_))));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            HttpClientConfig::load(&dir.path().join("http.yml")),
            Err(Error::Read { .. })
        ));
    }

    #[test]
    fn invalid_header_is_rejected() {
        let config = HttpClientConfig {
            headers: [("bad header".to_string(), "v".to_string())]
                .into_iter()
                .collect(),
            ..HttpClientConfig::default()
        };
        assert!(matches!(
            config.into_transport(),
            Err(Error::InvalidHeader(_))
        ));
    }

    async fn echo_authorization() -> String {
        let route = warp::path("metrics")
            .and(warp::header::optional::<String>("authorization"))
            .and(warp::header::optional::<String>("x-scope-orgid"))
            .map(|auth: Option<String>, org: Option<String>| {
                format!("{}|{}", auth.unwrap_or_default(), org.unwrap_or_default())
            });
        let (addr, serve_fut) = warp::serve(route).bind_ephemeral(([127, 0, 0, 1], 0));
        let _server_handle = tokio::spawn(serve_fut);
        format!("http://{addr}/metrics")
    }

    #[tokio::test]
    async fn bearer_token_file_is_presented() {
        let uri = echo_authorization().await;
        let token = yaml_file("s3cr3t\n");
        let config = HttpClientConfig {
            bearer_token_file: Some(token.path().to_path_buf()),
            headers: [("X-Scope-OrgID".to_string(), "tenant-1".to_string())]
                .into_iter()
                .collect(),
            ..HttpClientConfig::default()
        };

        let transport = config.into_transport().unwrap();
        let body = transport.get(&uri).send().await.unwrap().text().await.unwrap();
        assert_eq!(body, "Bearer s3cr3t|tenant-1");
    }

    #[tokio::test]
    async fn basic_auth_is_presented() {
        let uri = echo_authorization().await;
        let config = HttpClientConfig {
            basic_auth: Some(BasicAuth {
                username: "user".to_string(),
                password: Some("pass".to_string()),
                password_file: None,
            }),
            ..HttpClientConfig::default()
        };

        let transport = config.into_transport().unwrap();
        let body = transport.get(&uri).send().await.unwrap().text().await.unwrap();
        // base64("user:pass")
        assert_eq!(body, "Basic dXNlcjpwYXNz|");
    }
}

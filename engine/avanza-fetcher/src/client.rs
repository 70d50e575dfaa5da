//! HTTP client for the Avanza account API

use crate::config::AvanzaConfig;
use crate::error::{FetcherError, Result};
use crate::models::*;
use crate::provider::AccountDataProvider;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, COOKIE};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;
use tokio::sync::RwLock;
use totp_rs::{Algorithm, Secret, TOTP};
use tracing::{debug, info};

const CREDENTIALS_PATH: &str = "/_api/authentication/sessions/usercredentials";
const TOTP_PATH: &str = "/_api/authentication/sessions/totp";
const SECURITY_TOKEN_HEADER: &str = "x-securitytoken";
const AUTHENTICATION_SESSION_HEADER: &str = "x-authenticationsession";

/// Avanza API client holding the current login session
pub struct AvanzaClient {
    config: AvanzaConfig,
    client: Client,
    session: RwLock<Option<Session>>,
}

impl AvanzaClient {
    /// Create a new client; no network traffic happens until `authenticate`
    pub fn new(config: AvanzaConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(concat!("avanza-mqtt/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { config, client, session: RwLock::new(None) })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Current one-time code for the configured secret
    pub fn totp_code(&self) -> Result<String> {
        totp_generator(&self.config.secret)?
            .generate_current()
            .map_err(|e| FetcherError::Totp(e.to_string()))
    }

    /// Whether a login session is held
    pub async fn is_authenticated(&self) -> bool {
        self.session.read().await.is_some()
    }

    async fn session_headers(&self) -> Result<HeaderMap> {
        let session = self.session.read().await;
        let session = session.as_ref().ok_or(FetcherError::NotAuthenticated)?;

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHENTICATION_SESSION_HEADER,
            header_value(&session.authentication_session)?,
        );
        headers.insert(SECURITY_TOKEN_HEADER, header_value(&session.security_token)?);
        Ok(headers)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let headers = self.session_headers().await?;
        debug!("GET {}", path);

        let response = self.client.get(self.url(path)).headers(headers).send().await?;
        let status = response.status();

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                *self.session.write().await = None;
                return Err(FetcherError::SessionExpired);
            }
            StatusCode::TOO_MANY_REQUESTS => {
                return Err(FetcherError::RateLimited { endpoint: path.to_string() });
            }
            _ if !status.is_success() => {
                return Err(FetcherError::Status {
                    endpoint: path.to_string(),
                    status: status.as_u16(),
                });
            }
            _ => {}
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl AccountDataProvider for AvanzaClient {
    async fn authenticate(&self) -> Result<()> {
        let response = self
            .client
            .post(self.url(CREDENTIALS_PATH))
            .json(&json!({
                "maxInactiveMinutes": self.config.max_inactive_minutes,
                "username": self.config.username,
                "password": self.config.password,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FetcherError::AuthenticationFailed(format!(
                "credentials rejected with status {}",
                response.status()
            )));
        }

        let credentials: CredentialsResponse = serde_json::from_str(&response.text().await?)?;
        let two_factor = credentials.two_factor_login.ok_or_else(|| {
            FetcherError::AuthenticationFailed("no two-factor login offered".to_string())
        })?;

        if !two_factor.method.eq_ignore_ascii_case("TOTP") {
            return Err(FetcherError::AuthenticationFailed(format!(
                "unsupported two-factor method {}",
                two_factor.method
            )));
        }

        let response = self
            .client
            .post(self.url(TOTP_PATH))
            .header(COOKIE, format!("AZAMFATRANSACTION={}", two_factor.transaction_id))
            .json(&json!({ "method": "TOTP", "totpCode": self.totp_code()? }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FetcherError::AuthenticationFailed(format!(
                "one-time code rejected with status {}",
                response.status()
            )));
        }

        let security_token = response
            .headers()
            .get(SECURITY_TOKEN_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| {
                FetcherError::AuthenticationFailed("missing security token".to_string())
            })?;

        let totp: TotpResponse = serde_json::from_str(&response.text().await?)?;

        info!(
            customer_id = totp.customer_id.as_deref().unwrap_or("unknown"),
            "Authenticated against {}", self.config.base_url
        );

        *self.session.write().await = Some(Session {
            authentication_session: totp.authentication_session,
            security_token,
        });

        Ok(())
    }

    async fn overview(&self) -> Result<Overview> {
        self.get_json("/_mobile/account/overview").await
    }

    async fn account_overview(&self, account_id: &str) -> Result<AccountOverview> {
        self.get_json(&format!("/_mobile/account/{}/overview", account_id)).await
    }

    async fn positions(&self) -> Result<Positions> {
        self.get_json("/_mobile/account/positions").await
    }

    async fn watchlists(&self) -> Result<Vec<Watchlist>> {
        self.get_json("/_mobile/usercontent/watchlist").await
    }

    async fn orderbooks(&self, ids: &[String]) -> Result<Vec<Orderbook>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.get_json(&format!("/_mobile/market/orderbooklist/{}", ids.join(","))).await
    }

    async fn instrument(&self, instrument_type: &str, id: &str) -> Result<Instrument> {
        self.get_json(&format!("/_mobile/market/{}/{}", instrument_type.to_lowercase(), id)).await
    }
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| FetcherError::AuthenticationFailed(format!("invalid session header: {}", e)))
}

/// Build a 6-digit, 30-second SHA1 generator from a base32 secret
pub fn totp_generator(secret: &str) -> Result<TOTP> {
    let normalized: String =
        secret.chars().filter(|c| !c.is_whitespace()).collect::<String>().to_uppercase();
    let bytes = Secret::Encoded(normalized)
        .to_bytes()
        .map_err(|e| FetcherError::Totp(format!("invalid secret: {:?}", e)))?;

    Ok(TOTP::new_unchecked(Algorithm::SHA1, 6, 1, 30, bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    // RFC 6238 SHA1 test secret "12345678901234567890"
    const RFC_SECRET: &str = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ";

    #[test]
    fn test_totp_matches_rfc_vectors() {
        let totp = totp_generator(RFC_SECRET).unwrap();
        assert_eq!(totp.generate(59), "287082");
        assert_eq!(totp.generate(1111111109), "081804");
        assert_eq!(totp.generate(1234567890), "005924");
    }

    #[test]
    fn test_totp_secret_is_normalized() {
        let spaced = "gezd gnbv gy3t qojq gezd gnbv gy3t qojq";
        let totp = totp_generator(spaced).unwrap();
        assert_eq!(totp.generate(59), "287082");
    }

    #[test]
    fn test_invalid_secret_is_rejected() {
        let err = totp_generator("not base32!").unwrap_err();
        assert!(err.is_auth_failure());
    }

    #[test]
    fn test_url_building() {
        let client = AvanzaClient::new(AvanzaConfig {
            base_url: "https://example.test/".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            client.url("/_mobile/account/overview"),
            "https://example.test/_mobile/account/overview"
        );
    }

    #[tokio::test]
    async fn test_data_calls_require_login() {
        let client = AvanzaClient::new(AvanzaConfig::default()).unwrap();
        assert!(!client.is_authenticated().await);

        let err = client.overview().await.unwrap_err();
        assert!(matches!(err, FetcherError::NotAuthenticated));
        assert!(err.needs_login());
    }

    #[tokio::test]
    async fn test_empty_orderbook_list_skips_request() {
        let client = AvanzaClient::new(AvanzaConfig::default()).unwrap();
        let orderbooks = client.orderbooks(&[]).await.unwrap();
        assert!(orderbooks.is_empty());
    }
}

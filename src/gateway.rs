use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderValue;
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info_span, Instrument};
use uuid::Uuid;

use crate::error::GatewayError;
use crate::models::{Grant, MatchResult, NewProfile, PacketReceipt, PacketRequest, Profile};

/// The remote service that owns profiles, grants and match scoring.
#[async_trait]
pub trait GrantGateway: Send + Sync {
    async fn create_profile(&self, profile: &NewProfile) -> Result<Profile, GatewayError>;
    async fn get_profile(&self, profile_id: &str) -> Result<Profile, GatewayError>;
    async fn get_grant(&self, grant_id: &str) -> Result<Grant, GatewayError>;
    /// Recomputes matches and returns them in rank order.
    async fn refresh_matches(
        &self,
        profile_id: &str,
        limit: usize,
    ) -> Result<Vec<MatchResult>, GatewayError>;
    async fn request_packet(&self, request: &PacketRequest) -> Result<PacketReceipt, GatewayError>;
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

pub struct HttpGateway {
    base_url: Url,
    client: reqwest::Client,
}

impl HttpGateway {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, GatewayError> {
        let parsed = Url::parse(base_url)
            .map_err(|err| GatewayError::InvalidBaseUrl(format!("{base_url}: {err}")))?;
        if parsed.cannot_be_a_base() {
            return Err(GatewayError::InvalidBaseUrl(base_url.to_string()));
        }

        let client = reqwest::Client::builder()
            .user_agent(concat!("grant-match-client/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            base_url: parsed,
            client,
        })
    }

    /// Health check against `/ping`.
    pub async fn ping(&self) -> Result<(), GatewayError> {
        let _: serde_json::Value = self.send(self.request(Method::GET, &["ping"])).await?;
        Ok(())
    }

    /// Appends `segments` to the base path, percent-encoding each one so an
    /// id can never reach a different endpoint.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, segments: &[&str]) -> RequestBuilder {
        self.client.request(method, self.endpoint(segments))
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, GatewayError> {
        let request = builder.build()?;
        let request_id = Uuid::new_v4().to_string();
        let span = info_span!(
            "gateway",
            request_id = %request_id,
            method = %request.method(),
            path = request.url().path(),
            status = tracing::field::Empty,
        );

        async move {
            let mut request = request;
            if let Ok(value) = request_id.parse::<HeaderValue>() {
                request.headers_mut().insert("x-request-id", value);
            }

            let response = self.client.execute(request).await?;
            tracing::Span::current().record("status", response.status().as_u16());
            debug!("gateway responded");
            decode(response).await
        }
        .instrument(span)
        .await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, GatewayError> {
    let status = response.status();
    let body = response.text().await?;

    if status.is_success() {
        return Ok(serde_json::from_str(&body)?);
    }

    let message = error_message(status, &body);
    if status == StatusCode::NOT_FOUND {
        Err(GatewayError::NotFound(message))
    } else {
        Err(GatewayError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

/// Pulls the `detail` text out of an error body, falling back to the status line.
fn error_message(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            detail: serde_json::Value::String(detail),
        }) => detail,
        Ok(ErrorBody { detail }) => detail.to_string(),
        Err(_) if !body.trim().is_empty() => body.trim().to_string(),
        Err(_) => status
            .canonical_reason()
            .map(str::to_string)
            .unwrap_or_else(|| format!("HTTP {}", status.as_u16())),
    }
}

#[async_trait]
impl GrantGateway for HttpGateway {
    async fn create_profile(&self, profile: &NewProfile) -> Result<Profile, GatewayError> {
        self.send(self.request(Method::POST, &["profiles", ""]).json(profile))
            .await
    }

    async fn get_profile(&self, profile_id: &str) -> Result<Profile, GatewayError> {
        self.send(self.request(Method::GET, &["profiles", profile_id]))
            .await
    }

    async fn get_grant(&self, grant_id: &str) -> Result<Grant, GatewayError> {
        self.send(self.request(Method::GET, &["grants", grant_id]))
            .await
    }

    async fn refresh_matches(
        &self,
        profile_id: &str,
        limit: usize,
    ) -> Result<Vec<MatchResult>, GatewayError> {
        self.send(
            self.request(Method::POST, &["matches", "refresh", profile_id])
                .query(&[("limit", limit)]),
        )
        .await
    }

    async fn request_packet(&self, request: &PacketRequest) -> Result<PacketReceipt, GatewayError> {
        self.send(self.request(Method::POST, &["packets", "generate"]).json(request))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_prefers_detail_text() {
        let message = error_message(StatusCode::NOT_FOUND, r#"{"detail":"Grant not found"}"#);
        assert_eq!(message, "Grant not found");
    }

    #[test]
    fn error_message_renders_structured_detail() {
        let message = error_message(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"detail":[{"msg":"field required"}]}"#,
        );
        assert!(message.contains("field required"));
    }

    #[test]
    fn error_message_falls_back_to_status_reason() {
        assert_eq!(
            error_message(StatusCode::INTERNAL_SERVER_ERROR, ""),
            "Internal Server Error"
        );
        assert_eq!(error_message(StatusCode::BAD_GATEWAY, "upstream down"), "upstream down");
    }

    #[test]
    fn endpoints_join_base_url_with_or_without_trailing_slash() {
        for base in ["http://localhost:8000", "http://localhost:8000/"] {
            let gateway = HttpGateway::new(base, Duration::from_secs(5)).unwrap();
            assert_eq!(
                gateway.endpoint(&["profiles", ""]).as_str(),
                "http://localhost:8000/profiles/"
            );
        }

        let gateway = HttpGateway::new("http://api.local/v1/", Duration::from_secs(5)).unwrap();
        assert_eq!(
            gateway.endpoint(&["matches", "refresh", "p1"]).as_str(),
            "http://api.local/v1/matches/refresh/p1"
        );
    }

    #[test]
    fn identifiers_cannot_escape_their_path_segment() {
        let gateway = HttpGateway::new("http://localhost:8000", Duration::from_secs(5)).unwrap();

        let url = gateway.endpoint(&["grants", "../profiles/p1?x=1#top"]);

        assert_eq!(url.path_segments().unwrap().count(), 2);
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);
        assert!(url.path().starts_with("/grants/"));
    }

    #[test]
    fn rejects_unusable_base_url() {
        assert!(matches!(
            HttpGateway::new("not a url", Duration::from_secs(5)),
            Err(GatewayError::InvalidBaseUrl(_))
        ));
        assert!(matches!(
            HttpGateway::new("mailto:api@example.com", Duration::from_secs(5)),
            Err(GatewayError::InvalidBaseUrl(_))
        ));
    }
}

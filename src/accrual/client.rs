//! HTTP client for the accrual service

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::RETRY_AFTER;
use std::time::Duration;
use tracing::debug;

use super::{AccrualOracle, OracleError, OracleResponse, Verdict};

/// Accrual service client
///
/// One `GET <base>/api/orders/{number}` per query, bounded by the configured
/// request timeout.
pub struct HttpAccrualClient {
    client: reqwest::Client,
    base_url: String,
    default_retry_after: Duration,
}

impl HttpAccrualClient {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        default_retry_after: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: normalize_base_url(base_url),
            default_retry_after,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn order_url(&self, order_number: &str) -> String {
        format!("{}/api/orders/{}", self.base_url, order_number)
    }

    fn retry_after(&self, headers: &reqwest::header::HeaderMap) -> Duration {
        headers
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(self.default_retry_after)
    }
}

/// Accept bare `host:port` addresses and strip trailing slashes
fn normalize_base_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    }
}

#[async_trait]
impl AccrualOracle for HttpAccrualClient {
    async fn query(&self, order_number: &str) -> Result<Verdict, OracleError> {
        let response = self
            .client
            .get(self.order_url(order_number))
            .send()
            .await
            .map_err(|e| OracleError::Unavailable(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        debug!(order = %order_number, status = status.as_u16(), "Oracle answered");

        match status {
            StatusCode::OK => {
                let body: OracleResponse = response.json().await.map_err(|e| {
                    OracleError::Malformed(format!("Failed to parse response: {}", e))
                })?;
                body.into_verdict(order_number)
            }
            StatusCode::NO_CONTENT => Err(OracleError::NotRegistered),
            StatusCode::TOO_MANY_REQUESTS => Err(OracleError::RateLimited {
                retry_after: self.retry_after(response.headers()),
            }),
            s if s.is_server_error() => Err(OracleError::Unavailable(format!(
                "server error {}",
                s.as_u16()
            ))),
            s => Err(OracleError::UnexpectedStatus(s.as_u16())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::extract::Path;
    use axum::http::{HeaderMap, HeaderValue, StatusCode as AxumStatus};
    use axum::response::IntoResponse;
    use axum::routing::get;
    use rust_decimal::Decimal;

    async fn mock_order(Path(number): Path<String>) -> axum::response::Response {
        match number.as_str() {
            "12345678903" => (
                AxumStatus::OK,
                r#"{"order":"12345678903","status":"PROCESSED","accrual":500}"#,
            )
                .into_response(),
            "79927398713" => (
                AxumStatus::OK,
                r#"{"order":"79927398713","status":"PROCESSING"}"#,
            )
                .into_response(),
            "2377225624" => AxumStatus::NO_CONTENT.into_response(),
            "9278923470" => {
                let mut headers = HeaderMap::new();
                headers.insert("Retry-After", HeaderValue::from_static("7"));
                (AxumStatus::TOO_MANY_REQUESTS, headers, "No more than N requests per minute allowed")
                    .into_response()
            }
            "4561261212345467" => AxumStatus::TOO_MANY_REQUESTS.into_response(),
            "0" => AxumStatus::INTERNAL_SERVER_ERROR.into_response(),
            "18" => (AxumStatus::OK, "not json").into_response(),
            _ => AxumStatus::IM_A_TEAPOT.into_response(),
        }
    }

    async fn spawn_mock() -> String {
        let app = Router::new().route("/api/orders/{number}", get(mock_order));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn client(base: &str) -> HttpAccrualClient {
        HttpAccrualClient::new(base, Duration::from_secs(2), Duration::from_secs(60)).unwrap()
    }

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(normalize_base_url("localhost:8080"), "http://localhost:8080");
        assert_eq!(
            normalize_base_url("http://localhost:8080/"),
            "http://localhost:8080"
        );
        assert_eq!(normalize_base_url(" https://a.b "), "https://a.b");
    }

    #[tokio::test]
    async fn test_query_status_mapping() {
        let base = spawn_mock().await;
        let oracle = client(&base);

        assert_eq!(
            oracle.query("12345678903").await,
            Ok(Verdict::Processed {
                accrual: Decimal::new(500, 0)
            })
        );
        assert_eq!(oracle.query("79927398713").await, Ok(Verdict::Processing));
        assert_eq!(
            oracle.query("2377225624").await,
            Err(OracleError::NotRegistered)
        );
        assert_eq!(
            oracle.query("9278923470").await,
            Err(OracleError::RateLimited {
                retry_after: Duration::from_secs(7)
            })
        );
        assert_eq!(
            oracle.query("4561261212345467").await,
            Err(OracleError::RateLimited {
                retry_after: Duration::from_secs(60)
            })
        );
        assert!(matches!(
            oracle.query("0").await,
            Err(OracleError::Unavailable(_))
        ));
        assert!(matches!(
            oracle.query("18").await,
            Err(OracleError::Malformed(_))
        ));
        assert_eq!(
            oracle.query("26").await,
            Err(OracleError::UnexpectedStatus(418))
        );
    }

    #[tokio::test]
    async fn test_query_unreachable_is_transient() {
        // Bind then drop to get a port nobody listens on
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let oracle = client(&addr.to_string());
        let err = oracle.query("12345678903").await.unwrap_err();
        assert!(matches!(err, OracleError::Unavailable(_)));
        assert!(err.is_transient());
    }
}

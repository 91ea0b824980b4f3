//! Client for the location/transit service.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::Result;
use crate::payload::{PayloadError, field_f64, field_i64, field_str, parse_object};
use crate::service::{SharedSession, call_text, log_payload};
use crate::sql::validate_zip;

/// Transit score tool.
pub const GET_TRANSIT_SCORE: &str = "get_transit_score";

/// Transit accessibility for a ZIP code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitScore {
    pub zip_code: String,
    /// 0 to 100, higher is better served.
    pub transit_score: i64,
    /// Short rating label, e.g. "Excellent Transit".
    pub description: String,
    /// Nearby routes as reported by the service.
    pub summary: String,
    /// Latitude of the geocoded ZIP centre.
    pub lat: f64,
    /// Longitude of the geocoded ZIP centre.
    pub lon: f64,
}

impl TransitScore {
    /// Build from the service's object, failing if it reports an error.
    fn from_object(object: &Value, raw: &str) -> std::result::Result<Self, PayloadError> {
        if let Some(error) = object.get("error") {
            let reason = match error {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            return Err(PayloadError::new(reason, raw));
        }

        Ok(Self {
            zip_code: field_str(object, "zip_code"),
            transit_score: field_i64(object, "transit_score"),
            description: field_str(object, "description"),
            summary: field_str(object, "summary"),
            lat: field_f64(object, "lat"),
            lon: field_f64(object, "lon"),
        })
    }
}

/// Typed client for the `location` service.
#[derive(Clone)]
pub struct LocationClient {
    session: SharedSession,
}

impl LocationClient {
    /// Wrap a session.
    pub fn new(session: SharedSession) -> Self {
        Self { session }
    }

    /// The underlying session.
    pub fn session(&self) -> &SharedSession {
        &self.session
    }

    /// Transit score for a five-digit ZIP code.
    pub async fn get_transit_score(&self, zip_code: &str) -> Result<TransitScore> {
        let zip = validate_zip(zip_code)?;

        let text = call_text(
            self.session.as_ref(),
            GET_TRANSIT_SCORE,
            json!({ "zip_code": zip }),
        )
        .await?;

        let parsed = parse_object(&text)
            .and_then(|map| TransitScore::from_object(&Value::Object(map), &text));
        let mut score = log_payload(self.session.name(), GET_TRANSIT_SCORE, parsed)?;
        if score.zip_code.is_empty() {
            score.zip_code = zip.to_string();
        }
        Ok(score)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::error::ToolsError;
    use crate::mock::MockSession;

    fn client(session: MockSession) -> (LocationClient, Arc<MockSession>) {
        let session = Arc::new(session.connected());
        (LocationClient::new(session.clone()), session)
    }

    #[tokio::test]
    async fn test_get_transit_score() {
        let body = json!({
            "transit_score": 88,
            "description": "Excellent Transit",
            "summary": "Daily errands do not require a car.",
            "zip_code": "11215",
            "lat": 40.7128,
            "lon": -74.006,
            "status": "success"
        });
        let (client, session) = client(MockSession::new("location").respond_text(body.to_string()));

        let score = client.get_transit_score("11215").await.unwrap();
        assert_eq!(score.transit_score, 88);
        assert_eq!(score.description, "Excellent Transit");
        assert_eq!(score.lat, 40.7128);
        assert_eq!(score.lon, -74.006);
        assert_eq!(session.calls()[0].1, json!({"zip_code": "11215"}));
    }

    #[tokio::test]
    async fn test_error_object_becomes_payload_error() {
        let body = json!({"error": "ZIP code not found", "status": "error", "zip_code": "99999"});
        let (client, _) = client(MockSession::new("location").respond_text(body.to_string()));

        let err = client.get_transit_score("99999").await.unwrap_err();
        assert_eq!(err.to_string(), "ZIP code not found");
        assert!(err.raw_excerpt().unwrap().contains("99999"));
    }

    #[tokio::test]
    async fn test_missing_zip_filled_from_request() {
        let (client, _) = client(
            MockSession::new("location").respond_text(r#"{"transit_score": "41"}"#),
        );
        let score = client.get_transit_score("10001").await.unwrap();
        assert_eq!(score.zip_code, "10001");
        assert_eq!(score.transit_score, 41);
        assert_eq!(score.summary, "");
    }

    #[tokio::test]
    async fn test_non_object_is_payload_error() {
        let (client, _) = client(MockSession::new("location").respond_text("[1, 2]"));
        let err = client.get_transit_score("10001").await.unwrap_err();
        assert!(matches!(err, ToolsError::Payload(_)));
    }

    #[tokio::test]
    async fn test_bad_zip_is_rejected_locally() {
        let (client, session) = client(MockSession::new("location"));
        assert!(client.get_transit_score("1000").await.is_err());
        assert!(session.calls().is_empty());
    }
}

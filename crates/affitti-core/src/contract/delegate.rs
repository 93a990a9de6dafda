//! Contract extraction delegated to a remote chat-completion service.
//!
//! The service is asked for a flat JSON object over the canonical field set.
//! Whatever it returns is scored field by field; anything that is not a flat
//! object of scalars is rejected rather than repaired.

use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::{Duration, Instant};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{DelegateError, ExtractionError, Result};
use crate::models::config::{DelegateConfig, StrategyKind};
use crate::models::record::{ConfidenceReport, ExtractedRecord, FieldValue};

use super::{ContractExtractor, ExtractionResult};

const SYSTEM_PROMPT: &str = "You extract structured data from rental contracts, leases and \
student housing agreements written in any language.

Rules:
1. Use null for every field that is not present in the document.
2. Copy dates exactly as written in the document; do not convert them.
3. Write amounts as plain numbers, without currency symbols or thousands separators.
4. Treat equivalent terms as the same concept: tenant, guest, renter, lessee, student and \
occupant; landlord, lessor, provider and owner; rent, monthly payment and rental fee; \
deposit, security deposit, caution and bond.
5. Payment schedules may appear as tables, lists or prose; read all of them.";

/// Client for the remote extraction service.
#[derive(Debug, Clone)]
pub struct DelegateContractParser {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
    max_installments: u32,
}

impl DelegateContractParser {
    /// Create a parser from configuration, reading the API key from the
    /// environment variable named in `config.api_key_env`.
    pub fn from_config(config: &DelegateConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                DelegateError::NotConfigured(format!("{} is not set", config.api_key_env))
            })?;

        Self::with_api_key(config, api_key)
    }

    /// Create a parser with an explicit API key.
    pub fn with_api_key(config: &DelegateConfig, api_key: impl Into<String>) -> Result<Self> {
        if config.endpoint.trim().is_empty() {
            return Err(DelegateError::NotConfigured("endpoint is empty".to_string()).into());
        }

        let client = reqwest::Client::builder()
            .user_agent(concat!("affitti/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(DelegateError::Http)?;

        info!(endpoint = %config.endpoint, model = %config.model, "delegate extraction client initialized");

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key: api_key.into(),
            max_installments: config.max_installments.max(1),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send the contract text to the service and parse its answer.
    pub async fn request(&self, text: &str) -> Result<ExtractionResult> {
        let start = Instant::now();

        if text.trim().is_empty() {
            return Err(ExtractionError::EmptyInput.into());
        }

        info!(model = %self.model, "Extracting contract fields with delegate service");

        let user_prompt = user_prompt(text, self.max_installments);
        let body = ChatRequest {
            model: &self.model,
            temperature: 0.0,
            response_format: ResponseFormat {
                kind: "json_object",
            },
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &user_prompt,
                },
            ],
        };

        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(DelegateError::Http)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "delegate service returned an error");
            return Err(DelegateError::Server {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let payload = resp.text().await.map_err(DelegateError::Http)?;
        let completion: ChatResponse =
            serde_json::from_str(&payload).map_err(DelegateError::Json)?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(DelegateError::EmptyResponse)?;

        debug!(
            "Delegate raw response: {}",
            content.chars().take(500).collect::<String>()
        );

        let (record, confidence) = parse_content(&content, self.max_installments)?;

        info!(
            "Delegate extraction complete. Confidence: {:.1}% in {:?}",
            confidence.percent(),
            start.elapsed()
        );

        Ok(ExtractionResult {
            record,
            confidence,
            raw_matches: [("response".to_string(), content)].into_iter().collect(),
            strategy: StrategyKind::Delegate,
        })
    }
}

impl ContractExtractor for DelegateContractParser {
    async fn extract(&self, text: &str) -> Result<ExtractionResult> {
        self.request(text).await
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    response_format: ResponseFormat,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

fn user_prompt(text: &str, max_installments: u32) -> String {
    let mut shape = String::from(
        r#"{
  "guest_name": "full name of the tenant or guest",
  "birth_date": "date of birth as written",
  "birth_place": "place of birth",
  "fiscal_code": "fiscal code, tax ID or national ID",
  "residence_city": "current city of residence",
  "residence_address": "current street address",
  "accommodation_address": "address of the rented property",
  "university": "university or college name",
  "academic_year": "e.g. 2025/2026",
  "start_date": "lease start date as written",
  "end_date": "lease end date as written",
  "rent_total": 12360,
  "monthly_rent": 1030,
  "security_deposit": 250,
  "number_of_installments": 3,
"#,
    );
    for n in 1..=max_installments {
        shape.push_str(&format!(
            "  \"installment_{n}_amount\": null,\n  \"installment_{n}_date\": null,\n"
        ));
    }
    shape.push_str("  \"contract_type\": \"type of contract\",\n  \"provider\": \"landlord or company name\"\n}");

    format!(
        "Extract the contract data from this document:\n\n{text}\n\n\
         Answer with ONE flat JSON object using exactly these keys at the top level \
         (null when unknown, never an empty string):\n\n{shape}\n\n\
         Installments:\n\
         - List every installment found, numbered in order from 1, up to {max_installments}.\n\
         - Give both the amount and the due date of each installment.\n\
         - Set number_of_installments to the number of installments found.\n\n\
         Do not group keys under sections and do not add any text outside the JSON object."
    )
}

/// Parse the service's message content into a record and its confidence.
///
/// Every returned key is scored before missing canonical keys are added as
/// `null`, so the overall score is the mean over the service's own answer.
pub(crate) fn parse_content(
    content: &str,
    max_installments: u32,
) -> std::result::Result<(ExtractedRecord, ConfidenceReport), DelegateError> {
    let Value::Object(map) = serde_json::from_str::<Value>(content)? else {
        return Err(DelegateError::MalformedResponse(
            "expected a JSON object".to_string(),
        ));
    };

    let mut record = ExtractedRecord::default();
    let mut scores = BTreeMap::new();

    for (key, value) in map {
        let value = field_value(&key, value)?;
        scores.insert(key.clone(), u8::from(value.is_filled()));
        record.set(key, value);
    }

    let confidence = ConfidenceReport::from_scores(scores);
    record.fill_missing(max_installments);

    Ok((record, confidence))
}

fn field_value(key: &str, value: Value) -> std::result::Result<FieldValue, DelegateError> {
    match value {
        Value::Null => Ok(FieldValue::Null),
        Value::Bool(b) => Ok(FieldValue::Flag(b)),
        Value::String(s) => Ok(FieldValue::Text(s)),
        Value::Number(n) => {
            let raw = n.to_string();
            Decimal::from_str(&raw)
                .or_else(|_| Decimal::from_scientific(&raw))
                .map(FieldValue::Number)
                .map_err(|_| {
                    DelegateError::MalformedResponse(format!("{key}: number out of range: {raw}"))
                })
        }
        Value::Array(_) | Value::Object(_) => Err(DelegateError::MalformedResponse(format!(
            "{key}: nested values are not allowed"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AffittiError;
    use pretty_assertions::assert_eq;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Serve one HTTP response and hand back the request body.
    async fn serve_once(status: &'static str, body: String) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 4096];

            let request_body = loop {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break String::new();
                }
                buf.extend_from_slice(&chunk[..n]);

                let request = String::from_utf8_lossy(&buf).to_string();
                let Some(header_end) = request.find("\r\n\r\n") else {
                    continue;
                };
                let length = request[..header_end]
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if buf.len() >= header_end + 4 + length {
                    break String::from_utf8_lossy(&buf[header_end + 4..]).to_string();
                }
            };

            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            request_body
        });

        (format!("http://{addr}/v1/chat/completions"), handle)
    }

    fn completion(content: &str) -> String {
        serde_json::json!({
            "choices": [{ "message": { "role": "assistant", "content": content } }]
        })
        .to_string()
    }

    fn parser(endpoint: String) -> DelegateContractParser {
        let config = DelegateConfig {
            endpoint,
            timeout_secs: 5,
            max_installments: 4,
            ..Default::default()
        };
        DelegateContractParser::with_api_key(&config, "test-key").unwrap()
    }

    #[test]
    fn test_parse_content_scores_every_returned_field() {
        let content = r#"{"guest_name": "MARIO ROSSI", "rent_total": 12360, "end_date": null, "provider": ""}"#;

        let (record, confidence) = parse_content(content, 3).unwrap();

        assert_eq!(confidence.field_scores.len(), 4);
        assert_eq!(confidence.overall, 0.5);
        assert_eq!(record.text("guest_name"), Some("MARIO ROSSI"));
        assert_eq!(record.number("rent_total"), Some(Decimal::from(12360)));
        assert_eq!(record.get("installment_3_date"), Some(&FieldValue::Null));
        assert_eq!(record.get("university"), Some(&FieldValue::Null));
    }

    #[test]
    fn test_parse_content_keeps_unknown_fields() {
        let (record, confidence) =
            parse_content(r#"{"utilities_included": true, "monthly_rent": 1030.5}"#, 1).unwrap();

        assert_eq!(record.get("utilities_included"), Some(&FieldValue::Flag(true)));
        assert_eq!(record.number("monthly_rent"), Some(Decimal::from_str("1030.5").unwrap()));
        assert_eq!(confidence.overall, 1.0);
    }

    #[test]
    fn test_parse_content_rejects_nested_values() {
        let err = parse_content(r#"{"PERSONAL": {"guest_name": "MARIO ROSSI"}}"#, 3).unwrap_err();
        assert!(matches!(err, DelegateError::MalformedResponse(_)));

        let err = parse_content(r#"["guest_name"]"#, 3).unwrap_err();
        assert!(matches!(err, DelegateError::MalformedResponse(_)));
    }

    #[test]
    fn test_parse_content_rejects_invalid_json() {
        let err = parse_content("guest_name: MARIO ROSSI", 3).unwrap_err();
        assert!(matches!(err, DelegateError::Json(_)));
    }

    #[test]
    fn test_user_prompt_lists_installment_slots() {
        let prompt = user_prompt("contratto", 10);
        assert!(prompt.contains("installment_10_amount"));
        assert!(!prompt.contains("installment_11_amount"));
        assert!(prompt.contains("contratto"));
    }

    #[test]
    fn test_empty_endpoint_is_not_configured() {
        let config = DelegateConfig {
            endpoint: String::new(),
            ..Default::default()
        };
        assert!(matches!(
            DelegateContractParser::with_api_key(&config, "key"),
            Err(AffittiError::Delegate(DelegateError::NotConfigured(_)))
        ));
    }

    #[tokio::test]
    async fn test_request_success() {
        let content = r#"{"guest_name": "MARIO ROSSI", "rent_total": 12360, "installment_1_date": "25 settembre 2025"}"#;
        let (endpoint, handle) = serve_once("200 OK", completion(content)).await;

        let result = parser(endpoint).extract("Il/La Sig./Sig.ra MARIO ROSSI").await.unwrap();

        assert_eq!(result.strategy, StrategyKind::Delegate);
        assert_eq!(result.record.text("installment_1_date"), Some("25 settembre 2025"));
        assert_eq!(result.record.get("installment_4_amount"), Some(&FieldValue::Null));
        assert_eq!(result.confidence.overall, 1.0);
        assert_eq!(result.raw_matches["response"], content);

        let request: Value = serde_json::from_str(&handle.await.unwrap()).unwrap();
        assert_eq!(request["temperature"], 0.0);
        assert_eq!(request["response_format"]["type"], "json_object");
        assert_eq!(request["messages"][0]["role"], "system");
    }

    #[tokio::test]
    async fn test_request_server_error() {
        let (endpoint, _handle) =
            serve_once("500 Internal Server Error", r#"{"error":"boom"}"#.to_string()).await;

        let err = parser(endpoint).extract("contratto").await.unwrap_err();
        match err {
            AffittiError::Delegate(DelegateError::Server { status, body }) => {
                assert_eq!(status, 500);
                assert!(body.contains("boom"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_request_unparseable_content() {
        let (endpoint, _handle) = serve_once("200 OK", completion("not json at all")).await;

        let err = parser(endpoint).extract("contratto").await.unwrap_err();
        assert!(matches!(err, AffittiError::Delegate(DelegateError::Json(_))));
    }

    #[tokio::test]
    async fn test_request_empty_content() {
        let (endpoint, _handle) = serve_once("200 OK", completion("")).await;

        let err = parser(endpoint).extract("contratto").await.unwrap_err();
        assert!(matches!(err, AffittiError::Delegate(DelegateError::EmptyResponse)));
    }

    #[tokio::test]
    async fn test_empty_text_skips_request() {
        let result = parser("http://127.0.0.1:9/unused".to_string()).extract("  ").await;
        assert!(matches!(
            result,
            Err(AffittiError::Extraction(ExtractionError::EmptyInput))
        ));
    }
}

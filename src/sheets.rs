//! Google Sheets mirror of finalized submissions.
//!
//! Authenticates as a service account: a signed RS256 assertion is exchanged
//! for an access token, which is cached until shortly before it expires.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, Offset, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use thiserror::Error;
use tracing::debug;

use crate::config::SheetsConfig;
use crate::models::submissions;

const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const SHEETS_API: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const TOKEN_CACHE_KEY: &str = "access_token";

/// Header row a sheet may start with; skipped when reading.
pub const HEADER_ROW: [&str; 5] = [
    "Submitted At",
    "Portfolio",
    "Company",
    "Responses",
    "IP Address",
];

#[derive(Debug, Error)]
pub enum SheetsError {
    #[error("Failed to sign service account assertion: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
    #[error("Sheets request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Sheets API returned {status}: {body}")]
    Api { status: u16, body: String },
}

/// One mirrored submission, in column order. A missing timestamp is filled
/// in at append time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRow {
    pub submitted_at: Option<String>,
    pub portfolio_title: String,
    pub company_name: String,
    pub responses: String,
    pub ip_address: String,
}

impl SheetRow {
    /// The row mirrored for a finalized submission.
    pub fn from_submission(
        submission: &submissions::Model,
        portfolio_title: &str,
        utc_offset_hours: i32,
    ) -> Self {
        let submitted_at = submission.completed_at.unwrap_or(submission.updated_at);
        let responses = match &submission.responses {
            Value::Object(map) => serialize_responses(map),
            _ => String::new(),
        };

        Self {
            submitted_at: Some(format_timestamp(submitted_at, utc_offset_hours)),
            portfolio_title: portfolio_title.to_string(),
            company_name: submission.company_name.clone(),
            responses,
            ip_address: submission.ip_address.clone().unwrap_or_default(),
        }
    }

    fn cells(&self, fallback_time: String) -> Vec<String> {
        vec![
            self.submitted_at.clone().unwrap_or(fallback_time),
            self.portfolio_title.clone(),
            self.company_name.clone(),
            self.responses.clone(),
            self.ip_address.clone(),
        ]
    }
}

/// A row read back from the sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetRecord {
    pub id: usize,
    pub submitted_at: String,
    pub portfolio_title: String,
    pub company_name: String,
    pub responses: String,
    pub ip_address: String,
}

/// `key: value` pairs joined by ` | `. Objects and arrays are written as JSON.
pub fn serialize_responses(responses: &Map<String, Value>) -> String {
    responses
        .iter()
        .map(|(key, value)| match value {
            Value::Null => format!("{key}: "),
            Value::String(s) => format!("{key}: {s}"),
            other => format!("{key}: {other}"),
        })
        .collect::<Vec<_>>()
        .join(" | ")
}

/// `YYYY-MM-DD HH:MM:SS` at a fixed UTC offset.
pub fn format_timestamp(at: DateTime<Utc>, utc_offset_hours: i32) -> String {
    let offset = FixedOffset::east_opt(utc_offset_hours * 3600)
        .unwrap_or_else(|| Utc.fix());
    at.with_timezone(&offset)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

/// Turn raw sheet values into records. Returns whether a header row was found.
pub fn parse_rows(values: Vec<Vec<String>>) -> (Vec<SheetRecord>, bool) {
    let has_header = values.first().is_some_and(|row| {
        row.len() >= HEADER_ROW.len() && row.iter().zip(HEADER_ROW).all(|(a, b)| a == b)
    });

    let records = values
        .into_iter()
        .skip(usize::from(has_header))
        .enumerate()
        .map(|(i, row)| {
            let cell = |n: usize| row.get(n).cloned().unwrap_or_default();
            SheetRecord {
                id: i + 1,
                submitted_at: cell(0),
                portfolio_title: cell(1),
                company_name: cell(2),
                responses: cell(3),
                ip_address: cell(4),
            }
        })
        .collect();

    (records, has_header)
}

#[derive(Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Clone)]
pub struct SheetsClient {
    client: reqwest::Client,
    config: SheetsConfig,
    tokens: Arc<Cache<&'static str, String>>,
}

impl SheetsClient {
    pub fn new(config: SheetsConfig) -> Self {
        let tokens = Arc::new(
            Cache::builder()
                .time_to_live(Duration::from_secs(50 * 60))
                .max_capacity(1)
                .build(),
        );

        Self {
            client: reqwest::Client::new(),
            config,
            tokens,
        }
    }

    pub fn utc_offset_hours(&self) -> i32 {
        self.config.utc_offset_hours
    }

    fn range(&self) -> String {
        format!("{}!A:E", self.config.sheet_name)
    }

    fn values_url(&self) -> String {
        format!(
            "{SHEETS_API}/{}/values/{}",
            self.config.sheet_id,
            urlencoding::encode(&self.range())
        )
    }

    async fn fetch_token(&self) -> Result<String, SheetsError> {
        debug!("Requesting Sheets access token for {}", self.config.service_account_email);

        let now = Utc::now().timestamp();
        let claims = AssertionClaims {
            iss: &self.config.service_account_email,
            scope: SCOPE,
            aud: TOKEN_URL,
            iat: now,
            exp: now + 3600,
        };
        let key = EncodingKey::from_rsa_pem(self.config.private_key.as_bytes())?;
        let assertion = encode(&Header::new(Algorithm::RS256), &claims, &key)?;

        let response = self
            .client
            .post(TOKEN_URL)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;
        let response = check_status(response).await?;
        let token: TokenResponse = response.json().await?;
        Ok(token.access_token)
    }

    async fn access_token(&self) -> Result<String, SheetsError> {
        if let Some(cached) = self.tokens.get(TOKEN_CACHE_KEY).await {
            return Ok(cached);
        }
        let token = self.fetch_token().await?;
        self.tokens.insert(TOKEN_CACHE_KEY, token.clone()).await;
        Ok(token)
    }

    /// Append one row below the existing data.
    pub async fn append(&self, row: &SheetRow) -> Result<(), SheetsError> {
        let token = self.access_token().await?;
        let cells = row.cells(format_timestamp(Utc::now(), self.config.utc_offset_hours));
        let url = format!(
            "{}:append?valueInputOption=USER_ENTERED&insertDataOption=INSERT_ROWS",
            self.values_url()
        );

        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(&json!({ "values": [cells] }))
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    /// Every row of the mirrored range, as text.
    pub async fn read(&self) -> Result<Vec<Vec<String>>, SheetsError> {
        let token = self.access_token().await?;
        let response = self
            .client
            .get(self.values_url())
            .bearer_auth(token)
            .send()
            .await?;
        let range: ValueRange = check_status(response).await?.json().await?;

        Ok(range
            .values
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|v| match v {
                        Value::String(s) => s,
                        Value::Null => String::new(),
                        other => other.to_string(),
                    })
                    .collect()
            })
            .collect())
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, SheetsError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(SheetsError::Api {
        status: status.as_u16(),
        body,
    })
}

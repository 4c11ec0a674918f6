use crate::error::MigrateError;
use crate::journal::config::StoreConfig;
use crate::journal::entry::JournalEntry;
use anyhow::{Context, Result};
use reqwest::blocking::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

const CONFLICT_TARGET: &str = "user_id,date";
const PREFER_UPSERT: &str = "resolution=merge-duplicates,return=representation";
const MAX_ERROR_CHARS: usize = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// The store echoed back the written row.
    Stored,
    /// The call succeeded but no row came back, so the write is unconfirmed.
    NoRows,
}

/// Destination for parsed entries, keyed on (user, date).
pub trait EntrySink {
    fn upsert(&mut self, entry: &JournalEntry) -> Result<UpsertOutcome>;
}

#[derive(Debug, Serialize)]
struct EntryRow<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<&'a str>,
    #[serde(flatten)]
    entry: &'a JournalEntry,
}

/// PostgREST upsert into a Supabase table.
pub struct SupabaseSink {
    client: Client,
    endpoint: String,
    key: String,
    user_id: Option<String>,
}

fn upsert_endpoint(base_url: &str, table: &str) -> String {
    let base = base_url.trim().trim_end_matches('/');
    format!("{base}/rest/v1/{table}?on_conflict={CONFLICT_TARGET}")
}

fn truncate_chars(input: &str, max_chars: usize) -> String {
    if input.chars().count() > max_chars {
        let mut s: String = input.chars().take(max_chars).collect();
        s.push('…');
        s
    } else {
        input.to_string()
    }
}

/// PostgREST reports failures as `{"message": .., "details": ..}`; fall back
/// to the raw body otherwise.
fn store_error_message(body: &str) -> String {
    let parsed = serde_json::from_str::<Value>(body).ok();
    let message = parsed.as_ref().and_then(|json| {
        let message = json.get("message").and_then(Value::as_str)?;
        match json.get("details").and_then(Value::as_str) {
            Some(details) if !details.is_empty() => Some(format!("{message} ({details})")),
            _ => Some(message.to_string()),
        }
    });
    let text = message.unwrap_or_else(|| body.trim().to_string());
    if text.is_empty() {
        "empty response body".to_string()
    } else {
        truncate_chars(&text, MAX_ERROR_CHARS)
    }
}

impl SupabaseSink {
    pub fn new(cfg: &StoreConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .context("failed to build http client")?;
        Ok(Self::with_client(client, cfg))
    }

    pub fn with_client(client: Client, cfg: &StoreConfig) -> Self {
        Self {
            client,
            endpoint: upsert_endpoint(&cfg.url, &cfg.table),
            key: cfg.key.clone(),
            user_id: cfg.user_id.clone(),
        }
    }
}

impl EntrySink for SupabaseSink {
    fn upsert(&mut self, entry: &JournalEntry) -> Result<UpsertOutcome> {
        let row = EntryRow {
            user_id: self.user_id.as_deref(),
            entry,
        };
        let response = self
            .client
            .post(&self.endpoint)
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
            .header("Prefer", PREFER_UPSERT)
            .json(&row)
            .send()
            .context("upsert request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(MigrateError::StoreRejected {
                status: status.as_u16(),
                message: store_error_message(&body),
            }
            .into());
        }

        let body = response.text().context("failed to read upsert response")?;
        if body.trim().is_empty() {
            return Ok(UpsertOutcome::NoRows);
        }
        let json: Value =
            serde_json::from_str(&body).context("upsert response was not valid json")?;
        Ok(match json {
            Value::Array(rows) if !rows.is_empty() => UpsertOutcome::Stored,
            Value::Object(_) => UpsertOutcome::Stored,
            _ => UpsertOutcome::NoRows,
        })
    }
}

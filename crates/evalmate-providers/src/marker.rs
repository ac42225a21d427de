//! Marker OCR service client.
//!
//! Uploads a document as multipart form data and reads the recognized text
//! back out of the JSON response.

use std::time::Instant;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use tracing::instrument;

use evalmate_core::traits::{ExtractRequest, ExtractedText, TextExtractor};
use evalmate_core::ServiceError;

use crate::http::{build_client, check_status, send_error};

pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Text extractor backed by a Marker conversion endpoint.
pub struct MarkerExtractor {
    url: String,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl MarkerExtractor {
    pub fn new(url: &str, timeout_secs: u64) -> anyhow::Result<Self> {
        Ok(Self {
            url: url.to_string(),
            timeout_secs,
            client: build_client(timeout_secs)?,
        })
    }
}

/// Pull the document text out of a Marker response.
///
/// Prefers the `markdown` field, then `text`; anything else is returned as
/// its JSON rendering so no content is silently dropped.
pub fn document_text(response: &Value) -> String {
    let field = response
        .get("markdown")
        .or_else(|| response.get("text"))
        .unwrap_or(response);

    match field {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
impl TextExtractor for MarkerExtractor {
    fn name(&self) -> &str {
        "marker"
    }

    #[instrument(skip(self, request), fields(file = %request.file_name, bytes = request.content.len()))]
    async fn extract_text(&self, request: &ExtractRequest) -> anyhow::Result<ExtractedText> {
        let start = Instant::now();

        let part = Part::bytes(request.content.clone()).file_name(request.file_name.clone());
        let form = Form::new()
            .part("file", part)
            .text("output_format", "json");

        let response = self
            .client
            .post(&self.url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| send_error(e, self.timeout_secs))?;
        let response = check_status(response).await?;

        let body: Value = response
            .json()
            .await
            .map_err(|e| ServiceError::InvalidResponse(format!("failed to parse response: {e}")))?;

        let text = document_text(&body);
        let latency_ms = start.elapsed().as_millis() as u64;
        tracing::debug!(characters = text.len(), latency_ms, "extracted document text");

        Ok(ExtractedText { text, latency_ms })
    }
}

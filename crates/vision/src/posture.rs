//! Remote posture classification
//!
//! Sends a JPEG snapshot to a Gemini-style `generateContent` endpoint and asks
//! for a one-word GOOD/BAD verdict.

use crate::config::PostureConfig;
use crate::labels::PostureLabel;
use crate::VisionError;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use camera_capture::VideoFrame;
use image::codecs::jpeg::JpegEncoder;
use inspector::{Probe, ProbeError};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

const POSTURE_PROMPT: &str = "Is the person in this image standing or sitting with good posture \
(erect/tall) or bad posture (slouching)? Reply with only GOOD or BAD. \
GOOD means standing or sitting erect/tall. BAD means slouching.";

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate
    fn first_text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content.parts.iter().filter_map(|p| p.text.as_deref()).collect();
        (!text.trim().is_empty()).then_some(text)
    }
}

/// Posture probe backed by a hosted vision-language model
pub struct GeminiPostureClassifier {
    client: Client,
    endpoint: String,
    api_key: String,
    jpeg_quality: u8,
    request_timeout: Duration,
}

impl GeminiPostureClassifier {
    /// Build from configuration. Fails when no credential is configured.
    pub fn new(config: &PostureConfig) -> Result<Self, VisionError> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| VisionError::Config("posture api_key is not set".into()))?
            .to_string();

        let request_timeout = Duration::from_millis(config.request_timeout_ms);
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| VisionError::Config(format!("http client: {}", e)))?;

        let endpoint = format!(
            "{}/v1beta/models/{}:generateContent",
            config.base_url.trim_end_matches('/'),
            config.model
        );

        Ok(Self {
            client,
            endpoint,
            api_key,
            jpeg_quality: config.jpeg_quality.clamp(1, 100),
            request_timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn encode_jpeg(&self, frame: &VideoFrame) -> Result<Vec<u8>, ProbeError> {
        let img = frame
            .to_rgb_image()
            .ok_or_else(|| ProbeError::Frame("buffer does not match dimensions".into()))?;
        let mut buf = Vec::new();
        JpegEncoder::new_with_quality(&mut buf, self.jpeg_quality)
            .encode_image(&img)
            .map_err(|e| ProbeError::Frame(format!("jpeg encoding: {}", e)))?;
        Ok(buf)
    }

    fn map_http_error(&self, err: reqwest::Error) -> ProbeError {
        if err.is_timeout() {
            ProbeError::Timeout(self.request_timeout.as_millis() as u64)
        } else {
            ProbeError::Network(err.to_string())
        }
    }
}

#[async_trait]
impl Probe for GeminiPostureClassifier {
    type Output = PostureLabel;

    fn name(&self) -> &'static str {
        "posture"
    }

    async fn probe(&self, frame: &VideoFrame) -> Result<Option<PostureLabel>, ProbeError> {
        let jpeg = self.encode_jpeg(frame)?;
        let body = json!({
            "contents": [{
                "parts": [
                    { "text": POSTURE_PROMPT },
                    { "inline_data": { "mime_type": "image/jpeg", "data": BASE64.encode(&jpeg) } }
                ]
            }]
        });

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_http_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProbeError::Network(format!("posture endpoint returned {}", status)));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ProbeError::InvalidResponse(e.to_string()))?;
        let text = parsed
            .first_text()
            .ok_or_else(|| ProbeError::InvalidResponse("no candidate text".into()))?;
        debug!(reply = %text.trim(), "Posture model replied");

        PostureLabel::parse_verdict(&text)
            .map(Some)
            .ok_or_else(|| ProbeError::InvalidResponse(format!("unrecognised verdict: {}", text.trim())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn reply(text: &str) -> serde_json::Value {
        json!({
            "candidates": [{
                "content": { "parts": [{ "text": text }], "role": "model" }
            }]
        })
    }

    fn classifier(server: &MockServer) -> GeminiPostureClassifier {
        let config = PostureConfig {
            api_key: Some("test-key".into()),
            base_url: format!("{}/", server.uri()),
            ..PostureConfig::default()
        };
        GeminiPostureClassifier::new(&config).unwrap()
    }

    fn frame() -> VideoFrame {
        VideoFrame::filled(16, 16, [120, 80, 40])
    }

    #[test]
    fn test_requires_api_key() {
        assert!(GeminiPostureClassifier::new(&PostureConfig::default()).is_err());

        let blank = PostureConfig {
            api_key: Some("  ".into()),
            ..PostureConfig::default()
        };
        assert!(GeminiPostureClassifier::new(&blank).is_err());
    }

    #[tokio::test]
    async fn test_bad_verdict() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.0-flash:generateContent"))
            .and(header("x-goog-api-key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply("BAD\n")))
            .expect(1)
            .mount(&server)
            .await;

        let result = classifier(&server).probe(&frame()).await.unwrap();
        assert_eq!(result, Some(PostureLabel::Bad));
    }

    #[tokio::test]
    async fn test_good_verdict() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply("GOOD")))
            .mount(&server)
            .await;

        let result = classifier(&server).probe(&frame()).await.unwrap();
        assert_eq!(result, Some(PostureLabel::Good));
    }

    #[tokio::test]
    async fn test_unrecognised_reply_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply("Maybe?")))
            .mount(&server)
            .await;

        let err = classifier(&server).probe(&frame()).await.unwrap_err();
        assert!(matches!(err, ProbeError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_server_error_is_network_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = classifier(&server).probe(&frame()).await.unwrap_err();
        assert!(matches!(err, ProbeError::Network(_)));
    }

    #[tokio::test]
    async fn test_malformed_frame_is_rejected() {
        let server = MockServer::start().await;
        let mut broken = frame();
        broken.data.truncate(10);

        let err = classifier(&server).probe(&broken).await.unwrap_err();
        assert!(matches!(err, ProbeError::Frame(_)));
    }
}

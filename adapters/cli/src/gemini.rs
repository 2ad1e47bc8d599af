//! Speech backend backed by the Gemini text-to-speech API.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use ferry_crossing_system_narration::{NarrationError, SpeechBackend, SpeechRequest};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::NarrationConfig;

/// Default endpoint root for the generative language API.
pub(crate) const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
/// Longest error body kept in a [`NarrationError::Status`].
const MAX_ERROR_BODY: usize = 512;

/// Client for `models/{model}:generateContent` with audio output.
#[derive(Debug)]
pub(crate) struct GeminiBackend {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
}

impl GeminiBackend {
    /// Builds a client whose requests give up after the configured timeout, so a hung
    /// exchange surfaces as [`NarrationError::Request`].
    pub(crate) fn new(settings: &NarrationConfig, api_key: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .context("failed to build the speech http client")?;
        Ok(Self {
            client,
            api_base: settings.api_base.trim_end_matches('/').to_owned(),
            api_key,
            model: settings.model.clone(),
        })
    }

    /// Reads the API key from the configured variable; a missing or empty key
    /// disables narration.
    pub(crate) fn from_env(settings: &NarrationConfig) -> Result<Option<Self>> {
        let variable = settings.api_key_env.as_str();
        match std::env::var(variable) {
            Ok(key) if !key.trim().is_empty() => Self::new(settings, key).map(Some),
            _ => {
                log::info!("narration disabled: `{variable}` is not set");
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl SpeechBackend for GeminiBackend {
    async fn synthesize(&self, request: &SpeechRequest) -> Result<Option<Vec<u8>>, NarrationError> {
        let url = format!("{}/models/{}:generateContent", self.api_base, self.model);
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body(request))
            .send()
            .await
            .map_err(|error| NarrationError::Request(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            if body.len() > MAX_ERROR_BODY {
                let cut = (0..=MAX_ERROR_BODY)
                    .rev()
                    .find(|index| body.is_char_boundary(*index))
                    .unwrap_or(0);
                body.truncate(cut);
            }
            return Err(NarrationError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let payload: GenerateContentResponse = response
            .json()
            .await
            .map_err(|error| NarrationError::Payload(error.to_string()))?;
        inline_audio(payload)
    }
}

fn request_body(request: &SpeechRequest) -> Value {
    json!({
        "contents": [{ "parts": [{ "text": request.prompt }] }],
        "generationConfig": {
            "responseModalities": ["AUDIO"],
            "speechConfig": {
                "voiceConfig": {
                    "prebuiltVoiceConfig": { "voiceName": request.persona.voice_name() }
                }
            }
        }
    })
}

/// Decodes the first inline audio part, if the response carries one.
fn inline_audio(response: GenerateContentResponse) -> Result<Option<Vec<u8>>, NarrationError> {
    let data = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts.into_iter().next())
        .and_then(|part| part.inline_data)
        .map(|inline| inline.data);
    let Some(data) = data else {
        return Ok(None);
    };
    STANDARD
        .decode(data.as_bytes())
        .map(Some)
        .map_err(|error| NarrationError::Payload(error.to_string()))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GenerateContentResponse {
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct Part {
    inline_data: Option<InlineData>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct InlineData {
    data: String,
}

#[cfg(test)]
mod tests {
    use ferry_crossing_core::NarrationRole;

    use super::*;

    fn parse(json: &str) -> GenerateContentResponse {
        serde_json::from_str(json).expect("response json")
    }

    #[test]
    fn body_selects_persona_voice() {
        let request = SpeechRequest::new("Land ho!", NarrationRole::PassengerFemale);
        let body = request_body(&request);

        assert_eq!(
            body["generationConfig"]["speechConfig"]["voiceConfig"]["prebuiltVoiceConfig"]
                ["voiceName"],
            "Kore"
        );
        assert_eq!(body["generationConfig"]["responseModalities"][0], "AUDIO");
        assert_eq!(body["contents"][0]["parts"][0]["text"], request.prompt.as_str());
    }

    #[tokio::test]
    async fn hung_server_releases_the_request() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind listener");
        let address = listener.local_addr().expect("local address");
        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.expect("accept");
            tokio::time::sleep(Duration::from_secs(30)).await;
            drop(socket);
        });

        let settings = NarrationConfig {
            api_base: format!("http://{address}"),
            request_timeout_secs: 1,
            ..NarrationConfig::default()
        };
        let backend = GeminiBackend::new(&settings, "key".into()).expect("client builds");
        let request = SpeechRequest::new("Hold on!", NarrationRole::Boatman);

        let started = std::time::Instant::now();
        let result = backend.synthesize(&request).await;

        assert!(matches!(result, Err(NarrationError::Request(_))), "{result:?}");
        assert!(started.elapsed() < Duration::from_secs(10));
        server.abort();
    }

    #[test]
    fn decodes_inline_audio() {
        let response = parse(
            r#"{"candidates":[{"content":{"parts":[{"inlineData":{"mimeType":"audio/L16;rate=24000","data":"AAD/fw=="}}]}}]}"#,
        );
        assert_eq!(inline_audio(response).expect("valid"), Some(vec![0x00, 0x00, 0xff, 0x7f]));
    }

    #[test]
    fn missing_audio_is_not_an_error() {
        assert_eq!(inline_audio(parse(r#"{"candidates":[]}"#)).expect("valid"), None);
        assert_eq!(
            inline_audio(parse(r#"{"candidates":[{"content":{"parts":[{"text":"no"}]}}]}"#))
                .expect("valid"),
            None
        );
    }

    #[test]
    fn corrupt_audio_is_a_payload_error() {
        let response = parse(r#"{"candidates":[{"content":{"parts":[{"inlineData":{"data":"!!"}}]}}]}"#);
        assert!(matches!(
            inline_audio(response),
            Err(NarrationError::Payload(_))
        ));
    }
}

//! Text-to-audio backends.
//!
//! [`HttpAudioBackend`] talks to an inference endpoint in the Hugging Face
//! style:
//!
//! ```text
//! POST {base_url}/models/{model}
//! { "inputs": "<prompt>",
//!   "parameters": { "max_new_tokens": 1000, "guidance_scale": 3.0, "do_sample": true } }
//!
//! 200 OK  ->  audio/wav body
//! ```

use async_trait::async_trait;

use super::wav::{decode_wav, AudioClip};
use super::MusicError;
use crate::config::MusicConfig;

/// Sampling parameters sent with every segment request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub max_new_tokens: u32,
    pub guidance_scale: f32,
    pub do_sample: bool,
}

impl GenerationParams {
    pub fn from_config(config: &MusicConfig) -> Self {
        Self {
            max_new_tokens: config.max_new_tokens,
            guidance_scale: config.guidance_scale,
            do_sample: true,
        }
    }
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self::from_config(&MusicConfig::default())
    }
}

/// Generates one audio clip from a text prompt.
#[async_trait]
pub trait AudioBackend: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<AudioClip, MusicError>;
}

// ---------------------------------------------------------------------------
// HttpAudioBackend
// ---------------------------------------------------------------------------

pub struct HttpAudioBackend {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_token: Option<String>,
}

impl HttpAudioBackend {
    pub fn from_config(config: &MusicConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_token: config.api_token.clone(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}", self.base_url, self.model)
    }
}

#[async_trait]
impl AudioBackend for HttpAudioBackend {
    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<AudioClip, MusicError> {
        let body = serde_json::json!({
            "inputs": prompt,
            "parameters": {
                "max_new_tokens": params.max_new_tokens,
                "guidance_scale": params.guidance_scale,
                "do_sample": params.do_sample
            }
        });

        let mut req = self
            .client
            .post(self.endpoint())
            .header(reqwest::header::ACCEPT, "audio/wav")
            .json(&body);

        let token = self.api_token.as_deref().unwrap_or("");
        if !token.is_empty() {
            req = req.bearer_auth(token);
        }

        let response = req.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MusicError::Backend {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        let clip = decode_wav(&bytes)?;
        if clip.is_empty() {
            return Err(MusicError::EmptyAudio);
        }

        log::debug!(
            "Generated {:.1}s at {} Hz for prompt: {prompt}",
            clip.duration_secs(),
            clip.sample_rate
        );
        Ok(clip)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_follow_config() {
        let config = MusicConfig {
            max_new_tokens: 256,
            guidance_scale: 2.5,
            ..MusicConfig::default()
        };
        let p = GenerationParams::from_config(&config);
        assert_eq!(p.max_new_tokens, 256);
        assert!((p.guidance_scale - 2.5).abs() < f32::EPSILON);
        assert!(p.do_sample);
    }

    #[test]
    fn endpoint_joins_model() {
        let config = MusicConfig {
            base_url: "http://localhost:8080/".into(),
            model: "facebook/musicgen-small".into(),
            ..MusicConfig::default()
        };
        let backend = HttpAudioBackend::from_config(&config);
        assert_eq!(
            backend.endpoint(),
            "http://localhost:8080/models/facebook/musicgen-small"
        );
    }

    #[tokio::test]
    async fn unreachable_backend_is_an_error() {
        let config = MusicConfig {
            base_url: "http://127.0.0.1:9".into(),
            timeout_secs: 2,
            ..MusicConfig::default()
        };
        let backend = HttpAudioBackend::from_config(&config);
        let result = backend.generate("calm piano", &GenerationParams::default()).await;
        assert!(matches!(
            result,
            Err(MusicError::Request(_)) | Err(MusicError::Timeout)
        ));
    }
}

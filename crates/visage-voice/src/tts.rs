//! Text-to-speech rendering through a chain of interchangeable engines.
//!
//! All engines implement one contract: text in, WAV file at the requested
//! path out. The service ranks them (preferred engine first, then the fixed
//! fallback order Piper, Azure, system) and walks the chain until one
//! succeeds. The system engine ships with the host OS and is expected not to
//! fail under normal conditions, so the chain as a whole rarely errors.

use crate::config::{TtsConfig, TtsEngine};
use crate::error::VoiceError;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Maximum text input size for TTS (64 KiB). Prevents resource exhaustion
/// from oversized synthesis requests.
const MAX_TTS_INPUT_BYTES: usize = 64 * 1024;

/// Timeout for TTS process execution and HTTP synthesis calls.
const TTS_TIMEOUT: Duration = Duration::from_secs(60);

/// Service for generating speech from text.
#[derive(Debug, Clone)]
pub struct TtsService {
    config: TtsConfig,
    http: reqwest::Client,
}

impl TtsService {
    pub fn new(config: TtsConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    /// Synthesizes `text` into a WAV file at `out_path`, overwriting if
    /// present.
    ///
    /// Tries the preferred engine first, then the remaining engines in
    /// fallback order. Individual engine failures are logged and swallowed;
    /// an error is returned only when every engine fails.
    pub async fn synthesize_to_wav(&self, text: &str, out_path: &Path) -> Result<(), VoiceError> {
        if text.len() > MAX_TTS_INPUT_BYTES {
            return Err(VoiceError::Tts(format!(
                "text exceeds maximum size: {} bytes (limit: {} bytes)",
                text.len(),
                MAX_TTS_INPUT_BYTES
            )));
        }

        let mut last_error = None;
        for engine in self.engine_order() {
            match self.synthesize_with(engine, text, out_path).await {
                Ok(()) => {
                    tracing::debug!(engine = engine.as_str(), path = %out_path.display(), "TTS ok");
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!(engine = engine.as_str(), "TTS engine failed: {}", e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| VoiceError::Tts("no TTS engine available".to_string())))
    }

    /// The ranked engine list: preferred first, then the fixed fallback
    /// order, Azure included only when credentials are present.
    fn engine_order(&self) -> Vec<TtsEngine> {
        let mut order = vec![self.config.preferred];
        for engine in [TtsEngine::Piper, TtsEngine::Azure, TtsEngine::System] {
            if !order.contains(&engine) {
                order.push(engine);
            }
        }
        order.retain(|engine| match engine {
            TtsEngine::Azure => {
                let configured = self.config.azure.is_configured();
                if !configured && self.config.preferred == TtsEngine::Azure {
                    tracing::warn!("Azure TTS preferred but key/region not set; skipping");
                }
                configured
            }
            _ => true,
        });
        order
    }

    async fn synthesize_with(
        &self,
        engine: TtsEngine,
        text: &str,
        out_path: &Path,
    ) -> Result<(), VoiceError> {
        match engine {
            TtsEngine::Piper => self.synthesize_piper(text, out_path).await,
            TtsEngine::Azure => self.synthesize_azure(text, out_path).await,
            TtsEngine::System => self.synthesize_system(text, out_path).await,
        }
    }

    async fn synthesize_piper(&self, text: &str, out_path: &Path) -> Result<(), VoiceError> {
        let piper = &self.config.piper;
        if piper.binary.is_empty() || piper.model_path.is_empty() {
            return Err(VoiceError::Tts(
                "Piper not configured (binary/model_path)".to_string(),
            ));
        }

        let mut command = Command::new(&piper.binary);
        command
            .arg("--model")
            .arg(&piper.model_path)
            .arg("--output_file")
            .arg(out_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        if let Some(speaker) = piper.speaker {
            command.arg("--speaker").arg(speaker.to_string());
        }
        if let Some(length_scale) = piper.length_scale {
            command.arg("--length_scale").arg(length_scale.to_string());
        }

        // Piper finds its espeak data relative to the binary when installed
        // from a release archive.
        if let Some(dir) = Path::new(&piper.binary).parent().filter(|d| !d.as_os_str().is_empty()) {
            command.env("PIPER_ESPEAK_DATA", dir.join("espeak-ng-data"));
        }

        let mut child = command
            .spawn()
            .map_err(|e| VoiceError::Tts(format!("failed to spawn piper: {}", e)))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| VoiceError::Tts("failed to open piper stdin".to_string()))?;
        let text_owned = text.to_string();

        // Write stdin from a task to avoid deadlock if the output buffer fills up.
        let write_task = tokio::spawn(async move { stdin.write_all(text_owned.as_bytes()).await });

        let output = tokio::time::timeout(TTS_TIMEOUT, child.wait_with_output())
            .await
            .map_err(|_| {
                VoiceError::Tts(format!(
                    "piper timed out after {} seconds",
                    TTS_TIMEOUT.as_secs()
                ))
            })?
            .map_err(|e| VoiceError::Tts(format!("failed to wait for piper: {}", e)))?;

        match write_task.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                return Err(VoiceError::Tts(format!(
                    "failed to write to piper stdin: {}",
                    e
                )))
            }
            Err(e) => return Err(VoiceError::Tts(format!("stdin task failed: {}", e))),
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VoiceError::Tts(format!("piper failed: {}", stderr)));
        }

        Ok(())
    }

    /// Synthesizes through the Azure neural TTS HTTP endpoint.
    ///
    /// Requests 16 kHz 16-bit mono RIFF output so the result feeds straight
    /// into forced alignment without resampling.
    async fn synthesize_azure(&self, text: &str, out_path: &Path) -> Result<(), VoiceError> {
        let azure = &self.config.azure;
        if !azure.is_configured() {
            return Err(VoiceError::Tts("Azure TTS not configured".to_string()));
        }

        let endpoint = format!(
            "https://{}.tts.speech.microsoft.com/cognitiveservices/v1",
            azure.region
        );
        let ssml = format!(
            concat!(
                "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
                "<speak version=\"1.0\" xml:lang=\"en-US\">\n",
                "  <voice name=\"{}\">{}</voice>\n",
                "</speak>"
            ),
            azure.voice,
            xml_escape(text)
        );

        let response = self
            .http
            .post(&endpoint)
            .header("Ocp-Apim-Subscription-Key", &azure.key)
            .header("Content-Type", "application/ssml+xml")
            .header("X-Microsoft-OutputFormat", "riff-16khz-16bit-mono-pcm")
            .header("User-Agent", concat!("visage/", env!("CARGO_PKG_VERSION")))
            .body(ssml)
            .timeout(TTS_TIMEOUT)
            .send()
            .await
            .map_err(|e| VoiceError::Tts(format!("Azure TTS request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(VoiceError::Tts(format!(
                "Azure TTS HTTP {}: {}",
                status, body
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| VoiceError::Tts(format!("Azure TTS body read failed: {}", e)))?;
        tokio::fs::write(out_path, &bytes)
            .await
            .map_err(|e| VoiceError::Tts(format!("failed to write Azure TTS output: {}", e)))?;

        Ok(())
    }

    /// Synthesizes through the OS-builtin engine.
    ///
    /// Unix hosts use `espeak-ng`, which writes WAV directly. Windows hosts
    /// use a PowerShell `System.Speech` script emitting 16 kHz 16-bit mono,
    /// preferring a female voice unless an exact name is configured.
    async fn synthesize_system(&self, text: &str, out_path: &Path) -> Result<(), VoiceError> {
        #[cfg(not(windows))]
        {
            let child = Command::new("espeak-ng")
                .arg("-w")
                .arg(out_path)
                .arg(text)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::piped())
                .spawn()
                .map_err(|e| VoiceError::Tts(format!("failed to spawn espeak-ng: {}", e)))?;

            let output = tokio::time::timeout(TTS_TIMEOUT, child.wait_with_output())
                .await
                .map_err(|_| {
                    VoiceError::Tts(format!(
                        "espeak-ng timed out after {} seconds",
                        TTS_TIMEOUT.as_secs()
                    ))
                })?
                .map_err(|e| VoiceError::Tts(format!("failed to wait for espeak-ng: {}", e)))?;

            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                return Err(VoiceError::Tts(format!("espeak-ng failed: {}", stderr)));
            }

            Ok(())
        }

        #[cfg(windows)]
        {
            let script = sapi_script(out_path, &self.config.system_voice);

            let mut child = Command::new("powershell.exe")
                .arg("-NoProfile")
                .arg("-ExecutionPolicy")
                .arg("Bypass")
                .arg("-Command")
                .arg(script)
                .stdin(Stdio::piped())
                .stdout(Stdio::null())
                .stderr(Stdio::piped())
                .spawn()
                .map_err(|e| VoiceError::Tts(format!("failed to spawn powershell: {}", e)))?;

            let mut stdin = child
                .stdin
                .take()
                .ok_or_else(|| VoiceError::Tts("failed to open powershell stdin".to_string()))?;
            let text_owned = text.to_string();
            let write_task =
                tokio::spawn(async move { stdin.write_all(text_owned.as_bytes()).await });

            let output = tokio::time::timeout(TTS_TIMEOUT, child.wait_with_output())
                .await
                .map_err(|_| {
                    VoiceError::Tts(format!(
                        "SAPI TTS timed out after {} seconds",
                        TTS_TIMEOUT.as_secs()
                    ))
                })?
                .map_err(|e| VoiceError::Tts(format!("failed to wait for powershell: {}", e)))?;

            match write_task.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    return Err(VoiceError::Tts(format!(
                        "failed to write to powershell stdin: {}",
                        e
                    )))
                }
                Err(e) => return Err(VoiceError::Tts(format!("stdin task failed: {}", e))),
            }

            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                return Err(VoiceError::Tts(format!("SAPI TTS failed: {}", stderr)));
            }

            Ok(())
        }
    }
}

/// Minimal XML escaping for text embedded in SSML.
fn xml_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Builds the PowerShell `System.Speech` synthesis script. Text is read
/// from stdin; the output path and voice name are embedded with
/// single-quote escaping.
#[cfg(windows)]
fn sapi_script(out_path: &Path, voice_name: &str) -> String {
    let out = out_path.display().to_string().replace('\'', "''");
    let voice = voice_name.replace('\'', "''");
    format!(
        r#"
Add-Type -AssemblyName System.Speech
$synth = New-Object System.Speech.Synthesis.SpeechSynthesizer
try {{
  if ('{voice}'.Length -gt 0) {{
    $synth.SelectVoice('{voice}')
  }} else {{
    $synth.SelectVoiceByHints([System.Speech.Synthesis.VoiceGender]::Female)
  }}
}} catch {{}}
$format = New-Object System.Speech.AudioFormat.SpeechAudioFormatInfo(16000,[System.Speech.AudioFormat.AudioBitsPerSample]::Sixteen,[System.Speech.AudioFormat.AudioChannel]::Mono)
$synth.SetOutputToWaveFile('{out}', $format)
$synth.Speak([Console]::In.ReadToEnd())
$synth.Dispose()
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AzureConfig;

    fn service_with(preferred: TtsEngine, azure_configured: bool) -> TtsService {
        let mut config = TtsConfig {
            preferred,
            ..TtsConfig::default()
        };
        if azure_configured {
            config.azure = AzureConfig {
                key: "k".to_string(),
                region: "eastus".to_string(),
                ..AzureConfig::default()
            };
        }
        TtsService::new(config)
    }

    #[test]
    fn preferred_engine_leads_the_chain() {
        let service = service_with(TtsEngine::Piper, true);
        assert_eq!(
            service.engine_order(),
            vec![TtsEngine::Piper, TtsEngine::Azure, TtsEngine::System]
        );

        let service = service_with(TtsEngine::Azure, true);
        assert_eq!(
            service.engine_order(),
            vec![TtsEngine::Azure, TtsEngine::Piper, TtsEngine::System]
        );
    }

    #[test]
    fn azure_is_skipped_without_credentials() {
        let service = service_with(TtsEngine::Piper, false);
        assert_eq!(
            service.engine_order(),
            vec![TtsEngine::Piper, TtsEngine::System]
        );
    }

    #[test]
    fn preferred_system_still_allows_fallback() {
        let service = service_with(TtsEngine::System, false);
        assert_eq!(
            service.engine_order(),
            vec![TtsEngine::System, TtsEngine::Piper]
        );
    }

    #[tokio::test]
    async fn oversized_input_is_rejected_before_any_engine() {
        let service = service_with(TtsEngine::System, false);
        let text = "a".repeat(MAX_TTS_INPUT_BYTES + 1);
        let err = service
            .synthesize_to_wav(&text, Path::new("out.wav"))
            .await
            .unwrap_err();
        assert!(matches!(err, VoiceError::Tts(_)));
        assert!(err.to_string().contains("maximum size"));
    }
}

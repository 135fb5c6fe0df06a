//! Speech recognition through the OS dictation engine.
//!
//! Recorded user audio is transcribed with a PowerShell `System.Speech`
//! dictation grammar. Silence timeouts are tuned for single-utterance
//! capture: no babble timeout, 0.5 s initial silence, 0.3 s end silence.
//! An empty recognition result is a valid outcome, not an error; only
//! process-level failures propagate.

use crate::config::SttConfig;
use crate::error::VoiceError;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Timeout for STT process execution.
const STT_TIMEOUT: Duration = Duration::from_secs(120);

/// Service for transcribing recorded speech.
#[derive(Debug, Clone)]
pub struct SttService {
    config: SttConfig,
}

impl SttService {
    pub fn new(config: SttConfig) -> Self {
        Self { config }
    }

    /// Transcribes a WAV file; returns the recognized text, possibly empty.
    ///
    /// # Errors
    ///
    /// `VoiceError::Stt` when the dictation engine cannot be spawned, times
    /// out, or exits non-zero.
    pub async fn transcribe_wav(&self, wav_path: &Path) -> Result<String, VoiceError> {
        let script = dictation_script(wav_path, &self.config.culture);
        let shell = if cfg!(windows) { "powershell.exe" } else { "pwsh" };

        let child = Command::new(shell)
            .arg("-NoProfile")
            .arg("-ExecutionPolicy")
            .arg("Bypass")
            .arg("-Command")
            .arg(script)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| VoiceError::Stt(format!("failed to spawn dictation engine: {}", e)))?;

        let output = tokio::time::timeout(STT_TIMEOUT, child.wait_with_output())
            .await
            .map_err(|_| {
                VoiceError::Stt(format!(
                    "dictation timed out after {} seconds",
                    STT_TIMEOUT.as_secs()
                ))
            })?
            .map_err(|e| VoiceError::Stt(format!("failed to wait for dictation engine: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VoiceError::Stt(format!(
                "dictation engine exited {}: {}",
                output.status, stderr
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

/// Builds the PowerShell dictation script for one WAV file.
fn dictation_script(wav_path: &Path, culture: &str) -> String {
    let path = wav_path.display().to_string().replace('\'', "''");
    let culture = culture.replace('\'', "''");
    format!(
        r#"
Add-Type -AssemblyName System.Speech
$rec = New-Object System.Speech.Recognition.SpeechRecognitionEngine([System.Globalization.CultureInfo]::('{culture}'))
$rec.LoadGrammar([System.Speech.Recognition.DictationGrammar]::new())
$rec.SetInputToWaveFile('{path}')
$rec.BabbleTimeout = [TimeSpan]::FromSeconds(0)
$rec.InitialSilenceTimeout = [TimeSpan]::FromSeconds(0.5)
$rec.EndSilenceTimeout = [TimeSpan]::FromSeconds(0.3)
$rx = $rec.Recognize()
$rec.Dispose()
if ($rx) {{ $rx.Text }} else {{ '' }}
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_escapes_single_quotes_in_paths() {
        let script = dictation_script(Path::new("/tmp/it's here/input.wav"), "en-US");
        assert!(script.contains("it''s here"));
        assert!(script.contains("DictationGrammar"));
        assert!(script.contains("FromSeconds(0.3)"));
    }
}

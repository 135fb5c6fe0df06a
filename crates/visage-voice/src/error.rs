use thiserror::Error;

#[derive(Error, Debug)]
pub enum VoiceError {
    #[error("TTS error: {0}")]
    Tts(String),

    #[error("STT error: {0}")]
    Stt(String),

    #[error("lip-sync error: {0}")]
    LipSync(String),

    #[error("transcode error: {0}")]
    Transcode(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

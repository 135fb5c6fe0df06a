use visage_voice::{LipSyncConfig, SttConfig, TtsConfig, TtsEngine};

#[test]
fn full_voice_config_parses_from_toml() {
    let tts: TtsConfig = toml::from_str(
        r#"
        preferred = "azure"

        [piper]
        binary = "/opt/piper/piper"
        model_path = "/opt/piper/voices/en_US-amy-medium.onnx"
        length_scale = 1.1

        [azure]
        key = "abc123"
        region = "westeurope"
        voice = "en-US-JennyNeural"
        "#,
    )
    .unwrap();

    assert_eq!(tts.preferred, TtsEngine::Azure);
    assert!(tts.azure.is_configured());
    assert_eq!(tts.azure.voice, "en-US-JennyNeural");
    assert_eq!(tts.piper.length_scale, Some(1.1));
    assert_eq!(tts.piper.speaker, None);

    // The key never appears in debug output.
    let debug = format!("{:?}", tts);
    assert!(!debug.contains("abc123"));
}

#[test]
fn lipsync_and_stt_defaults() {
    let lipsync = LipSyncConfig::default();
    assert_eq!(lipsync.rhubarb_binary, "bin/rhubarb");
    assert_eq!(lipsync.ffmpeg_binary, "ffmpeg");

    let stt: SttConfig = toml::from_str("").unwrap();
    assert_eq!(stt.culture, "en-US");
}

// Configuration for the chat client

use std::time::Duration;

use speech_core::VoiceOptions;

#[derive(Clone)]
pub struct AppConfig {
    pub chat_endpoint: String,
    pub tts_endpoint: String,
    pub tts_voice: String,
    pub tts_locale: String,
    pub connect_timeout_secs: u64,
    pub voice_output: bool,
    pub speak_plain: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            chat_endpoint: "http://localhost:3000/api/chat".to_string(),
            tts_endpoint: "http://localhost:3000/api/tts".to_string(),
            tts_voice: "en-US-JennyNeural".to_string(),
            tts_locale: "en-US".to_string(),
            connect_timeout_secs: 10,
            voice_output: true,
            speak_plain: false,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let chat_endpoint = std::env::var("CHAT_ENDPOINT")
            .ok()
            .unwrap_or(defaults.chat_endpoint);

        let tts_endpoint = std::env::var("TTS_ENDPOINT")
            .ok()
            .unwrap_or(defaults.tts_endpoint);

        let tts_voice = std::env::var("TTS_VOICE")
            .ok()
            .unwrap_or(defaults.tts_voice);

        let tts_locale = std::env::var("TTS_LOCALE")
            .ok()
            .unwrap_or(defaults.tts_locale);

        let connect_timeout_secs = std::env::var("CONNECT_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.connect_timeout_secs);

        let voice_output = std::env::var("VOICE_OUTPUT")
            .ok()
            .map(|v| parse_switch(&v))
            .unwrap_or(defaults.voice_output);

        let speak_plain = std::env::var("SPEAK_PLAIN")
            .ok()
            .map(|v| parse_switch(&v))
            .unwrap_or(defaults.speak_plain);

        Self {
            chat_endpoint,
            tts_endpoint,
            tts_voice,
            tts_locale,
            connect_timeout_secs,
            voice_output,
            speak_plain,
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn voice_options(&self) -> VoiceOptions {
        VoiceOptions {
            voice: self.tts_voice.clone(),
            locale: self.tts_locale.clone(),
        }
    }
}

fn parse_switch(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "on" | "yes"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_switch_accepts_common_spellings() {
        assert!(parse_switch("1"));
        assert!(parse_switch("true"));
        assert!(parse_switch("ON"));
        assert!(parse_switch(" yes "));
        assert!(!parse_switch("0"));
        assert!(!parse_switch("false"));
        assert!(!parse_switch("off"));
        assert!(!parse_switch(""));
    }
}

//! Session Configuration Reconciliation
//!
//! Decides, field by field, what session configuration is sent upstream given
//! whatever the browser supplied. Nothing from the caller is trusted to be
//! well-typed: every field is checked before use and a wrong-typed field falls
//! back to its default instead of being forwarded.

use serde::Serialize;
use serde_json::{Map, Value};

/// The realtime model every session is created against. Not caller-selectable.
pub const REALTIME_MODEL: &str = "gpt-4o-mini-realtime-preview-2024-12-17";

/// Fallback system prompt for a calm, learner-paced English tutor.
pub const DEFAULT_INSTRUCTIONS: &str = "You are a patient English tutor. SPEAK SLOWLY and CLEARLY. \
Keep replies to 1–2 sentences. Pause briefly between sentences (~300 ms). \
Adapt difficulty to the student's CEFR level. Encourage, correct gently, and avoid long monologues.";

pub const DEFAULT_VOICE: &str = "alloy";
pub const DEFAULT_SPEED: f64 = 0.9;
pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const OUTPUT_AUDIO_FORMAT: &str = "pcm16";
pub const MODALITIES: [&str; 2] = ["text", "audio"];

/// Server-side voice activity detection settings tuned for slow speakers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnDetection {
    #[serde(rename = "type")]
    pub kind: String,
    /// Stricter than the upstream default of 0.5 to reduce false starts.
    pub threshold: f64,
    pub prefix_padding_ms: u32,
    pub silence_duration_ms: u32,
    pub create_response: bool,
    pub interrupt_response: bool,
}

impl Default for TurnDetection {
    fn default() -> Self {
        Self {
            kind: "server_vad".to_string(),
            threshold: 0.6,
            prefix_padding_ms: 300,
            silence_duration_ms: 350,
            create_response: true,
            interrupt_response: true,
        }
    }
}

/// The turn-detection value sent upstream.
///
/// A caller-supplied object is forwarded verbatim; the upstream API owns its schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TurnDetectionSetting {
    Default(TurnDetection),
    Caller(Value),
}

/// A read-only, defensively-typed view over the caller's JSON object.
#[derive(Debug, Clone, Copy)]
pub struct InboundSessionRequest<'a> {
    body: &'a Map<String, Value>,
}

impl<'a> InboundSessionRequest<'a> {
    pub fn new(body: &'a Map<String, Value>) -> Self {
        Self { body }
    }

    pub fn instructions(&self) -> Option<&'a str> {
        self.non_empty_str("instructions")
    }

    pub fn voice(&self) -> Option<&'a str> {
        self.non_empty_str("voice")
    }

    /// Only JSON numbers are accepted; `"0.9"` is not a speed.
    pub fn speed(&self) -> Option<f64> {
        self.number("speed")
    }

    pub fn temperature(&self) -> Option<f64> {
        self.number("temperature")
    }

    /// Resolves the two spellings of the turn-detection field.
    ///
    /// `turnDetection` is consulted before `turn_detection`; the first truthy
    /// value wins.
    pub fn turn_detection(&self) -> Option<&'a Value> {
        ["turnDetection", "turn_detection"]
            .into_iter()
            .filter_map(|key| self.body.get(key))
            .find(|value| is_truthy(value))
    }

    pub fn user_id(&self) -> Option<&'a str> {
        self.non_empty_str("userId")
    }

    fn non_empty_str(&self, key: &str) -> Option<&'a str> {
        self.body
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    fn number(&self, key: &str) -> Option<f64> {
        match self.body.get(key) {
            Some(Value::Number(n)) => n.as_f64(),
            _ => None,
        }
    }
}

/// The canonical session-creation request sent upstream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutboundSessionConfig {
    pub model: &'static str,
    pub instructions: String,
    pub voice: String,
    pub output_audio_format: &'static str,
    pub modalities: [&'static str; 2],
    pub temperature: f64,
    pub speed: f64,
    pub turn_detection: TurnDetectionSetting,
}

impl From<InboundSessionRequest<'_>> for OutboundSessionConfig {
    fn from(request: InboundSessionRequest<'_>) -> Self {
        Self {
            model: REALTIME_MODEL,
            instructions: request
                .instructions()
                .unwrap_or(DEFAULT_INSTRUCTIONS)
                .to_string(),
            voice: request.voice().unwrap_or(DEFAULT_VOICE).to_string(),
            output_audio_format: OUTPUT_AUDIO_FORMAT,
            modalities: MODALITIES,
            temperature: request.temperature().unwrap_or(DEFAULT_TEMPERATURE),
            speed: request.speed().unwrap_or(DEFAULT_SPEED),
            turn_detection: match request.turn_detection() {
                Some(value) => TurnDetectionSetting::Caller(value.clone()),
                None => TurnDetectionSetting::Default(TurnDetection::default()),
            },
        }
    }
}

/// Builds the upstream session configuration from a parsed request body.
///
/// Never fails: every missing or malformed field degrades to its default.
pub fn normalize(body: &Map<String, Value>) -> OutboundSessionConfig {
    OutboundSessionConfig::from(InboundSessionRequest::new(body))
}

/// JSON-level truthiness: `null`, `false`, `0` and `""` are falsy.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("test body must be an object, got {other}"),
        }
    }

    fn default_turn_detection_json() -> Value {
        json!({
            "type": "server_vad",
            "threshold": 0.6,
            "prefix_padding_ms": 300,
            "silence_duration_ms": 350,
            "create_response": true,
            "interrupt_response": true
        })
    }

    #[test]
    fn test_empty_body_uses_all_defaults() {
        let config = normalize(&Map::new());

        assert_eq!(config.model, REALTIME_MODEL);
        assert_eq!(config.instructions, DEFAULT_INSTRUCTIONS);
        assert_eq!(config.voice, "alloy");
        assert_eq!(config.output_audio_format, "pcm16");
        assert_eq!(config.modalities, ["text", "audio"]);
        assert_eq!(config.speed, 0.9);
        assert_eq!(config.temperature, 0.7);
        assert_eq!(
            serde_json::to_value(&config.turn_detection).unwrap(),
            default_turn_detection_json()
        );
    }

    #[test]
    fn test_wrong_typed_fields_fall_back() {
        let config = normalize(&body(json!({
            "instructions": 42,
            "voice": ["verse"],
            "speed": "1.2",
            "temperature": {"value": 1.0},
            "turnDetection": null,
            "turn_detection": false
        })));

        assert_eq!(config.instructions, DEFAULT_INSTRUCTIONS);
        assert_eq!(config.voice, DEFAULT_VOICE);
        assert_eq!(config.speed, DEFAULT_SPEED);
        assert_eq!(config.temperature, DEFAULT_TEMPERATURE);
        assert_eq!(
            config.turn_detection,
            TurnDetectionSetting::Default(TurnDetection::default())
        );
    }

    #[test]
    fn test_empty_strings_fall_back() {
        let config = normalize(&body(json!({ "instructions": "", "voice": "" })));
        assert_eq!(config.instructions, DEFAULT_INSTRUCTIONS);
        assert_eq!(config.voice, DEFAULT_VOICE);
    }

    #[test]
    fn test_numeric_string_speed_is_not_coerced() {
        let config = normalize(&body(json!({ "speed": "0.9" })));
        assert_eq!(config.speed, DEFAULT_SPEED);

        let config = normalize(&body(json!({ "speed": "1.5" })));
        assert_eq!(config.speed, DEFAULT_SPEED);
    }

    #[test]
    fn test_explicit_zero_is_preserved() {
        let config = normalize(&body(json!({ "speed": 0, "temperature": 0.0 })));
        assert_eq!(config.speed, 0.0);
        assert_eq!(config.temperature, 0.0);
    }

    #[test]
    fn test_integer_numbers_are_accepted() {
        let config = normalize(&body(json!({ "speed": 1, "temperature": 1 })));
        assert_eq!(config.speed, 1.0);
        assert_eq!(config.temperature, 1.0);
    }

    #[test]
    fn test_camel_case_turn_detection_passes_through() {
        let config = normalize(&body(json!({ "turnDetection": { "type": "none" } })));
        assert_eq!(
            serde_json::to_value(&config.turn_detection).unwrap(),
            json!({ "type": "none" })
        );
    }

    #[test]
    fn test_snake_case_turn_detection_passes_through() {
        let config = normalize(&body(json!({
            "turn_detection": { "type": "semantic_vad", "eagerness": "low" }
        })));
        assert_eq!(
            config.turn_detection,
            TurnDetectionSetting::Caller(json!({ "type": "semantic_vad", "eagerness": "low" }))
        );
    }

    #[test]
    fn test_camel_case_wins_over_snake_case() {
        let config = normalize(&body(json!({
            "turn_detection": { "type": "server_vad", "threshold": 0.9 },
            "turnDetection": { "type": "none" }
        })));
        assert_eq!(
            config.turn_detection,
            TurnDetectionSetting::Caller(json!({ "type": "none" }))
        );
    }

    #[test]
    fn test_falsy_camel_case_defers_to_snake_case() {
        for falsy in [json!(null), json!(false), json!(0), json!("")] {
            let config = normalize(&body(json!({
                "turnDetection": falsy,
                "turn_detection": { "type": "none" }
            })));
            assert_eq!(
                config.turn_detection,
                TurnDetectionSetting::Caller(json!({ "type": "none" }))
            );
        }
    }

    #[test]
    fn test_model_and_fixed_fields_are_not_caller_configurable() {
        let config = normalize(&body(json!({
            "model": "gpt-4o-realtime-preview",
            "output_audio_format": "g711_ulaw",
            "modalities": ["text"]
        })));
        assert_eq!(config.model, REALTIME_MODEL);
        assert_eq!(config.output_audio_format, OUTPUT_AUDIO_FORMAT);
        assert_eq!(config.modalities, MODALITIES);
    }

    #[test]
    fn test_end_to_end_scenario() {
        let config = normalize(&body(json!({
            "voice": "verse",
            "speed": 1.2,
            "turnDetection": { "type": "server_vad", "threshold": 0.5 }
        })));

        assert_eq!(
            serde_json::to_value(&config).unwrap(),
            json!({
                "model": REALTIME_MODEL,
                "instructions": DEFAULT_INSTRUCTIONS,
                "voice": "verse",
                "output_audio_format": "pcm16",
                "modalities": ["text", "audio"],
                "temperature": 0.7,
                "speed": 1.2,
                "turn_detection": { "type": "server_vad", "threshold": 0.5 }
            })
        );
    }

    #[test]
    fn test_serialized_key_order() {
        let json = serde_json::to_string(&normalize(&Map::new())).unwrap();
        let keys = [
            "\"model\"",
            "\"instructions\"",
            "\"voice\"",
            "\"output_audio_format\"",
            "\"modalities\"",
            "\"temperature\"",
            "\"speed\"",
            "\"turn_detection\"",
        ];
        let positions: Vec<usize> = keys.iter().map(|k| json.find(k).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{json}");
    }

    #[test]
    fn test_user_id_is_read_but_not_forwarded() {
        let map = body(json!({ "userId": "student-7" }));
        let request = InboundSessionRequest::new(&map);
        assert_eq!(request.user_id(), Some("student-7"));

        let json = serde_json::to_value(normalize(&map)).unwrap();
        assert!(json.get("userId").is_none());
    }

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!(0.0)));
        assert!(!is_truthy(&json!("")));
        assert!(is_truthy(&json!({})));
        assert!(is_truthy(&json!([])));
        assert!(is_truthy(&json!("x")));
        assert!(is_truthy(&json!(true)));
        assert!(is_truthy(&json!(-1)));
    }
}

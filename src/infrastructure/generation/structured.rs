//! Lenient parsing of structured model output

use serde::de::DeserializeOwned;

use crate::domain::DomainError;

/// Parse a JSON object out of model output.
///
/// Models asked for strict JSON still occasionally wrap it in code fences or
/// prose; this takes the outermost `{...}` span before deserializing.
pub fn parse_json_object<T: DeserializeOwned>(text: &str) -> Result<T, DomainError> {
    let trimmed = text.trim();

    if let Ok(value) = serde_json::from_str::<T>(trimmed) {
        return Ok(value);
    }

    let start = trimmed
        .find('{')
        .ok_or_else(|| DomainError::validation("no JSON object in model output"))?;
    let end = trimmed
        .rfind('}')
        .ok_or_else(|| DomainError::validation("unterminated JSON object in model output"))?;

    if end <= start {
        return Err(DomainError::validation("malformed JSON object in model output"));
    }

    serde_json::from_str(&trimmed[start..=end])
        .map_err(|e| DomainError::validation(format!("cannot parse model output: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Flagged {
        flag: i32,
        message: Option<String>,
    }

    #[test]
    fn test_parses_clean_json() {
        let parsed: Flagged = parse_json_object(r#"{"flag":0,"message":null}"#).unwrap();
        assert_eq!(parsed.flag, 0);
        assert!(parsed.message.is_none());
    }

    #[test]
    fn test_parses_fenced_json() {
        let text = "```json\n{\"flag\": 1, \"message\": \"no\"}\n```";
        let parsed: Flagged = parse_json_object(text).unwrap();
        assert_eq!(parsed.flag, 1);
        assert_eq!(parsed.message.as_deref(), Some("no"));
    }

    #[test]
    fn test_parses_json_inside_prose() {
        let text = "Here is my verdict: {\"flag\": 0} - thanks";
        let parsed: Flagged = parse_json_object(text).unwrap();
        assert_eq!(parsed.flag, 0);
    }

    #[test]
    fn test_rejects_output_without_object() {
        let result: Result<Flagged, _> = parse_json_object("definitely not json");
        assert!(result.is_err());
    }
}

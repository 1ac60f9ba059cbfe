//! Extraction of the machine-readable action directive embedded in assistant replies.
//!
//! The backend appends a tag of the form
//! `[ACTION: OPEN_PORTAL | scheme: <name> | details: {"key":"value",...}]`
//! to a reply when it wants the portal filled in. The tag is stripped from the
//! text shown to the citizen and the payload is returned as an [`ActionDirective`].
//! Only the first tag in a reply is considered, and it must fit on one line.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::types::FieldValues;

/// Shown instead of the reply when the directive was the only thing in it.
pub const FALLBACK_ACKNOWLEDGEMENT: &str = "Theek hai! Mujhe saari jankari mil gayi hai. Main ab portal par aapka application bhar raha hoon. Kripya screen par dekhiye...";

lazy_static! {
    static ref ACTION_RE: Regex = Regex::new(
        r"\[ACTION:\s*OPEN_PORTAL\s*\|\s*scheme:\s*(.*?)\s*\|\s*details:\s*(\{.*?\})\]"
    )
    .expect("action directive pattern is valid");
}

/// Instruction to open the portal and fill a scheme form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionDirective {
    pub scheme_name: String,
    pub details: FieldValues,
}

/// Why a directive payload was rejected
#[derive(Error, Debug)]
pub enum DirectiveError {
    #[error("details are not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("details must be a JSON object")]
    NotAnObject,

    #[error("detail field '{0}' is not a string, number or boolean")]
    NonScalarField(String),
}

/// Result of running extraction over one reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionOutcome {
    /// Text to show the citizen
    pub display_text: String,
    /// Parsed directive, if the reply carried a well-formed one
    pub directive: Option<ActionDirective>,
}

/// Parses the brace-delimited details payload into ordered scalar fields.
pub fn parse_details(raw: &str) -> Result<FieldValues, DirectiveError> {
    let object = match serde_json::from_str::<Value>(raw)? {
        Value::Object(map) => map,
        _ => return Err(DirectiveError::NotAnObject),
    };

    let mut details = FieldValues::with_capacity(object.len());
    for (key, value) in object {
        let text = match value {
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => return Err(DirectiveError::NonScalarField(key)),
        };
        details.insert(key, text);
    }
    Ok(details)
}

/// Splits a reply into display text and an optional directive.
///
/// Never fails: a malformed payload is logged and dropped, leaving only the
/// human-readable part of the reply.
pub fn extract_directive(reply: &str) -> ExtractionOutcome {
    let Some(captures) = ACTION_RE.captures(reply) else {
        return ExtractionOutcome {
            display_text: reply.to_string(),
            directive: None,
        };
    };

    // Group 0 always exists on a successful capture
    let whole = captures.get(0).map(|m| m.range()).unwrap_or(0..0);
    let scheme_name = captures
        .get(1)
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default();
    let raw_details = captures.get(2).map(|m| m.as_str()).unwrap_or("{}");

    let mut remaining = String::with_capacity(reply.len());
    remaining.push_str(&reply[..whole.start]);
    remaining.push_str(&reply[whole.end..]);
    let cleaned = remaining.trim().to_string();

    match parse_details(raw_details) {
        Ok(details) => {
            debug!(scheme = %scheme_name, fields = details.len(), "Extracted portal directive");
            let display_text = if cleaned.is_empty() {
                FALLBACK_ACKNOWLEDGEMENT.to_string()
            } else {
                cleaned
            };
            ExtractionOutcome {
                display_text,
                directive: Some(ActionDirective {
                    scheme_name,
                    details,
                }),
            }
        }
        Err(e) => {
            warn!(error = %e, scheme = %scheme_name, "Dropping malformed portal directive");
            ExtractionOutcome {
                display_text: cleaned,
                directive: None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_without_directive_is_unchanged() {
        let reply = "  PM Kisan mein saal ke 6000 rupaye milte hain.  ";
        let outcome = extract_directive(reply);
        assert_eq!(outcome.display_text, reply);
        assert!(outcome.directive.is_none());
    }

    #[test]
    fn test_directive_is_removed_and_parsed() {
        let reply = r#"Theek hai ji, main application bhar raha hoon. [ACTION: OPEN_PORTAL | scheme: Ladli Behna | details: {"aadhar":"1111-2222-3333","samagra_id":"192837465"}]"#;
        let outcome = extract_directive(reply);

        assert_eq!(
            outcome.display_text,
            "Theek hai ji, main application bhar raha hoon."
        );
        let directive = outcome.directive.unwrap();
        assert_eq!(directive.scheme_name, "Ladli Behna");
        let keys: Vec<&str> = directive.details.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["aadhar", "samagra_id"]);
        assert_eq!(directive.details["samagra_id"], "192837465");
    }

    #[test]
    fn test_text_on_both_sides_is_joined_and_trimmed() {
        let reply = r#"Pehle. [ACTION: OPEN_PORTAL | scheme: PM Kisan | details: {"aadhar":"1"}] Baad mein.   "#;
        let outcome = extract_directive(reply);
        assert_eq!(outcome.display_text, "Pehle.  Baad mein.");
        assert!(outcome.directive.is_some());
    }

    #[test]
    fn test_directive_only_reply_uses_fallback() {
        let reply = r#"[ACTION: OPEN_PORTAL | scheme: PM Kisan | details: {"aadhar":"1234-5678-9012","bank_account":"30991234"}]"#;
        let outcome = extract_directive(reply);
        assert_eq!(outcome.display_text, FALLBACK_ACKNOWLEDGEMENT);
        let directive = outcome.directive.unwrap();
        assert_eq!(directive.scheme_name, "PM Kisan");
        assert_eq!(directive.details["aadhar"], "1234-5678-9012");
        assert_eq!(directive.details["bank_account"], "30991234");
    }

    #[test]
    fn test_loose_spacing_is_accepted() {
        let reply = r#"[ACTION:OPEN_PORTAL|scheme:Old Age Pension|details:{"bank_ifsc":"SBIN0001234"}]"#;
        let directive = extract_directive(reply).directive.unwrap();
        assert_eq!(directive.scheme_name, "Old Age Pension");
        assert_eq!(directive.details["bank_ifsc"], "SBIN0001234");
    }

    #[test]
    fn test_malformed_payload_is_stripped_without_directive() {
        let reply = r#"Ek minute. [ACTION: OPEN_PORTAL | scheme: PM Kisan | details: {aadhar: 1234}]"#;
        let outcome = extract_directive(reply);
        assert_eq!(outcome.display_text, "Ek minute.");
        assert!(outcome.directive.is_none());
    }

    #[test]
    fn test_malformed_payload_alone_leaves_empty_text() {
        let reply = r#"[ACTION: OPEN_PORTAL | scheme: PM Kisan | details: {not json}]"#;
        let outcome = extract_directive(reply);
        assert_eq!(outcome.display_text, "");
        assert!(outcome.directive.is_none());
    }

    #[test]
    fn test_scalar_values_become_text() {
        let details = parse_details(r#"{"family_count":4,"land_status":true,"aadhar":"x"}"#).unwrap();
        assert_eq!(details["family_count"], "4");
        assert_eq!(details["land_status"], "true");
        assert_eq!(details["aadhar"], "x");
    }

    #[test]
    fn test_nested_values_are_rejected() {
        let err = parse_details(r#"{"address":{"district":"Sehore"}}"#).unwrap_err();
        assert!(matches!(err, DirectiveError::NonScalarField(ref k) if k == "address"));

        let reply = r#"Ok [ACTION: OPEN_PORTAL | scheme: PM Kisan | details: {"docs":["a","b"]}]"#;
        let outcome = extract_directive(reply);
        assert_eq!(outcome.display_text, "Ok");
        assert!(outcome.directive.is_none());
    }

    #[test]
    fn test_only_first_directive_is_considered() {
        let reply = r#"[ACTION: OPEN_PORTAL | scheme: PM Kisan | details: {"aadhar":"1"}] [ACTION: OPEN_PORTAL | scheme: Ladli Behna | details: {"aadhar":"2"}]"#;
        let outcome = extract_directive(reply);
        assert_eq!(outcome.directive.unwrap().scheme_name, "PM Kisan");
        assert!(outcome.display_text.contains("Ladli Behna"));
    }

    #[test]
    fn test_multiline_payload_does_not_match() {
        let reply = "[ACTION: OPEN_PORTAL | scheme: PM Kisan | details: {\"aadhar\":\n\"1\"}]";
        let outcome = extract_directive(reply);
        assert_eq!(outcome.display_text, reply);
        assert!(outcome.directive.is_none());
    }
}

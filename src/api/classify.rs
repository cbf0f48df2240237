//! Classification of service-reported errors.

use serde_json::Value;

use super::{Error, ServiceErrorKind};

// Compared case-insensitively against the "error" message. The service
// prefixes or suffixes some of these, so a phrase only has to be contained.
const KNOWN_ERRORS: [(&str, ServiceErrorKind); 5] = [
    ("rate limit reached", ServiceErrorKind::RateLimited),
    ("no information available", ServiceErrorKind::NoInformation),
    ("empty search query", ServiceErrorKind::NoQuery),
    ("access denied", ServiceErrorKind::AccessDenied),
    ("invalid api key", ServiceErrorKind::InvalidKey),
];

impl ServiceErrorKind {
    /// Finds the kind whose phrase appears in `message`.
    pub fn from_message(message: &str) -> Option<ServiceErrorKind> {
        let message = message.to_lowercase();

        KNOWN_ERRORS
            .iter()
            .find(|(phrase, _)| message.contains(*phrase))
            .map(|(_, kind)| *kind)
    }
}

/// The `"error"` message of an envelope, if it carries one. Non-string
/// messages are rendered as JSON.
pub(crate) fn error_message(envelope: &Value) -> Option<String> {
    let error = envelope.as_object()?.get("error")?;

    Some(match error {
        Value::String(message) => message.clone(),
        other => other.to_string(),
    })
}

/// Passes a decoded response through unchanged unless it is a mapping with an
/// `"error"` key, in which case the error is raised as a typed [`Error`].
pub fn classify(envelope: Value) -> Result<Value, Error> {
    let message = match error_message(&envelope) {
        Some(message) => message,
        None => return Ok(envelope),
    };

    match ServiceErrorKind::from_message(&message) {
        Some(kind) => Err(Error::Service { kind, message }),
        None => Err(Error::UnknownService(message)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use strum::IntoEnumIterator;

    #[test]
    fn test_known_phrases_any_casing() {
        let cases = [
            ("Rate limit reached", ServiceErrorKind::RateLimited),
            ("RATE LIMIT REACHED", ServiceErrorKind::RateLimited),
            ("No information available", ServiceErrorKind::NoInformation),
            ("empty search query", ServiceErrorKind::NoQuery),
            ("Access Denied", ServiceErrorKind::AccessDenied),
            ("Invalid API key", ServiceErrorKind::InvalidKey),
        ];

        for (message, expected) in cases {
            let err = classify(json!({ "error": message })).unwrap_err();

            assert_eq!(err.service_kind(), Some(expected), "{}", message);
        }
    }

    #[test]
    fn test_message_variations_still_match() {
        let err = classify(json!({
            "error": "Request rate limit reached (1/second). Please wait a second and try again."
        }))
        .unwrap_err();
        assert_eq!(err.service_kind(), Some(ServiceErrorKind::RateLimited));

        let err = classify(json!({ "error": "No information available for that IP." })).unwrap_err();
        assert_eq!(err.service_kind(), Some(ServiceErrorKind::NoInformation));

        match err {
            Error::Service { message, .. } => {
                assert_eq!(message, "No information available for that IP.")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_every_kind_has_a_phrase() {
        for kind in ServiceErrorKind::iter() {
            assert!(KNOWN_ERRORS.iter().any(|(_, k)| *k == kind), "{:?}", kind);
        }
    }

    #[test]
    fn test_unknown_error_is_surfaced() {
        let err = classify(json!({ "error": "Something else went wrong" })).unwrap_err();

        assert!(matches!(err, Error::UnknownService(ref m) if m == "Something else went wrong"));
        assert_eq!(err.service_kind(), None);

        let err = classify(json!({ "error": { "code": 7 } })).unwrap_err();
        assert!(matches!(err, Error::UnknownService(ref m) if m == r#"{"code":7}"#));
    }

    #[test]
    fn test_payloads_pass_through() {
        let payloads = [
            json!({ "matches": [], "total": 0 }),
            json!([{ "error": "not an envelope" }]),
            json!("Invalid API key"),
            json!(42),
            json!(null),
        ];

        for payload in payloads {
            assert_eq!(classify(payload.clone()).unwrap(), payload);
        }
    }
}

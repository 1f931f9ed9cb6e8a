//! Turning bridge errors into one user-facing line.
//!
//! Structured server messages are shown verbatim unless a rule of the
//! table matches; failures without a server message fall back to the
//! table's transport text or the error's own description.

use bridge_client::BridgeError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemapRule {
    /// Matched case-insensitively anywhere in the server message.
    pub needle: String,
    pub replacement: String,
}

#[derive(Debug, Clone, Default)]
pub struct ErrorRemapTable {
    rules: Vec<RemapRule>,
    transport_fallback: Option<String>,
}

impl ErrorRemapTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rule(mut self, needle: impl Into<String>, replacement: impl Into<String>) -> Self {
        self.rules.push(RemapRule {
            needle: needle.into().to_lowercase(),
            replacement: replacement.into(),
        });
        self
    }

    /// Text shown when the bridge gave no message at all.
    pub fn transport_fallback(mut self, text: impl Into<String>) -> Self {
        self.transport_fallback = Some(text.into());
        self
    }

    /// Replacement for a server message, first matching rule wins.
    pub fn rewrite(&self, message: &str) -> Option<&str> {
        let lowered = message.to_lowercase();
        self.rules
            .iter()
            .find(|rule| lowered.contains(&rule.needle))
            .map(|rule| rule.replacement.as_str())
    }

    pub fn normalize(&self, error: &BridgeError) -> String {
        match error.server_message() {
            Some(message) => self.rewrite(message).unwrap_or(message).to_string(),
            None => self
                .transport_fallback
                .clone()
                .unwrap_or_else(|| error.to_string()),
        }
    }

    /// Messages of `GET /user/business-profile`.
    pub fn business_profile() -> Self {
        Self::new()
            .rule(
                "not be a business account",
                "This number is not a WhatsApp Business account, or it has no public business profile.",
            )
            .rule(
                "profile data is corrupted",
                "The business profile data is corrupted. Please try again later.",
            )
            .transport_fallback(
                "Failed to fetch business profile. Check the phone number and try again.",
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(message: &str) -> BridgeError {
        BridgeError::Api {
            status: 500,
            message: message.into(),
        }
    }

    #[test]
    fn test_server_message_is_shown_verbatim() {
        let table = ErrorRemapTable::new();
        assert_eq!(table.normalize(&api("group not found")), "group not found");
    }

    #[test]
    fn test_known_substring_is_rewritten() {
        let table = ErrorRemapTable::business_profile();
        let message = table.normalize(&api(
            "the number 5511 may Not Be A Business Account",
        ));
        assert!(message.starts_with("This number is not a WhatsApp Business account"));

        let corrupted = table.normalize(&api("profile data is corrupted: bad proto"));
        assert!(corrupted.contains("try again later"));
    }

    #[test]
    fn test_unmatched_message_falls_through() {
        let table = ErrorRemapTable::business_profile();
        assert_eq!(table.normalize(&api("rate limited")), "rate limited");
    }

    #[test]
    fn test_transport_failure_uses_fallback() {
        let table = ErrorRemapTable::business_profile();
        assert_eq!(
            table.normalize(&BridgeError::Status(502)),
            "Failed to fetch business profile. Check the phone number and try again."
        );
    }

    #[test]
    fn test_transport_failure_without_fallback() {
        let table = ErrorRemapTable::new();
        assert_eq!(
            table.normalize(&BridgeError::Status(502)),
            "Unexpected response status: 502"
        );
    }
}

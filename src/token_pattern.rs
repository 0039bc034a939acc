use crate::error::ConfigProtectedError;
use regex::Regex;

/// Default token syntax: `Protected:{<ciphertext>}` or
/// `Protected:{<qualifier>}:{<ciphertext>}`. Neither segment may contain
/// braces, so a qualifier can never swallow text between two tokens and
/// several tokens can live inside one string value.
pub const DEFAULT_TOKEN_PATTERN: &str =
    r"Protected(?::\{(?P<purpose>[^{}]+?)\})?:\{(?P<payload>[^{}]+?)\}";

pub const DEFAULT_PAYLOAD_GROUP: &str = "payload";
pub const DEFAULT_PURPOSE_GROUP: &str = "purpose";

/// A compiled token pattern. The payload group is mandatory; the purpose
/// qualifier group may be missing from the pattern or from individual
/// matches.
#[derive(Clone, Debug)]
pub struct TokenPattern {
    regex: Regex,
    payload_group: String,
    purpose_group: String,
}

impl TokenPattern {
    /// Compiles `pattern` with the default capture group names.
    pub fn new(pattern: &str) -> Result<Self, ConfigProtectedError> {
        Self::with_groups(pattern, DEFAULT_PAYLOAD_GROUP, DEFAULT_PURPOSE_GROUP)
    }

    /// Compiles `pattern` with caller-chosen capture group names. Fails if
    /// the regex does not compile or lacks the payload group.
    pub fn with_groups(
        pattern: &str,
        payload_group: &str,
        purpose_group: &str,
    ) -> Result<Self, ConfigProtectedError> {
        let regex = Regex::new(pattern)
            .map_err(|e| ConfigProtectedError::InvalidPattern(e.to_string()))?;

        let has_payload = regex
            .capture_names()
            .any(|name| name == Some(payload_group));
        if !has_payload {
            return Err(ConfigProtectedError::MissingPayloadGroup(
                payload_group.to_string(),
            ));
        }

        Ok(Self {
            regex,
            payload_group: payload_group.to_string(),
            purpose_group: purpose_group.to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Replaces every token in `value` with `decode(qualifier, payload)`,
    /// preserving all non-matched text verbatim. The first decode error
    /// aborts; no partial output escapes.
    pub fn replace_all<F>(&self, value: &str, mut decode: F) -> Result<String, ConfigProtectedError>
    where
        F: FnMut(Option<&str>, &str) -> Result<String, ConfigProtectedError>,
    {
        let mut output = String::with_capacity(value.len());
        let mut cursor = 0;

        for caps in self.regex.captures_iter(value) {
            let span = match caps.get(0) {
                Some(span) => span,
                None => continue,
            };

            // A payload group that did not participate in this particular
            // match (possible with alternation patterns) leaves the span
            // untouched.
            let payload = match caps.name(&self.payload_group) {
                Some(payload) => payload.as_str(),
                None => continue,
            };
            let qualifier = caps
                .name(&self.purpose_group)
                .map(|m| m.as_str())
                .filter(|q| !q.is_empty());

            output.push_str(&value[cursor..span.start()]);
            output.push_str(&decode(qualifier, payload)?);
            cursor = span.end();
        }

        output.push_str(&value[cursor..]);
        Ok(output)
    }
}

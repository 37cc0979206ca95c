/// Longest prefix of a raw payload kept for diagnostics.
const SNIPPET_LIMIT: usize = 256;

const UNKNOWN_VARIANT_PREFIX: &str = "unknown variant `";

/// Endings serde puts after the closing backtick of an unknown tag. The tag
/// itself may contain backticks, so the tag ends at the last match.
const UNKNOWN_VARIANT_ENDINGS: [&str; 2] = ["`, expected ", "`, there are no variants"];

/// Errors that can occur when decoding or encoding wire payloads.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// The bytes do not match any expected JSON shape.
    #[error("malformed payload: {reason} (payload: {snippet})")]
    MalformedPayload { reason: String, snippet: String },

    /// A discriminant tag names a variant that is not known.
    #[error("unknown variant `{tag}`")]
    UnknownVariant { tag: String },
}

impl Error {
    pub fn malformed(reason: impl Into<String>, raw: &[u8]) -> Self {
        Error::MalformedPayload {
            reason: reason.into(),
            snippet: snippet(raw),
        }
    }

    pub fn unknown_variant(tag: impl Into<String>) -> Self {
        Error::UnknownVariant { tag: tag.into() }
    }

    /// Classify a `serde_json` failure against the raw bytes it was reading.
    ///
    /// Unknown tags surface through serde's `unknown_variant` message (both
    /// from derived enums and from [`de_error`]), so that is the one data
    /// error we lift back into a structured variant.
    pub fn from_serde(err: serde_json::Error, raw: &[u8]) -> Self {
        if err.is_data() {
            let message = err.to_string();
            if let Some(tag) = unknown_variant_tag(&message) {
                return Error::UnknownVariant {
                    tag: tag.to_string(),
                };
            }
        }
        Error::malformed(err.to_string(), raw)
    }
}

/// Convert a codec error raised inside a hand-written `Deserialize` impl into
/// the deserializer's error type, keeping it recognisable to
/// [`Error::from_serde`].
pub fn de_error<E: serde::de::Error>(err: Error) -> E {
    match err {
        Error::MalformedPayload { reason, .. } => E::custom(reason),
        Error::UnknownVariant { tag } => E::custom(format_args!(
            "{UNKNOWN_VARIANT_PREFIX}{tag}`, expected a known variant"
        )),
    }
}

fn unknown_variant_tag(message: &str) -> Option<&str> {
    let rest = message.strip_prefix(UNKNOWN_VARIANT_PREFIX)?;
    let end = UNKNOWN_VARIANT_ENDINGS
        .iter()
        .filter_map(|ending| rest.rfind(ending))
        .max()?;
    Some(&rest[..end])
}

fn snippet(raw: &[u8]) -> String {
    let text = String::from_utf8_lossy(raw);
    match text.char_indices().nth(SNIPPET_LIMIT) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.into_owned(),
    }
}

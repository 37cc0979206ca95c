//! Discriminated-union decoding.
//!
//! Polymorphic payloads come in two flavours:
//!
//! - **Tagged**: a `type` (or `role`) field names the variant. These are plain
//!   serde internally-tagged enums; [`decode`] turns serde's
//!   `unknown variant` failure into [`Error::UnknownVariant`] and everything
//!   else into [`Error::MalformedPayload`].
//! - **Shape-probed**: the same field may hold a bare string or an object
//!   (e.g. `"auto"` vs `{"type": "function", ...}`). [`probe`] tries each
//!   shape in order and stops at the first one that matches.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::Error;
use crate::value::{DynamicValue, Map};

/// Decode a typed payload from JSON bytes.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, Error> {
    serde_json::from_slice(bytes).map_err(|e| Error::from_serde(e, bytes))
}

/// Decode a typed payload from a JSON string.
pub fn decode_str<T: DeserializeOwned>(text: &str) -> Result<T, Error> {
    decode(text.as_bytes())
}

/// Encode a typed payload as JSON bytes.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, Error> {
    serde_json::to_vec(value).map_err(|e| Error::malformed(e.to_string(), &[]))
}

/// Read a string discriminant out of an object.
pub fn require_tag<'v>(object: &'v Map, field: &str) -> Result<&'v str, Error> {
    match object.get(field) {
        Some(DynamicValue::String(tag)) => Ok(tag),
        Some(other) => Err(Error::MalformedPayload {
            reason: format!("`{field}` must be a string, found {}", other.kind()),
            snippet: DynamicValue::Object(object.clone()).to_string(),
        }),
        None => Err(Error::MalformedPayload {
            reason: format!("missing field `{field}`"),
            snippet: DynamicValue::Object(object.clone()).to_string(),
        }),
    }
}

// ---------------------------------------------------------------------------
// Shape probing
// ---------------------------------------------------------------------------

/// Start an ordered list of shape alternatives over `value`.
///
/// ```
/// use assist_codec::{DynamicValue, codec};
///
/// let value = DynamicValue::decode(br#""auto""#).unwrap();
/// let parsed: Result<String, _> = codec::probe(&value)
///     .string(|s| Ok(format!("string:{s}")))
///     .object(|_| Ok("object".to_string()))
///     .finish("string or object");
/// assert_eq!(parsed.unwrap(), "string:auto");
/// ```
pub fn probe<T>(value: &DynamicValue) -> Probe<'_, T> {
    Probe {
        value,
        outcome: None,
    }
}

/// Ordered-alternative parser over the shape of a [`DynamicValue`].
///
/// Each alternative only runs when no earlier alternative matched and the
/// value has that alternative's shape. A shape mismatch is silent; once a
/// shape matches, its parser's result (success or error) is final.
#[must_use]
pub struct Probe<'v, T> {
    value: &'v DynamicValue,
    outcome: Option<Result<T, Error>>,
}

impl<'v, T> Probe<'v, T> {
    /// Alternative for a bare JSON string.
    pub fn string(self, parse: impl FnOnce(&'v str) -> Result<T, Error>) -> Self {
        self.alternative(|value| match value {
            DynamicValue::String(s) => Some(parse(s.as_str())),
            _ => None,
        })
    }

    /// Alternative for a JSON object.
    pub fn object(self, parse: impl FnOnce(&'v Map) -> Result<T, Error>) -> Self {
        self.alternative(|value| match value {
            DynamicValue::Object(map) => Some(parse(map)),
            _ => None,
        })
    }

    /// Generic alternative: return `None` to let the next one try.
    pub fn alternative(
        mut self,
        attempt: impl FnOnce(&'v DynamicValue) -> Option<Result<T, Error>>,
    ) -> Self {
        if self.outcome.is_none() {
            self.outcome = attempt(self.value);
        }
        self
    }

    /// Resolve the probe. `expected` describes the accepted shapes when none
    /// matched.
    pub fn finish(self, expected: &str) -> Result<T, Error> {
        match self.outcome {
            Some(outcome) => outcome,
            None => Err(Error::MalformedPayload {
                reason: format!("expected {expected}, found {}", self.value.kind()),
                snippet: self.value.to_string(),
            }),
        }
    }
}

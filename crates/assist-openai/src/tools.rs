//! Tools, tool choice, response format and tool calls.

use assist_codec::{DynamicValue, de_error, probe, require_tag};
use serde::de::{DeserializeOwned, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

use crate::error::Error;

// ---------------------------------------------------------------------------
// Tool
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Tool {
    CodeInterpreter,
    FileSearch {
        #[serde(default)]
        file_search: FileSearch,
    },
    Function {
        function: FunctionTool,
    },
}

impl Tool {
    pub fn file_search(vector_store_ids: Vec<String>) -> Self {
        Tool::FileSearch {
            file_search: FileSearch { vector_store_ids },
        }
    }

    pub fn function(function: FunctionTool) -> Self {
        Tool::Function { function }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileSearch {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vector_store_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionTool {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Parameters>,
}

impl FunctionTool {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            parameters: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Attach a JSON-Schema string describing the arguments.
    pub fn parameters(mut self, schema: impl Into<String>) -> Result<Self, Error> {
        self.parameters = Some(Parameters::parse(schema)?);
        Ok(self)
    }
}

/// A function's JSON-Schema parameters, kept as the caller's original text
/// and as a parsed value used for encoding.
///
/// Equality compares the parsed schema only, so formatting differences in
/// the source text do not matter.
#[derive(Debug, Clone)]
pub struct Parameters {
    raw: String,
    schema: DynamicValue,
}

impl Parameters {
    /// Parse schema text. It must hold a JSON object.
    pub fn parse(raw: impl Into<String>) -> Result<Self, Error> {
        Ok(Self::parse_schema(raw.into())?)
    }

    /// Parse schema bytes. They must be UTF-8 and hold a JSON object.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, Error> {
        let raw = std::str::from_utf8(bytes)
            .map_err(|e| assist_codec::Error::malformed(e.to_string(), bytes))?;
        Self::parse(raw)
    }

    /// Wrap an already-parsed schema.
    pub fn from_value(schema: DynamicValue) -> Result<Self, Error> {
        Ok(Self::checked(schema.to_string(), schema)?)
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn schema(&self) -> &DynamicValue {
        &self.schema
    }

    fn parse_schema(raw: String) -> Result<Self, assist_codec::Error> {
        let schema = DynamicValue::decode(raw.as_bytes())?;
        Self::checked(raw, schema)
    }

    fn checked(raw: String, schema: DynamicValue) -> Result<Self, assist_codec::Error> {
        if schema.as_object().is_none() {
            return Err(assist_codec::Error::MalformedPayload {
                reason: format!("parameters must be a JSON object, found {}", schema.kind()),
                snippet: raw,
            });
        }
        Ok(Self { raw, schema })
    }
}

impl PartialEq for Parameters {
    fn eq(&self, other: &Self) -> bool {
        self.schema == other.schema
    }
}

impl Serialize for Parameters {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.schema.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Parameters {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = DynamicValue::deserialize(deserializer)?;
        probe(&value)
            .string(|text| Parameters::parse_schema(text.to_string()))
            .object(|_| Parameters::checked(value.to_string(), value.clone()))
            .finish("a JSON-Schema string or object")
            .map_err(de_error)
    }
}

// ---------------------------------------------------------------------------
// ToolChoice
// ---------------------------------------------------------------------------

/// Controls which tool the model calls. Encoded as a bare string for the
/// three modes and as a `{"type": ...}` object for a specific tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolChoice {
    None,
    Auto,
    Required,
    Specific(SpecificTool),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecificTool {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<FunctionName>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionName {
    pub name: String,
}

impl ToolChoice {
    /// Force a call to the named function.
    pub fn function(name: impl Into<String>) -> Self {
        ToolChoice::Specific(SpecificTool {
            kind: "function".into(),
            function: Some(FunctionName { name: name.into() }),
        })
    }

    fn from_mode(mode: &str) -> Result<Self, assist_codec::Error> {
        match mode {
            "none" => Ok(ToolChoice::None),
            "auto" => Ok(ToolChoice::Auto),
            "required" => Ok(ToolChoice::Required),
            other => Err(assist_codec::Error::unknown_variant(other)),
        }
    }

    fn from_object(object: &assist_codec::Map) -> Result<Self, assist_codec::Error> {
        let kind = require_tag(object, "type")?.to_string();
        let function = match object.get("function") {
            None | Some(DynamicValue::Null) => None,
            Some(function) => match function.get("name").and_then(DynamicValue::as_str) {
                Some(name) => Some(FunctionName {
                    name: name.to_string(),
                }),
                None => {
                    return Err(assist_codec::Error::MalformedPayload {
                        reason: "`function` must be an object with a string `name`".into(),
                        snippet: function.to_string(),
                    });
                }
            },
        };
        Ok(ToolChoice::Specific(SpecificTool { kind, function }))
    }
}

impl Serialize for ToolChoice {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ToolChoice::None => serializer.serialize_str("none"),
            ToolChoice::Auto => serializer.serialize_str("auto"),
            ToolChoice::Required => serializer.serialize_str("required"),
            ToolChoice::Specific(tool) => tool.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for ToolChoice {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = DynamicValue::deserialize(deserializer)?;
        probe(&value)
            .string(ToolChoice::from_mode)
            .object(ToolChoice::from_object)
            .finish("a tool choice string or object")
            .map_err(de_error)
    }
}

// ---------------------------------------------------------------------------
// ResponseFormat
// ---------------------------------------------------------------------------

/// Output format. The service sends `"auto"` as a bare string; explicit
/// formats are `{"type": "text" | "json_object"}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseFormat {
    Raw(String),
    Typed(ResponseKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseKind {
    Text,
    JsonObject,
}

impl ResponseKind {
    fn as_str(self) -> &'static str {
        match self {
            ResponseKind::Text => "text",
            ResponseKind::JsonObject => "json_object",
        }
    }
}

impl Serialize for ResponseFormat {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ResponseFormat::Raw(value) => serializer.serialize_str(value),
            ResponseFormat::Typed(kind) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("type", kind.as_str())?;
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for ResponseFormat {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = DynamicValue::deserialize(deserializer)?;
        probe(&value)
            .string(|raw| Ok(ResponseFormat::Raw(raw.to_string())))
            .object(|object| match require_tag(object, "type")? {
                "text" => Ok(ResponseFormat::Typed(ResponseKind::Text)),
                "json_object" => Ok(ResponseFormat::Typed(ResponseKind::JsonObject)),
                other => Err(assist_codec::Error::unknown_variant(other)),
            })
            .finish("a response format string or object")
            .map_err(de_error)
    }
}

// ---------------------------------------------------------------------------
// Tool calls
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolCall {
    Function(FunctionCall),
}

impl ToolCall {
    pub fn id(&self) -> &str {
        match self {
            ToolCall::Function(call) => &call.id,
        }
    }

    pub fn as_function(&self) -> Option<&FunctionCall> {
        match self {
            ToolCall::Function(call) => Some(call),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub id: String,
    pub function: FunctionInvocation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionInvocation {
    pub name: String,
    /// Raw JSON produced by the model; not validated until decoded.
    pub arguments: String,
}

impl FunctionCall {
    pub fn name(&self) -> &str {
        &self.function.name
    }

    /// Decode the model-supplied arguments into `T`.
    pub fn decode_arguments<T: DeserializeOwned>(&self) -> Result<T, Error> {
        Ok(assist_codec::decode_str(&self.function.arguments)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ANALYSIS_SCHEMA: &str = r#"{
        "type": "object",
        "properties": {
            "analysis": {
                "type": "object",
                "properties": { "text": { "type": "string" } }
            },
            "strategies": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": { "sl": { "type": "number" }, "tp": { "type": "number" } },
                    "required": ["sl", "tp"]
                }
            }
        },
        "required": ["analysis", "strategies"]
    }"#;

    fn round_trip(tool: &Tool) -> Tool {
        let bytes = assist_codec::encode(tool).expect("encode");
        assist_codec::decode(&bytes).expect("decode")
    }

    #[test]
    fn every_tool_variant_round_trips() {
        let with_schema = FunctionTool::new("get_analysis")
            .description("Provide technical analysis")
            .parameters(ANALYSIS_SCHEMA)
            .expect("schema");

        let tools = [
            Tool::CodeInterpreter,
            Tool::file_search(vec!["vs_1".into(), "vs_2".into()]),
            Tool::file_search(Vec::new()),
            Tool::function(with_schema),
            Tool::function(FunctionTool::new("ping")),
        ];
        for tool in &tools {
            assert_eq!(&round_trip(tool), tool);
        }
    }

    #[test]
    fn function_tool_encodes_parameters_as_object() {
        let tool = Tool::function(
            FunctionTool::new("f")
                .parameters(r#"{"type": "object", "properties": {}}"#)
                .expect("schema"),
        );
        assert_eq!(
            serde_json::to_value(&tool).expect("encode"),
            json!({
                "type": "function",
                "function": {"name": "f", "parameters": {"type": "object", "properties": {}}}
            })
        );
    }

    #[test]
    fn parameters_accept_string_or_object_on_decode() {
        let inline: Tool = assist_codec::decode_str(
            r#"{"type": "function", "function": {"name": "f", "parameters": {"type": "object"}}}"#,
        )
        .expect("inline");
        let quoted: Tool = assist_codec::decode_str(
            r#"{"type": "function", "function": {"name": "f", "parameters": "{\"type\": \"object\"}"}}"#,
        )
        .expect("quoted");
        assert_eq!(inline, quoted);

        let Tool::Function { function } = quoted else {
            panic!("expected function tool");
        };
        assert_eq!(
            function.parameters.expect("parameters").as_str(),
            r#"{"type": "object"}"#
        );
    }

    #[test]
    fn parameters_must_be_an_object() {
        let err = FunctionTool::new("f").parameters("[1, 2]").unwrap_err();
        assert!(matches!(err, Error::MalformedPayload { .. }));

        let err = FunctionTool::new("f").parameters("{not json").unwrap_err();
        assert!(matches!(err, Error::MalformedPayload { .. }));

        let err = Parameters::from_slice(&[0xff, 0xfe]).unwrap_err();
        assert!(matches!(err, Error::MalformedPayload { .. }));
    }

    #[test]
    fn unknown_tool_type_is_reported() {
        let err = assist_codec::decode_str::<Tool>(r#"{"type": "unknown_tool"}"#).unwrap_err();
        assert_eq!(err, assist_codec::Error::unknown_variant("unknown_tool"));

        let err = assist_codec::decode_str::<Tool>(r#"{"type": "my`tool"}"#).unwrap_err();
        assert_eq!(err, assist_codec::Error::unknown_variant("my`tool"));
    }

    #[test]
    fn tool_choice_decodes_both_shapes() {
        for (raw, expected) in [
            (r#""none""#, ToolChoice::None),
            (r#""auto""#, ToolChoice::Auto),
            (r#""required""#, ToolChoice::Required),
            (
                r#"{"type": "function", "function": {"name": "get_analysis"}}"#,
                ToolChoice::function("get_analysis"),
            ),
            (
                r#"{"type": "file_search"}"#,
                ToolChoice::Specific(SpecificTool {
                    kind: "file_search".into(),
                    function: None,
                }),
            ),
        ] {
            let decoded: ToolChoice = assist_codec::decode_str(raw).expect(raw);
            assert_eq!(decoded, expected, "{raw}");
        }
    }

    #[test]
    fn tool_choice_encodes_exactly_one_shape() {
        assert_eq!(
            serde_json::to_value(ToolChoice::Required).expect("encode"),
            json!("required")
        );
        assert_eq!(
            serde_json::to_value(ToolChoice::function("get_analysis")).expect("encode"),
            json!({"type": "function", "function": {"name": "get_analysis"}})
        );
    }

    #[test]
    fn tool_choice_object_without_type_is_malformed() {
        let err = assist_codec::decode_str::<ToolChoice>(r#"{"function": {"name": "f"}}"#)
            .unwrap_err();
        assert!(
            matches!(err, assist_codec::Error::MalformedPayload { ref reason, .. } if reason.contains("missing field `type`")),
            "{err:?}"
        );
    }

    #[test]
    fn tool_choice_unknown_mode_is_reported() {
        let err = assist_codec::decode_str::<ToolChoice>(r#""sometimes""#).unwrap_err();
        assert_eq!(err, assist_codec::Error::unknown_variant("sometimes"));

        let err = assist_codec::decode_str::<ToolChoice>(r#""some`mode""#).unwrap_err();
        assert_eq!(err, assist_codec::Error::unknown_variant("some`mode"));
    }

    #[test]
    fn response_format_decodes_both_shapes() {
        let raw: ResponseFormat = assist_codec::decode_str(r#""auto""#).expect("raw");
        assert_eq!(raw, ResponseFormat::Raw("auto".into()));

        let typed: ResponseFormat =
            assist_codec::decode_str(r#"{"type": "json_object"}"#).expect("typed");
        assert_eq!(typed, ResponseFormat::Typed(ResponseKind::JsonObject));

        assert_eq!(
            serde_json::to_value(&typed).expect("encode"),
            json!({"type": "json_object"})
        );
    }

    #[test]
    fn response_format_object_without_type_is_malformed() {
        let err = assist_codec::decode_str::<ResponseFormat>("{}").unwrap_err();
        assert!(matches!(err, assist_codec::Error::MalformedPayload { .. }));

        let err = assist_codec::decode_str::<ResponseFormat>(r#"{"type": "xml"}"#).unwrap_err();
        assert_eq!(err, assist_codec::Error::unknown_variant("xml"));
    }

    #[test]
    fn tool_call_arguments_decode_lazily() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Args {
            sl: f64,
            tp: f64,
        }

        let call: ToolCall = assist_codec::decode_str(
            r#"{"id": "call_1", "type": "function", "function": {"name": "get_analysis", "arguments": "{\"sl\": 1.5, \"tp\": 3}"}}"#,
        )
        .expect("decode");
        assert_eq!(call.id(), "call_1");

        let function = call.as_function().expect("function call");
        assert_eq!(function.name(), "get_analysis");
        assert_eq!(
            function.decode_arguments::<Args>().expect("args"),
            Args { sl: 1.5, tp: 3.0 }
        );
    }

    #[test]
    fn malformed_tool_call_arguments_are_recoverable() {
        let call = FunctionCall {
            id: "call_1".into(),
            function: FunctionInvocation {
                name: "f".into(),
                arguments: "{\"sl\": ".into(),
            },
        };
        let err = call.decode_arguments::<DynamicValue>().unwrap_err();
        assert!(matches!(err, Error::MalformedPayload { .. }));
    }
}

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// One coding-assistant transcript, as produced by the session parser.
///
/// Records are loaded from loosely-typed JSON, so scalar fields accept strings, numbers or
/// booleans and unknown keys are preserved in `extra` for faithful round-trips.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    #[serde(
        default,
        deserialize_with = "scalar_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub session_id: Option<String>,

    #[serde(
        default,
        deserialize_with = "scalar_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub project: Option<String>,

    #[serde(
        default,
        deserialize_with = "scalar_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub trajectory_type: Option<String>,

    #[serde(
        default,
        deserialize_with = "scalar_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub model: Option<String>,

    #[serde(
        default,
        deserialize_with = "scalar_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_time: Option<String>,

    #[serde(default)]
    pub messages: Vec<Message>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default, deserialize_with = "text")]
    pub role: String,

    #[serde(default, deserialize_with = "text")]
    pub content: String,

    #[serde(default)]
    pub tool_uses: Vec<ToolUse>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolUse {
    #[serde(default, deserialize_with = "text")]
    pub tool: String,

    /// Raw tool input; usually a string, sometimes a JSON object of arguments.
    #[serde(default)]
    pub input: Value,
}

/// A source of sessions found by discovery (a project log directory or an archive file).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDescriptor {
    pub dir_name: String,
    pub display_name: String,
    pub source: String,
}

impl Session {
    /// Tool names in message order, trimmed, skipping blanks.
    pub fn tool_names(&self) -> impl Iterator<Item = &str> {
        self.messages
            .iter()
            .flat_map(|message| message.tool_uses.iter())
            .map(|tool_use| tool_use.tool.trim())
            .filter(|name| !name.is_empty())
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }
}

impl Message {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn with_tool(mut self, tool: impl Into<String>, input: impl Into<Value>) -> Self {
        self.tool_uses.push(ToolUse {
            tool: tool.into(),
            input: input.into(),
        });
        self
    }
}

impl ToolUse {
    /// Input rendered as text: strings verbatim, other JSON values serialized.
    pub fn input_text(&self) -> String {
        match &self.input {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

fn scalar_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(scalar_string(deserializer)?.unwrap_or_default())
}

//! Data model for messages exchanged on the assistant's message bus

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A message on the bus: `{"type": ..., "data": {...}, "context": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "type")]
    pub msg_type: String,
    #[serde(default)]
    pub data: Map<String, Value>,
    #[serde(default)]
    pub context: Map<String, Value>,
}

impl Message {
    pub fn new(msg_type: impl Into<String>) -> Self {
        Message {
            msg_type: msg_type.into(),
            data: Map::new(),
            context: Map::new(),
        }
    }

    /// Builds a message whose data is the given JSON object. Non-object values
    /// are ignored.
    pub fn with_data(msg_type: impl Into<String>, data: Value) -> Self {
        let mut message = Message::new(msg_type);
        if let Value::Object(map) = data {
            message.data = map;
        }
        message
    }

    /// Builds a reply carrying this message's context.
    pub fn reply(&self, msg_type: impl Into<String>, data: Value) -> Self {
        let mut reply = Message::with_data(msg_type, data);
        reply.context = self.context.clone();
        reply
    }

    /// The default reply type used by request/response exchanges.
    pub fn response_type(&self) -> String {
        format!("{}.response", self.msg_type)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

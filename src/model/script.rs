use serde::Serialize;

/// One control message exchanged with a node's network controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigMessage {
    pub fblock_id: u8,
    pub instance_id: u8,
    pub function_id: u16,
    pub op_type: u8,
    /// Empty on an expected response means "match any payload".
    pub payload: Vec<u8>,
}

/// Command plus the response that completes it. `pause_ms` is waited
/// before the command is sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptStep {
    pub pause_ms: u16,
    pub command: ConfigMessage,
    pub expected: ConfigMessage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Script {
    pub name: String,
    pub steps: Vec<ScriptStep>,
}

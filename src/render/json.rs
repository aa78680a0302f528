//! JSON export of compiled configurations and scripts.

use crate::error::{CompileError, CompileResult};
use crate::model::{Configuration, Script};
use serde::Serialize;

fn to_json<T: Serialize>(value: &T) -> CompileResult<String> {
    serde_json::to_string_pretty(value).map_err(|err| CompileError::Internal(format!("json export: {}", err)))
}

pub fn render_json(config: &Configuration) -> CompileResult<String> {
    to_json(config)
}

pub fn render_script_json(script: &Script) -> CompileResult<String> {
    to_json(script)
}

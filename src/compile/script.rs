//! Script compiler: `<Script>` actions -> command/response message pairs.

use crate::diagnostics;
use crate::document::Element;
use crate::document::schema::*;
use crate::error::{CompileError, CompileResult};
use crate::model::{ConfigMessage, Script, ScriptStep};

pub const FBLOCK_INIC: u8 = 0x00;
pub const INSTANCE_INIC: u8 = 0x00;
pub const OP_START_RESULT: u8 = 0x02;
pub const OP_RESULT: u8 = 0x0C;
/// Expected op type that accepts any response.
pub const OP_ANY: u8 = 0xFF;

const FID_GPIO_PORT_CREATE: u16 = 0x701;
const FID_GPIO_PORT_PIN_MODE: u16 = 0x703;
const FID_GPIO_PIN_STATE: u16 = 0x704;
const FID_I2C_PORT_CREATE: u16 = 0x6C1;
const FID_I2C_PORT_READ: u16 = 0x6C3;
const FID_I2C_PORT_WRITE: u16 = 0x6C4;

const GPIO_PORT_INDEX: u8 = 0x00;
const GPIO_PORT_HANDLE: [u8; 2] = [0x1D, 0x00];
const I2C_PORT_INDEX: u8 = 0x00;
const I2C_SLAVE_ADDRESS: u8 = 0x00;
const I2C_PORT_HANDLE: [u8; 2] = [0x0F, 0x00];

const I2C_SPEEDS: &[(&str, u8)] = &[("SlowMode", 0x00), ("FastMode", 0x01)];
const I2C_MODES: &[(&str, u8)] = &[("Default", 0x00), ("RepeatedStart", 0x01), ("BurstMode", 0x02)];

/// Who asked for a script.
#[derive(Debug, Clone)]
enum Registration {
    Node { index: usize, address: u16, name: String },
    /// Accepts whatever script is declared.
    SingleShot,
}

impl Registration {
    fn accepts(&self, script: &str) -> bool {
        match self {
            Registration::Node { name, .. } => name == script,
            Registration::SingleShot => true,
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct ScriptRegistry {
    pending: Vec<Registration>,
    compiled: Vec<Script>,
}

#[derive(Debug, Default)]
pub(crate) struct Resolved {
    /// (node index, script) for every node that references a script.
    pub(crate) per_node: Vec<(usize, Script)>,
    pub(crate) single_shot: Option<Script>,
}

impl ScriptRegistry {
    pub(crate) fn register_node(&mut self, index: usize, address: u16, name: String) {
        self.pending.push(Registration::Node { index, address, name });
    }

    pub(crate) fn register_single_shot(&mut self) {
        self.pending.push(Registration::SingleShot);
    }

    pub(crate) fn compile(&mut self, el: &Element) -> CompileResult<()> {
        let script = compile_script_element(el)?;
        if self.compiled.iter().any(|s| s.name == script.name) {
            return Err(CompileError::structure(
                el.line,
                format!("script '{}' is declared twice", script.name),
            ));
        }
        self.compiled.push(script);
        Ok(())
    }

    /// Attach compiled scripts to their registrations. Every reference must
    /// resolve and every declared script must be referenced.
    pub(crate) fn resolve(self) -> CompileResult<Resolved> {
        let mut resolved = Resolved::default();

        for registration in &self.pending {
            let found = self.compiled.iter().find(|s| registration.accepts(&s.name));
            match (registration, found) {
                (Registration::Node { index, .. }, Some(script)) => {
                    resolved.per_node.push((*index, script.clone()));
                }
                (Registration::SingleShot, Some(script)) => {
                    resolved.single_shot = Some(script.clone());
                }
                (Registration::Node { address, name, .. }, None) => {
                    return Err(CompileError::reference(format!(
                        "script '{}' referenced by node 0x{:X} not found",
                        name, address
                    )));
                }
                (Registration::SingleShot, None) => {
                    return Err(CompileError::reference("no script to compile"));
                }
            }
        }

        for script in &self.compiled {
            if !self.pending.iter().any(|r| r.accepts(&script.name)) {
                return Err(CompileError::reference(format!(
                    "script '{}' is never referenced",
                    script.name
                )));
            }
        }

        Ok(resolved)
    }
}

/// Compile one `<Script>` element. A `Pause` delays the next action.
pub(crate) fn compile_script_element(el: &Element) -> CompileResult<Script> {
    let name = el.req_str(NAME)?.to_string();
    let mut steps = Vec::new();
    let mut pause: Option<u16> = None;

    for action in &el.children {
        if action.is(PAUSE) {
            let wait = action.req_u16(WAIT_TIME)?;
            let total = pause.unwrap_or(0).checked_add(wait).ok_or_else(|| CompileError::OutOfRange {
                element: action.name.clone(),
                attribute: WAIT_TIME.to_string(),
                value: (u32::from(pause.unwrap_or(0)) + u32::from(wait)).to_string(),
                max: u64::from(u16::MAX),
                line: action.line,
            })?;
            pause = Some(total);
            continue;
        }
        let (command, expected) = compile_action(action)?;
        steps.push(ScriptStep {
            pause_ms: pause.take().unwrap_or(0),
            command,
            expected,
        });
    }

    if pause.is_some() {
        diagnostics::warn(format!(
            "script '{}' ends with a <{}> that has no action to delay",
            name, PAUSE
        ));
    }
    Ok(Script { name, steps })
}

fn compile_action(el: &Element) -> CompileResult<(ConfigMessage, ConfigMessage)> {
    match el.name.as_str() {
        MSG_SEND => {
            let fblock_id = el.req_u8(FBLOCK_ID)?;
            let instance_id = el.opt_u8(INSTANCE_ID)?.unwrap_or(0);
            let function_id = el.req_u16(FUNCTION_ID)?;
            let command = ConfigMessage {
                fblock_id,
                instance_id,
                function_id,
                op_type: el.req_u8(OP_TYPE_REQUEST)?,
                payload: el.opt_hex(PAYLOAD_HEX)?.unwrap_or_default(),
            };
            let expected = ConfigMessage {
                fblock_id,
                instance_id,
                function_id,
                op_type: el.opt_u8(OP_TYPE_RESPONSE)?.unwrap_or(OP_ANY),
                payload: Vec::new(),
            };
            Ok((command, expected))
        }
        GPIO_PORT_CREATE => {
            let [hi, lo] = el.req_u16(DEBOUNCE_TIME)?.to_be_bytes();
            Ok(inic(FID_GPIO_PORT_CREATE, vec![GPIO_PORT_INDEX, hi, lo]))
        }
        GPIO_PORT_PIN_MODE => {
            let config = el.req_hex(PIN_CONFIGURATION)?;
            if config.len() % 2 != 0 {
                return Err(CompileError::InvalidValue {
                    element: el.name.clone(),
                    attribute: PIN_CONFIGURATION.to_string(),
                    value: el.opt_str(PIN_CONFIGURATION).unwrap_or_default().to_string(),
                    line: el.line,
                });
            }
            let mut payload = GPIO_PORT_HANDLE.to_vec();
            payload.extend(config);
            Ok(inic(FID_GPIO_PORT_PIN_MODE, payload))
        }
        GPIO_PIN_STATE => {
            let mut payload = GPIO_PORT_HANDLE.to_vec();
            payload.extend(el.req_u16(MASK)?.to_be_bytes());
            payload.extend(el.req_u16(DATA)?.to_be_bytes());
            Ok(inic(FID_GPIO_PIN_STATE, payload))
        }
        I2C_PORT_CREATE => {
            let speed = el.req_keyword(SPEED, I2C_SPEEDS)?;
            Ok(inic(FID_I2C_PORT_CREATE, vec![I2C_PORT_INDEX, I2C_SLAVE_ADDRESS, speed]))
        }
        I2C_PORT_WRITE => {
            let mode = el.req_keyword(MODE, I2C_MODES)?;
            let block_count = el.opt_u8(BLOCK_COUNT)?.unwrap_or(0);
            let address = el.req_u8(ADDRESS)?;
            let [tmo_hi, tmo_lo] = el.req_u16(TIMEOUT)?.to_be_bytes();
            let data = el.req_hex(PAYLOAD_HEX)?;
            let length = u8::try_from(data.len()).map_err(|_| CompileError::OutOfRange {
                element: el.name.clone(),
                attribute: PAYLOAD_HEX.to_string(),
                value: format!("{} bytes", data.len()),
                max: u8::MAX as u64,
                line: el.line,
            })?;
            let mut payload = I2C_PORT_HANDLE.to_vec();
            payload.extend([mode, block_count, address, tmo_hi, tmo_lo, length]);
            payload.extend(data);
            Ok(inic(FID_I2C_PORT_WRITE, payload))
        }
        I2C_PORT_READ => {
            let address = el.req_u8(ADDRESS)?;
            let length = el.req_u8(LENGTH)?;
            let [tmo_hi, tmo_lo] = el.req_u16(TIMEOUT)?.to_be_bytes();
            let mut payload = I2C_PORT_HANDLE.to_vec();
            payload.extend([address, length, tmo_hi, tmo_lo]);
            Ok(inic(FID_I2C_PORT_READ, payload))
        }
        other => Err(CompileError::structure(
            el.line,
            format!("unknown script action <{}>", other),
        )),
    }
}

/// Request to the local network controller plus its wildcard result.
fn inic(function_id: u16, payload: Vec<u8>) -> (ConfigMessage, ConfigMessage) {
    let command = ConfigMessage {
        fblock_id: FBLOCK_INIC,
        instance_id: INSTANCE_INIC,
        function_id,
        op_type: OP_START_RESULT,
        payload,
    };
    let expected = ConfigMessage {
        op_type: OP_RESULT,
        payload: Vec::new(),
        ..command.clone()
    };
    (command, expected)
}

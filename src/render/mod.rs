//! Output renderers for compiled configurations.

pub mod json;
pub mod xml;

pub use json::{render_json, render_script_json};
pub use xml::render_xml;

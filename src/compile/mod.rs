//! Compilation pipeline: document -> resource graph, routes, scripts, drivers.
//!
//! Stages, in order:
//! 1. `graph` builds nodes, ports, sockets and connections and registers
//!    script references and driver links.
//! 2. `script` compiles every `<Script>` and resolves the references.
//! 3. `routes` pairs source and sink endpoints.
//! 4. `driver` derives driver-channel records from the finished sockets.
//!
//! Any failure drops the in-flight [`Compiler`], and with it every resource
//! allocated so far.

mod driver;
mod graph;
mod routes;
mod script;

pub use routes::AUTO_ROUTE_ID_BASE;
pub use script::{FBLOCK_INIC, OP_ANY, OP_RESULT, OP_START_RESULT};

use crate::diagnostics::{LogReporter, Reporter};
use crate::document::schema::{ASYNC_BANDWIDTH, DRIVER, NODE, ROOT, SCRIPT};
use crate::document::{Element, parse_document};
use crate::error::{CompileError, CompileResult};
use crate::model::{Arena, Configuration, Endpoint, Node, Script};
use driver::LinkCandidate;
use script::ScriptRegistry;

/// In-flight state of one compilation.
pub(crate) struct Compiler {
    pub(crate) arena: Arena,
    pub(crate) nodes: Vec<Node>,
    pub(crate) endpoints: Vec<Endpoint>,
    pub(crate) scripts: ScriptRegistry,
    pub(crate) links: Vec<LinkCandidate>,
    /// Connection elements seen so far; numbers each one for link checks.
    pub(crate) connections: usize,
}

impl Compiler {
    fn new() -> Self {
        Self {
            arena: Arena::new(),
            nodes: Vec::new(),
            endpoints: Vec::new(),
            scripts: ScriptRegistry::default(),
            links: Vec::new(),
            connections: 0,
        }
    }
}

/// Compile a configuration document, logging the failure if there is one.
pub fn compile(xml: &str) -> CompileResult<Configuration> {
    compile_with(xml, &mut LogReporter)
}

/// Compile a configuration document. On failure `reporter` receives the
/// error exactly once before it is returned.
pub fn compile_with<R: Reporter + ?Sized>(xml: &str, reporter: &mut R) -> CompileResult<Configuration> {
    parse_document(xml)
        .and_then(|root| compile_document(&root))
        .inspect_err(|err| reporter.report(err))
}

/// Compile the single `<Script>` of a document.
pub fn compile_script(xml: &str) -> CompileResult<Script> {
    compile_script_with(xml, &mut LogReporter)
}

pub fn compile_script_with<R: Reporter + ?Sized>(xml: &str, reporter: &mut R) -> CompileResult<Script> {
    parse_document(xml)
        .and_then(|root| compile_script_document(&root))
        .inspect_err(|err| reporter.report(err))
}

fn check_root(root: &Element) -> CompileResult<()> {
    if !root.is(ROOT) {
        return Err(CompileError::structure(
            root.line,
            format!("root element must be <{}>, found <{}>", ROOT, root.name),
        ));
    }
    Ok(())
}

/// Compile an already parsed document.
pub fn compile_document(root: &Element) -> CompileResult<Configuration> {
    check_root(root)?;
    let packet_bandwidth = root.req_u16(ASYNC_BANDWIDTH)?;
    root.count_children(NODE, true)?;

    let mut compiler = Compiler::new();
    for child in &root.children {
        match child.name.as_str() {
            NODE => compiler.build_node(child)?,
            SCRIPT | DRIVER => {}
            other => {
                return Err(CompileError::structure(
                    child.line,
                    format!("unexpected element <{}> in <{}>", other, ROOT),
                ));
            }
        }
    }

    for element in root.children_named(SCRIPT) {
        compiler.scripts.compile(element)?;
    }
    let resolved = std::mem::take(&mut compiler.scripts).resolve()?;
    for (node_index, script) in resolved.per_node {
        let node = compiler.nodes.get_mut(node_index).ok_or_else(|| {
            CompileError::Internal(format!("script attached to unknown node #{}", node_index))
        })?;
        node.script = Some(script);
    }

    let routes = routes::assemble(&compiler.endpoints, &compiler.arena)?;
    let drivers = driver::derive(&compiler.arena, &compiler.links, root.children_named(DRIVER))?;

    tracing::info!(
        nodes = compiler.nodes.len(),
        resources = compiler.arena.len(),
        routes = routes.len(),
        drivers = drivers.len(),
        "configuration compiled"
    );

    Ok(Configuration {
        packet_bandwidth,
        nodes: compiler.nodes,
        endpoints: compiler.endpoints,
        routes,
        drivers,
        resources: compiler.arena,
    })
}

/// Single-script mode: the root holds exactly one `<Script>`, compiled
/// against one synthetic node that accepts any script name.
pub fn compile_script_document(root: &Element) -> CompileResult<Script> {
    check_root(root)?;
    if root.count_children(SCRIPT, true)? > 1 {
        return Err(CompileError::structure(
            root.line,
            format!("single-script mode expects exactly one <{}>", SCRIPT),
        ));
    }

    let mut registry = ScriptRegistry::default();
    registry.register_single_shot();
    for element in root.children_named(SCRIPT) {
        registry.compile(element)?;
    }
    registry
        .resolve()?
        .single_shot
        .ok_or_else(|| CompileError::Internal("single-shot script was not resolved".into()))
}

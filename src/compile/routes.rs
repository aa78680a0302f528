//! Route assembler: pairs source and sink endpoints by route name.

use crate::error::{CompileError, CompileResult};
use crate::model::{Arena, Endpoint, EndpointId, EndpointKind, ResourceId, Route, RouteDecl, SocketKind};
use std::collections::{BTreeMap, BTreeSet};

/// First identifier handed out to routes without an explicit `RouteId`.
pub const AUTO_ROUTE_ID_BASE: u16 = 0x8000;

struct Entry<'a> {
    endpoint: EndpointId,
    node: u16,
    decl: &'a RouteDecl,
}

fn route_decl(arena: &Arena, socket: ResourceId) -> CompileResult<&RouteDecl> {
    match arena.get(socket)?.as_socket().map(|s| &s.kind) {
        Some(SocketKind::Network { route, .. }) => Ok(route),
        _ => Err(CompileError::Internal(format!(
            "endpoint refers to resource {} which is not a network socket",
            socket.0
        ))),
    }
}

/// Emit one route per (source, sink) pair sharing a name, in source-major
/// document order.
pub(crate) fn assemble(endpoints: &[Endpoint], arena: &Arena) -> CompileResult<Vec<Route>> {
    let mut sources = Vec::new();
    let mut sinks = Vec::new();
    for (i, endpoint) in endpoints.iter().enumerate() {
        let entry = Entry {
            endpoint: EndpointId(i as u32),
            node: endpoint.node_address,
            decl: route_decl(arena, endpoint.network_socket)?,
        };
        match endpoint.kind {
            EndpointKind::Source => sources.push(entry),
            EndpointKind::Sink => sinks.push(entry),
        }
    }

    let mut source_nodes: BTreeMap<&str, u16> = BTreeMap::new();
    for source in &sources {
        if let Some(prev) = source_nodes.insert(source.decl.name.as_str(), source.node) {
            return Err(CompileError::reference(format!(
                "route '{}' has more than one source (nodes 0x{:X} and 0x{:X})",
                source.decl.name, prev, source.node
            )));
        }
    }
    for source in &sources {
        if !sinks.iter().any(|s| s.decl.name == source.decl.name) {
            return Err(CompileError::reference(format!(
                "route '{}' from node 0x{:X} has no sink",
                source.decl.name, source.node
            )));
        }
    }
    for sink in &sinks {
        if !source_nodes.contains_key(sink.decl.name.as_str()) {
            return Err(CompileError::reference(format!(
                "route '{}' into node 0x{:X} has no source",
                sink.decl.name, sink.node
            )));
        }
    }

    let reserved: BTreeSet<u16> = sources
        .iter()
        .chain(&sinks)
        .filter_map(|e| e.decl.route_id)
        .collect();
    let expected: usize = sources
        .iter()
        .map(|src| sinks.iter().filter(|s| s.decl.name == src.decl.name).count())
        .sum();

    let mut next_auto = u32::from(AUTO_ROUTE_ID_BASE);
    let mut used = BTreeSet::new();
    let mut routes = Vec::with_capacity(expected);
    for source in &sources {
        for sink in sinks.iter().filter(|s| s.decl.name == source.decl.name) {
            let route_id = match sink.decl.route_id.or(source.decl.route_id) {
                Some(id) => id,
                None => next_auto_id(&mut next_auto, &reserved)?,
            };
            if !used.insert(route_id) {
                return Err(CompileError::reference(format!(
                    "route id 0x{:04X} is assigned to more than one route",
                    route_id
                )));
            }
            routes.push(Route {
                name: source.decl.name.clone(),
                source: source.endpoint,
                sink: sink.endpoint,
                route_id,
                active: source.decl.active && sink.decl.active,
            });
        }
    }

    if routes.len() != expected {
        return Err(CompileError::Internal(format!(
            "assembled {} routes, expected {}",
            routes.len(),
            expected
        )));
    }
    Ok(routes)
}

fn next_auto_id(next: &mut u32, reserved: &BTreeSet<u16>) -> CompileResult<u16> {
    loop {
        let id = u16::try_from(*next)
            .map_err(|_| CompileError::reference("automatic route ids are exhausted"))?;
        *next += 1;
        if !reserved.contains(&id) {
            return Ok(id);
        }
    }
}

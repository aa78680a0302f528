//! Compiled configuration: the immutable graph handed to the runtime.

pub mod arena;
pub mod driver;
pub mod resource;
pub mod script;

pub use arena::{Arena, JobList, ResourceId};
pub use driver::{DriverBinding, DriverInformation};
pub use resource::{Connection, Port, Resource, RouteDecl, Socket, SocketKind};
pub use script::{ConfigMessage, Script, ScriptStep};

use crate::error::CompileResult;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EndpointId(pub u32);

impl EndpointId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Port handles cached on a node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NodePorts {
    pub network: Option<ResourceId>,
    pub media_lb: Option<ResourceId>,
    pub usb: Option<ResourceId>,
    pub stream: Option<[ResourceId; 2]>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub address: u16,
    pub script_name: Option<String>,
    pub script: Option<Script>,
    pub ports: NodePorts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EndpointKind {
    Source,
    Sink,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Endpoint {
    pub kind: EndpointKind,
    pub node_address: u16,
    pub jobs: JobList,
    pub connection: ResourceId,
    /// The network socket that faces the network for this endpoint.
    pub network_socket: ResourceId,
    pub link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Route {
    pub name: String,
    pub source: EndpointId,
    pub sink: EndpointId,
    pub route_id: u16,
    pub active: bool,
}

/// Result of one successful compilation. Owns every resource it refers to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Configuration {
    pub packet_bandwidth: u16,
    pub nodes: Vec<Node>,
    pub endpoints: Vec<Endpoint>,
    pub routes: Vec<Route>,
    pub drivers: Vec<DriverInformation>,
    pub resources: Arena,
}

impl Configuration {
    pub fn endpoint(&self, id: EndpointId) -> Option<&Endpoint> {
        self.endpoints.get(id.index())
    }

    pub fn resource(&self, id: ResourceId) -> CompileResult<&Resource> {
        self.resources.get(id)
    }

    pub fn node(&self, address: u16) -> Option<&Node> {
        self.nodes.iter().find(|n| n.address == address)
    }
}

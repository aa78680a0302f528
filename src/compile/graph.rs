//! Resource graph builder: Node -> Port -> Connection -> Socket.

use crate::compile::Compiler;
use crate::compile::driver::LinkCandidate;
use crate::document::schema::*;
use crate::document::{Element, Scan};
use crate::error::{CompileError, CompileResult};
use crate::model::resource::{
    Combiner, ConnectionKind, DATA_ALIGNMENTS, DataType, Direction, ISOC_PACKET_SIZES,
    IsocPacketSize, MLB_CLOCKS, MUTE_MODES, MlbClock, MuteMode, PortKind, PortOrigin,
    STREAM_CLOCKS, STREAM_PINS, Splitter, StreamPortIndex, USB_PHYSICAL_LAYERS,
    UsbPhysicalLayer,
};
use crate::model::{
    Connection, Endpoint, EndpointKind, JobList, Node, NodePorts, Port, Resource, ResourceId,
    RouteDecl, Socket, SocketKind,
};

/// Connection attributes known before any socket is visited.
#[derive(Debug, Clone, Copy)]
enum Template {
    Sync { mute_mode: MuteMode },
    AvPacketized { packet_size: IsocPacketSize },
}

impl Template {
    fn data_type(self) -> DataType {
        match self {
            Template::Sync { .. } => DataType::Sync,
            Template::AvPacketized { .. } => DataType::Isochronous,
        }
    }

    fn finish(self, offset: Option<u16>) -> ConnectionKind {
        match self {
            Template::Sync { mute_mode } => ConnectionKind::Sync {
                mute_mode,
                offset: offset.unwrap_or(0),
            },
            Template::AvPacketized { packet_size } => ConnectionKind::AvPacketized { packet_size },
        }
    }
}

/// Per connection element context shared by all sockets built inside it.
struct Context<'d> {
    element: &'d Element,
    /// Document-order number of `element` among all connections.
    seq: usize,
    node: u16,
    template: Template,
    link: Option<String>,
}

struct Built {
    id: ResourceId,
    offset: Option<u16>,
}

/// How a socket is built: inside a fan-out the offset becomes mandatory
/// for sync traffic, and a combiner is scheduled right before the socket.
#[derive(Default, Clone, Copy)]
struct FanOut {
    active: bool,
    combiner: Option<ResourceId>,
}

impl Compiler {
    pub(crate) fn build_node(&mut self, el: &Element) -> CompileResult<()> {
        let address = el.req_u16(ADDRESS)?;
        if self.nodes.iter().any(|n| n.address == address) {
            return Err(CompileError::structure(
                el.line,
                format!("node address 0x{:X} is declared twice", address),
            ));
        }
        tracing::debug!(node = %format!("0x{:X}", address), "building node");

        let script_name = el.opt_str(SCRIPT_REF).map(str::to_string);
        if let Some(name) = &script_name {
            self.scripts.register_node(self.nodes.len(), address, name.clone());
        }

        let mut ports = NodePorts::default();
        self.build_declared_ports(el, address, &mut ports)?;

        for child in &el.children {
            match child.name.as_str() {
                MEDIALB_PORT | USB_PORT | STREAM_PORT => {}
                SYNC_CONNECTION => {
                    let mute_mode = child.opt_keyword(MUTE_MODE, MUTE_MODES)?.unwrap_or(MuteMode::NoMuting);
                    self.build_connection(child, address, &mut ports, Template::Sync { mute_mode })?;
                }
                AVP_CONNECTION => {
                    let packet_size = child
                        .opt_keyword(ISOC_PACKET_SIZE, ISOC_PACKET_SIZES)?
                        .unwrap_or(IsocPacketSize::P188);
                    self.build_connection(child, address, &mut ports, Template::AvPacketized { packet_size })?;
                }
                other => {
                    return Err(CompileError::structure(
                        child.line,
                        format!("unknown connection type <{}> in node 0x{:X}", other, address),
                    ));
                }
            }
        }

        self.nodes.push(Node {
            address,
            script_name,
            script: None,
            ports,
        });
        Ok(())
    }

    fn build_declared_ports(&mut self, el: &Element, node: u16, ports: &mut NodePorts) -> CompileResult<()> {
        if let Some(port) = single_child(el, MEDIALB_PORT, node)? {
            let clock = port.req_keyword(CLOCK_CONFIG, MLB_CLOCKS)?;
            ports.media_lb = Some(self.alloc_port(node, PortOrigin::Declared, PortKind::MediaLb { clock })?);
        }

        if let Some(port) = single_child(el, USB_PORT, node)? {
            let kind = PortKind::Usb {
                physical_layer: port.req_keyword(PHYSICAL_LAYER, USB_PHYSICAL_LAYERS)?,
                device_interfaces: port.req_u16(DEVICE_INTERFACES)?,
                streaming_out_count: port.opt_u8(EP_OUT_COUNT)?.unwrap_or(0),
                streaming_in_count: port.opt_u8(EP_IN_COUNT)?.unwrap_or(0),
            };
            ports.usb = Some(self.alloc_port(node, PortOrigin::Declared, kind)?);
        }

        if let Some(port) = single_child(el, STREAM_PORT, node)? {
            let clock = port.req_keyword(CLOCK_CONFIG, STREAM_CLOCKS)?;
            let alignment = port.req_keyword(DATA_ALIGNMENT, DATA_ALIGNMENTS)?;
            let mut pair = [ResourceId(0); 2];
            for (slot, index) in pair.iter_mut().zip([StreamPortIndex::A, StreamPortIndex::B]) {
                *slot = self.alloc_port(
                    node,
                    PortOrigin::Declared,
                    PortKind::Stream {
                        index,
                        clock,
                        alignment,
                    },
                )?;
            }
            ports.stream = Some(pair);
        }
        Ok(())
    }

    fn alloc_port(&mut self, node: u16, origin: PortOrigin, kind: PortKind) -> CompileResult<ResourceId> {
        self.arena.alloc(Resource::Port(Port { node, origin, kind }))
    }

    fn network_port(&mut self, node: u16, ports: &mut NodePorts) -> CompileResult<ResourceId> {
        if let Some(id) = ports.network {
            return Ok(id);
        }
        let id = self.alloc_port(node, PortOrigin::Default, PortKind::Network)?;
        ports.network = Some(id);
        Ok(id)
    }

    fn usb_port(&mut self, node: u16, ports: &mut NodePorts) -> CompileResult<ResourceId> {
        if let Some(id) = ports.usb {
            return Ok(id);
        }
        let kind = PortKind::Usb {
            physical_layer: UsbPhysicalLayer::Standard,
            device_interfaces: 0,
            streaming_out_count: 0,
            streaming_in_count: 0,
        };
        let id = self.alloc_port(node, PortOrigin::Default, kind)?;
        ports.usb = Some(id);
        Ok(id)
    }

    fn media_lb_port(&mut self, node: u16, ports: &mut NodePorts) -> CompileResult<ResourceId> {
        if let Some(id) = ports.media_lb {
            return Ok(id);
        }
        let kind = PortKind::MediaLb {
            clock: MlbClock::Fs256,
        };
        let id = self.alloc_port(node, PortOrigin::Default, kind)?;
        ports.media_lb = Some(id);
        Ok(id)
    }

    fn build_connection(
        &mut self,
        el: &Element,
        node: u16,
        ports: &mut NodePorts,
        template: Template,
    ) -> CompileResult<()> {
        let ctx = Context {
            element: el,
            seq: self.connections,
            node,
            template,
            link: el.opt_str(LINK).map(str::to_string),
        };
        self.connections += 1;
        let mut jobs = JobList::new();
        let mut socket_in: Option<Built> = None;
        let mut socket_out: Option<Built> = None;
        let mut combiner: Option<&Element> = None;
        let mut fanned_out = false;

        for child in &el.children {
            if fanned_out {
                return Err(CompileError::structure(
                    child.line,
                    format!("<{}> cannot follow a fan-out in the same connection", child.name),
                ));
            }
            match child.name.as_str() {
                SPLITTER => {
                    let Some(input) = &socket_in else {
                        return Err(CompileError::structure(
                            child.line,
                            "a Splitter cannot be the input of a connection",
                        ));
                    };
                    if socket_out.is_some() {
                        return Err(too_many_sockets(child));
                    }
                    self.fan_out(&ctx, ports, &jobs, child, input.id)?;
                    fanned_out = true;
                }
                COMBINER => {
                    if socket_in.is_some() || combiner.is_some() {
                        return Err(CompileError::structure(
                            child.line,
                            "a Combiner cannot be the output of a connection",
                        ));
                    }
                    child.count_children(NETWORK_SOCKET, true)?;
                    combiner = Some(child);
                }
                _ => {
                    if let Some(pending) = combiner {
                        let output = self.build_socket(child, &ctx, ports, &mut jobs, Direction::Output, FanOut::default())?;
                        self.fan_in(&ctx, ports, &jobs, pending, output.id)?;
                        fanned_out = true;
                    } else if socket_in.is_none() {
                        socket_in = Some(self.build_socket(child, &ctx, ports, &mut jobs, Direction::Input, FanOut::default())?);
                    } else if socket_out.is_none() {
                        socket_out = Some(self.build_socket(child, &ctx, ports, &mut jobs, Direction::Output, FanOut::default())?);
                    } else {
                        return Err(too_many_sockets(child));
                    }
                }
            }
        }

        if fanned_out {
            return Ok(());
        }
        if combiner.is_some() {
            return Err(CompileError::structure(el.line, "a Combiner needs an output socket"));
        }
        match (socket_in, socket_out) {
            (Some(input), Some(output)) => {
                let offset = if self.arena.get(output.id)?.is_network_socket() {
                    output.offset
                } else {
                    input.offset
                };
                self.finish_connection(&ctx, jobs, input.id, output.id, offset)
            }
            _ => Err(CompileError::structure(
                el.line,
                format!("<{}> needs an input and an output socket", el.name),
            )),
        }
    }

    /// Splitter: the input socket is wrapped, each nested network socket
    /// becomes an output on its own copy of the job list.
    fn fan_out(
        &mut self,
        ctx: &Context<'_>,
        ports: &mut NodePorts,
        jobs: &JobList,
        el: &Element,
        socket_in: ResourceId,
    ) -> CompileResult<()> {
        let bytes_per_frame = el.req_u16(BYTES_PER_FRAME)?;
        el.count_children(NETWORK_SOCKET, true)?;
        let splitter = self.arena.alloc(Resource::Splitter(Splitter {
            socket_in,
            bytes_per_frame,
        }))?;
        let mut shared = jobs.clone();
        shared.push(splitter);

        for child in &el.children {
            expect_network_socket(el, child)?;
            let mut branch = shared.clone();
            let fan = FanOut {
                active: true,
                combiner: None,
            };
            let output = self.build_socket(child, ctx, ports, &mut branch, Direction::Output, fan)?;
            self.finish_connection(ctx, branch, splitter, output.id, output.offset)?;
        }
        Ok(())
    }

    /// Combiner: wraps the output socket, each nested network socket
    /// becomes an input on its own copy of the job list.
    fn fan_in(
        &mut self,
        ctx: &Context<'_>,
        ports: &mut NodePorts,
        jobs: &JobList,
        el: &Element,
        socket_out: ResourceId,
    ) -> CompileResult<()> {
        let bytes_per_frame = el.req_u16(BYTES_PER_FRAME)?;
        let combiner = self.arena.alloc(Resource::Combiner(Combiner {
            socket_out,
            bytes_per_frame,
        }))?;

        for child in &el.children {
            expect_network_socket(el, child)?;
            let mut branch = jobs.clone();
            let fan = FanOut {
                active: true,
                combiner: Some(combiner),
            };
            let input = self.build_socket(child, ctx, ports, &mut branch, Direction::Input, fan)?;
            self.finish_connection(ctx, branch, input.id, combiner, input.offset)?;
        }
        Ok(())
    }

    fn build_socket(
        &mut self,
        el: &Element,
        ctx: &Context<'_>,
        ports: &mut NodePorts,
        jobs: &mut JobList,
        direction: Direction,
        fan: FanOut,
    ) -> CompileResult<Built> {
        let data_type = ctx.template.data_type();
        let mut offset = None;

        let (port, kind) = match el.name.as_str() {
            NETWORK_SOCKET => {
                let bandwidth = el.req_u16(BANDWIDTH)?;
                let route = RouteDecl {
                    name: el.req_str(ROUTE)?.to_string(),
                    active: el.opt_bool(IS_ACTIVE)?.unwrap_or(true),
                    route_id: el.opt_u16(ROUTE_ID)?,
                };
                if data_type == DataType::Sync {
                    offset = if fan.active {
                        Some(el.req_u16(OFFSET)?)
                    } else {
                        el.opt_u16(OFFSET)?
                    };
                }
                let port = self.network_port(ctx.node, ports)?;
                jobs.push(port);
                if let Some(combiner) = fan.combiner {
                    jobs.push(combiner);
                }
                (port, SocketKind::Network { bandwidth, route })
            }
            USB_SOCKET => {
                let kind = SocketKind::Usb {
                    endpoint_address: el.req_u8(ENDPOINT_ADDRESS)?,
                    frames_per_transaction: el.req_u16(FRAMES_PER_TRANSACTION)?,
                };
                let port = self.usb_port(ctx.node, ports)?;
                jobs.push(port);
                (port, kind)
            }
            MEDIALB_SOCKET => {
                let kind = SocketKind::MediaLb {
                    channel_address: el.req_u16(CHANNEL_ADDRESS)?,
                    bandwidth: el.req_u16(BANDWIDTH)?,
                };
                let port = self.media_lb_port(ctx.node, ports)?;
                jobs.push(port);
                (port, kind)
            }
            STREAM_SOCKET => {
                let kind = SocketKind::Stream {
                    pin: el.req_keyword(STREAM_PIN_ID, STREAM_PINS)?,
                    bandwidth: el.req_u16(BANDWIDTH)?,
                };
                let [port_a, port_b] = ports.stream.ok_or_else(|| {
                    CompileError::structure(
                        el.line,
                        format!(
                            "<{}> on node 0x{:X} requires a <{}>",
                            STREAM_SOCKET, ctx.node, STREAM_PORT
                        ),
                    )
                })?;
                jobs.push(port_a);
                jobs.push(port_b);
                (port_a, kind)
            }
            other => {
                return Err(CompileError::structure(
                    el.line,
                    format!("unknown socket type <{}> in <{}>", other, ctx.element.name),
                ));
            }
        };

        let id = self.arena.alloc(Resource::Socket(Socket {
            port,
            direction,
            data_type,
            kind,
        }))?;
        jobs.push(id);
        Ok(Built { id, offset })
    }

    fn finish_connection(
        &mut self,
        ctx: &Context<'_>,
        mut jobs: JobList,
        socket_in: ResourceId,
        socket_out: ResourceId,
        offset: Option<u16>,
    ) -> CompileResult<()> {
        let out_is_network = self.arena.get(socket_out)?.is_network_socket();
        let in_is_network = self.arena.get(socket_in)?.is_network_socket();
        let (kind, network_socket) = if out_is_network {
            (EndpointKind::Source, socket_out)
        } else if in_is_network {
            (EndpointKind::Sink, socket_in)
        } else {
            return Err(CompileError::structure(
                ctx.element.line,
                format!(
                    "<{}> on node 0x{:X} has no network socket",
                    ctx.element.name, ctx.node
                ),
            ));
        };

        let connection = self.arena.alloc(Resource::Connection(Connection {
            socket_in,
            socket_out,
            kind: ctx.template.finish(offset),
        }))?;
        jobs.push(connection);

        if let Some(link) = &ctx.link {
            let clash = self
                .links
                .iter()
                .any(|l| l.link == *link && l.element != ctx.seq);
            if clash {
                return Err(CompileError::structure(
                    ctx.element.line,
                    format!("driver link '{}' is declared by more than one connection", link),
                ));
            }
            self.links.push(LinkCandidate {
                link: link.clone(),
                node: ctx.node,
                element: ctx.seq,
                connection,
                line: ctx.element.line,
            });
        }

        self.endpoints.push(Endpoint {
            kind,
            node_address: ctx.node,
            jobs,
            connection,
            network_socket,
            link: ctx.link.clone(),
        });
        Ok(())
    }
}

/// At most one child tagged `tag`.
fn single_child<'a>(el: &'a Element, tag: &str, node: u16) -> CompileResult<Option<&'a Element>> {
    match el.count_children(tag, false)? {
        0 => Ok(None),
        1 => Ok(el.find(&[tag], Scan::Siblings)),
        _ => Err(CompileError::structure(
            el.line,
            format!("node 0x{:X} declares more than one <{}>", node, tag),
        )),
    }
}

fn expect_network_socket(parent: &Element, child: &Element) -> CompileResult<()> {
    if child.is(NETWORK_SOCKET) {
        return Ok(());
    }
    Err(CompileError::structure(
        child.line,
        format!("<{}> may only contain <{}>, found <{}>", parent.name, NETWORK_SOCKET, child.name),
    ))
}

fn too_many_sockets(el: &Element) -> CompileError {
    CompileError::structure(
        el.line,
        format!("<{}> exceeds the two sockets of a connection", el.name),
    )
}

#[cfg(test)]
mod tests {
    use crate::compile::compile_document;
    use crate::document::parse_document;
    use crate::error::CompileError;
    use crate::model::resource::{ConnectionKind, MuteMode, PortKind, PortOrigin};
    use crate::model::{Configuration, EndpointKind, Resource, SocketKind};
    use pretty_assertions::assert_eq;

    fn build(body: &str) -> Result<Configuration, CompileError> {
        let xml = format!(r#"<Unicens AsyncBandwidth="80">{}</Unicens>"#, body);
        compile_document(&parse_document(&xml)?)
    }

    fn kinds(config: &Configuration, jobs: &[crate::model::ResourceId]) -> Vec<&'static str> {
        jobs.iter()
            .map(|id| config.resource(*id).unwrap().kind_name())
            .collect()
    }

    #[test]
    fn source_connection_orders_jobs() {
        let config = build(
            r#"<Node Address="0x200">
                 <SyncConnection MuteMode="MuteSignal">
                   <USBSocket EndpointAddress="0x01" FramesPerTransaction="128"/>
                   <NetworkSocket Bandwidth="4" Route="A"/>
                 </SyncConnection>
               </Node>
               <Node Address="0x210">
                 <SyncConnection>
                   <NetworkSocket Bandwidth="4" Route="A"/>
                   <USBSocket EndpointAddress="0x81" FramesPerTransaction="128"/>
                 </SyncConnection>
               </Node>"#,
        )
        .unwrap();

        let source = &config.endpoints[0];
        assert_eq!(source.kind, EndpointKind::Source);
        assert_eq!(
            kinds(&config, source.jobs.as_slice()),
            vec!["port", "socket", "port", "socket", "connection"]
        );
        let connection = config
            .resource(source.connection)
            .unwrap()
            .as_connection()
            .unwrap();
        assert_eq!(
            connection.kind,
            ConnectionKind::Sync {
                mute_mode: MuteMode::MuteSignal,
                offset: 0
            }
        );
        assert_eq!(config.endpoints[1].kind, EndpointKind::Sink);

        let usb = config.resource(source.jobs.as_slice()[0]).unwrap().as_port().unwrap();
        assert_eq!(usb.origin, PortOrigin::Default);
    }

    #[test]
    fn declared_ports_are_reused() {
        let config = build(
            r#"<Node Address="0x200">
                 <USBPort PhysicalLayer="HSIC" DeviceInterfaces="0x3"/>
                 <SyncConnection>
                   <USBSocket EndpointAddress="0x01" FramesPerTransaction="64"/>
                   <NetworkSocket Bandwidth="2" Route="R"/>
                 </SyncConnection>
                 <SyncConnection>
                   <USBSocket EndpointAddress="0x02" FramesPerTransaction="64"/>
                   <NetworkSocket Bandwidth="2" Route="S"/>
                 </SyncConnection>
               </Node>
               <Node Address="0x210">
                 <SyncConnection><NetworkSocket Bandwidth="2" Route="R"/><USBSocket EndpointAddress="0x81" FramesPerTransaction="64"/></SyncConnection>
                 <SyncConnection><NetworkSocket Bandwidth="2" Route="S"/><USBSocket EndpointAddress="0x82" FramesPerTransaction="64"/></SyncConnection>
               </Node>"#,
        )
        .unwrap();
        let node = &config.nodes[0];
        let usb = node.ports.usb.unwrap();
        assert_eq!(config.endpoints[0].jobs.as_slice()[0], usb);
        assert_eq!(config.endpoints[1].jobs.as_slice()[0], usb);
        let port = config.resource(usb).unwrap().as_port().unwrap();
        assert_eq!(port.origin, PortOrigin::Declared);
        assert!(matches!(port.kind, PortKind::Usb { device_interfaces: 3, .. }));
        assert_eq!(config.endpoints[0].jobs.as_slice()[2], node.ports.network.unwrap());
    }

    #[test]
    fn stream_socket_requires_stream_ports() {
        let err = build(
            r#"<Node Address="0x200">
                 <SyncConnection>
                   <StreamSocket StreamPinID="SRXA0" Bandwidth="4"/>
                   <NetworkSocket Bandwidth="4" Route="A"/>
                 </SyncConnection>
               </Node>"#,
        )
        .unwrap_err();
        assert!(matches!(err, CompileError::Structure { .. }));
        assert!(err.to_string().contains("requires a <StreamPort>"));
    }

    #[test]
    fn stream_socket_schedules_both_ports() {
        let config = build(
            r#"<Node Address="0x200">
                 <StreamPort ClockConfig="64Fs" DataAlignment="Left16Bit"/>
                 <SyncConnection>
                   <StreamSocket StreamPinID="SRXA0" Bandwidth="4"/>
                   <NetworkSocket Bandwidth="4" Route="A"/>
                 </SyncConnection>
               </Node>
               <Node Address="0x210">
                 <SyncConnection><NetworkSocket Bandwidth="4" Route="A"/><MediaLBSocket ChannelAddress="0x0A" Bandwidth="4"/></SyncConnection>
               </Node>"#,
        )
        .unwrap();
        let [a, b] = config.nodes[0].ports.stream.unwrap();
        assert_eq!(&config.endpoints[0].jobs.as_slice()[..2], &[a, b]);
    }

    #[test]
    fn connection_without_network_side_fails() {
        let err = build(
            r#"<Node Address="0x200">
                 <SyncConnection>
                   <USBSocket EndpointAddress="0x01" FramesPerTransaction="128"/>
                   <MediaLBSocket ChannelAddress="0x0A" Bandwidth="4"/>
                 </SyncConnection>
               </Node>"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("has no network socket"));
    }

    #[test]
    fn network_to_network_is_a_source() {
        let config = build(
            r#"<Node Address="0x200">
                 <SyncConnection>
                   <NetworkSocket Bandwidth="4" Route="In"/>
                   <NetworkSocket Bandwidth="4" Route="Out"/>
                 </SyncConnection>
               </Node>
               <Node Address="0x210">
                 <SyncConnection><NetworkSocket Bandwidth="4" Route="Out"/><USBSocket EndpointAddress="0x81" FramesPerTransaction="8"/></SyncConnection>
               </Node>"#,
        )
        .unwrap();
        let bridge = &config.endpoints[0];
        assert_eq!(bridge.kind, EndpointKind::Source);
        let socket = config.resource(bridge.network_socket).unwrap().as_socket().unwrap();
        assert!(matches!(&socket.kind, SocketKind::Network { route, .. } if route.name == "Out"));
    }

    #[test]
    fn splitter_position_is_checked() {
        let err = build(
            r#"<Node Address="0x200">
                 <SyncConnection>
                   <Splitter BytesPerFrame="8"><NetworkSocket Bandwidth="4" Route="A" Offset="0"/></Splitter>
                   <USBSocket EndpointAddress="0x01" FramesPerTransaction="128"/>
                 </SyncConnection>
               </Node>"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("Splitter cannot be the input"));

        let err = build(
            r#"<Node Address="0x200">
                 <SyncConnection>
                   <USBSocket EndpointAddress="0x01" FramesPerTransaction="128"/>
                   <Combiner BytesPerFrame="8"><NetworkSocket Bandwidth="4" Route="A" Offset="0"/></Combiner>
                 </SyncConnection>
               </Node>"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("Combiner cannot be the output"));
    }

    #[test]
    fn splitter_fans_out_with_shared_upstream() {
        let config = build(
            r#"<Node Address="0x200">
                 <SyncConnection>
                   <USBSocket EndpointAddress="0x01" FramesPerTransaction="128"/>
                   <Splitter BytesPerFrame="8">
                     <NetworkSocket Bandwidth="4" Route="L" Offset="0"/>
                     <NetworkSocket Bandwidth="4" Route="R" Offset="4"/>
                   </Splitter>
                 </SyncConnection>
               </Node>
               <Node Address="0x210">
                 <SyncConnection><NetworkSocket Bandwidth="4" Route="L"/><USBSocket EndpointAddress="0x81" FramesPerTransaction="8"/></SyncConnection>
                 <SyncConnection><NetworkSocket Bandwidth="4" Route="R"/><USBSocket EndpointAddress="0x82" FramesPerTransaction="8"/></SyncConnection>
               </Node>"#,
        )
        .unwrap();
        let (left, right) = (&config.endpoints[0], &config.endpoints[1]);
        assert_eq!(left.kind, EndpointKind::Source);
        assert_eq!(right.kind, EndpointKind::Source);
        assert_eq!(&left.jobs.as_slice()[..3], &right.jobs.as_slice()[..3]);
        assert_ne!(left.network_socket, right.network_socket);
        assert!(matches!(config.resource(left.jobs.as_slice()[2]).unwrap(), Resource::Splitter(_)));

        let offset = |id| match config.resource(id).unwrap().as_connection().unwrap().kind {
            ConnectionKind::Sync { offset, .. } => offset,
            _ => unreachable!(),
        };
        assert_eq!((offset(left.connection), offset(right.connection)), (0, 4));
    }

    #[test]
    fn fan_out_requires_offset_for_sync() {
        let err = build(
            r#"<Node Address="0x200">
                 <SyncConnection>
                   <USBSocket EndpointAddress="0x01" FramesPerTransaction="128"/>
                   <Splitter BytesPerFrame="8"><NetworkSocket Bandwidth="4" Route="L"/></Splitter>
                 </SyncConnection>
               </Node>"#,
        )
        .unwrap_err();
        assert!(matches!(err, CompileError::MissingAttribute { ref attribute, .. } if attribute == "Offset"));
    }

    #[test]
    fn rejects_duplicates_and_unknown_tags() {
        let err = build(r#"<Node Address="1"/><Node Address="0x1"/>"#).unwrap_err();
        assert!(err.to_string().contains("declared twice"));

        let err = build(
            r#"<Node Address="1"><USBPort PhysicalLayer="Standard" DeviceInterfaces="0"/><USBPort PhysicalLayer="Standard" DeviceInterfaces="0"/></Node>"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("more than one <USBPort>"));

        let err = build(r#"<Node Address="1"><QoSConnection/></Node>"#).unwrap_err();
        assert!(err.to_string().contains("unknown connection type"));
    }

    #[test]
    fn link_reuse_is_detected_on_one_line() {
        let err = build(
            r#"<Node Address="0x200"><SyncConnection Link="x"><USBSocket EndpointAddress="0x01" FramesPerTransaction="8"/><NetworkSocket Bandwidth="4" Route="A"/></SyncConnection><SyncConnection Link="x"><MediaLBSocket ChannelAddress="2" Bandwidth="4"/><NetworkSocket Bandwidth="4" Route="B"/></SyncConnection></Node>"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("'x' is declared by more than one connection"));
    }

    #[test]
    fn fan_out_branches_share_one_link() {
        let config = build(
            r#"<Node Address="0x200"><SyncConnection Link="x"><USBSocket EndpointAddress="0x01" FramesPerTransaction="8"/><Splitter BytesPerFrame="8"><NetworkSocket Bandwidth="4" Route="L" Offset="0"/><NetworkSocket Bandwidth="4" Route="R" Offset="4"/></Splitter></SyncConnection></Node><Node Address="0x210"><SyncConnection><NetworkSocket Bandwidth="4" Route="L"/><MediaLBSocket ChannelAddress="2" Bandwidth="4"/></SyncConnection><SyncConnection><NetworkSocket Bandwidth="4" Route="R"/><MediaLBSocket ChannelAddress="4" Bandwidth="4"/></SyncConnection></Node>"#,
        )
        .unwrap();
        assert_eq!(config.drivers.len(), 1);
        assert_eq!(config.drivers[0].link, "x");
        assert_eq!(config.drivers[0].channel_name, "ep01");
    }

    #[test]
    fn combiner_without_output_fails() {
        let err = build(
            r#"<Node Address="0x200">
                 <SyncConnection>
                   <Combiner BytesPerFrame="8"><NetworkSocket Bandwidth="4" Route="A" Offset="0"/></Combiner>
                 </SyncConnection>
               </Node>"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("a Combiner needs an output socket"));
    }

    #[test]
    fn third_socket_is_rejected() {
        let err = build(
            r#"<Node Address="0x200">
                 <SyncConnection>
                   <USBSocket EndpointAddress="0x01" FramesPerTransaction="8"/>
                   <NetworkSocket Bandwidth="4" Route="A"/>
                   <MediaLBSocket ChannelAddress="2" Bandwidth="4"/>
                 </SyncConnection>
               </Node>"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("exceeds the two sockets"));
    }

    #[test]
    fn nothing_may_follow_a_fan_out() {
        let err = build(
            r#"<Node Address="0x200">
                 <SyncConnection>
                   <USBSocket EndpointAddress="0x01" FramesPerTransaction="8"/>
                   <Splitter BytesPerFrame="8"><NetworkSocket Bandwidth="4" Route="A" Offset="0"/></Splitter>
                   <MediaLBSocket ChannelAddress="2" Bandwidth="4"/>
                 </SyncConnection>
               </Node>"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("cannot follow a fan-out"));

        let err = build(
            r#"<Node Address="0x200">
                 <SyncConnection>
                   <Combiner BytesPerFrame="8"><NetworkSocket Bandwidth="4" Route="A" Offset="0"/></Combiner>
                   <USBSocket EndpointAddress="0x81" FramesPerTransaction="8"/>
                   <MediaLBSocket ChannelAddress="2" Bandwidth="4"/>
                 </SyncConnection>
               </Node>"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("cannot follow a fan-out"));
    }
}

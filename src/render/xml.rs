//! Configuration -> document printer.
//!
//! Emits only what the compiler reads back: declared ports, connections in
//! endpoint order (fan-outs regrouped under their splitter or combiner),
//! referenced scripts as `Pause` + `MsgSend` pairs, and bound drivers.
//! Recompiling the output allocates resources in the same order.

use crate::document::attr::keyword_name;
use crate::document::schema::*;
use crate::error::{CompileError, CompileResult};
use crate::model::driver::ALSA_RESOLUTIONS;
use crate::model::resource::{
    ConnectionKind, DATA_ALIGNMENTS, ISOC_PACKET_SIZES, MLB_CLOCKS, MUTE_MODES, PortKind,
    PortOrigin, STREAM_CLOCKS, STREAM_PINS, USB_PHYSICAL_LAYERS,
};
use crate::model::{
    Configuration, Connection, DriverBinding, Endpoint, Node, Resource, ResourceId, Script,
    SocketKind,
};
use std::borrow::Cow;

type Attrs<'a> = Vec<(&'static str, Cow<'a, str>)>;

struct XmlWriter {
    out: String,
    depth: usize,
}

impl XmlWriter {
    fn new() -> Self {
        Self {
            out: String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n"),
            depth: 0,
        }
    }

    fn start(&mut self, tag: &str, attrs: &Attrs<'_>) {
        self.out.push_str(&"  ".repeat(self.depth));
        self.out.push('<');
        self.out.push_str(tag);
        for (key, value) in attrs {
            self.out.push(' ');
            self.out.push_str(key);
            self.out.push_str("=\"");
            self.out.push_str(&quick_xml::escape::escape(value.as_ref()));
            self.out.push('"');
        }
    }

    fn open(&mut self, tag: &str, attrs: Attrs<'_>) {
        self.start(tag, &attrs);
        self.out.push_str(">\n");
        self.depth += 1;
    }

    fn leaf(&mut self, tag: &str, attrs: Attrs<'_>) {
        self.start(tag, &attrs);
        self.out.push_str("/>\n");
    }

    fn close(&mut self, tag: &str) {
        self.depth = self.depth.saturating_sub(1);
        self.out.push_str(&"  ".repeat(self.depth));
        self.out.push_str("</");
        self.out.push_str(tag);
        self.out.push_str(">\n");
    }

    fn finish(self) -> String {
        self.out
    }
}

fn hex8(value: u8) -> Cow<'static, str> {
    Cow::Owned(format!("0x{:02X}", value))
}

fn hex16(value: u16) -> Cow<'static, str> {
    Cow::Owned(format!("0x{:04X}", value))
}

fn num(value: impl ToString) -> Cow<'static, str> {
    Cow::Owned(value.to_string())
}

fn payload(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Print a compiled configuration in the input document schema.
pub fn render_xml(config: &Configuration) -> CompileResult<String> {
    let mut w = XmlWriter::new();
    w.open(ROOT, vec![(ASYNC_BANDWIDTH, num(config.packet_bandwidth))]);

    for node in &config.nodes {
        render_node(&mut w, config, node)?;
    }

    let mut printed: Vec<&str> = Vec::new();
    for script in config.nodes.iter().filter_map(|n| n.script.as_ref()) {
        if printed.contains(&script.name.as_str()) {
            continue;
        }
        printed.push(&script.name);
        render_script(&mut w, script);
    }

    render_drivers(&mut w, config);
    w.close(ROOT);
    Ok(w.finish())
}

fn render_node(w: &mut XmlWriter, config: &Configuration, node: &Node) -> CompileResult<()> {
    let mut attrs: Attrs<'_> = vec![(ADDRESS, hex16(node.address))];
    if let Some(name) = &node.script_name {
        attrs.push((SCRIPT_REF, Cow::Borrowed(name.as_str())));
    }
    w.open(NODE, attrs);

    let declared = [node.ports.media_lb, node.ports.usb, node.ports.stream.map(|[a, _]| a)];
    for id in declared.into_iter().flatten() {
        let port = config
            .resource(id)?
            .as_port()
            .ok_or_else(|| CompileError::Internal(format!("node port {} is not a port", id.0)))?;
        if port.origin != PortOrigin::Declared {
            continue;
        }
        match &port.kind {
            PortKind::MediaLb { clock } => {
                w.leaf(MEDIALB_PORT, vec![(CLOCK_CONFIG, keyword_name(MLB_CLOCKS, clock).into())]);
            }
            PortKind::Usb {
                physical_layer,
                device_interfaces,
                streaming_out_count,
                streaming_in_count,
            } => w.leaf(
                USB_PORT,
                vec![
                    (PHYSICAL_LAYER, keyword_name(USB_PHYSICAL_LAYERS, physical_layer).into()),
                    (DEVICE_INTERFACES, hex16(*device_interfaces)),
                    (EP_OUT_COUNT, num(streaming_out_count)),
                    (EP_IN_COUNT, num(streaming_in_count)),
                ],
            ),
            PortKind::Stream { clock, alignment, .. } => w.leaf(
                STREAM_PORT,
                vec![
                    (CLOCK_CONFIG, keyword_name(STREAM_CLOCKS, clock).into()),
                    (DATA_ALIGNMENT, keyword_name(DATA_ALIGNMENTS, alignment).into()),
                ],
            ),
            PortKind::Network => {}
        }
    }

    let endpoints: Vec<&Endpoint> = config
        .endpoints
        .iter()
        .filter(|e| e.node_address == node.address)
        .collect();
    let mut rest = endpoints.as_slice();
    while let Some(first) = rest.first() {
        let group = match fan_resource(config, connection(config, first.connection)?)? {
            Some(shared) => {
                let mut len = 1;
                while let Some(next) = rest.get(len) {
                    if fan_resource(config, connection(config, next.connection)?)? != Some(shared) {
                        break;
                    }
                    len += 1;
                }
                len
            }
            None => 1,
        };
        let (head, tail) = rest.split_at(group);
        render_connection(w, config, head)?;
        rest = tail;
    }

    w.close(NODE);
    Ok(())
}

fn connection(config: &Configuration, id: ResourceId) -> CompileResult<&Connection> {
    config
        .resource(id)?
        .as_connection()
        .ok_or_else(|| CompileError::Internal(format!("resource {} is not a connection", id.0)))
}

/// The splitter or combiner a connection shares with its siblings.
fn fan_resource(config: &Configuration, connection: &Connection) -> CompileResult<Option<ResourceId>> {
    for id in [connection.socket_in, connection.socket_out] {
        if matches!(config.resource(id)?, Resource::Splitter(_) | Resource::Combiner(_)) {
            return Ok(Some(id));
        }
    }
    Ok(None)
}

fn render_connection(w: &mut XmlWriter, config: &Configuration, group: &[&Endpoint]) -> CompileResult<()> {
    let Some(first) = group.first() else {
        return Ok(());
    };
    let head = connection(config, first.connection)?;
    let (tag, mut attrs): (&str, Attrs<'_>) = match head.kind {
        ConnectionKind::Sync { mute_mode, .. } => (
            SYNC_CONNECTION,
            vec![(MUTE_MODE, keyword_name(MUTE_MODES, &mute_mode).into())],
        ),
        ConnectionKind::AvPacketized { packet_size } => (
            AVP_CONNECTION,
            vec![(ISOC_PACKET_SIZE, keyword_name(ISOC_PACKET_SIZES, &packet_size).into())],
        ),
    };
    if let Some(link) = &first.link {
        attrs.push((LINK, Cow::Borrowed(link.as_str())));
    }
    w.open(tag, attrs);

    match config.resource(head.socket_in)? {
        Resource::Splitter(splitter) => {
            render_socket(w, config, splitter.socket_in, None)?;
            w.open(SPLITTER, vec![(BYTES_PER_FRAME, num(splitter.bytes_per_frame))]);
            for endpoint in group {
                let branch = connection(config, endpoint.connection)?;
                render_socket(w, config, branch.socket_out, sync_offset(branch, true))?;
            }
            w.close(SPLITTER);
        }
        _ => match config.resource(head.socket_out)? {
            Resource::Combiner(combiner) => {
                w.open(COMBINER, vec![(BYTES_PER_FRAME, num(combiner.bytes_per_frame))]);
                for endpoint in group {
                    let branch = connection(config, endpoint.connection)?;
                    render_socket(w, config, branch.socket_in, sync_offset(branch, true))?;
                }
                w.close(COMBINER);
                render_socket(w, config, combiner.socket_out, None)?;
            }
            _ => {
                let out_is_network = config.resource(head.socket_out)?.is_network_socket();
                let offset = sync_offset(head, false);
                render_socket(w, config, head.socket_in, offset.filter(|_| !out_is_network))?;
                render_socket(w, config, head.socket_out, offset.filter(|_| out_is_network))?;
            }
        },
    }

    w.close(tag);
    Ok(())
}

/// Offset to print on the network-facing socket. Fan-out branches always
/// carry one; plain connections only when it is not the default.
fn sync_offset(connection: &Connection, fan_out: bool) -> Option<u16> {
    match connection.kind {
        ConnectionKind::Sync { offset, .. } if fan_out || offset != 0 => Some(offset),
        _ => None,
    }
}

fn render_socket(
    w: &mut XmlWriter,
    config: &Configuration,
    id: ResourceId,
    offset: Option<u16>,
) -> CompileResult<()> {
    let socket = config
        .resource(id)?
        .as_socket()
        .ok_or_else(|| CompileError::Internal(format!("resource {} is not a socket", id.0)))?;
    match &socket.kind {
        SocketKind::Network { bandwidth, route } => {
            let mut attrs: Attrs<'_> = vec![
                (BANDWIDTH, num(bandwidth)),
                (ROUTE, Cow::Borrowed(route.name.as_str())),
            ];
            if !route.active {
                attrs.push((IS_ACTIVE, Cow::Borrowed("false")));
            }
            if let Some(route_id) = route.route_id {
                attrs.push((ROUTE_ID, hex16(route_id)));
            }
            if let Some(offset) = offset {
                attrs.push((OFFSET, num(offset)));
            }
            w.leaf(NETWORK_SOCKET, attrs);
        }
        SocketKind::Usb {
            endpoint_address,
            frames_per_transaction,
        } => w.leaf(
            USB_SOCKET,
            vec![
                (ENDPOINT_ADDRESS, hex8(*endpoint_address)),
                (FRAMES_PER_TRANSACTION, num(frames_per_transaction)),
            ],
        ),
        SocketKind::MediaLb {
            channel_address,
            bandwidth,
        } => w.leaf(
            MEDIALB_SOCKET,
            vec![
                (CHANNEL_ADDRESS, hex16(*channel_address)),
                (BANDWIDTH, num(bandwidth)),
            ],
        ),
        SocketKind::Stream { pin, bandwidth } => w.leaf(
            STREAM_SOCKET,
            vec![
                (STREAM_PIN_ID, keyword_name(STREAM_PINS, pin).into()),
                (BANDWIDTH, num(bandwidth)),
            ],
        ),
    }
    Ok(())
}

fn render_script(w: &mut XmlWriter, script: &Script) {
    w.open(SCRIPT, vec![(NAME, Cow::Borrowed(script.name.as_str()))]);
    for step in &script.steps {
        if step.pause_ms > 0 {
            w.leaf(PAUSE, vec![(WAIT_TIME, num(step.pause_ms))]);
        }
        let command = &step.command;
        let mut attrs: Attrs<'_> = vec![
            (FBLOCK_ID, hex8(command.fblock_id)),
            (INSTANCE_ID, hex8(command.instance_id)),
            (FUNCTION_ID, hex16(command.function_id)),
            (OP_TYPE_REQUEST, hex8(command.op_type)),
            (OP_TYPE_RESPONSE, hex8(step.expected.op_type)),
        ];
        if !command.payload.is_empty() {
            attrs.push((PAYLOAD_HEX, Cow::Owned(payload(&command.payload))));
        }
        w.leaf(MSG_SEND, attrs);
    }
    w.close(SCRIPT);
}

fn render_drivers(w: &mut XmlWriter, config: &Configuration) {
    let mut links: Vec<&str> = Vec::new();
    for record in &config.drivers {
        if record.binding.is_some() && !links.contains(&record.link.as_str()) {
            links.push(&record.link);
        }
    }

    for link in links {
        w.open(DRIVER, vec![(LINK, Cow::Borrowed(link))]);
        let bindings = config
            .drivers
            .iter()
            .filter(|r| r.link == link)
            .filter_map(|r| r.binding.as_ref());
        for binding in bindings {
            let (name, buffers) = match binding {
                DriverBinding::Cdev { name, buffers }
                | DriverBinding::V4l2 { name, buffers }
                | DriverBinding::Alsa { name, buffers, .. } => (name, buffers),
            };
            let mut attrs: Attrs<'_> = Vec::new();
            if let Some(name) = name {
                attrs.push((NAME, Cow::Borrowed(name.as_str())));
            }
            attrs.push((BUFFER_COUNT, num(buffers.count)));
            attrs.push((BUFFER_SIZE, num(buffers.size)));
            if let DriverBinding::Alsa {
                channels, resolution, ..
            } = binding
            {
                attrs.push((CHANNEL_COUNT, num(channels)));
                attrs.push((RESOLUTION, keyword_name(ALSA_RESOLUTIONS, resolution).into()));
            }
            w.leaf(binding.tag(), attrs);
        }
        w.close(DRIVER);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::compile_document;
    use crate::document::parse_document;
    use pretty_assertions::assert_eq;

    fn compile(xml: &str) -> Configuration {
        compile_document(&parse_document(xml).unwrap()).unwrap()
    }

    #[test]
    fn escapes_attribute_values() {
        let mut w = XmlWriter::new();
        w.leaf("A", vec![("Name", Cow::Borrowed("a<b&\"c\""))]);
        assert!(w.finish().contains(r#"<A Name="a&lt;b&amp;&quot;c&quot;"/>"#));
    }

    #[test]
    fn prints_declared_ports_only() {
        let config = compile(
            r#"<Unicens AsyncBandwidth="80">
  <Node Address="0x200">
    <MediaLBPort ClockConfig="512Fs"/>
    <SyncConnection>
      <USBSocket EndpointAddress="0x81" FramesPerTransaction="2"/>
      <NetworkSocket Bandwidth="2" Route="R" Offset="3"/>
    </SyncConnection>
  </Node>
  <Node Address="0x210">
    <SyncConnection MuteMode="MuteSignal">
      <NetworkSocket Bandwidth="2" Route="R" IsActive="false"/>
      <MediaLBSocket ChannelAddress="6" Bandwidth="2"/>
    </SyncConnection>
  </Node>
</Unicens>"#,
        );
        let xml = render_xml(&config).unwrap();
        assert!(xml.contains(r#"<MediaLBPort ClockConfig="512Fs"/>"#));
        assert!(!xml.contains(USB_PORT));
        assert!(xml.contains(r#"<NetworkSocket Bandwidth="2" Route="R" Offset="3"/>"#));
        assert!(xml.contains(r#"<NetworkSocket Bandwidth="2" Route="R" IsActive="false"/>"#));
        assert!(xml.contains(r#"<SyncConnection MuteMode="MuteSignal">"#));
        assert_eq!(compile(&xml), config);
    }

    #[test]
    fn regroups_splitter_branches() {
        let config = compile(
            r#"<Unicens AsyncBandwidth="80">
  <Node Address="0x200">
    <SyncConnection Link="mix">
      <USBSocket EndpointAddress="0x01" FramesPerTransaction="8"/>
      <Splitter BytesPerFrame="12">
        <NetworkSocket Bandwidth="4" Route="L" Offset="0"/>
        <NetworkSocket Bandwidth="4" Route="R" Offset="4"/>
      </Splitter>
    </SyncConnection>
  </Node>
  <Node Address="0x210">
    <SyncConnection>
      <NetworkSocket Bandwidth="4" Route="L"/>
      <MediaLBSocket ChannelAddress="2" Bandwidth="4"/>
    </SyncConnection>
    <SyncConnection>
      <NetworkSocket Bandwidth="4" Route="R"/>
      <MediaLBSocket ChannelAddress="4" Bandwidth="4"/>
    </SyncConnection>
  </Node>
</Unicens>"#,
        );
        let xml = render_xml(&config).unwrap();
        assert_eq!(xml.matches("<Splitter").count(), 1);
        assert_eq!(xml.matches("<SyncConnection").count(), 3);
        assert_eq!(compile(&xml), config);
    }
}

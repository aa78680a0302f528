//! Network resources: ports, sockets, splitters, combiners and connections.

use crate::model::arena::ResourceId;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Resource {
    Port(Port),
    Socket(Socket),
    Splitter(Splitter),
    Combiner(Combiner),
    Connection(Connection),
}

impl Resource {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Resource::Port(_) => "port",
            Resource::Socket(_) => "socket",
            Resource::Splitter(_) => "splitter",
            Resource::Combiner(_) => "combiner",
            Resource::Connection(_) => "connection",
        }
    }

    pub fn as_socket(&self) -> Option<&Socket> {
        match self {
            Resource::Socket(socket) => Some(socket),
            _ => None,
        }
    }

    pub fn as_connection(&self) -> Option<&Connection> {
        match self {
            Resource::Connection(connection) => Some(connection),
            _ => None,
        }
    }

    pub fn as_port(&self) -> Option<&Port> {
        match self {
            Resource::Port(port) => Some(port),
            _ => None,
        }
    }

    /// True for a plain network socket.
    pub fn is_network_socket(&self) -> bool {
        matches!(
            self,
            Resource::Socket(Socket {
                kind: SocketKind::Network { .. },
                ..
            })
        )
    }
}

/// Whether a port was declared in the document or created on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PortOrigin {
    Declared,
    Default,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Port {
    pub node: u16,
    pub origin: PortOrigin,
    pub kind: PortKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum PortKind {
    Network,
    MediaLb {
        clock: MlbClock,
    },
    Usb {
        physical_layer: UsbPhysicalLayer,
        device_interfaces: u16,
        streaming_out_count: u8,
        streaming_in_count: u8,
    },
    Stream {
        index: StreamPortIndex,
        clock: StreamClock,
        alignment: DataAlignment,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MlbClock {
    Fs256,
    Fs512,
    Fs1024,
    Fs2048,
    Fs3072,
    Fs4096,
    Fs6144,
    Fs8192,
}

pub const MLB_CLOCKS: &[(&str, MlbClock)] = &[
    ("256Fs", MlbClock::Fs256),
    ("512Fs", MlbClock::Fs512),
    ("1024Fs", MlbClock::Fs1024),
    ("2048Fs", MlbClock::Fs2048),
    ("3072Fs", MlbClock::Fs3072),
    ("4096Fs", MlbClock::Fs4096),
    ("6144Fs", MlbClock::Fs6144),
    ("8192Fs", MlbClock::Fs8192),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UsbPhysicalLayer {
    Standard,
    Hsic,
}

pub const USB_PHYSICAL_LAYERS: &[(&str, UsbPhysicalLayer)] = &[
    ("Standard", UsbPhysicalLayer::Standard),
    ("HSIC", UsbPhysicalLayer::Hsic),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StreamPortIndex {
    A,
    B,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StreamClock {
    Fs8,
    Fs16,
    Fs32,
    Fs64,
    Fs128,
    Fs256,
    Fs512,
    Wildcard,
}

pub const STREAM_CLOCKS: &[(&str, StreamClock)] = &[
    ("8Fs", StreamClock::Fs8),
    ("16Fs", StreamClock::Fs16),
    ("32Fs", StreamClock::Fs32),
    ("64Fs", StreamClock::Fs64),
    ("128Fs", StreamClock::Fs128),
    ("256Fs", StreamClock::Fs256),
    ("512Fs", StreamClock::Fs512),
    ("Wildcard", StreamClock::Wildcard),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DataAlignment {
    Left16Bit,
    Left24Bit,
    Right16Bit,
    Right24Bit,
    Seq,
}

pub const DATA_ALIGNMENTS: &[(&str, DataAlignment)] = &[
    ("Left16Bit", DataAlignment::Left16Bit),
    ("Left24Bit", DataAlignment::Left24Bit),
    ("Right16Bit", DataAlignment::Right16Bit),
    ("Right24Bit", DataAlignment::Right24Bit),
    ("Seq", DataAlignment::Seq),
];

/// Traffic direction as seen by the network controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Direction {
    Input,
    Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DataType {
    Sync,
    Isochronous,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Socket {
    pub port: ResourceId,
    pub direction: Direction,
    pub data_type: DataType,
    pub kind: SocketKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SocketKind {
    Network {
        bandwidth: u16,
        route: RouteDecl,
    },
    Usb {
        endpoint_address: u8,
        frames_per_transaction: u16,
    },
    MediaLb {
        channel_address: u16,
        bandwidth: u16,
    },
    Stream {
        pin: StreamPin,
        bandwidth: u16,
    },
}

/// Route declaration carried by a network socket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteDecl {
    pub name: String,
    pub active: bool,
    pub route_id: Option<u16>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StreamPin {
    SrxA0,
    SrxA1,
    SrxB0,
    SrxB1,
}

pub const STREAM_PINS: &[(&str, StreamPin)] = &[
    ("SRXA0", StreamPin::SrxA0),
    ("SRXA1", StreamPin::SrxA1),
    ("SRXB0", StreamPin::SrxB0),
    ("SRXB1", StreamPin::SrxB1),
];

/// Fans one input socket out to several network sockets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Splitter {
    pub socket_in: ResourceId,
    pub bytes_per_frame: u16,
}

/// Fans several network sockets in to one output socket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Combiner {
    pub socket_out: ResourceId,
    pub bytes_per_frame: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Connection {
    pub socket_in: ResourceId,
    pub socket_out: ResourceId,
    pub kind: ConnectionKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConnectionKind {
    Sync { mute_mode: MuteMode, offset: u16 },
    AvPacketized { packet_size: IsocPacketSize },
}

impl ConnectionKind {
    pub fn data_type(&self) -> DataType {
        match self {
            ConnectionKind::Sync { .. } => DataType::Sync,
            ConnectionKind::AvPacketized { .. } => DataType::Isochronous,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MuteMode {
    NoMuting,
    MuteSignal,
}

pub const MUTE_MODES: &[(&str, MuteMode)] = &[
    ("NoMuting", MuteMode::NoMuting),
    ("MuteSignal", MuteMode::MuteSignal),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IsocPacketSize {
    P188,
    P196,
    P206,
}

impl IsocPacketSize {
    pub fn bytes(self) -> u16 {
        match self {
            IsocPacketSize::P188 => 188,
            IsocPacketSize::P196 => 196,
            IsocPacketSize::P206 => 206,
        }
    }
}

pub const ISOC_PACKET_SIZES: &[(&str, IsocPacketSize)] = &[
    ("188", IsocPacketSize::P188),
    ("196", IsocPacketSize::P196),
    ("206", IsocPacketSize::P206),
];

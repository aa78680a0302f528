//! Driver-channel records for connections that declare a `Link`.

use crate::document::schema::{
    ALSA, BUFFER_COUNT, BUFFER_SIZE, CDEV, CHANNEL_COUNT, LINK, NAME, RESOLUTION, V4L2,
};
use crate::document::{Element, Scan};
use crate::error::{CompileError, CompileResult};
use crate::model::driver::{
    ALSA_RESOLUTIONS, BufferConfig, ChannelDirection, DriverBinding, DriverInformation,
    PhysicalLayer,
};
use crate::model::resource::{ConnectionKind, Direction};
use crate::model::{Arena, Resource, ResourceId, Socket, SocketKind};

/// A connection that named a driver link. Fan-outs register one candidate
/// per branch, all with the same `element` number.
#[derive(Debug, Clone)]
pub(crate) struct LinkCandidate {
    pub(crate) link: String,
    pub(crate) node: u16,
    /// Document-order number of the connection element.
    pub(crate) element: usize,
    pub(crate) connection: ResourceId,
    pub(crate) line: usize,
}

pub(crate) fn derive<'a>(
    arena: &Arena,
    links: &[LinkCandidate],
    drivers: impl Iterator<Item = &'a Element>,
) -> CompileResult<Vec<DriverInformation>> {
    let mut inferred: Vec<(DriverInformation, Option<&'a Element>)> = Vec::new();
    for candidate in links {
        if inferred.iter().any(|(info, _)| info.link == candidate.link) {
            continue;
        }
        inferred.push((infer(arena, candidate)?, None));
    }

    for driver in drivers {
        let link = driver.req_str(LINK)?;
        let Some((_, slot)) = inferred.iter_mut().find(|(info, _)| info.link == link) else {
            return Err(CompileError::structure(
                driver.line,
                format!("<Driver> refers to unknown link '{}'", link),
            ));
        };
        if slot.is_some() {
            return Err(CompileError::structure(
                driver.line,
                format!("link '{}' has more than one <Driver>", link),
            ));
        }
        *slot = Some(driver);
    }

    let mut records = Vec::new();
    for (info, driver) in inferred {
        let Some(driver) = driver else {
            records.push(info);
            continue;
        };
        driver.require(&[CDEV, V4L2, ALSA], Scan::Siblings)?;
        for child in &driver.children {
            records.push(DriverInformation {
                binding: Some(binding(child)?),
                ..info.clone()
            });
        }
    }
    tracing::debug!(records = records.len(), "driver information derived");
    Ok(records)
}

fn binding(el: &Element) -> CompileResult<DriverBinding> {
    if ![CDEV, V4L2, ALSA].contains(&el.name.as_str()) {
        return Err(CompileError::structure(
            el.line,
            format!("unknown driver interface <{}>", el.name),
        ));
    }
    let name = el.opt_str(NAME).map(str::to_string);
    let buffers = BufferConfig {
        count: el.req_u16(BUFFER_COUNT)?,
        size: el.req_u16(BUFFER_SIZE)?,
    };
    Ok(match el.name.as_str() {
        CDEV => DriverBinding::Cdev { name, buffers },
        V4L2 => DriverBinding::V4l2 { name, buffers },
        _ => DriverBinding::Alsa {
            name,
            buffers,
            channels: el.req_u8(CHANNEL_COUNT)?,
            resolution: el.req_keyword(RESOLUTION, ALSA_RESOLUTIONS)?,
        },
    })
}

fn socket(arena: &Arena, id: ResourceId) -> CompileResult<Option<&Socket>> {
    Ok(arena.get(id)?.as_socket())
}

/// Unwrap splitters and combiners down to the socket they wrap.
fn port_facing(arena: &Arena, id: ResourceId) -> CompileResult<&Socket> {
    match arena.get(id)? {
        Resource::Socket(socket) => Ok(socket),
        Resource::Splitter(splitter) => port_facing(arena, splitter.socket_in),
        Resource::Combiner(combiner) => port_facing(arena, combiner.socket_out),
        other => Err(CompileError::Internal(format!(
            "connection side {} is a {}",
            id.0,
            other.kind_name()
        ))),
    }
}

fn infer(arena: &Arena, candidate: &LinkCandidate) -> CompileResult<DriverInformation> {
    let connection = arena
        .get(candidate.connection)?
        .as_connection()
        .ok_or_else(|| CompileError::Internal(format!("link '{}' has no connection", candidate.link)))?;

    let network = [connection.socket_out, connection.socket_in]
        .into_iter()
        .map(|id| socket(arena, id))
        .collect::<CompileResult<Vec<_>>>()?
        .into_iter()
        .flatten()
        .find_map(|s| match &s.kind {
            SocketKind::Network { bandwidth, .. } => Some(*bandwidth),
            _ => None,
        })
        .ok_or_else(|| CompileError::Internal(format!("link '{}' has no network socket", candidate.link)))?;

    let out_is_network = arena.get(connection.socket_out)?.is_network_socket();
    let facing = if out_is_network {
        port_facing(arena, connection.socket_in)?
    } else {
        port_facing(arena, connection.socket_out)?
    };

    let (physical_layer, channel_name, packets_per_transaction) = match &facing.kind {
        SocketKind::Usb {
            endpoint_address,
            frames_per_transaction,
        } => (
            PhysicalLayer::Usb,
            format!("ep{:02x}", endpoint_address),
            *frames_per_transaction,
        ),
        SocketKind::MediaLb { channel_address, .. } => {
            (PhysicalLayer::MediaLb, format!("ca{}", channel_address), 0)
        }
        SocketKind::Stream { .. } | SocketKind::Network { .. } => {
            return Err(CompileError::structure(
                candidate.line,
                format!(
                    "link '{}' on node 0x{:X} must face a USB or MediaLB socket",
                    candidate.link, candidate.node
                ),
            ));
        }
    };

    let sub_buffer_size = match connection.kind {
        ConnectionKind::Sync { .. } => network,
        ConnectionKind::AvPacketized { packet_size } => packet_size.bytes(),
    };

    Ok(DriverInformation {
        link: candidate.link.clone(),
        node_address: candidate.node,
        physical_layer,
        channel_name,
        direction: match facing.direction {
            Direction::Input => ChannelDirection::Tx,
            Direction::Output => ChannelDirection::Rx,
        },
        data_type: connection.kind.data_type(),
        sub_buffer_size,
        packets_per_transaction,
        binding: None,
    })
}

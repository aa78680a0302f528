use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PhysicalLayer {
    Usb,
    MediaLb,
}

/// Direction from the host's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChannelDirection {
    Tx,
    Rx,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AlsaResolution {
    Bits8,
    Bits16,
    Bits24,
    Bits32,
}

pub const ALSA_RESOLUTIONS: &[(&str, AlsaResolution)] = &[
    ("8bit", AlsaResolution::Bits8),
    ("16bit", AlsaResolution::Bits16),
    ("24bit", AlsaResolution::Bits24),
    ("32bit", AlsaResolution::Bits32),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BufferConfig {
    pub count: u16,
    pub size: u16,
}

/// Linux driver interface a channel is exposed through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum DriverBinding {
    Cdev {
        name: Option<String>,
        buffers: BufferConfig,
    },
    V4l2 {
        name: Option<String>,
        buffers: BufferConfig,
    },
    Alsa {
        name: Option<String>,
        buffers: BufferConfig,
        channels: u8,
        resolution: AlsaResolution,
    },
}

impl DriverBinding {
    pub fn tag(&self) -> &'static str {
        match self {
            DriverBinding::Cdev { .. } => "Cdev",
            DriverBinding::V4l2 { .. } => "V4l2",
            DriverBinding::Alsa { .. } => "Alsa",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriverInformation {
    pub link: String,
    pub node_address: u16,
    pub physical_layer: PhysicalLayer,
    pub channel_name: String,
    pub direction: ChannelDirection,
    pub data_type: crate::model::resource::DataType,
    pub sub_buffer_size: u16,
    /// USB frames per transaction; zero for MediaLB.
    pub packets_per_transaction: u16,
    pub binding: Option<DriverBinding>,
}

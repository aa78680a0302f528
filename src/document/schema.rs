//! Element and attribute names of the configuration document.

pub const ROOT: &str = "Unicens";
pub const ASYNC_BANDWIDTH: &str = "AsyncBandwidth";

pub const NODE: &str = "Node";
pub const ADDRESS: &str = "Address";
pub const SCRIPT_REF: &str = "Script";

pub const MEDIALB_PORT: &str = "MediaLBPort";
pub const USB_PORT: &str = "USBPort";
pub const STREAM_PORT: &str = "StreamPort";
pub const CLOCK_CONFIG: &str = "ClockConfig";
pub const PHYSICAL_LAYER: &str = "PhysicalLayer";
pub const DEVICE_INTERFACES: &str = "DeviceInterfaces";
pub const EP_OUT_COUNT: &str = "StreamingIfEpOutCount";
pub const EP_IN_COUNT: &str = "StreamingIfEpInCount";
pub const DATA_ALIGNMENT: &str = "DataAlignment";

pub const SYNC_CONNECTION: &str = "SyncConnection";
pub const AVP_CONNECTION: &str = "AVPConnection";
pub const MUTE_MODE: &str = "MuteMode";
pub const ISOC_PACKET_SIZE: &str = "IsocPacketSize";
pub const LINK: &str = "Link";

pub const NETWORK_SOCKET: &str = "NetworkSocket";
pub const USB_SOCKET: &str = "USBSocket";
pub const MEDIALB_SOCKET: &str = "MediaLBSocket";
pub const STREAM_SOCKET: &str = "StreamSocket";
pub const SPLITTER: &str = "Splitter";
pub const COMBINER: &str = "Combiner";
pub const BANDWIDTH: &str = "Bandwidth";
pub const ROUTE: &str = "Route";
pub const IS_ACTIVE: &str = "IsActive";
pub const ROUTE_ID: &str = "RouteId";
pub const OFFSET: &str = "Offset";
pub const ENDPOINT_ADDRESS: &str = "EndpointAddress";
pub const FRAMES_PER_TRANSACTION: &str = "FramesPerTransaction";
pub const CHANNEL_ADDRESS: &str = "ChannelAddress";
pub const STREAM_PIN_ID: &str = "StreamPinID";
pub const BYTES_PER_FRAME: &str = "BytesPerFrame";

pub const SCRIPT: &str = "Script";
pub const NAME: &str = "Name";
pub const PAUSE: &str = "Pause";
pub const WAIT_TIME: &str = "WaitTime";
pub const MSG_SEND: &str = "MsgSend";
pub const FBLOCK_ID: &str = "FBlockId";
pub const INSTANCE_ID: &str = "InstanceId";
pub const FUNCTION_ID: &str = "FunctionId";
pub const OP_TYPE_REQUEST: &str = "OpTypeRequest";
pub const OP_TYPE_RESPONSE: &str = "OpTypeResponse";
pub const PAYLOAD_HEX: &str = "PayloadHex";
pub const GPIO_PORT_CREATE: &str = "GPIOPortCreate";
pub const DEBOUNCE_TIME: &str = "DebounceTime";
pub const GPIO_PORT_PIN_MODE: &str = "GPIOPortPinMode";
pub const PIN_CONFIGURATION: &str = "PinConfiguration";
pub const GPIO_PIN_STATE: &str = "GPIOPinState";
pub const MASK: &str = "Mask";
pub const DATA: &str = "Data";
pub const I2C_PORT_CREATE: &str = "I2CPortCreate";
pub const SPEED: &str = "Speed";
pub const I2C_PORT_WRITE: &str = "I2CPortWrite";
pub const I2C_PORT_READ: &str = "I2CPortRead";
pub const MODE: &str = "Mode";
pub const BLOCK_COUNT: &str = "BlockCount";
pub const TIMEOUT: &str = "Timeout";
pub const LENGTH: &str = "Length";

pub const DRIVER: &str = "Driver";
pub const CDEV: &str = "Cdev";
pub const V4L2: &str = "V4l2";
pub const ALSA: &str = "Alsa";
pub const BUFFER_COUNT: &str = "BufferCount";
pub const BUFFER_SIZE: &str = "BufferSize";
pub const CHANNEL_COUNT: &str = "ChannelCount";
pub const RESOLUTION: &str = "Resolution";

/// Command IDs for the Huawei SPP protocol.
/// Format: `[service_id, command_id]` packed big-endian into a `u16`.
pub type CommandId = u16;

// Device info
pub const CMD_DEVICE_INFO: CommandId = 0x0107;

// Battery
pub const CMD_BATTERY_READ: CommandId = 0x0108;
pub const CMD_BATTERY_NOTIFY: CommandId = 0x0127;

// In-ear state (notification)
pub const CMD_IN_EAR_STATE: CommandId = 0x010B;

// ANC
pub const CMD_ANC_READ: CommandId = 0x2B2A;
pub const CMD_ANC_WRITE: CommandId = 0x2B04;
pub const CMD_ANC_NOTIFY: CommandId = 0x2B03;

// Auto-pause (wear detection)
pub const CMD_AUTO_PAUSE_READ: CommandId = 0x2B11;
pub const CMD_AUTO_PAUSE_WRITE: CommandId = 0x2B10;

// Gestures - Double tap (param 4 carries the in-call action)
pub const CMD_DUAL_TAP_READ: CommandId = 0x0120;
pub const CMD_DUAL_TAP_WRITE: CommandId = 0x011F;

// Gestures - Triple tap
pub const CMD_TRIPLE_TAP_READ: CommandId = 0x0126;
pub const CMD_TRIPLE_TAP_WRITE: CommandId = 0x0125;

// Gestures - Long tap (split left/right)
pub const CMD_LONG_TAP_SPLIT_READ_BASE: CommandId = 0x2B17;
pub const CMD_LONG_TAP_SPLIT_READ_ANC: CommandId = 0x2B19;
pub const CMD_LONG_TAP_SPLIT_WRITE_BASE: CommandId = 0x2B16;
pub const CMD_LONG_TAP_SPLIT_WRITE_ANC: CommandId = 0x2B18;

// Gestures - Swipe
pub const CMD_SWIPE_READ: CommandId = 0x2B1F;
pub const CMD_SWIPE_WRITE: CommandId = 0x2B1E;

// Low latency (same id for read and write)
pub const CMD_LOW_LATENCY: CommandId = 0x2B6C;

// Dual connect
pub const CMD_DUAL_CONNECT_ENABLED_READ: CommandId = 0x2B2F;
pub const CMD_DUAL_CONNECT_ENABLED_WRITE: CommandId = 0x2B2E;
pub const CMD_DUAL_CONNECT_ENUMERATE: CommandId = 0x2B31;
pub const CMD_DUAL_CONNECT_PREFERRED_WRITE: CommandId = 0x2B32;
pub const CMD_DUAL_CONNECT_EXECUTE: CommandId = 0x2B33;
pub const CMD_DUAL_CONNECT_CHANGE_EVENT: CommandId = 0x2B36;

// Equalizer
pub const CMD_EQUALIZER_READ: CommandId = 0x2B4A;
pub const CMD_EQUALIZER_WRITE: CommandId = 0x2B49;

// Sound quality preference
pub const CMD_SOUND_QUALITY_READ: CommandId = 0x2BA3;
pub const CMD_SOUND_QUALITY_WRITE: CommandId = 0x2BA2;

// Voice language
pub const CMD_VOICE_LANGUAGE_READ: CommandId = 0x0C02;
pub const CMD_VOICE_LANGUAGE_WRITE: CommandId = 0x0C01;

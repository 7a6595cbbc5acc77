use crate::protocol::commands::CommandId;

/// Errors produced by the protocol core.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The transport refused to connect or failed to write.
    #[error("transport error: {0}")]
    Transport(String),

    /// The frame is too short or its marker/reserved bytes are wrong.
    #[error("malformed frame header")]
    MalformedHeader,

    /// The CRC trailer does not match the frame contents.
    #[error("checksum mismatch: computed {computed:04X}, received {received:04X}")]
    ChecksumMismatch { computed: u16, received: u16 },

    /// A parameter declares more bytes than the frame holds.
    #[error("parameter {key} overflows frame (len={len}, offset={offset})")]
    TruncatedParameter { key: u8, len: usize, offset: usize },

    /// No frame with the expected command id arrived in time.
    #[error("no response to command {0:04X}")]
    ResponseTimeout(CommandId),

    /// The caller supplied a value the protocol cannot express.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("device not connected")]
    NotConnected,

    /// The dispatch worker has stopped accepting commands.
    #[error("command queue closed")]
    QueueClosed,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }
}

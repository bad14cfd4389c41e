//! Gateway protocol definitions
//!
//! Defines the WebSocket protocol including op codes, message formats, close
//! codes and the zlib-stream transport compression.

mod close_codes;
mod compression;
mod messages;
mod opcodes;
mod payloads;

pub use close_codes::CloseCode;
pub use compression::{CompressionError, ZlibStreamDecoder, ZLIB_SUFFIX};
pub use messages::{GatewayMessage, EVENT_READY, EVENT_RESUMED};
pub use opcodes::OpCode;
pub use payloads::{
    ClientState, HelloPayload, IdentifyPayload, IdentifyProperties, ReadyPayload, ReadyUser,
    ResumePayload,
};

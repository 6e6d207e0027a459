//! Binary message codec

use crate::error::CodecError;
use crate::protocol::ForwardMsg;

/// Turns raw inbound buffers into typed messages and back.
pub trait MessageCodec: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Result<ForwardMsg, CodecError>;
    fn encode(&self, msg: &ForwardMsg) -> Result<Vec<u8>, CodecError>;
}

/// Default codec: `bincode` over the serde message model.
#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeCodec;

impl MessageCodec for BincodeCodec {
    fn decode(&self, bytes: &[u8]) -> Result<ForwardMsg, CodecError> {
        bincode::deserialize(bytes).map_err(|e| CodecError::Decode(e.to_string()))
    }

    fn encode(&self, msg: &ForwardMsg) -> Result<Vec<u8>, CodecError> {
        bincode::serialize(msg).map_err(|e| CodecError::Encode(e.to_string()))
    }
}

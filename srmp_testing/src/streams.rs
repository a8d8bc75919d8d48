use bytes::{Bytes, BytesMut};
use srmp::{DefaultMessage, MessageKindRegistry, WireMessage};

/// Encode `messages` back to back as bare SRMP frames.
///
/// # Panics
///
/// Panics if a message cannot be encoded.
#[must_use]
pub fn encode_stream(messages: &[DefaultMessage]) -> Bytes {
    let mut wire = BytesMut::new();
    for message in messages {
        message.encode(&mut wire).expect("message should encode");
    }
    wire.freeze()
}

/// Encode `messages` back to back as typed envelopes.
///
/// # Panics
///
/// Panics if a message type is not registered or fails to encode.
#[must_use]
pub fn encode_envelopes<M: WireMessage>(registry: &MessageKindRegistry, messages: &[M]) -> Bytes {
    let mut wire = BytesMut::new();
    for message in messages {
        registry
            .encode(message, &mut wire)
            .expect("envelope should encode");
    }
    wire.freeze()
}

/// Cut `wire` into pieces of at most `size` bytes.
///
/// # Panics
///
/// Panics if `size` is zero.
#[must_use]
pub fn split_every(wire: &Bytes, size: usize) -> Vec<Bytes> {
    assert!(size > 0, "piece size must be non-zero");
    (0..wire.len())
        .step_by(size)
        .map(|start| wire.slice(start..(start + size).min(wire.len())))
        .collect()
}

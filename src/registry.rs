//! Mapping between message kind bytes and concrete message variants.
//!
//! Non-default variants travel inside a typed envelope: one kind byte followed
//! by the variant's own body. The registry resolves the kind byte to a
//! [`MessageVariant`] that knows how to measure and decode the body. It is
//! built once at startup and then shared read-only.

use std::{any::TypeId, collections::HashMap, fmt};

use bytes::{BufMut, Bytes, BytesMut};
use thiserror::Error;

use crate::{
    codec::{self, CodecError, FramingError, ProtocolError},
    group::{self, GroupMessage},
    message::{DefaultMessage, Message, MessageKind},
};

/// A message variant that can travel inside the typed envelope.
pub trait WireMessage: Message + Sized {
    /// Kind byte written ahead of the body.
    const KIND: MessageKind;

    /// Human-readable variant name used in logs and errors.
    const NAME: &'static str;

    /// Append the variant body (without the kind byte) to `dst`.
    ///
    /// # Errors
    ///
    /// Returns a [`CodecError`] if the message cannot be represented.
    fn encode_body(&self, dst: &mut BytesMut) -> Result<(), CodecError>;

    /// Decode a body that starts at the beginning of `body`.
    ///
    /// # Errors
    ///
    /// Returns a [`CodecError`] for truncated or malformed input.
    fn decode_body(body: &Bytes) -> Result<Self, CodecError>;

    /// Length of the body at the start of `src`, or `0` if not yet known.
    fn body_frame_length(src: &[u8]) -> usize;
}

impl WireMessage for DefaultMessage {
    const KIND: MessageKind = DefaultMessage::KIND;
    const NAME: &'static str = "DefaultMessage";

    fn encode_body(&self, dst: &mut BytesMut) -> Result<(), CodecError> { self.encode(dst) }

    fn decode_body(body: &Bytes) -> Result<Self, CodecError> { Self::decode_frame(body) }

    fn body_frame_length(src: &[u8]) -> usize { codec::peek_frame_length(src) }
}

impl WireMessage for GroupMessage {
    const KIND: MessageKind = GroupMessage::KIND;
    const NAME: &'static str = "GroupMessage";

    fn encode_body(&self, dst: &mut BytesMut) -> Result<(), CodecError> {
        self.encode(dst);
        Ok(())
    }

    fn decode_body(body: &Bytes) -> Result<Self, CodecError> { Self::decode_frame(body) }

    fn body_frame_length(src: &[u8]) -> usize { group::message::peek_frame_length(src) }
}

type DecodeFn = fn(&Bytes) -> Result<Box<dyn Message>, CodecError>;

fn decode_boxed<M: WireMessage>(body: &Bytes) -> Result<Box<dyn Message>, CodecError> {
    Ok(Box::new(M::decode_body(body)?))
}

/// Registry entry describing one variant.
#[derive(Clone, Copy)]
pub struct MessageVariant {
    kind: MessageKind,
    name: &'static str,
    type_id: TypeId,
    decode: DecodeFn,
    body_frame_length: fn(&[u8]) -> usize,
}

impl MessageVariant {
    /// Describe the variant `M`.
    #[must_use]
    pub fn of<M: WireMessage>() -> Self {
        Self {
            kind: M::KIND,
            name: M::NAME,
            type_id: TypeId::of::<M>(),
            decode: decode_boxed::<M>,
            body_frame_length: M::body_frame_length,
        }
    }

    /// Kind byte of the variant.
    #[must_use]
    pub const fn kind(&self) -> MessageKind { self.kind }

    /// Variant name.
    #[must_use]
    pub const fn name(&self) -> &'static str { self.name }

    /// Rust type implementing the variant.
    #[must_use]
    pub const fn type_id(&self) -> TypeId { self.type_id }

    /// Decode a variant body into a trait object.
    ///
    /// # Errors
    ///
    /// Returns the variant's [`CodecError`] for malformed input.
    pub fn decode(&self, body: &Bytes) -> Result<Box<dyn Message>, CodecError> {
        (self.decode)(body)
    }

    /// Length of the variant body at the start of `src`, or `0`.
    #[must_use]
    pub fn body_frame_length(&self, src: &[u8]) -> usize { (self.body_frame_length)(src) }
}

impl fmt::Debug for MessageVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageVariant")
            .field("kind", &self.kind)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Errors raised while building a registry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// Two variants claimed the same kind byte.
    #[error("message kind {kind} already registered to {existing}, cannot register {attempted}")]
    DuplicateKind {
        /// Contested kind byte.
        kind: MessageKind,
        /// Variant that holds the kind.
        existing: &'static str,
        /// Variant that tried to claim it.
        attempted: &'static str,
    },
}

/// Bidirectional map between kind bytes and variants.
///
/// # Examples
///
/// ```
/// use srmp::{
///     message::{DefaultMessage, Message},
///     registry::MessageKindRegistry,
/// };
///
/// let registry = MessageKindRegistry::with_builtin();
/// let mut wire = bytes::BytesMut::new();
/// registry
///     .encode(&DefaultMessage::new("hi").with_sequence(2), &mut wire)
///     .expect("encode");
/// assert_eq!(registry.frame_length(&wire), wire.len());
///
/// let decoded = registry.decode_frame(&wire.freeze()).expect("decode");
/// assert_eq!(decoded.kind(), DefaultMessage::KIND);
/// assert_eq!(decoded.payload().as_ref(), b"hi");
/// ```
#[derive(Clone, Debug, Default)]
pub struct MessageKindRegistry {
    variants: HashMap<MessageKind, MessageVariant>,
    kinds: HashMap<TypeId, MessageKind>,
}

impl MessageKindRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Create a registry holding [`DefaultMessage`] and [`GroupMessage`].
    #[must_use]
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.insert(MessageVariant::of::<DefaultMessage>());
        registry.insert(MessageVariant::of::<GroupMessage>());
        registry
    }

    fn insert(&mut self, variant: MessageVariant) {
        self.kinds.insert(variant.type_id, variant.kind);
        self.variants.insert(variant.kind, variant);
    }

    /// Register the variant `M`.
    ///
    /// Registering the same type twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateKind`] when another type already
    /// holds `M::KIND`.
    pub fn register<M: WireMessage>(&mut self) -> Result<&mut Self, RegistryError> {
        let variant = MessageVariant::of::<M>();
        if let Some(existing) = self.variants.get(&variant.kind) {
            if existing.type_id == variant.type_id {
                return Ok(self);
            }
            return Err(RegistryError::DuplicateKind {
                kind: variant.kind,
                existing: existing.name,
                attempted: variant.name,
            });
        }
        log::debug!("registered message kind {} as {}", variant.kind, variant.name);
        self.insert(variant);
        Ok(self)
    }

    /// Look up the variant registered for `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::UnknownMessageKind`] for unregistered kinds.
    pub fn resolve(&self, kind: MessageKind) -> Result<&MessageVariant, ProtocolError> {
        self.variants
            .get(&kind)
            .ok_or(ProtocolError::UnknownMessageKind { kind: kind.get() })
    }

    /// Kind byte registered for the type `M`, if any.
    #[must_use]
    pub fn kind_of<M: WireMessage>(&self) -> Option<MessageKind> {
        self.kinds.get(&TypeId::of::<M>()).copied()
    }

    /// Number of registered variants.
    #[must_use]
    pub fn len(&self) -> usize { self.variants.len() }

    /// Whether no variant is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.variants.is_empty() }

    /// Write `message` as kind byte plus body.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::UnknownMessageKind`] if `M` is not registered,
    /// or the variant's own encoding error.
    pub fn encode<M: WireMessage>(&self, message: &M, dst: &mut BytesMut) -> Result<(), CodecError> {
        let kind = self
            .kind_of::<M>()
            .ok_or(ProtocolError::UnknownMessageKind { kind: M::KIND.get() })?;
        dst.put_u8(kind.get());
        message.encode_body(dst)
    }

    /// Decode an envelope without copying the body.
    ///
    /// # Errors
    ///
    /// Returns [`FramingError::TruncatedHeader`] for an empty frame,
    /// [`ProtocolError::UnknownMessageKind`] for an unregistered kind byte,
    /// or the variant's decoding error.
    pub fn decode_frame(&self, frame: &Bytes) -> Result<Box<dyn Message>, CodecError> {
        let Some(&kind) = frame.first() else {
            return Err(FramingError::TruncatedHeader { have: 0, need: 1 }.into());
        };
        let variant = self.resolve(MessageKind::new(kind))?;
        variant.decode(&frame.slice(1..))
    }

    /// Decode an envelope from a borrowed slice, copying it first.
    ///
    /// # Errors
    ///
    /// See [`decode_frame`](Self::decode_frame).
    pub fn decode(&self, src: &[u8]) -> Result<Box<dyn Message>, CodecError> {
        self.decode_frame(&Bytes::copy_from_slice(src))
    }

    /// Full envelope length at the start of `src`, or `0` while unknown.
    ///
    /// An unregistered kind byte is reported as a one-byte frame so the
    /// decoder surfaces [`ProtocolError::UnknownMessageKind`] and the stream
    /// moves on instead of stalling.
    #[must_use]
    pub fn frame_length(&self, src: &[u8]) -> usize {
        let Some((&kind, body)) = src.split_first() else {
            return 0;
        };
        match self.variants.get(&MessageKind::new(kind)) {
            Some(variant) => match variant.body_frame_length(body) {
                0 => 0,
                len => len.saturating_add(1),
            },
            None => 1,
        }
    }
}

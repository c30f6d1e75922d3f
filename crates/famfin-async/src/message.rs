use bytes::Bytes;

/// Messages the application pulls from [`Inbound`](crate::Inbound).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundMessage {
    /// The request body. The bridge buffers the whole body, so
    /// `more_body` is always `false`.
    Body { body: Bytes, more_body: bool },
    /// The body has already been delivered.
    Disconnect,
}

/// Messages the application pushes into [`Outbound`](crate::Outbound).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundMessage {
    /// Status line and headers. Must be sent exactly once.
    Start {
        status: u16,
        headers: Vec<(Bytes, Bytes)>,
    },
    /// A body chunk. `more_body: false` marks the last one.
    Body { body: Bytes, more_body: bool },
}

impl OutboundMessage {
    pub fn start(status: u16, headers: Vec<(Bytes, Bytes)>) -> Self {
        OutboundMessage::Start { status, headers }
    }

    /// A single, final body chunk.
    pub fn body(body: impl Into<Bytes>) -> Self {
        OutboundMessage::Body {
            body: body.into(),
            more_body: false,
        }
    }

    /// A body chunk with more to follow.
    pub fn chunk(body: impl Into<Bytes>) -> Self {
        OutboundMessage::Body {
            body: body.into(),
            more_body: true,
        }
    }
}

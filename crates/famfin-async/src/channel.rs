//! The two exchange primitives handed to an application, and the state they
//! accumulate.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::{Bytes, BytesMut};

use crate::error::ChannelError;
use crate::message::{InboundMessage, OutboundMessage};

/// Where an invocation's outbound exchange currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Unstarted,
    Started,
    /// The final body chunk (`more_body: false`) has been recorded.
    Complete,
}

/// Outbound status, headers and body recorded during one invocation.
#[derive(Debug, Default)]
pub struct ChannelState {
    status: Option<u16>,
    headers: Vec<(Bytes, Bytes)>,
    body: BytesMut,
    complete: bool,
    violation: Option<ChannelError>,
}

impl ChannelState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one outbound message.
    ///
    /// A second start is rejected. Body chunks are appended in arrival
    /// order; a body sent before the start is accepted and the status
    /// stays unset.
    pub fn record(&mut self, message: OutboundMessage) -> Result<(), ChannelError> {
        match message {
            OutboundMessage::Start { status, headers } => {
                if self.status.is_some() {
                    return Err(ChannelError::DuplicateStart);
                }
                self.status = Some(status);
                self.headers = headers;
            }
            OutboundMessage::Body { body, more_body } => {
                if self.complete {
                    return Err(ChannelError::BodyAfterComplete);
                }
                self.body.extend_from_slice(&body);
                self.complete = !more_body;
            }
        }
        Ok(())
    }

    pub fn phase(&self) -> Phase {
        if self.complete {
            Phase::Complete
        } else if self.status.is_some() {
            Phase::Started
        } else {
            Phase::Unstarted
        }
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn headers(&self) -> &[(Bytes, Bytes)] {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn into_parts(self) -> (Option<u16>, Vec<(Bytes, Bytes)>, Bytes) {
        (self.status, self.headers, self.body.freeze())
    }
}

/// Create the channel for one invocation carrying the buffered `body`.
pub fn channel(body: Bytes) -> (Inbound, Outbound, ChannelHandle) {
    let state = Arc::new(Mutex::new(ChannelState::new()));
    (
        Inbound { body: Some(body) },
        Outbound {
            state: Arc::clone(&state),
        },
        ChannelHandle { state },
    )
}

/// Receiving half: yields the request body exactly once.
#[derive(Debug)]
pub struct Inbound {
    body: Option<Bytes>,
}

impl Inbound {
    pub async fn receive(&mut self) -> InboundMessage {
        match self.body.take() {
            Some(body) => InboundMessage::Body {
                body,
                more_body: false,
            },
            None => InboundMessage::Disconnect,
        }
    }

    /// Convenience for applications that only want the bytes.
    pub async fn body(&mut self) -> Bytes {
        match self.receive().await {
            InboundMessage::Body { body, .. } => body,
            InboundMessage::Disconnect => Bytes::new(),
        }
    }
}

/// Sending half: records into the shared [`ChannelState`].
#[derive(Debug, Clone)]
pub struct Outbound {
    state: Arc<Mutex<ChannelState>>,
}

impl Outbound {
    /// Record `message`. Never blocks.
    ///
    /// A violation is returned to the caller and also kept on the channel,
    /// so the invocation fails even when the application ignores it.
    pub async fn send(&self, message: OutboundMessage) -> Result<(), ChannelError> {
        let mut state = lock(&self.state);
        let result = state.record(message);
        if let Err(e) = &result {
            state.violation.get_or_insert_with(|| e.clone());
        }
        result
    }
}

/// Held by the invoker to collect the state once the application returns.
#[derive(Debug)]
pub struct ChannelHandle {
    state: Arc<Mutex<ChannelState>>,
}

impl ChannelHandle {
    pub fn phase(&self) -> Phase {
        lock(&self.state).phase()
    }

    /// Take the accumulated state, or the first protocol violation.
    pub fn finish(self) -> Result<ChannelState, ChannelError> {
        let mut state = std::mem::take(&mut *lock(&self.state));
        match state.violation.take() {
            Some(violation) => Err(violation),
            None => Ok(state),
        }
    }
}

fn lock(state: &Mutex<ChannelState>) -> MutexGuard<'_, ChannelState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start(status: u16) -> OutboundMessage {
        OutboundMessage::start(
            status,
            vec![(Bytes::from_static(b"content-type"), Bytes::from_static(b"text/plain"))],
        )
    }

    #[tokio::test]
    async fn receive_yields_body_once() {
        let (mut inbound, _outbound, _handle) = channel(Bytes::from("payload"));

        assert_eq!(
            inbound.receive().await,
            InboundMessage::Body {
                body: Bytes::from("payload"),
                more_body: false
            }
        );
        assert_eq!(inbound.receive().await, InboundMessage::Disconnect);
        assert!(inbound.body().await.is_empty());
    }

    #[tokio::test]
    async fn start_then_body() {
        let (_inbound, outbound, handle) = channel(Bytes::new());
        assert_eq!(handle.phase(), Phase::Unstarted);

        outbound.send(start(201)).await.unwrap();
        assert_eq!(handle.phase(), Phase::Started);

        outbound.send(OutboundMessage::body("done")).await.unwrap();
        assert_eq!(handle.phase(), Phase::Complete);

        let state = handle.finish().unwrap();
        assert_eq!(state.status(), Some(201));
        assert_eq!(state.headers().len(), 1);
        assert_eq!(state.body(), b"done");
    }

    #[tokio::test]
    async fn body_chunks_are_concatenated_in_order() {
        let (_inbound, outbound, handle) = channel(Bytes::new());
        outbound.send(start(200)).await.unwrap();
        outbound.send(OutboundMessage::chunk("one,")).await.unwrap();
        outbound.send(OutboundMessage::chunk("two,")).await.unwrap();
        outbound.send(OutboundMessage::body("three")).await.unwrap();

        let (_, _, body) = handle.finish().unwrap().into_parts();
        assert_eq!(body, Bytes::from("one,two,three"));
    }

    #[tokio::test]
    async fn duplicate_start_fails_invocation() {
        let (_inbound, outbound, handle) = channel(Bytes::new());
        outbound.send(start(200)).await.unwrap();

        let err = outbound.send(start(500)).await.unwrap_err();
        assert_eq!(err, ChannelError::DuplicateStart);
        assert_eq!(handle.finish().unwrap_err(), ChannelError::DuplicateStart);
    }

    #[tokio::test]
    async fn ignored_violation_is_still_reported() {
        let (_inbound, outbound, handle) = channel(Bytes::new());
        outbound.send(start(200)).await.unwrap();
        outbound.send(OutboundMessage::body("a")).await.unwrap();
        let _ = outbound.send(OutboundMessage::body("b")).await;

        assert_eq!(handle.finish().unwrap_err(), ChannelError::BodyAfterComplete);
    }

    #[tokio::test]
    async fn body_before_start_is_accepted() {
        let (_inbound, outbound, handle) = channel(Bytes::new());
        outbound.send(OutboundMessage::chunk("early")).await.unwrap();

        let state = handle.finish().unwrap();
        assert_eq!(state.status(), None);
        assert_eq!(state.body(), b"early");
    }

    #[tokio::test]
    async fn cloned_outbound_shares_state() {
        let (_inbound, outbound, handle) = channel(Bytes::new());
        let clone = outbound.clone();
        outbound.send(start(204)).await.unwrap();
        clone.send(OutboundMessage::body("")).await.unwrap();

        let state = handle.finish().unwrap();
        assert_eq!(state.status(), Some(204));
        assert!(state.body().is_empty());
    }

    #[test]
    fn fresh_state_is_unstarted() {
        let state = ChannelState::new();
        assert_eq!(state.phase(), Phase::Unstarted);
        assert_eq!(state.status(), None);
        assert!(state.headers().is_empty());
        assert!(state.body().is_empty());
    }
}

//! Mock transport for testing and development.
//!
//! This module provides a simulated reader link driven by a script of
//! queued replies, so transport behavior (responses, errors, exhaustion)
//! can be exercised without hardware.

use crate::{
    error::{Result, TransportError},
    traits::{CardResponse, Transport},
};
use relaykit_core::StatusWord;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// One scripted outcome for a `transmit` call.
#[derive(Debug)]
enum ScriptedReply {
    Reply(CardResponse),
    Error(TransportError),
}

#[derive(Debug, Default)]
struct Inner {
    script: VecDeque<ScriptedReply>,
    sent: Vec<Vec<u8>>,
    closed: bool,
}

/// Mock reader link for testing and development.
///
/// Replies are consumed from a script in FIFO order; every transmitted
/// frame is recorded for later assertion through the handle. An exhausted
/// script reports `Disconnected`, which doubles as a way to drive the
/// relay's permanent-failure handling in tests.
///
/// # Examples
///
/// ```
/// use relaykit_core::StatusWord;
/// use relaykit_hardware::mock::MockTransport;
/// use relaykit_hardware::Transport;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> relaykit_hardware::error::Result<()> {
/// let (mut link, handle) = MockTransport::new();
/// handle.queue_response(&[0x04, 0xAB, 0xCD, 0xEF], StatusWord::SUCCESS);
///
/// let response = link.transmit(&[0xFF, 0xCA, 0x00, 0x00, 0x00]).await?;
/// assert_eq!(response.data, vec![0x04, 0xAB, 0xCD, 0xEF]);
/// assert_eq!(handle.sent_frames().len(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct MockTransport {
    inner: Arc<Mutex<Inner>>,
    name: String,
}

impl MockTransport {
    /// Create a mock transport with the default name.
    ///
    /// Returns a `(MockTransport, MockTransportHandle)` pair; the handle
    /// scripts replies and inspects traffic.
    pub fn new() -> (Self, MockTransportHandle) {
        Self::with_name("Mock Reader")
    }

    /// Create a mock transport with a custom reader name.
    pub fn with_name(name: impl Into<String>) -> (Self, MockTransportHandle) {
        let name = name.into();
        let inner = Arc::new(Mutex::new(Inner::default()));

        let transport = Self {
            inner: Arc::clone(&inner),
            name: name.clone(),
        };
        let handle = MockTransportHandle { inner, name };

        (transport, handle)
    }
}

impl Transport for MockTransport {
    async fn transmit(&mut self, payload: &[u8]) -> Result<CardResponse> {
        let mut inner = self.inner.lock().expect("mock transport lock poisoned");

        if inner.closed {
            return Err(TransportError::disconnected(&self.name));
        }

        inner.sent.push(payload.to_vec());
        match inner.script.pop_front() {
            Some(ScriptedReply::Reply(response)) => Ok(response),
            Some(ScriptedReply::Error(err)) => Err(err),
            None => Err(TransportError::disconnected(&self.name)),
        }
    }

    fn reader_name(&self) -> &str {
        &self.name
    }

    async fn close(&mut self) -> Result<()> {
        self.inner
            .lock()
            .expect("mock transport lock poisoned")
            .closed = true;
        Ok(())
    }
}

/// Handle for controlling a [`MockTransport`].
///
/// Cloneable; all clones share the same script and traffic log.
#[derive(Debug, Clone)]
pub struct MockTransportHandle {
    inner: Arc<Mutex<Inner>>,
    name: String,
}

impl MockTransportHandle {
    /// Queue a successful reply with the given body and status word.
    pub fn queue_response(&self, data: &[u8], status: StatusWord) {
        self.lock()
            .script
            .push_back(ScriptedReply::Reply(CardResponse::new(
                data.to_vec(),
                status,
            )));
    }

    /// Queue a reply carrying only a status word.
    pub fn queue_status(&self, status: StatusWord) {
        self.queue_response(&[], status);
    }

    /// Queue a transport failure.
    pub fn queue_error(&self, error: TransportError) {
        self.lock().script.push_back(ScriptedReply::Error(error));
    }

    /// Frames transmitted so far, oldest first.
    pub fn sent_frames(&self) -> Vec<Vec<u8>> {
        self.lock().sent.clone()
    }

    /// Number of frames transmitted so far.
    pub fn sent_count(&self) -> usize {
        self.lock().sent.len()
    }

    /// Scripted replies not yet consumed.
    pub fn remaining(&self) -> usize {
        self.lock().script.len()
    }

    /// Whether the transport was closed.
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Reader name of the paired transport.
    pub fn name(&self) -> &str {
        &self.name
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("mock transport lock poisoned")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_replies_in_order() {
        let (mut link, handle) = MockTransport::new();
        handle.queue_response(&[0x01], StatusWord::SUCCESS);
        handle.queue_status(StatusWord::new(0x63, 0x00));

        let first = link.transmit(&[0xAA]).await.unwrap();
        assert_eq!(first.data, vec![0x01]);
        assert!(first.is_success());

        let second = link.transmit(&[0xBB]).await.unwrap();
        assert!(second.data.is_empty());
        assert_eq!(second.status.to_u16(), 0x6300);

        assert_eq!(handle.sent_frames(), vec![vec![0xAA], vec![0xBB]]);
        assert_eq!(handle.remaining(), 0);
    }

    #[tokio::test]
    async fn test_scripted_error() {
        let (mut link, handle) = MockTransport::new();
        handle.queue_error(TransportError::timeout(1500));

        let err = link.transmit(&[0x00]).await.unwrap_err();
        assert!(err.is_timeout());
        // The attempt is still recorded.
        assert_eq!(handle.sent_count(), 1);
    }

    #[tokio::test]
    async fn test_exhausted_script_reports_disconnected() {
        let (mut link, _handle) = MockTransport::with_name("emulator");

        let err = link.transmit(&[0x00]).await.unwrap_err();
        assert!(matches!(err, TransportError::Disconnected { device } if device == "emulator"));
    }

    #[tokio::test]
    async fn test_close_stops_traffic() {
        let (mut link, handle) = MockTransport::new();
        handle.queue_response(&[0x01], StatusWord::SUCCESS);

        link.close().await.unwrap();
        assert!(handle.is_closed());

        let err = link.transmit(&[0x00]).await.unwrap_err();
        assert!(matches!(err, TransportError::Disconnected { .. }));
        // Nothing is recorded after close.
        assert_eq!(handle.sent_count(), 0);
    }
}

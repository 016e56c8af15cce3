//! PC/SC transport backend.
//! Can be enabled by turning the `pcsc` feature on.
//!
//! PC/SC is the platform abstraction for smart-card readers; Windows and
//! macOS ship it, Linux provides it through pcsc-lite. Both relay links run
//! over it, with different connection modes:
//!
//! - the card side connects like any card application (shared mode, any
//!   protocol), waiting for a card to arrive;
//! - the emulator side has no card in the field, so it connects in direct
//!   share mode with the raw protocol and drives the reader's controller
//!   through the pass-through channel.

use crate::{
    error::{Result, TransportError},
    traits::{CardResponse, Transport},
};
use pcsc::{Card, Disposition, MAX_BUFFER_SIZE, Protocols, Scope, ShareMode};
use std::ffi::CString;
use std::thread::sleep;
use std::time::Duration;
use tracing::{debug, info};

/// Interval between card-arrival polls while waiting on the card reader.
const CARD_WAIT_POLL: Duration = Duration::from_secs(1);

/// PC/SC context wrapper.
pub struct PcscContext {
    ctx: pcsc::Context,
}

impl PcscContext {
    /// Establish a PC/SC context in user scope.
    pub fn establish() -> Result<Self> {
        Ok(Self {
            ctx: pcsc::Context::establish(Scope::User)?,
        })
    }

    /// Names of all readers currently attached to the service.
    pub fn reader_names(&self) -> Result<Vec<String>> {
        let mut buf = [0u8; 2048];
        Ok(self
            .ctx
            .list_readers(&mut buf)?
            .map(|name| name.to_string_lossy().into_owned())
            .collect())
    }

    /// Connect to the card inserted in the given reader, waiting for one to
    /// arrive.
    ///
    /// Polls once per second while the reader reports no card; every other
    /// failure is returned immediately.
    pub fn connect_card(&self, reader_name: &str) -> Result<PcscTransport> {
        let reader = to_cstring(reader_name)?;
        info!(reader = reader_name, "waiting for a card");

        loop {
            match self
                .ctx
                .connect(&reader, ShareMode::Shared, Protocols::ANY)
            {
                Ok(card) => {
                    debug!(reader = reader_name, "connected to card");
                    return Ok(PcscTransport::new(card, reader_name));
                }
                Err(pcsc::Error::NoSmartcard) => {
                    info!(reader = reader_name, "still waiting for a card");
                    sleep(CARD_WAIT_POLL);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Connect to a reader in direct share mode for controller pass-through.
    ///
    /// No card needs to be present; this is the emulator-side channel.
    pub fn connect_direct(&self, reader_name: &str) -> Result<PcscTransport> {
        let reader = to_cstring(reader_name)?;
        let card = self
            .ctx
            .connect(&reader, ShareMode::Direct, Protocols::RAW)?;

        debug!(reader = reader_name, "connected in direct mode");
        Ok(PcscTransport::new(card, reader_name))
    }
}

fn to_cstring(name: &str) -> Result<CString> {
    CString::new(name).map_err(|_| TransportError::reader_not_found(name))
}

/// A reader link over PC/SC.
pub struct PcscTransport {
    card: Option<Card>,
    name: String,
}

impl PcscTransport {
    fn new(card: Card, name: &str) -> Self {
        Self {
            card: Some(card),
            name: name.to_string(),
        }
    }
}

impl Transport for PcscTransport {
    async fn transmit(&mut self, payload: &[u8]) -> Result<CardResponse> {
        let card = self
            .card
            .as_ref()
            .ok_or_else(|| TransportError::disconnected(&self.name))?;

        debug!(reader = %self.name, tx = %hex(payload), "transmit");

        let mut buf = [0u8; MAX_BUFFER_SIZE];
        let raw = card.transmit(payload, &mut buf)?;

        debug!(reader = %self.name, rx = %hex(raw), "response");
        CardResponse::from_raw(raw)
    }

    fn reader_name(&self) -> &str {
        &self.name
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(card) = self.card.take() {
            card.disconnect(Disposition::LeaveCard)
                .map_err(|(_, e)| TransportError::from(e))?;
        }
        Ok(())
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}

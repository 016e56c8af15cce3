//! Reader preparation.
//!
//! Both readers need the same setup before a session: automatic polling
//! off, an LED color for the operator, and a liveness probe of the NFC
//! controller through the pass-through channel. The reader-level steps are
//! informational and may fail on non-ACR122 hardware; the controller probe
//! is mandatory, because without it the session would fail later in a less
//! obvious way.

use relaykit_core::{Error, Result};
use relaykit_hardware::{LedColor, ReaderInfo, Transport, acr122};
use relaykit_protocol::{ControllerCommand, Opcode, PassThroughFrame};
use tracing::{debug, info, warn};

/// Expected prefix of the controller's firmware response payload.
const FIRMWARE_RESPONSE_PREFIX: [u8; 2] = [0xD5, 0x03];

/// Prepare a reader for a relay session.
///
/// # Errors
///
/// Returns an error when the controller behind the reader does not answer
/// the pass-through firmware probe. LED and auto-poll failures are logged
/// and ignored.
pub async fn prep_reader<T: Transport>(link: &mut T, led: LedColor) -> Result<ReaderInfo> {
    if let Err(e) = link.transmit(&acr122::disable_auto_poll_command()).await {
        warn!(reader = link.reader_name(), error = %e, "could not disable auto-polling");
    }

    if let Err(e) = link.transmit(&acr122::led_command(led)).await {
        debug!(reader = link.reader_name(), error = %e, "LED not set");
    }

    if let Err(e) = link.transmit(&acr122::reader_firmware_command()).await {
        debug!(reader = link.reader_name(), error = %e, "reader firmware query failed");
    }

    // The controller must be reachable through the pass-through channel.
    let probe = PassThroughFrame::wrap(&ControllerCommand::new(Opcode::GetFirmwareVersion, vec![]))?;
    let response = link
        .transmit(probe.as_bytes())
        .await
        .map_err(Error::from)?;
    if !response.is_success() {
        return Err(Error::Transport(format!(
            "controller probe rejected with status {} on {}",
            response.status,
            link.reader_name()
        )));
    }

    let mut reader_info = ReaderInfo::new(link.reader_name());
    if let Some(version) = parse_firmware_version(&response.data) {
        debug!(reader = link.reader_name(), firmware = %version, "controller firmware");
        reader_info = reader_info.with_firmware_version(version);
    }

    info!(reader = link.reader_name(), "reader prepared");
    Ok(reader_info)
}

/// Parse the controller firmware response: `D5 03 <ic> <ver> <rev> <support>`.
fn parse_firmware_version(data: &[u8]) -> Option<String> {
    if data.len() >= 5 && data[..2] == FIRMWARE_RESPONSE_PREFIX {
        Some(format!("PN5{:02X} v{}.{}", data[2], data[3], data[4]))
    } else {
        None
    }
}

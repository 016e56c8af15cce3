//! Card identity capture.
//!
//! Before the emulation target can be configured, the genuine card's
//! anti-collision identity has to be read through its reader. Only the UID
//! (and, when the card supports it, the ATS historical bytes) can be
//! queried over the standard identity APDUs; ATQA and SAK are assigned the
//! configured defaults and logged as such.

use relaykit_core::{
    CardIdentity, Error, Result,
    constants::{APDU_GET_ATS, APDU_GET_UID, DEFAULT_ATQA, DEFAULT_SAK},
};
use relaykit_hardware::Transport;
use tracing::{debug, info, warn};

/// Read the identity of the card behind `card`.
///
/// The UID query must succeed; without a UID there is nothing to emulate.
/// The ATS query is best-effort: cards that do not support it simply yield
/// an identity without historical bytes, and the init-command builder
/// substitutes its fallback block later.
///
/// # Errors
///
/// Returns an error when the transport fails, when the reader rejects the
/// UID query, or when the reported UID has an impossible length.
pub async fn read_card_identity<T: Transport>(card: &mut T) -> Result<CardIdentity> {
    let uid_response = card.transmit(&APDU_GET_UID).await.map_err(Error::from)?;
    if !uid_response.is_success() {
        return Err(Error::Transport(format!(
            "UID query rejected with status {} on {}",
            uid_response.status,
            card.reader_name()
        )));
    }

    // ATQA and SAK are exchanged during anti-collision, before the reader
    // exposes the card to us; they cannot be queried over this channel.
    debug!(
        atqa = %format!("{:02X}{:02X}", DEFAULT_ATQA[0], DEFAULT_ATQA[1]),
        sak = %format!("{DEFAULT_SAK:02X}"),
        "ATQA/SAK defaulted; not reported by the reader"
    );

    let identity = CardIdentity::new(DEFAULT_ATQA, uid_response.data, DEFAULT_SAK)?;

    let identity = match card.transmit(&APDU_GET_ATS).await {
        Ok(response) if response.is_success() && !response.data.is_empty() => {
            identity.with_historical_bytes(response.data)
        }
        Ok(response) => {
            warn!(
                status = %response.status,
                "ATS query yielded nothing; continuing without historical bytes"
            );
            identity
        }
        Err(e) => {
            warn!(
                error = %e,
                "ATS query failed; continuing without historical bytes"
            );
            identity
        }
    };

    info!(identity = %identity, "card identity captured");
    Ok(identity)
}

//! Process entry for the APDU relay.
//!
//! Expects exactly two PC/SC readers: the first holds the genuine card, the
//! second acts as the emulated card facing the terminal. The relay runs
//! until Ctrl-C.
//!
//! ```sh
//! RUST_LOG=debug cargo run -p relaykit-cli --features pcsc
//! ```

use anyhow::{Context, bail};
use relaykit_engine::{RelaySession, prep_reader, read_card_identity};
use relaykit_hardware::{LedColor, PcscContext};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let ctx = PcscContext::establish().context("PC/SC service unavailable")?;
    let readers = ctx.reader_names().context("listing readers failed")?;
    if readers.len() != 2 {
        bail!(
            "exactly two readers are required (card side, then emulator side); found {}",
            readers.len()
        );
    }
    let (card_reader, emulator_reader) = (&readers[0], &readers[1]);
    info!(card = %card_reader, emulator = %emulator_reader, "using readers");

    info!("tap the genuine card on {card_reader}");
    let mut card_link = ctx
        .connect_card(card_reader)
        .context("connecting to the card reader failed")?;
    prep_reader(&mut card_link, LedColor::Green)
        .await
        .context("preparing the card reader failed")?;
    let identity = read_card_identity(&mut card_link)
        .await
        .context("reading the card identity failed")?;

    let mut emulator_link = ctx
        .connect_direct(emulator_reader)
        .context("connecting to the emulator reader failed")?;
    prep_reader(&mut emulator_link, LedColor::Orange)
        .await
        .context("preparing the emulator reader failed")?;

    let mut session = RelaySession::new(emulator_link, card_link);
    session
        .initialize(&identity)
        .await
        .context("initializing the emulation target failed")?;

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown requested");
            signal_cancel.cancel();
        }
    });

    info!("relaying; present the emulator reader to the terminal (Ctrl-C to stop)");
    let result = session.run(cancel).await;
    let stats = session.stats();
    session.shutdown().await;
    info!(?stats, "session finished");

    result.context("relay session failed")?;
    Ok(())
}

//! Relay session: target initialization and the forwarding loop.
//!
//! A [`RelaySession`] owns the two reader links for its whole lifetime: the
//! emulator side (the controller impersonating the card) and the card side
//! (the genuine card). After [`initialize`](RelaySession::initialize)
//! configures the emulation target, [`run`](RelaySession::run) ping-pongs
//! between them:
//!
//! ```text
//! terminal ──> emulator ──poll──> relay ──APDU──> card
//! terminal <── emulator <──push── relay <──resp── card
//! ```
//!
//! # Failure policy
//!
//! Card-side failures never end the session: the terminal receives a
//! synthetic technical-problem status word and the loop keeps going. Only
//! cancellation and a run of hard emulator-transport failures end it; an
//! empty or timed-out poll is the normal idle case, not an error.

use crate::state::{RelayState, RelayStateMachine};
use relaykit_core::{
    CardIdentity, EmulationDefaults, Error, Result, StatusWord,
    constants::{
        DEFAULT_EMULATOR_FAILURE_LIMIT, DEFAULT_POLL_BACKOFF_MS, DEFAULT_TRANSMIT_TIMEOUT_MS,
        TARGET_DATA_HEADER_LEN,
    },
};
use relaykit_hardware::{CardResponse, Transport, TransportError};
use relaykit_protocol::{
    ControllerCommand, InitTargetBuilder, Opcode, PassThroughFrame, strip_target_data_header,
};
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Tuning knobs for a relay session.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Bound on any single transport exchange.
    pub transmit_timeout: Duration,

    /// Delay between empty polls of the emulator.
    pub poll_backoff: Duration,

    /// Consecutive hard emulator failures before the session gives up.
    pub emulator_failure_limit: usize,

    /// Protocol defaults for the init-as-target command.
    pub defaults: EmulationDefaults,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            transmit_timeout: Duration::from_millis(DEFAULT_TRANSMIT_TIMEOUT_MS),
            poll_backoff: Duration::from_millis(DEFAULT_POLL_BACKOFF_MS),
            emulator_failure_limit: DEFAULT_EMULATOR_FAILURE_LIMIT,
            defaults: EmulationDefaults::default(),
        }
    }
}

/// Counters accumulated over a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayStats {
    /// Complete relay cycles (command fetched, answered, pushed back).
    pub commands_relayed: u64,

    /// Card exchanges replaced by the synthetic technical-problem status.
    pub card_failures: u64,

    /// Responses the emulator refused or that failed to send.
    pub delivery_failures: u64,

    /// Polls that returned nothing relayable.
    pub short_polls: u64,
}

/// A single relay session over two exclusively-owned reader links.
pub struct RelaySession<E, C> {
    emulator: E,
    card: C,
    config: RelayConfig,
    machine: RelayStateMachine,
    stats: RelayStats,
    initialized: bool,
}

impl<E: Transport, C: Transport> RelaySession<E, C> {
    /// Create a session with default configuration.
    pub fn new(emulator: E, card: C) -> Self {
        Self::with_config(emulator, card, RelayConfig::default())
    }

    /// Create a session with explicit configuration.
    pub fn with_config(emulator: E, card: C, config: RelayConfig) -> Self {
        Self {
            emulator,
            card,
            config,
            machine: RelayStateMachine::new(),
            stats: RelayStats::default(),
            initialized: false,
        }
    }

    /// Session counters so far.
    pub fn stats(&self) -> RelayStats {
        self.stats
    }

    /// Current loop state.
    pub fn state(&self) -> RelayState {
        self.machine.current_state()
    }

    /// Configure the emulator controller to present the captured identity.
    ///
    /// Sent once per session, before the loop starts.
    ///
    /// # Errors
    ///
    /// Any non-success status word from the controller is
    /// `Error::InitializationRejected`; the session must not proceed to
    /// relay after that.
    pub async fn initialize(&mut self, identity: &CardIdentity) -> Result<()> {
        let cmd = InitTargetBuilder::new(identity.clone())
            .with_defaults(self.config.defaults.clone())
            .build()?;
        let frame = PassThroughFrame::wrap(&cmd)?;

        debug!(command = cmd.name(), frame = %frame, "sending init-as-target");
        let response = bounded_transmit(
            &mut self.emulator,
            frame.as_bytes(),
            self.config.transmit_timeout,
        )
        .await?;

        if !response.is_success() {
            error!(status = %response.status, "target initialization rejected");
            return Err(Error::InitializationRejected {
                status: response.status,
            });
        }

        self.initialized = true;
        info!(identity = %identity, "emulation target initialized");
        Ok(())
    }

    /// Run the relay loop until cancellation or an unusable emulator link.
    ///
    /// # Errors
    ///
    /// - `Error::Config` when called before a successful
    ///   [`initialize`](Self::initialize).
    /// - `Error::EmulatorUnavailable` after too many consecutive hard
    ///   emulator-transport failures.
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<()> {
        if !self.initialized {
            return Err(Error::Config(
                "relay session not initialized; call initialize() first".into(),
            ));
        }

        info!(
            emulator = self.emulator.reader_name(),
            card = self.card.reader_name(),
            "relay loop started"
        );

        let mut consecutive_failures = 0usize;

        loop {
            if cancel.is_cancelled() {
                self.machine.transition_to(RelayState::Stopped)?;
                info!(stats = ?self.stats, "relay loop cancelled");
                return Ok(());
            }

            // POLLING: ask the emulator for pending terminal data.
            let poll = PassThroughFrame::wrap(&ControllerCommand::new(Opcode::GetData, vec![]))?;
            let pending = match bounded_transmit(
                &mut self.emulator,
                poll.as_bytes(),
                self.config.transmit_timeout,
            )
            .await
            {
                Ok(response)
                    if response.is_success() && response.data.len() >= TARGET_DATA_HEADER_LEN =>
                {
                    consecutive_failures = 0;
                    response.data
                }
                Ok(response) => {
                    // Too short to carry a command, or a controller-level
                    // complaint. Both mean nothing is pending yet.
                    consecutive_failures = 0;
                    self.stats.short_polls += 1;
                    debug!(
                        status = %response.status,
                        len = response.data.len(),
                        "nothing pending"
                    );
                    self.backoff(&cancel).await;
                    continue;
                }
                Err(e) if e.is_timeout() => {
                    self.stats.short_polls += 1;
                    debug!("poll timed out; treating as nothing pending");
                    self.backoff(&cancel).await;
                    continue;
                }
                Err(e) => {
                    consecutive_failures += 1;
                    warn!(
                        error = %e,
                        failures = consecutive_failures,
                        "emulator poll failed"
                    );
                    if consecutive_failures >= self.config.emulator_failure_limit {
                        error!(
                            failures = consecutive_failures,
                            "emulator transport unusable; ending session"
                        );
                        self.machine.transition_to(RelayState::Stopped)?;
                        return Err(Error::EmulatorUnavailable {
                            failures: consecutive_failures,
                        });
                    }
                    self.backoff(&cancel).await;
                    continue;
                }
            };

            // FORWARDING: peel the controller's own framing off the data.
            self.machine.transition_to(RelayState::Forwarding)?;
            let apdu = strip_target_data_header(&pending).to_vec();
            debug!(apdu = %hex(&apdu), "terminal command");

            // AWAITING_CARD: the genuine card answers, or we fabricate one.
            self.machine.transition_to(RelayState::AwaitingCard)?;
            let full_response =
                match bounded_transmit(&mut self.card, &apdu, self.config.transmit_timeout).await {
                    Ok(response) => {
                        debug!(
                            status = %response.status,
                            len = response.data.len(),
                            "card answered"
                        );
                        response.into_full_bytes()
                    }
                    Err(e) => {
                        self.stats.card_failures += 1;
                        warn!(error = %e, "card unreachable; substituting technical-problem status");
                        StatusWord::TECHNICAL_PROBLEM.as_bytes().to_vec()
                    }
                };

            // RESPONDING: push the response back through the emulator.
            self.machine.transition_to(RelayState::Responding)?;
            let reply = ControllerCommand::new(Opcode::SetData, full_response);
            let reply_frame = PassThroughFrame::wrap(&reply)?;
            match bounded_transmit(
                &mut self.emulator,
                reply_frame.as_bytes(),
                self.config.transmit_timeout,
            )
            .await
            {
                Ok(response) if response.is_success() => {
                    consecutive_failures = 0;
                    debug!("response delivered to terminal");
                }
                Ok(response) => {
                    // The next poll recovers naturally if the emulator is
                    // still reachable.
                    self.stats.delivery_failures += 1;
                    warn!(
                        command = reply.name(),
                        status = %response.status,
                        "emulator refused relayed response"
                    );
                }
                Err(e) => {
                    self.stats.delivery_failures += 1;
                    consecutive_failures += 1;
                    warn!(error = %e, "delivery to emulator failed");
                }
            }

            self.stats.commands_relayed += 1;
            self.machine.transition_to(RelayState::Polling)?;
        }
    }

    /// Close both reader links. The session is over afterwards.
    pub async fn shutdown(mut self) {
        if let Err(e) = self.emulator.close().await {
            warn!(reader = self.emulator.reader_name(), error = %e, "emulator close failed");
        }
        if let Err(e) = self.card.close().await {
            warn!(reader = self.card.reader_name(), error = %e, "card close failed");
        }
        info!(stats = ?self.stats, "relay session closed");
    }

    async fn backoff(&self, cancel: &CancellationToken) {
        tokio::select! {
            _ = cancel.cancelled() => {}
            _ = sleep(self.config.poll_backoff) => {}
        }
    }
}

/// Transmit with the configured time bound; expiry maps to a transport
/// timeout, which the polling path treats as "nothing pending".
async fn bounded_transmit<T: Transport>(
    link: &mut T,
    payload: &[u8],
    bound: Duration,
) -> std::result::Result<CardResponse, TransportError> {
    match timeout(bound, link.transmit(payload)).await {
        Ok(result) => result,
        Err(_) => Err(TransportError::timeout(bound.as_millis() as u64)),
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}

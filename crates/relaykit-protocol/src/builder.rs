use crate::command::{ControllerCommand, Opcode};
use relaykit_core::{
    CardIdentity, EmulationDefaults, Error, Result,
    constants::{MAX_PASS_THROUGH_PAYLOAD, UID_CASCADE_PREFIX_LEN},
};

/// Builder for the init-as-target command that configures the controller to
/// impersonate a captured card.
///
/// The command body has a fixed field order; every field is either taken
/// from the [`CardIdentity`] or from [`EmulationDefaults`]:
///
/// ```text
/// mode | ATQA | UID (cascade byte dropped) | SAK
///      | FeliCa params | NFCID2 | system code | NFCID3
///      | len(general bytes) | general bytes
///      | len(historical bytes) | historical bytes
/// ```
///
/// When the identity carries no historical bytes, the defaults' fallback
/// block is advertised instead of an empty one, so terminals that parse the
/// ATS still see a plausible card.
///
/// # Example
/// ```
/// use relaykit_core::CardIdentity;
/// use relaykit_protocol::{InitTargetBuilder, Opcode};
///
/// let identity = CardIdentity::new([0x04, 0x00], vec![0x88, 0x04, 0xE1, 0x5C], 0x20).unwrap();
/// let cmd = InitTargetBuilder::new(identity).build().unwrap();
/// assert_eq!(cmd.opcode, Opcode::InitAsTarget.bytes());
/// ```
pub struct InitTargetBuilder {
    identity: CardIdentity,
    defaults: EmulationDefaults,
}

impl InitTargetBuilder {
    /// Create a builder for the given identity with stock defaults.
    #[must_use]
    pub fn new(identity: CardIdentity) -> Self {
        InitTargetBuilder {
            identity,
            defaults: EmulationDefaults::default(),
        }
    }

    /// Replace the protocol defaults.
    #[must_use]
    pub fn with_defaults(mut self, defaults: EmulationDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Assemble the init-as-target command.
    ///
    /// # Errors
    /// Returns `Error::PayloadTooLarge` if a length-prefixed block exceeds
    /// 255 bytes, or if the finished command could not be carried by the
    /// pass-through envelope.
    pub fn build(self) -> Result<ControllerCommand> {
        let general = &self.defaults.general_bytes;
        let historical: &[u8] = if self.identity.has_historical_bytes() {
            &self.identity.historical_bytes
        } else {
            &self.defaults.fallback_historical
        };

        for block in [general.as_slice(), historical] {
            if block.len() > u8::MAX as usize {
                return Err(Error::PayloadTooLarge {
                    length: block.len(),
                    max: u8::MAX as usize,
                });
            }
        }

        // The first UID byte is a cascade-tag artifact; the terminal
        // selects against the remainder.
        let uid = &self.identity.uid[UID_CASCADE_PREFIX_LEN..];

        let mut params = Vec::with_capacity(64);
        params.push(self.defaults.mode);
        params.extend_from_slice(&self.identity.atqa);
        params.extend_from_slice(uid);
        params.push(self.identity.sak);
        params.extend_from_slice(&self.defaults.felica_params);
        params.extend_from_slice(&self.defaults.nfcid2);
        params.extend_from_slice(&self.defaults.system_code);
        params.extend_from_slice(&self.defaults.nfcid3);
        params.push(general.len() as u8);
        params.extend_from_slice(general);
        params.push(historical.len() as u8);
        params.extend_from_slice(historical);

        let cmd = ControllerCommand::new(Opcode::InitAsTarget, params);
        if cmd.wire_len() > MAX_PASS_THROUGH_PAYLOAD {
            return Err(Error::PayloadTooLarge {
                length: cmd.wire_len(),
                max: MAX_PASS_THROUGH_PAYLOAD,
            });
        }

        Ok(cmd)
    }
}

// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Security policy for vote key registration
//!
//! A [Policy] decides, for each value about to be hashed or signed, whether
//! the request proceeds silently, is shown (or warned about) before the
//! response is returned, requires an explicit user prompt, or is denied.

use strum::{Display, EnumIter, EnumString, EnumVariantNames};

use ledger_cvote_apdu::{
    destination::{AddressParams, AddressType, Destination, StakingChoice},
    path::Bip44Path,
    registration::{Format, VoteKey},
};

use super::address::{address_type, network_id};

/// Policy decision for a single registration step
#[derive(Copy, Clone, PartialEq, Debug, EnumString, Display, EnumVariantNames, EnumIter)]
pub enum PolicyOutcome {
    /// Proceed without user interaction
    AllowWithoutPrompt,
    /// Display the value before responding
    ShowBeforeResponse,
    /// Warn the user, then display the value before responding
    WarnUnusual,
    /// Require explicit user confirmation before responding
    PromptBeforeResponse,
    /// Refuse the request, aborting the registration
    Deny,
}

/// Registration security policy
pub trait Policy {
    /// Decide on a vote key or delegation key
    fn vote_key(&self, format: Format, key: &VoteKey) -> PolicyOutcome;

    /// Decide on the staking key path
    fn staking_key(&self, path: &Bip44Path) -> PolicyOutcome;

    /// Decide on the rewards destination, with the network id of the signing session
    fn payment_destination(&self, destination: &Destination, network_id: u8) -> PolicyOutcome;

    /// Decide on the nonce
    fn nonce(&self, nonce: u64) -> PolicyOutcome;

    /// Decide on the voting purpose (CIP-36 only)
    fn voting_purpose(&self, voting_purpose: u64) -> PolicyOutcome;

    /// Decide on final registration confirmation
    fn confirm(&self) -> PolicyOutcome;
}

impl<T: Policy> Policy for &T {
    fn vote_key(&self, format: Format, key: &VoteKey) -> PolicyOutcome {
        T::vote_key(self, format, key)
    }

    fn staking_key(&self, path: &Bip44Path) -> PolicyOutcome {
        T::staking_key(self, path)
    }

    fn payment_destination(&self, destination: &Destination, network_id: u8) -> PolicyOutcome {
        T::payment_destination(self, destination, network_id)
    }

    fn nonce(&self, nonce: u64) -> PolicyOutcome {
        T::nonce(self, nonce)
    }

    fn voting_purpose(&self, voting_purpose: u64) -> PolicyOutcome {
        T::voting_purpose(self, voting_purpose)
    }

    fn confirm(&self) -> PolicyOutcome {
        T::confirm(self)
    }
}

/// Byron address type (high nibble of the header byte)
const BYRON_ADDRESS_TYPE: u8 = 0b1000;

/// Default registration policy
#[derive(Copy, Clone, PartialEq, Debug, Default)]
pub struct DefaultPolicy;

impl DefaultPolicy {
    fn device_owned(&self, params: &AddressParams, network_id: u8) -> PolicyOutcome {
        use PolicyOutcome::*;

        if params.network_id != network_id {
            return Deny;
        }

        let path = &params.spending_path;
        let mut unusual = path.has_unusual_account();

        match (params.kind, &params.staking) {
            (AddressType::Reward, StakingChoice::None) => {
                if !path.is_ordinary_staking_key_path() {
                    return Deny;
                }
            }
            (AddressType::Enterprise, StakingChoice::None) => {
                if !path.is_ordinary_spending_path() {
                    return Deny;
                }
            }
            (AddressType::Base, StakingChoice::KeyHash(_)) => {
                if !path.is_ordinary_spending_path() {
                    return Deny;
                }
            }
            (AddressType::Base, StakingChoice::KeyPath(s)) => {
                if !path.is_ordinary_spending_path() || !s.is_ordinary_staking_key_path() {
                    return Deny;
                }
                unusual |= s.has_unusual_account();
            }
            _ => return Deny,
        }

        match unusual {
            true => WarnUnusual,
            false => ShowBeforeResponse,
        }
    }
}

impl Policy for DefaultPolicy {
    fn vote_key(&self, format: Format, key: &VoteKey) -> PolicyOutcome {
        use PolicyOutcome::*;

        match key {
            VoteKey::Key(_) => ShowBeforeResponse,
            VoteKey::Path(p) if !p.is_vote_key_path() => Deny,
            VoteKey::Path(p) if p.has_unusual_account() => WarnUnusual,
            // CIP-15 predates vote key derivation paths
            VoteKey::Path(_) if format == Format::Cip15 => WarnUnusual,
            VoteKey::Path(_) => ShowBeforeResponse,
        }
    }

    fn staking_key(&self, path: &Bip44Path) -> PolicyOutcome {
        use PolicyOutcome::*;

        if !path.is_ordinary_staking_key_path() {
            return Deny;
        }

        match path.has_unusual_account() {
            true => WarnUnusual,
            false => ShowBeforeResponse,
        }
    }

    fn payment_destination(&self, destination: &Destination, session_network_id: u8) -> PolicyOutcome {
        use PolicyOutcome::*;

        match destination {
            Destination::ThirdParty(a) => {
                // Validated as non-empty on decode
                let header = match a.first() {
                    Some(h) => *h,
                    None => return Deny,
                };

                match address_type(header) {
                    BYRON_ADDRESS_TYPE => Deny,
                    _ if network_id(header) != session_network_id => Deny,
                    _ => ShowBeforeResponse,
                }
            }
            Destination::DeviceOwned(p) => self.device_owned(p, session_network_id),
        }
    }

    fn nonce(&self, _nonce: u64) -> PolicyOutcome {
        PolicyOutcome::ShowBeforeResponse
    }

    fn voting_purpose(&self, _voting_purpose: u64) -> PolicyOutcome {
        PolicyOutcome::ShowBeforeResponse
    }

    fn confirm(&self) -> PolicyOutcome {
        PolicyOutcome::PromptBeforeResponse
    }
}

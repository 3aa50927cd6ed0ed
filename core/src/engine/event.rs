// Copyright (c) 2022-2023 The MobileCoin Foundation

use encdec::DecodeOwned;
use zeroize::Zeroize;

use ledger_cvote_apdu::{prelude::*, ApduError};

/// [`Engine`][super::Engine] input events, typically decoded from request [APDUs][crate::apdu]
#[derive(Clone, PartialEq, Debug)]
pub enum Event {
    None,

    /// Start a registration
    Init {
        format: Format,
        num_delegations: u32,
    },

    /// Set the vote key (no delegations)
    VoteKey(VoteKey),

    /// Add a weighted delegation
    Delegation { key: VoteKey, weight: u32 },

    /// Set the staking key path
    StakingKey(Bip44Path),

    /// Set the rewards destination
    PaymentAddress(Destination),

    /// Set the nonce
    Nonce(u64),

    /// Set the voting purpose (if included)
    VotingPurpose(Option<u64>),

    /// Confirm and sign the registration
    Confirm,
}

/// Helper for decoding APDUs to events, requiring the full payload is consumed
fn decode_event<T>(buff: &[u8]) -> Result<Event, ApduError>
where
    T: DecodeOwned<Output = T, Error = ApduError>,
    Event: From<T>,
{
    let (v, n) = T::decode_owned(buff)?;

    if n != buff.len() {
        #[cfg(feature = "log")]
        log::warn!("trailing data ({} of {} bytes consumed)", n, buff.len());

        return Err(ApduError::InvalidLength);
    }

    Ok(Event::from(v))
}

impl Event {
    /// Parse an incoming APDU to engine event
    #[cfg_attr(feature = "noinline", inline(never))]
    pub fn parse(ins: Instruction, buff: &[u8]) -> Result<Self, ApduError> {
        match ins {
            Instruction::Init => decode_event::<RegistrationInit>(buff),
            Instruction::VoteKey => decode_event::<VoteKeyReq>(buff),
            Instruction::Delegation => decode_event::<DelegationReq>(buff),
            Instruction::StakingKey => decode_event::<StakingKeyReq>(buff),
            Instruction::PaymentAddress => decode_event::<PaymentAddressReq>(buff),
            Instruction::Nonce => decode_event::<NonceReq>(buff),
            Instruction::VotingPurpose => decode_event::<VotingPurposeReq>(buff),
            Instruction::Confirm => decode_event::<ConfirmReq>(buff),
        }
    }
}

/// Registration state in which an instruction is accepted
pub fn expected_state(ins: Instruction) -> RegistrationState {
    match ins {
        Instruction::Init => RegistrationState::Init,
        Instruction::VoteKey => RegistrationState::VoteKey,
        Instruction::Delegation => RegistrationState::Delegations,
        Instruction::StakingKey => RegistrationState::StakingKey,
        Instruction::PaymentAddress => RegistrationState::PaymentAddress,
        Instruction::Nonce => RegistrationState::Nonce,
        Instruction::VotingPurpose => RegistrationState::VotingPurpose,
        Instruction::Confirm => RegistrationState::Confirm,
    }
}

impl Zeroize for Event {
    fn zeroize(&mut self) {
        match self {
            Event::VoteKey(key) => key.zeroize(),
            Event::Delegation { key, weight } => {
                key.zeroize();
                weight.zeroize();
            }
            Event::StakingKey(path) => path.zeroize(),
            Event::PaymentAddress(destination) => destination.zeroize(),
            Event::Nonce(nonce) => nonce.zeroize(),
            _ => (),
        }

        *self = Event::None;
    }
}

impl From<RegistrationInit> for Event {
    fn from(a: RegistrationInit) -> Self {
        Event::Init {
            format: a.format,
            num_delegations: a.num_delegations,
        }
    }
}

impl From<VoteKeyReq> for Event {
    fn from(a: VoteKeyReq) -> Self {
        Event::VoteKey(a.key)
    }
}

impl From<DelegationReq> for Event {
    fn from(a: DelegationReq) -> Self {
        Event::Delegation {
            key: a.key,
            weight: a.weight,
        }
    }
}

impl From<StakingKeyReq> for Event {
    fn from(a: StakingKeyReq) -> Self {
        Event::StakingKey(a.path)
    }
}

impl From<PaymentAddressReq> for Event {
    fn from(a: PaymentAddressReq) -> Self {
        Event::PaymentAddress(a.destination)
    }
}

impl From<NonceReq> for Event {
    fn from(a: NonceReq) -> Self {
        Event::Nonce(a.nonce)
    }
}

impl From<VotingPurposeReq> for Event {
    fn from(a: VotingPurposeReq) -> Self {
        Event::VotingPurpose(a.voting_purpose)
    }
}

impl From<ConfirmReq> for Event {
    fn from(_a: ConfirmReq) -> Self {
        Event::Confirm
    }
}

#[cfg(test)]
mod test {
    use encdec::Encode;
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn parse_events() {
        let tests = &[
            (Instruction::Init, &[0x02, 0x00, 0x00, 0x00, 0x03][..], Event::Init {
                format: Format::Cip36,
                num_delegations: 3,
            }),
            (
                Instruction::Nonce,
                &[0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x04, 0xd2][..],
                Event::Nonce(1234),
            ),
            (Instruction::VotingPurpose, &[0x01][..], Event::VotingPurpose(None)),
            (
                Instruction::VotingPurpose,
                &[0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x07][..],
                Event::VotingPurpose(Some(7)),
            ),
            (Instruction::Confirm, &[][..], Event::Confirm),
        ];

        for (ins, buff, evt) in tests {
            let e = Event::parse(*ins, buff).unwrap();
            assert_eq!(&e, evt);
        }
    }

    #[test]
    fn parse_encoded_requests() {
        let mut buff = [0u8; 64];

        let req = DelegationReq::new(VoteKey::Key([0xcd; 32]), 100);
        let n = req.encode(&mut buff).unwrap();

        assert_eq!(
            Event::parse(Instruction::Delegation, &buff[..n]).unwrap(),
            Event::Delegation {
                key: VoteKey::Key([0xcd; 32]),
                weight: 100
            }
        );
    }

    #[test]
    fn zeroize_events() {
        use ledger_cvote_apdu::path::{COIN_ADA, HARDENED, PURPOSE_VOTING};

        let path = Bip44Path::new(&[PURPOSE_VOTING, COIN_ADA, HARDENED, 0, 0]).unwrap();

        let events = [
            Event::VoteKey(VoteKey::Key([0xab; 32])),
            Event::Delegation {
                key: VoteKey::Path(path.clone()),
                weight: 10,
            },
            Event::StakingKey(path),
            Event::Nonce(1234),
        ];

        for mut e in events {
            e.zeroize();
            assert_eq!(e, Event::None);
        }
    }

    #[test]
    fn reject_trailing_data() {
        assert!(Event::parse(Instruction::Confirm, &[0x00]).is_err());
        assert!(Event::parse(Instruction::Nonce, &[0u8; 9]).is_err());
        assert!(Event::parse(Instruction::VotingPurpose, &[0x01, 0x00]).is_err());
    }

    #[test]
    fn reject_truncated_data() {
        assert!(Event::parse(Instruction::Nonce, &[0u8; 7]).is_err());
        assert!(Event::parse(Instruction::Init, &[0x02, 0x00]).is_err());
        assert!(Event::parse(Instruction::VotingPurpose, &[0x03]).is_err());
    }

    #[test]
    fn expected_states() {
        for s in RegistrationState::iter() {
            let n = [
                Instruction::Init,
                Instruction::VoteKey,
                Instruction::Delegation,
                Instruction::StakingKey,
                Instruction::PaymentAddress,
                Instruction::Nonce,
                Instruction::VotingPurpose,
                Instruction::Confirm,
            ]
            .iter()
            .filter(|i| expected_state(**i) == s)
            .count();

            // Every state but finished accepts exactly one instruction
            match s {
                RegistrationState::Finished => assert_eq!(n, 0),
                _ => assert_eq!(n, 1, "state {s}"),
            }
        }
    }
}

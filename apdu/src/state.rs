// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Registration state enumeration
//!

use encdec::{DecodeOwned, Encode};
use ledger_proto::ApduError;
use num_enum::TryFromPrimitive;
use strum::{Display, EnumIter, EnumString, EnumVariantNames};

/// Vote key registration state, advanced strictly in declaration order
/// (with [`RegistrationState::Delegations`] repeating once per delegation)
#[derive(
    Copy,
    Clone,
    PartialEq,
    Debug,
    EnumString,
    Display,
    EnumVariantNames,
    EnumIter,
    TryFromPrimitive,
)]
#[repr(u8)]
pub enum RegistrationState {
    Init = 0x00,
    VoteKey = 0x01,
    Delegations = 0x02,
    StakingKey = 0x03,
    PaymentAddress = 0x04,
    Nonce = 0x05,
    VotingPurpose = 0x06,
    Confirm = 0x07,
    Finished = 0x08,
}

impl Default for RegistrationState {
    fn default() -> Self {
        Self::Init
    }
}

impl Encode for RegistrationState {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, ApduError> {
        Ok(1)
    }

    fn encode(&self, buff: &mut [u8]) -> Result<usize, ApduError> {
        if buff.is_empty() {
            return Err(ApduError::InvalidLength);
        }

        buff[0] = *self as u8;
        Ok(1)
    }
}

impl DecodeOwned for RegistrationState {
    type Output = Self;

    type Error = ApduError;

    fn decode_owned(buff: &[u8]) -> Result<(Self::Output, usize), ApduError> {
        if buff.is_empty() {
            return Err(ApduError::InvalidLength);
        }

        match Self::try_from(buff[0]) {
            Ok(v) => Ok((v, 1)),
            Err(_) => Err(ApduError::InvalidEncoding),
        }
    }
}

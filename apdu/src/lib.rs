// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Protocol / APDU definitions for Cardano vote key registration
//!
//! This module provides a protocol specification and reference implementation for the
//! CIP-15 / CIP-36 vote key registration sub-protocol, executed as a strictly ordered
//! sequence of commands while the device builds the auxiliary data hash.
//!
//! Unlike most ledger applications, field encodings are big-endian to remain wire compatible
//! with existing Cardano host libraries. Each request payload must be consumed in full,
//! any trailing bytes are rejected as invalid data.
//!
//! Commands are issued in the order:
//!
//! 1. [`RegistrationInit`][registration::RegistrationInit]
//! 2. either a single [`VoteKeyReq`][registration::VoteKeyReq] or `N`
//!    [`DelegationReq`][registration::DelegationReq]s
//! 3. [`StakingKeyReq`][registration::StakingKeyReq]
//! 4. [`PaymentAddressReq`][registration::PaymentAddressReq]
//! 5. [`NonceReq`][registration::NonceReq]
//! 6. [`VotingPurposeReq`][registration::VotingPurposeReq] (required for CIP-15 too)
//! 7. [`ConfirmReq`][registration::ConfirmReq], returning a [`ConfirmResp`][registration::ConfirmResp]
//!

#![no_std]

#[cfg(test)]
extern crate std;

use num_enum::TryFromPrimitive;

pub use ledger_proto::{ApduError, ApduStatic};

/// Helper macro implementing `encdec` traits over [`ReadView`][view::ReadView] /
/// [`WriteView`][view::WriteView] codecs, for types providing `read`, `write` and `wire_len`
macro_rules! encdec_view {
    ($t:ty) => {
        impl encdec::Encode for $t {
            type Error = $crate::ApduError;

            fn encode_len(&self) -> Result<usize, Self::Error> {
                self.wire_len()
            }

            fn encode(&self, buff: &mut [u8]) -> Result<usize, Self::Error> {
                let mut w = $crate::view::WriteView::new(buff);
                self.write(&mut w)?;
                Ok(w.finish())
            }
        }

        impl encdec::DecodeOwned for $t {
            type Output = $t;
            type Error = $crate::ApduError;

            fn decode_owned(buff: &[u8]) -> Result<(Self::Output, usize), Self::Error> {
                let mut v = $crate::view::ReadView::new(buff);
                let d = <$t>::read(&mut v)?;
                Ok((d, v.consumed()))
            }
        }
    };
}

pub mod destination;
pub mod path;
pub mod prelude;
pub mod registration;
pub mod state;
pub mod view;

/// Cardano APDU Class
pub const CVOTE_APDU_CLA: u8 = 0xd7;

/// Ed25519 public key length
pub const PUBLIC_KEY_LEN: usize = 32;

/// Blake2b-256 auxiliary data hash length
pub const AUX_DATA_HASH_LEN: usize = 32;

/// Ed25519 signature length
pub const SIGNATURE_LEN: usize = 64;

/// Blake2b-224 key hash length
pub const KEY_HASH_LEN: usize = 28;

/// Maximum encoded address length
pub const MAX_ADDRESS_LEN: usize = 128;

/// Vote registration instruction codes
#[derive(Copy, Clone, Debug, PartialEq, TryFromPrimitive)]
#[repr(u8)]
pub enum Instruction {
    /// Provide a single vote key (no delegations)
    VoteKey = 0x30,

    /// Provide the staking key path
    StakingKey = 0x31,

    /// Provide the rewards payment address
    PaymentAddress = 0x32,

    /// Provide the registration nonce
    Nonce = 0x33,

    /// Confirm and sign the registration
    Confirm = 0x34,

    /// Provide the (optional) voting purpose
    VotingPurpose = 0x35,

    /// Start a registration
    Init = 0x36,

    /// Provide a single weighted delegation
    Delegation = 0x37,
}

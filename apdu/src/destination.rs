// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Payment destination descriptors
//!
//! Rewards for a registration are paid either to an opaque address supplied by
//! the host, or to an address owned by the device and derived from key paths.
//!
//! ## Encoding:
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |  KIND (0x01)  |                 ADDRESS_LEN (u32, BE)         |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |               |                                               |
//! +-+-+-+-+-+-+-+-+                                               +
//! /                    ADDRESS (ADDRESS_LEN bytes)                /
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//!
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |  KIND (0x02)  |  ADDR_TYPE    |  NETWORK_ID   |               |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+               +
//! /                 SPENDING_PATH (BIP-44 encoding)               /
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |   STAKING     |   STAKING_PATH (0x22) or KEY_HASH (0x33)      /
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! The staking choice is only present for base addresses, reward addresses
//! carry the staking key path in the spending path position.

use heapless::Vec;
use num_enum::TryFromPrimitive;
use zeroize::Zeroize;

use crate::{
    path::Bip44Path,
    view::{ReadView, WriteView},
    ApduError, KEY_HASH_LEN, MAX_ADDRESS_LEN,
};

/// Maximum Shelley network identifier
pub const MAX_NETWORK_ID: u8 = 0x0f;

/// Destination descriptor discriminant
#[derive(Copy, Clone, PartialEq, Debug, TryFromPrimitive)]
#[repr(u8)]
pub enum DestinationKind {
    ThirdParty = 0x01,
    DeviceOwned = 0x02,
}

/// Shelley address types supported for device-owned destinations
#[derive(Copy, Clone, PartialEq, Debug, TryFromPrimitive)]
#[repr(u8)]
pub enum AddressType {
    /// Payment key hash + staking key hash
    Base = 0x00,
    /// Payment key hash only
    Enterprise = 0x06,
    /// Staking key hash only
    Reward = 0x0e,
}

/// Staking part of a base address
#[derive(Clone, PartialEq, Debug, Default)]
pub enum StakingChoice {
    /// No staking part (enterprise and reward addresses)
    #[default]
    None,
    /// Staking key derived from a path
    KeyPath(Bip44Path),
    /// Staking key hash supplied by the host
    KeyHash([u8; KEY_HASH_LEN]),
}

/// Staking choice discriminant
#[derive(Copy, Clone, PartialEq, Debug, TryFromPrimitive)]
#[repr(u8)]
pub enum StakingChoiceKind {
    KeyPath = 0x22,
    KeyHash = 0x33,
}

/// Parameters for a device-owned address
#[derive(Clone, PartialEq, Debug)]
pub struct AddressParams {
    /// Address type
    pub kind: AddressType,

    /// Shelley network identifier
    pub network_id: u8,

    /// Spending key path (or staking key path for reward addresses)
    pub spending_path: Bip44Path,

    /// Staking part, base addresses only
    pub staking: StakingChoice,
}

/// Rewards payment destination
#[derive(Clone, PartialEq, Debug)]
pub enum Destination {
    /// Opaque address supplied by the host
    ThirdParty(Vec<u8, MAX_ADDRESS_LEN>),

    /// Address derived on the device
    DeviceOwned(AddressParams),
}

impl Destination {
    /// Create a third party destination from raw address bytes
    pub fn third_party(address: &[u8]) -> Result<Self, ApduError> {
        if address.is_empty() {
            return Err(ApduError::InvalidLength);
        }

        Vec::from_slice(address)
            .map(Self::ThirdParty)
            .map_err(|_| ApduError::InvalidLength)
    }

    /// Read a destination descriptor from a [ReadView]
    pub fn read(view: &mut ReadView) -> Result<Self, ApduError> {
        let kind =
            DestinationKind::try_from(view.u8()?).map_err(|_| ApduError::InvalidEncoding)?;

        match kind {
            DestinationKind::ThirdParty => {
                let n = view.u32_be()? as usize;
                if n == 0 || n > MAX_ADDRESS_LEN {
                    return Err(ApduError::InvalidLength);
                }

                Self::third_party(view.bytes(n)?)
            }
            DestinationKind::DeviceOwned => {
                let kind =
                    AddressType::try_from(view.u8()?).map_err(|_| ApduError::InvalidEncoding)?;

                let network_id = view.u8()?;
                if network_id > MAX_NETWORK_ID {
                    return Err(ApduError::InvalidEncoding);
                }

                let spending_path = Bip44Path::read(view)?;

                let staking = match kind {
                    AddressType::Base => {
                        match StakingChoiceKind::try_from(view.u8()?)
                            .map_err(|_| ApduError::InvalidEncoding)?
                        {
                            StakingChoiceKind::KeyPath => {
                                StakingChoice::KeyPath(Bip44Path::read(view)?)
                            }
                            StakingChoiceKind::KeyHash => StakingChoice::KeyHash(view.array()?),
                        }
                    }
                    _ => StakingChoice::None,
                };

                Ok(Self::DeviceOwned(AddressParams {
                    kind,
                    network_id,
                    spending_path,
                    staking,
                }))
            }
        }
    }

    /// Encoded length of the descriptor
    pub fn wire_len(&self) -> Result<usize, ApduError> {
        let n = match self {
            Self::ThirdParty(a) => 1 + 4 + a.len(),
            Self::DeviceOwned(p) => {
                let staking = match (&p.kind, &p.staking) {
                    (AddressType::Base, StakingChoice::KeyPath(s)) => 1 + s.wire_len()?,
                    (AddressType::Base, StakingChoice::KeyHash(_)) => 1 + KEY_HASH_LEN,
                    (AddressType::Base, StakingChoice::None) => {
                        return Err(ApduError::InvalidEncoding)
                    }
                    _ => 0,
                };
                3 + p.spending_path.wire_len()? + staking
            }
        };
        Ok(n)
    }

    /// Write a destination descriptor to a [WriteView]
    pub fn write(&self, view: &mut WriteView) -> Result<(), ApduError> {
        match self {
            Self::ThirdParty(a) => {
                view.u8(DestinationKind::ThirdParty as u8)?;
                view.u32_be(a.len() as u32)?;
                view.bytes(a)?;
            }
            Self::DeviceOwned(p) => {
                view.u8(DestinationKind::DeviceOwned as u8)?;
                view.u8(p.kind as u8)?;
                view.u8(p.network_id)?;
                p.spending_path.write(view)?;

                if p.kind == AddressType::Base {
                    match &p.staking {
                        StakingChoice::KeyPath(s) => {
                            view.u8(StakingChoiceKind::KeyPath as u8)?;
                            s.write(view)?;
                        }
                        StakingChoice::KeyHash(h) => {
                            view.u8(StakingChoiceKind::KeyHash as u8)?;
                            view.bytes(h)?;
                        }
                        StakingChoice::None => return Err(ApduError::InvalidEncoding),
                    }
                }
            }
        }

        Ok(())
    }
}

impl Zeroize for Destination {
    fn zeroize(&mut self) {
        match self {
            Self::ThirdParty(a) => {
                a.iter_mut().for_each(|b| *b = 0);
                a.clear();
            }
            Self::DeviceOwned(p) => {
                p.spending_path.zeroize();
                match &mut p.staking {
                    StakingChoice::KeyPath(s) => s.zeroize(),
                    StakingChoice::KeyHash(h) => h.zeroize(),
                    StakingChoice::None => (),
                }
                p.staking = StakingChoice::None;
            }
        }
    }
}

encdec_view!(Destination);

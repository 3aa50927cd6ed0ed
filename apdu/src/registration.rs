// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Vote key registration APDUs
//!
//! Each request carries a big-endian payload that must be consumed in full,
//! responses are empty acknowledgements except for [ConfirmResp].

use encdec::{DecodeOwned, Encode};
use num_enum::TryFromPrimitive;
use zeroize::Zeroize;

use crate::{
    destination::Destination,
    path::Bip44Path,
    view::{ReadView, WriteView},
    ApduError, ApduStatic, Instruction, AUX_DATA_HASH_LEN, CVOTE_APDU_CLA, PUBLIC_KEY_LEN,
    SIGNATURE_LEN,
};

/// Maximum number of delegations in a single registration
pub const MAX_DELEGATIONS: u32 = u16::MAX as u32;

/// Registration metadata format
#[derive(Copy, Clone, PartialEq, Debug, TryFromPrimitive)]
#[repr(u8)]
pub enum Format {
    /// CIP-15 (Catalyst), a single vote key and no voting purpose
    Cip15 = 0x01,
    /// CIP-36, weighted delegations and an explicit voting purpose
    Cip36 = 0x02,
}

/// Vote key descriptor discriminant
#[derive(Copy, Clone, PartialEq, Debug, TryFromPrimitive)]
#[repr(u8)]
pub enum VoteKeyKind {
    Path = 0x01,
    Key = 0x02,
}

/// Vote key, either derived on the device or supplied by the host
#[derive(Clone, PartialEq, Debug)]
pub enum VoteKey {
    /// Vote key derivation path
    Path(Bip44Path),
    /// Raw vote public key
    Key([u8; PUBLIC_KEY_LEN]),
}

impl Default for VoteKey {
    fn default() -> Self {
        Self::Key([0u8; PUBLIC_KEY_LEN])
    }
}

impl VoteKey {
    /// Read a vote key descriptor from a [ReadView]
    pub fn read(view: &mut ReadView) -> Result<Self, ApduError> {
        match VoteKeyKind::try_from(view.u8()?).map_err(|_| ApduError::InvalidEncoding)? {
            VoteKeyKind::Path => Bip44Path::read(view).map(Self::Path),
            VoteKeyKind::Key => view.array().map(Self::Key),
        }
    }

    /// Encoded length of the descriptor
    pub fn wire_len(&self) -> Result<usize, ApduError> {
        match self {
            Self::Path(p) => Ok(1 + p.wire_len()?),
            Self::Key(_) => Ok(1 + PUBLIC_KEY_LEN),
        }
    }

    /// Write a vote key descriptor to a [WriteView]
    pub fn write(&self, view: &mut WriteView) -> Result<(), ApduError> {
        match self {
            Self::Path(p) => {
                view.u8(VoteKeyKind::Path as u8)?;
                p.write(view)
            }
            Self::Key(k) => {
                view.u8(VoteKeyKind::Key as u8)?;
                view.bytes(k)
            }
        }
    }
}

impl Zeroize for VoteKey {
    fn zeroize(&mut self) {
        match self {
            Self::Path(p) => p.zeroize(),
            Self::Key(k) => k.zeroize(),
        }
        *self = Self::default();
    }
}

/// Start a vote key registration
///
/// ## Encoding:
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |    FORMAT     |             NUM_DELEGATIONS (u32, BE)         |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |               |
/// +-+-+-+-+-+-+-+-+
/// ```
#[derive(Clone, PartialEq, Debug)]
pub struct RegistrationInit {
    /// Metadata format
    pub format: Format,
    /// Number of delegations to follow, zero for a single vote key
    pub num_delegations: u32,
}

impl ApduStatic for RegistrationInit {
    const CLA: u8 = CVOTE_APDU_CLA;
    const INS: u8 = Instruction::Init as u8;
}

impl RegistrationInit {
    /// Create a new [`RegistrationInit`] request
    pub fn new(format: Format, num_delegations: u32) -> Self {
        Self {
            format,
            num_delegations,
        }
    }

    pub fn read(view: &mut ReadView) -> Result<Self, ApduError> {
        let format = Format::try_from(view.u8()?).map_err(|_| ApduError::InvalidEncoding)?;

        let num_delegations = view.u32_be()?;
        if num_delegations > MAX_DELEGATIONS {
            return Err(ApduError::InvalidEncoding);
        }

        Ok(Self {
            format,
            num_delegations,
        })
    }

    pub fn wire_len(&self) -> Result<usize, ApduError> {
        Ok(5)
    }

    pub fn write(&self, view: &mut WriteView) -> Result<(), ApduError> {
        view.u8(self.format as u8)?;
        view.u32_be(self.num_delegations)
    }
}

encdec_view!(RegistrationInit);

/// Provide a single vote key
///
/// ## Encoding:
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |     KIND      |                                               /
/// +-+-+-+-+-+-+-+-+   VOTE_KEY (32 bytes) or PATH (BIP-44)        /
/// /                                                               /
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Clone, PartialEq, Debug)]
pub struct VoteKeyReq {
    pub key: VoteKey,
}

impl ApduStatic for VoteKeyReq {
    const CLA: u8 = CVOTE_APDU_CLA;
    const INS: u8 = Instruction::VoteKey as u8;
}

impl VoteKeyReq {
    pub fn new(key: VoteKey) -> Self {
        Self { key }
    }

    pub fn read(view: &mut ReadView) -> Result<Self, ApduError> {
        VoteKey::read(view).map(Self::new)
    }

    pub fn wire_len(&self) -> Result<usize, ApduError> {
        self.key.wire_len()
    }

    pub fn write(&self, view: &mut WriteView) -> Result<(), ApduError> {
        self.key.write(view)
    }
}

encdec_view!(VoteKeyReq);

/// Provide a single weighted delegation
///
/// ## Encoding:
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |     KIND      |                                               /
/// +-+-+-+-+-+-+-+-+   VOTE_KEY (32 bytes) or PATH (BIP-44)        /
/// /                                                               /
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                       WEIGHT (u32, BE)                        |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Clone, PartialEq, Debug)]
pub struct DelegationReq {
    pub key: VoteKey,
    pub weight: u32,
}

impl ApduStatic for DelegationReq {
    const CLA: u8 = CVOTE_APDU_CLA;
    const INS: u8 = Instruction::Delegation as u8;
}

impl DelegationReq {
    pub fn new(key: VoteKey, weight: u32) -> Self {
        Self { key, weight }
    }

    pub fn read(view: &mut ReadView) -> Result<Self, ApduError> {
        let key = VoteKey::read(view)?;
        let weight = view.u32_be()?;
        Ok(Self { key, weight })
    }

    pub fn wire_len(&self) -> Result<usize, ApduError> {
        Ok(self.key.wire_len()? + 4)
    }

    pub fn write(&self, view: &mut WriteView) -> Result<(), ApduError> {
        self.key.write(view)?;
        view.u32_be(self.weight)
    }
}

encdec_view!(DelegationReq);

/// Provide the staking key path, used to sign the registration
#[derive(Clone, PartialEq, Debug)]
pub struct StakingKeyReq {
    pub path: Bip44Path,
}

impl ApduStatic for StakingKeyReq {
    const CLA: u8 = CVOTE_APDU_CLA;
    const INS: u8 = Instruction::StakingKey as u8;
}

impl StakingKeyReq {
    pub fn new(path: Bip44Path) -> Self {
        Self { path }
    }

    pub fn read(view: &mut ReadView) -> Result<Self, ApduError> {
        Bip44Path::read(view).map(Self::new)
    }

    pub fn wire_len(&self) -> Result<usize, ApduError> {
        self.path.wire_len()
    }

    pub fn write(&self, view: &mut WriteView) -> Result<(), ApduError> {
        self.path.write(view)
    }
}

encdec_view!(StakingKeyReq);

/// Provide the rewards payment destination
/// (see [`destination`][crate::destination] for encoding)
#[derive(Clone, PartialEq, Debug)]
pub struct PaymentAddressReq {
    pub destination: Destination,
}

impl ApduStatic for PaymentAddressReq {
    const CLA: u8 = CVOTE_APDU_CLA;
    const INS: u8 = Instruction::PaymentAddress as u8;
}

impl PaymentAddressReq {
    pub fn new(destination: Destination) -> Self {
        Self { destination }
    }

    pub fn read(view: &mut ReadView) -> Result<Self, ApduError> {
        Destination::read(view).map(Self::new)
    }

    pub fn wire_len(&self) -> Result<usize, ApduError> {
        self.destination.wire_len()
    }

    pub fn write(&self, view: &mut WriteView) -> Result<(), ApduError> {
        self.destination.write(view)
    }
}

encdec_view!(PaymentAddressReq);

/// Provide the registration nonce (u64, BE)
#[derive(Clone, PartialEq, Debug)]
pub struct NonceReq {
    pub nonce: u64,
}

impl ApduStatic for NonceReq {
    const CLA: u8 = CVOTE_APDU_CLA;
    const INS: u8 = Instruction::Nonce as u8;
}

impl NonceReq {
    pub fn new(nonce: u64) -> Self {
        Self { nonce }
    }

    pub fn read(view: &mut ReadView) -> Result<Self, ApduError> {
        view.u64_be().map(Self::new)
    }

    pub fn wire_len(&self) -> Result<usize, ApduError> {
        Ok(8)
    }

    pub fn write(&self, view: &mut WriteView) -> Result<(), ApduError> {
        view.u64_be(self.nonce)
    }
}

encdec_view!(NonceReq);

/// Voting purpose inclusion flag
#[derive(Copy, Clone, PartialEq, Debug, TryFromPrimitive)]
#[repr(u8)]
pub enum Included {
    No = 0x01,
    Yes = 0x02,
}

/// Provide the voting purpose
///
/// ## Encoding:
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |   INCLUDED    |         VOTING_PURPOSE (u64, BE, optional)    /
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// /                                               |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Clone, PartialEq, Debug)]
pub struct VotingPurposeReq {
    /// Voting purpose, `None` to use the default
    pub voting_purpose: Option<u64>,
}

impl ApduStatic for VotingPurposeReq {
    const CLA: u8 = CVOTE_APDU_CLA;
    const INS: u8 = Instruction::VotingPurpose as u8;
}

impl VotingPurposeReq {
    pub fn new(voting_purpose: Option<u64>) -> Self {
        Self { voting_purpose }
    }

    pub fn read(view: &mut ReadView) -> Result<Self, ApduError> {
        let voting_purpose =
            match Included::try_from(view.u8()?).map_err(|_| ApduError::InvalidEncoding)? {
                Included::No => None,
                Included::Yes => Some(view.u64_be()?),
            };

        Ok(Self { voting_purpose })
    }

    pub fn wire_len(&self) -> Result<usize, ApduError> {
        match self.voting_purpose {
            Some(_) => Ok(9),
            None => Ok(1),
        }
    }

    pub fn write(&self, view: &mut WriteView) -> Result<(), ApduError> {
        match self.voting_purpose {
            Some(v) => {
                view.u8(Included::Yes as u8)?;
                view.u64_be(v)
            }
            None => view.u8(Included::No as u8),
        }
    }
}

encdec_view!(VotingPurposeReq);

/// Confirm and sign the registration, no payload
#[derive(Clone, PartialEq, Debug, Default)]
pub struct ConfirmReq;

impl ApduStatic for ConfirmReq {
    const CLA: u8 = CVOTE_APDU_CLA;
    const INS: u8 = Instruction::Confirm as u8;
}

impl Encode for ConfirmReq {
    type Error = ApduError;

    fn encode_len(&self) -> Result<usize, ApduError> {
        Ok(0)
    }

    fn encode(&self, _buff: &mut [u8]) -> Result<usize, ApduError> {
        Ok(0)
    }
}

impl DecodeOwned for ConfirmReq {
    type Output = Self;

    type Error = ApduError;

    fn decode_owned(_buff: &[u8]) -> Result<(Self::Output, usize), ApduError> {
        Ok((Self, 0))
    }
}

/// Registration confirmation response, returned once the user has approved
/// the registration
///
/// ## Encoding:
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// /                 AUX_DATA_HASH (32-byte Blake2b-256)           /
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// /                 SIGNATURE (64-byte Ed25519)                   /
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Clone, PartialEq, Debug)]
pub struct ConfirmResp {
    /// Auxiliary data hash, committed to by the transaction body
    pub aux_data_hash: [u8; AUX_DATA_HASH_LEN],
    /// Registration signature by the staking key
    pub signature: [u8; SIGNATURE_LEN],
}

impl ConfirmResp {
    pub fn new(aux_data_hash: [u8; AUX_DATA_HASH_LEN], signature: [u8; SIGNATURE_LEN]) -> Self {
        Self {
            aux_data_hash,
            signature,
        }
    }

    pub fn read(view: &mut ReadView) -> Result<Self, ApduError> {
        let aux_data_hash = view.array()?;
        let signature = view.array()?;
        Ok(Self {
            aux_data_hash,
            signature,
        })
    }

    pub fn wire_len(&self) -> Result<usize, ApduError> {
        Ok(AUX_DATA_HASH_LEN + SIGNATURE_LEN)
    }

    pub fn write(&self, view: &mut WriteView) -> Result<(), ApduError> {
        view.bytes(&self.aux_data_hash)?;
        view.bytes(&self.signature)
    }
}

encdec_view!(ConfirmResp);

// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Streaming auxiliary data hash for vote key registrations
//!
//! Registration metadata is hashed as it arrives, writing CBOR headers
//! directly into two Blake2b-256 contexts: one over the complete
//! auxiliary data `[{61284: payload, 61285: {1: signature}}, []]` and one
//! over the signed payload `{61284: payload}`.

use blake2::{
    digest::consts::{U28, U32},
    Blake2b, Digest,
};
use ciborium_io::Write;
use ciborium_ll::{Encoder, Header};

use ledger_cvote_apdu::{
    registration::Format, AUX_DATA_HASH_LEN, KEY_HASH_LEN, PUBLIC_KEY_LEN, SIGNATURE_LEN,
};

use super::Error;

/// Blake2b-256 hash type
pub type Blake2b256 = Blake2b<U32>;

/// Blake2b-224 hash type (key hashes)
pub type Blake2b224 = Blake2b<U28>;

/// Metadata label for registration payloads
pub const METADATA_KEY_REGISTRATION: u64 = 61284;

/// Metadata label for registration signatures
pub const METADATA_KEY_SIGNATURE: u64 = 61285;

const PAYLOAD_KEY_VOTE_KEY: u64 = 1;
const PAYLOAD_KEY_STAKING_KEY: u64 = 2;
const PAYLOAD_KEY_PAYMENT_ADDRESS: u64 = 3;
const PAYLOAD_KEY_NONCE: u64 = 4;
const PAYLOAD_KEY_VOTING_PURPOSE: u64 = 5;

const SIGNATURE_KEY: u64 = 1;

/// Blake2b-224 key hash, used for address construction
pub fn key_hash(public_key: &[u8; PUBLIC_KEY_LEN]) -> [u8; KEY_HASH_LEN] {
    let mut h = [0u8; KEY_HASH_LEN];
    h.copy_from_slice(&Blake2b224::new().chain_update(public_key).finalize());
    h
}

/// Adaptor allowing CBOR headers to be written into a digest
struct Sink<'a, D: Digest>(&'a mut D);

impl<'a, D: Digest> Write for Sink<'a, D> {
    type Error = core::convert::Infallible;

    fn write_all(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        self.0.update(data);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Write a CBOR header to the provided digest
fn cbor<D: Digest>(d: &mut D, h: Header) {
    match Encoder::from(Sink(d)).push(h) {
        Ok(()) => (),
        Err(e) => match e {},
    }
}

/// Hash builder stage, used to enforce call ordering
#[derive(Copy, Clone, PartialEq, Debug)]
enum Stage {
    Init,
    Registration,
    Payload,
    Delegations { remaining: u16 },
    VoteKey,
    StakingKey,
    PaymentAddress,
    Nonce,
    VotingPurpose,
    PayloadFinalized,
    Signature,
    AuxiliaryScripts,
    Finished,
}

/// Auxiliary data hash accumulator
#[derive(Clone)]
pub struct AuxDataHasher {
    stage: Stage,
    format: Format,
    aux: Blake2b256,
    payload: Blake2b256,
}

impl Default for AuxDataHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl AuxDataHasher {
    /// Create a new hash accumulator
    pub fn new() -> Self {
        Self {
            stage: Stage::Init,
            format: Format::Cip36,
            aux: Blake2b256::new(),
            payload: Blake2b256::new(),
        }
    }

    fn check_stage(&self, stage: Stage) -> Result<(), Error> {
        if self.stage != stage {
            #[cfg(feature = "log")]
            log::error!("aux data hash out of order, stage: {:?}", self.stage);

            return Err(Error::Internal);
        }
        Ok(())
    }

    /// Append a header to both the aux data and payload contexts
    fn both(&mut self, h: Header) {
        cbor(&mut self.aux, h);
        cbor(&mut self.payload, h);
    }

    fn both_bytes(&mut self, d: &[u8]) {
        self.both(Header::Bytes(Some(d.len())));
        self.aux.update(d);
        self.payload.update(d);
    }

    /// Open the registration section of the auxiliary data
    pub fn enter_registration(&mut self, format: Format) -> Result<(), Error> {
        self.check_stage(Stage::Init)?;

        // [ metadata, auxiliary_scripts ]
        cbor(&mut self.aux, Header::Array(Some(2)));
        // { 61284: payload, 61285: signature }
        cbor(&mut self.aux, Header::Map(Some(2)));
        cbor(&mut self.aux, Header::Positive(METADATA_KEY_REGISTRATION));

        self.format = format;
        self.stage = Stage::Registration;

        Ok(())
    }

    /// Open the registration payload
    pub fn enter_payload(&mut self) -> Result<(), Error> {
        self.check_stage(Stage::Registration)?;

        // Signed payload is wrapped as { 61284: payload }
        cbor(&mut self.payload, Header::Map(Some(1)));
        cbor(&mut self.payload, Header::Positive(METADATA_KEY_REGISTRATION));

        let n = match self.format {
            Format::Cip15 => 4,
            Format::Cip36 => 5,
        };
        self.both(Header::Map(Some(n)));

        self.stage = Stage::Payload;

        Ok(())
    }

    /// Add a single vote key
    pub fn add_vote_key(&mut self, key: &[u8; PUBLIC_KEY_LEN]) -> Result<(), Error> {
        self.check_stage(Stage::Payload)?;

        self.both(Header::Positive(PAYLOAD_KEY_VOTE_KEY));
        self.both_bytes(key);

        self.stage = Stage::VoteKey;

        Ok(())
    }

    /// Open the delegation list, expecting `count` delegations to follow
    pub fn enter_delegations(&mut self, count: u16) -> Result<(), Error> {
        self.check_stage(Stage::Payload)?;

        if self.format != Format::Cip36 || count == 0 {
            return Err(Error::Internal);
        }

        self.both(Header::Positive(PAYLOAD_KEY_VOTE_KEY));
        self.both(Header::Array(Some(count as usize)));

        self.stage = Stage::Delegations { remaining: count };

        Ok(())
    }

    /// Add a weighted delegation
    pub fn add_delegation(&mut self, key: &[u8; PUBLIC_KEY_LEN], weight: u32) -> Result<(), Error> {
        let remaining = match self.stage {
            Stage::Delegations { remaining } if remaining > 0 => remaining,
            _ => return Err(Error::Internal),
        };

        self.both(Header::Array(Some(2)));
        self.both_bytes(key);
        self.both(Header::Positive(weight as u64));

        self.stage = Stage::Delegations {
            remaining: remaining - 1,
        };

        Ok(())
    }

    /// Add the staking public key
    pub fn add_staking_key(&mut self, key: &[u8; PUBLIC_KEY_LEN]) -> Result<(), Error> {
        match self.stage {
            Stage::VoteKey | Stage::Delegations { remaining: 0 } => (),
            _ => return Err(Error::Internal),
        }

        self.both(Header::Positive(PAYLOAD_KEY_STAKING_KEY));
        self.both_bytes(key);

        self.stage = Stage::StakingKey;

        Ok(())
    }

    /// Add the rewards payment address
    pub fn add_payment_address(&mut self, address: &[u8]) -> Result<(), Error> {
        self.check_stage(Stage::StakingKey)?;

        self.both(Header::Positive(PAYLOAD_KEY_PAYMENT_ADDRESS));
        self.both_bytes(address);

        self.stage = Stage::PaymentAddress;

        Ok(())
    }

    /// Add the registration nonce
    pub fn add_nonce(&mut self, nonce: u64) -> Result<(), Error> {
        self.check_stage(Stage::PaymentAddress)?;

        self.both(Header::Positive(PAYLOAD_KEY_NONCE));
        self.both(Header::Positive(nonce));

        self.stage = Stage::Nonce;

        Ok(())
    }

    /// Add the voting purpose (CIP-36 only)
    pub fn add_voting_purpose(&mut self, voting_purpose: u64) -> Result<(), Error> {
        self.check_stage(Stage::Nonce)?;

        if self.format != Format::Cip36 {
            return Err(Error::Internal);
        }

        self.both(Header::Positive(PAYLOAD_KEY_VOTING_PURPOSE));
        self.both(Header::Positive(voting_purpose));

        self.stage = Stage::VotingPurpose;

        Ok(())
    }

    /// Finalise the payload hash, returning the digest to be signed
    pub fn finalize_payload(&mut self) -> Result<[u8; AUX_DATA_HASH_LEN], Error> {
        match (self.format, self.stage) {
            (Format::Cip15, Stage::Nonce) | (Format::Cip36, Stage::VotingPurpose) => (),
            _ => return Err(Error::Internal),
        }

        let mut h = [0u8; AUX_DATA_HASH_LEN];
        h.copy_from_slice(&core::mem::take(&mut self.payload).finalize());

        self.stage = Stage::PayloadFinalized;

        Ok(h)
    }

    /// Add the registration signature
    pub fn add_signature(&mut self, signature: &[u8; SIGNATURE_LEN]) -> Result<(), Error> {
        self.check_stage(Stage::PayloadFinalized)?;

        cbor(&mut self.aux, Header::Positive(METADATA_KEY_SIGNATURE));
        cbor(&mut self.aux, Header::Map(Some(1)));
        cbor(&mut self.aux, Header::Positive(SIGNATURE_KEY));
        cbor(&mut self.aux, Header::Bytes(Some(signature.len())));
        self.aux.update(signature);

        self.stage = Stage::Signature;

        Ok(())
    }

    /// Add the (empty) auxiliary scripts list
    pub fn add_auxiliary_scripts(&mut self) -> Result<(), Error> {
        self.check_stage(Stage::Signature)?;

        cbor(&mut self.aux, Header::Array(Some(0)));

        self.stage = Stage::AuxiliaryScripts;

        Ok(())
    }

    /// Finalise the auxiliary data hash
    pub fn finalize(&mut self) -> Result<[u8; AUX_DATA_HASH_LEN], Error> {
        self.check_stage(Stage::AuxiliaryScripts)?;

        let mut h = [0u8; AUX_DATA_HASH_LEN];
        h.copy_from_slice(&core::mem::take(&mut self.aux).finalize());

        self.stage = Stage::Finished;

        Ok(h)
    }

    /// Reset the accumulator
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

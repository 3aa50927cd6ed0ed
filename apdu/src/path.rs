// Copyright (c) 2022-2023 The MobileCoin Foundation

//! BIP-44 derivation paths
//!
//! ## Encoding:
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |      LEN      |             INDEX[0] (u32, BE) ...            |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! /                  INDEX[1..LEN] (u32, BE)                      /
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```

use heapless::Vec;
use zeroize::Zeroize;

use crate::{
    view::{ReadView, WriteView},
    ApduError,
};

/// Hardened derivation flag
pub const HARDENED: u32 = 0x8000_0000;

/// Maximum number of path elements
pub const MAX_PATH_LEN: usize = 10;

/// CIP-1852 purpose for payment and staking keys
pub const PURPOSE_SHELLEY: u32 = HARDENED | 1852;

/// CIP-36 purpose for vote keys
pub const PURPOSE_VOTING: u32 = HARDENED | 1694;

/// Cardano coin type
pub const COIN_ADA: u32 = HARDENED | 1815;

/// External chain role
pub const ROLE_EXTERNAL: u32 = 0;

/// Internal (change) chain role
pub const ROLE_INTERNAL: u32 = 1;

/// Staking key role
pub const ROLE_STAKING: u32 = 2;

/// Accounts above this index are considered unusual
pub const MAX_REASONABLE_ACCOUNT: u32 = 100;

/// BIP-44 derivation path
#[derive(Clone, PartialEq, Default)]
pub struct Bip44Path(Vec<u32, MAX_PATH_LEN>);

impl Bip44Path {
    /// Create a new path from the provided indices
    pub fn new(indices: &[u32]) -> Result<Self, ApduError> {
        Vec::from_slice(indices)
            .map(Self)
            .map_err(|_| ApduError::InvalidLength)
    }

    /// Path indices
    pub fn indices(&self) -> &[u32] {
        &self.0
    }

    /// Number of path elements
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check whether the path is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn get(&self, n: usize) -> Option<u32> {
        self.0.get(n).copied()
    }

    /// Purpose element (`m/PURPOSE'`)
    pub fn purpose(&self) -> Option<u32> {
        self.get(0)
    }

    /// Coin type element
    pub fn coin(&self) -> Option<u32> {
        self.get(1)
    }

    /// Raw account element, including the hardened flag
    pub fn account(&self) -> Option<u32> {
        self.get(2)
    }

    /// Chain role element
    pub fn role(&self) -> Option<u32> {
        self.get(3)
    }

    /// Address index element
    pub fn index(&self) -> Option<u32> {
        self.get(4)
    }

    /// Account number with the hardened flag removed
    pub fn account_index(&self) -> Option<u32> {
        self.account().map(|a| a & !HARDENED)
    }

    /// Check the account element is hardened
    pub fn has_hardened_account(&self) -> bool {
        matches!(self.account(), Some(a) if a & HARDENED != 0)
    }

    /// Check the account number exceeds [MAX_REASONABLE_ACCOUNT]
    pub fn has_unusual_account(&self) -> bool {
        matches!(self.account_index(), Some(a) if a > MAX_REASONABLE_ACCOUNT)
    }

    fn is_shelley_prefix(&self) -> bool {
        self.purpose() == Some(PURPOSE_SHELLEY)
            && self.coin() == Some(COIN_ADA)
            && self.has_hardened_account()
    }

    /// Vote key path, `m/1694'/1815'/account'/0/index` with a non-hardened index
    pub fn is_vote_key_path(&self) -> bool {
        self.len() == 5
            && self.purpose() == Some(PURPOSE_VOTING)
            && self.coin() == Some(COIN_ADA)
            && self.has_hardened_account()
            && self.role() == Some(ROLE_EXTERNAL)
            && matches!(self.index(), Some(i) if i & HARDENED == 0)
    }

    /// Ordinary staking key path, `m/1852'/1815'/account'/2/0`
    pub fn is_ordinary_staking_key_path(&self) -> bool {
        self.len() == 5
            && self.is_shelley_prefix()
            && self.role() == Some(ROLE_STAKING)
            && self.index() == Some(0)
    }

    /// Ordinary spending path, `m/1852'/1815'/account'/(0|1)/index` with a non-hardened index
    pub fn is_ordinary_spending_path(&self) -> bool {
        self.len() == 5
            && self.is_shelley_prefix()
            && matches!(self.role(), Some(ROLE_EXTERNAL) | Some(ROLE_INTERNAL))
            && matches!(self.index(), Some(i) if i & HARDENED == 0)
    }

    /// Read a path from a [ReadView]
    pub fn read(view: &mut ReadView) -> Result<Self, ApduError> {
        let n = view.u8()? as usize;
        if n > MAX_PATH_LEN {
            return Err(ApduError::InvalidLength);
        }

        let mut p = Vec::new();
        for _ in 0..n {
            // Bounded by the length check above
            let _ = p.push(view.u32_be()?);
        }

        Ok(Self(p))
    }

    /// Encoded length of the path
    pub fn wire_len(&self) -> Result<usize, ApduError> {
        Ok(1 + self.0.len() * 4)
    }

    /// Write a path to a [WriteView]
    pub fn write(&self, view: &mut WriteView) -> Result<(), ApduError> {
        view.u8(self.0.len() as u8)?;
        for i in self.0.iter() {
            view.u32_be(*i)?;
        }
        Ok(())
    }
}

impl Zeroize for Bip44Path {
    fn zeroize(&mut self) {
        for i in self.0.iter_mut() {
            i.zeroize();
        }
        self.0.clear();
    }
}

/// Display paths in `m/1852'/1815'/0'/2/0` form
impl core::fmt::Display for Bip44Path {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "m")?;
        for i in self.0.iter() {
            match i & HARDENED != 0 {
                true => write!(f, "/{}'", i & !HARDENED)?,
                false => write!(f, "/{i}")?,
            }
        }
        Ok(())
    }
}

impl core::fmt::Debug for Bip44Path {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(self, f)
    }
}

encdec_view!(Bip44Path);

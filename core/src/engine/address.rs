// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Device-owned Shelley address derivation

use heapless::Vec;

use ledger_cvote_apdu::{
    destination::{AddressParams, AddressType, StakingChoice},
    MAX_ADDRESS_LEN,
};

use super::{aux_data::key_hash, Driver, Error};

/// Shelley address buffer
pub type Address = Vec<u8, MAX_ADDRESS_LEN>;

/// Address type stored in the high nibble of the header byte
pub fn address_type(header: u8) -> u8 {
    header >> 4
}

/// Network id stored in the low nibble of the header byte
pub fn network_id(header: u8) -> u8 {
    header & 0x0f
}

/// Derive a device-owned address, writing the encoded address to `out`
#[cfg_attr(feature = "noinline", inline(never))]
pub fn derive_address<DRV: Driver>(
    drv: &DRV,
    params: &AddressParams,
    out: &mut Address,
) -> Result<(), Error> {
    out.clear();

    let header = ((params.kind as u8) << 4) | (params.network_id & 0x0f);
    push(out, &[header])?;

    let spending = key_hash(&drv.derive_public_key(params.spending_path.indices()));
    push(out, &spending)?;

    match (params.kind, &params.staking) {
        (AddressType::Base, StakingChoice::KeyPath(p)) => {
            let staking = key_hash(&drv.derive_public_key(p.indices()));
            push(out, &staking)?;
        }
        (AddressType::Base, StakingChoice::KeyHash(h)) => push(out, h)?,
        (AddressType::Enterprise | AddressType::Reward, StakingChoice::None) => (),
        _ => {
            #[cfg(feature = "log")]
            log::warn!("invalid staking choice for {:?} address", params.kind);

            return Err(Error::InvalidData);
        }
    }

    #[cfg(feature = "log")]
    log::debug!("derived address: {:02x?}", &out[..]);

    Ok(())
}

fn push(out: &mut Address, d: &[u8]) -> Result<(), Error> {
    out.extend_from_slice(d).map_err(|_| Error::Internal)
}

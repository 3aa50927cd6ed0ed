//! Prelude to simplify downstream use of APDU objects
//!

pub use crate::{
    destination::{AddressParams, AddressType, Destination, StakingChoice},
    path::Bip44Path,
    registration::{
        ConfirmReq, ConfirmResp, DelegationReq, Format, NonceReq, PaymentAddressReq,
        RegistrationInit, StakingKeyReq, VoteKey, VoteKeyReq, VotingPurposeReq,
    },
    state::RegistrationState,
    view::{ReadView, WriteView},
    Instruction,
};

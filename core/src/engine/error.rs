// Copyright (c) 2022-2023 The MobileCoin Foundation

use ledger_proto::ApduError;

/// [Engine][super::Engine] errors
#[derive(Copy, Clone, PartialEq, Debug)]
#[cfg_attr(feature = "thiserror", derive(thiserror::Error))]
#[repr(u8)]
pub enum Error {
    /// Malformed or out of range request data
    #[cfg_attr(feature = "thiserror", error("invalid data"))]
    InvalidData = 0x00,

    /// Command not valid in the current registration state
    #[cfg_attr(feature = "thiserror", error("invalid engine state"))]
    InvalidState = 0x01,

    /// Unrecognised instruction code
    #[cfg_attr(feature = "thiserror", error("unknown instruction"))]
    UnknownInstruction = 0x02,

    /// Request denied by security policy
    #[cfg_attr(feature = "thiserror", error("rejected by policy"))]
    RejectedByPolicy = 0x03,

    /// Request rejected by the user
    #[cfg_attr(feature = "thiserror", error("rejected by user"))]
    RejectedByUser = 0x04,

    /// No UI mapping for the policy outcome at this step
    #[cfg_attr(feature = "thiserror", error("not implemented"))]
    NotImplemented = 0x05,

    /// Unexpected event (eg. UI action with no screen displayed)
    #[cfg_attr(feature = "thiserror", error("unexpected event"))]
    UnexpectedEvent = 0x06,

    /// Internal consistency failure
    #[cfg_attr(feature = "thiserror", error("internal error"))]
    Internal = 0x07,
}

impl Error {
    /// Status word reported to the host for this error
    pub const fn status(&self) -> u16 {
        match self {
            Error::InvalidData => 0x6e07,
            Error::InvalidState => 0x6e06,
            Error::UnknownInstruction => 0x6e03,
            Error::RejectedByPolicy => 0x6e10,
            Error::RejectedByUser => 0x6e09,
            Error::NotImplemented => 0x6e13,
            Error::UnexpectedEvent | Error::Internal => 0x6e06,
        }
    }
}

impl From<ApduError> for Error {
    fn from(_e: ApduError) -> Self {
        Error::InvalidData
    }
}

// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Registration screens and UI step sequencing
//!
//! Each registration step runs a short sequence of [UiStep]s selected by the
//! policy outcome. Every non-terminal step yields a [Screen] for the platform
//! to render, the terminal step emits the response and advances the
//! registration state.

use strum::{Display, EnumIter, EnumString, EnumVariantNames};

use ledger_cvote_apdu::registration::VoteKey;

use super::Registration;
use crate::helpers::{fmt_hex, fmt_path, fmt_u64};

/// UI step within the current registration command
#[derive(
    Copy, Clone, PartialEq, Debug, Default, EnumString, Display, EnumVariantNames, EnumIter,
)]
pub enum UiStep {
    /// No command in progress
    #[default]
    Idle,

    VoteKeyWarning,
    VoteKeyDisplay,
    VoteKeyRespond,

    DelegationWarning,
    DelegationVoteKey,
    DelegationWeight,
    DelegationRespond,

    StakingKeyWarning,
    StakingKeyDisplay,
    StakingKeyRespond,

    PaymentAddressWarning,
    PaymentAddressDisplay,
    PaymentAddressRespond,

    NonceDisplay,
    NonceRespond,

    VotingPurposeDisplay,
    VotingPurposeRespond,

    ConfirmPrompt,
    ConfirmHash,
    ConfirmRespond,
}

/// Screens to be rendered by the platform, values are fetched from the
/// active [Registration] when drawing
#[derive(Copy, Clone, PartialEq, Debug, EnumString, Display, EnumVariantNames, EnumIter)]
pub enum Screen {
    /// Warning for unusual vote keys
    UnusualVoteKey,
    /// Vote public key (or derivation path)
    VoteKey,
    /// Delegation weight
    Weight,
    /// Warning for unusual requests
    UnusualRequest,
    /// Staking key derivation path
    StakingKey,
    /// Rewards destination address
    RewardsAddress,
    /// Registration nonce
    Nonce,
    /// Voting purpose
    VotingPurpose,
    /// Final registration prompt, may be rejected
    ConfirmRegistration,
    /// Auxiliary data hash (expert mode only)
    AuxDataHash,
}

impl Screen {
    /// Screen title
    pub fn title(&self) -> &'static str {
        match self {
            Screen::UnusualVoteKey => "WARNING:",
            Screen::VoteKey => "Vote public key",
            Screen::Weight => "Weight",
            Screen::UnusualRequest => "Unusual request",
            Screen::StakingKey => "Staking key",
            Screen::RewardsAddress => "Rewards go to",
            Screen::Nonce => "Nonce",
            Screen::VotingPurpose => "Voting purpose",
            Screen::ConfirmRegistration => "Confirm vote key",
            Screen::AuxDataHash => "Auxiliary data hash",
        }
    }

    /// Check whether the screen offers a reject action
    pub fn is_prompt(&self) -> bool {
        matches!(self, Screen::ConfirmRegistration)
    }

    /// Render the screen body using values from the active registration
    pub fn body<'a>(&self, r: &Registration, buff: &'a mut [u8]) -> &'a str {
        match self {
            Screen::UnusualVoteKey => "unusual vote key",
            Screen::UnusualRequest => "Proceed with care",
            Screen::ConfirmRegistration => "registration?",
            Screen::VoteKey => match r.vote_key() {
                Some(VoteKey::Path(p)) => fmt_path(p, buff),
                Some(VoteKey::Key(_)) | None => match r.vote_public_key() {
                    Some(k) => fmt_hex(k, buff),
                    None => "",
                },
            },
            Screen::Weight => match r.weight() {
                Some(w) => fmt_u64(w as u64, buff),
                None => "",
            },
            Screen::StakingKey => fmt_path(r.staking_key_path(), buff),
            Screen::RewardsAddress => match r.address() {
                Some(a) => fmt_hex(a, buff),
                None => "",
            },
            Screen::Nonce => match r.nonce() {
                Some(n) => fmt_u64(n, buff),
                None => "",
            },
            Screen::VotingPurpose => match r.voting_purpose() {
                Some(v) => fmt_u64(v, buff),
                None => "",
            },
            Screen::AuxDataHash => fmt_hex(r.aux_data_hash(), buff),
        }
    }
}

// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Cardano vote key registration hardware wallet core
//!
//! This provides a common [Engine][engine] supporting CIP-15 / CIP-36 vote key
//! registration for execution on hardware wallets.
//!
//! Interactions with the [Engine][engine] are performed via [Event][engine::Event]s and [Output][engine::Output]s,
//! see [ledger_cvote_apdu] for APDU objects and wire encodings.
//!
//! ## Operations
//!
//! A registration is started with [`Engine::begin`][engine::Engine::begin] for a given
//! network, then built from a strictly ordered sequence of commands while the
//! auxiliary data hash is accumulated on the device.
//!
//! 1. Issue [`RegistrationInit`][ledger_cvote_apdu::registration::RegistrationInit] with the
//!    registration format and number of delegations
//! 2. Issue either a single [`VoteKeyReq`][ledger_cvote_apdu::registration::VoteKeyReq] or one
//!    [`DelegationReq`][ledger_cvote_apdu::registration::DelegationReq] per delegation
//! 3. Issue [`StakingKeyReq`][ledger_cvote_apdu::registration::StakingKeyReq] with the staking
//!    key path, used to sign the registration
//! 4. Issue [`PaymentAddressReq`][ledger_cvote_apdu::registration::PaymentAddressReq] with the
//!    rewards destination
//! 5. Issue [`NonceReq`][ledger_cvote_apdu::registration::NonceReq]
//! 6. Issue [`VotingPurposeReq`][ledger_cvote_apdu::registration::VotingPurposeReq]
//!    (required for CIP-15 registrations, where it has no effect)
//! 7. Issue [`ConfirmReq`][ledger_cvote_apdu::registration::ConfirmReq] to fetch a
//!    [`ConfirmResp`][ledger_cvote_apdu::registration::ConfirmResp] containing the auxiliary
//!    data hash and the registration signature
//!
//! Commands may require user interaction prior to responding, signalled by an
//! [`Output::Screen`][engine::Output::Screen]. Any failure aborts the registration,
//! which must then be restarted from [`Engine::begin`][engine::Engine::begin].
//!

#![cfg_attr(not(feature = "std"), no_std)]

pub use ledger_cvote_apdu::{self as apdu};

pub mod engine;

pub mod helpers;

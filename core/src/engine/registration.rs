// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Vote key registration state machine
//!
//! Registration commands must arrive in the order defined by
//! [RegistrationState]. Each handler checks the current state, consults the
//! [Policy], updates the [AuxDataHasher] and selects a sequence of
//! [UiStep]s, with the response emitted (and the state advanced) once the
//! final step is reached via [Registration::run_ui].

use zeroize::Zeroize;

use ledger_cvote_apdu::{
    destination::Destination,
    path::Bip44Path,
    registration::{Format, VoteKey, MAX_DELEGATIONS},
    state::RegistrationState,
    AUX_DATA_HASH_LEN, PUBLIC_KEY_LEN, SIGNATURE_LEN,
};

use super::{
    address::{derive_address, Address},
    aux_data::AuxDataHasher,
    policy::{Policy, PolicyOutcome},
    ui::{Screen, UiStep},
    Driver, Error, Output, Settings,
};

/// Per-step transient data, replaced (and wiped) by each command
#[derive(Clone, Debug, Default)]
enum StepData {
    #[default]
    None,

    VoteKey {
        key: VoteKey,
        public_key: [u8; PUBLIC_KEY_LEN],
    },

    Delegation {
        key: VoteKey,
        public_key: [u8; PUBLIC_KEY_LEN],
        weight: u32,
    },

    PaymentAddress(Address),

    Nonce(u64),

    VotingPurpose(u64),

    Signature([u8; SIGNATURE_LEN]),
}

impl Zeroize for StepData {
    fn zeroize(&mut self) {
        match self {
            StepData::None => (),
            StepData::VoteKey { key, public_key } => {
                key.zeroize();
                public_key.zeroize();
            }
            StepData::Delegation {
                key,
                public_key,
                weight,
            } => {
                key.zeroize();
                public_key.zeroize();
                weight.zeroize();
            }
            StepData::PaymentAddress(a) => {
                a.iter_mut().for_each(|b| *b = 0);
                a.clear();
            }
            StepData::Nonce(n) | StepData::VotingPurpose(n) => n.zeroize(),
            StepData::Signature(s) => s.zeroize(),
        }

        *self = StepData::None;
    }
}

/// Vote key registration session
#[derive(Clone)]
pub struct Registration {
    state: RegistrationState,
    format: Format,
    num_delegations: u16,
    current_delegation: u16,

    staking_key_path: Bip44Path,

    data: StepData,
    ui_step: UiStep,
    screen: Option<Screen>,

    aux_data_hash: [u8; AUX_DATA_HASH_LEN],
    hasher: AuxDataHasher,
}

impl Default for Registration {
    fn default() -> Self {
        Self::new()
    }
}

impl Registration {
    /// Create a new registration session in the [RegistrationState::Init] state
    pub fn new() -> Self {
        Self {
            state: RegistrationState::Init,
            format: Format::Cip36,
            num_delegations: 0,
            current_delegation: 0,
            staking_key_path: Bip44Path::default(),
            data: StepData::None,
            ui_step: UiStep::Idle,
            screen: None,
            aux_data_hash: [0u8; AUX_DATA_HASH_LEN],
            hasher: AuxDataHasher::new(),
        }
    }

    /// Current registration state
    pub fn state(&self) -> RegistrationState {
        self.state
    }

    /// Registration format
    pub fn format(&self) -> Format {
        self.format
    }

    /// Number of delegations announced at init
    pub fn num_delegations(&self) -> u16 {
        self.num_delegations
    }

    /// Number of delegations received so far
    pub fn current_delegation(&self) -> u16 {
        self.current_delegation
    }

    /// Current UI step
    pub fn ui_step(&self) -> UiStep {
        self.ui_step
    }

    /// Screen currently displayed, if any
    pub fn screen(&self) -> Option<Screen> {
        self.screen
    }

    /// Check whether a command is awaiting user interaction
    pub fn is_busy(&self) -> bool {
        self.ui_step != UiStep::Idle
    }

    /// Vote key for the current vote key / delegation command
    pub fn vote_key(&self) -> Option<&VoteKey> {
        match &self.data {
            StepData::VoteKey { key, .. } | StepData::Delegation { key, .. } => Some(key),
            _ => None,
        }
    }

    /// Resolved vote public key for the current vote key / delegation command
    pub fn vote_public_key(&self) -> Option<&[u8; PUBLIC_KEY_LEN]> {
        match &self.data {
            StepData::VoteKey { public_key, .. } | StepData::Delegation { public_key, .. } => {
                Some(public_key)
            }
            _ => None,
        }
    }

    /// Weight for the current delegation command
    pub fn weight(&self) -> Option<u32> {
        match &self.data {
            StepData::Delegation { weight, .. } => Some(*weight),
            _ => None,
        }
    }

    /// Staking key path (empty prior to the staking key command)
    pub fn staking_key_path(&self) -> &Bip44Path {
        &self.staking_key_path
    }

    /// Resolved rewards address for the current payment address command
    pub fn address(&self) -> Option<&[u8]> {
        match &self.data {
            StepData::PaymentAddress(a) => Some(&a[..]),
            _ => None,
        }
    }

    /// Nonce for the current nonce command
    pub fn nonce(&self) -> Option<u64> {
        match &self.data {
            StepData::Nonce(n) => Some(*n),
            _ => None,
        }
    }

    /// Voting purpose for the current voting purpose command
    pub fn voting_purpose(&self) -> Option<u64> {
        match &self.data {
            StepData::VotingPurpose(v) => Some(*v),
            _ => None,
        }
    }

    /// Auxiliary data hash (zero until confirmed)
    pub fn aux_data_hash(&self) -> &[u8; AUX_DATA_HASH_LEN] {
        &self.aux_data_hash
    }

    /// Registration signature, available once confirmed
    pub fn signature(&self) -> Option<&[u8; SIGNATURE_LEN]> {
        match &self.data {
            StepData::Signature(s) => Some(s),
            _ => None,
        }
    }

    fn check_state(&self, expected: RegistrationState) -> Result<(), Error> {
        if self.state != expected {
            #[cfg(feature = "log")]
            log::error!(
                "registration state mismatch, current: {}, expected: {}",
                self.state,
                expected
            );

            return Err(Error::InvalidState);
        }

        if self.is_busy() {
            #[cfg(feature = "log")]
            log::error!("command received during ui step {}", self.ui_step);

            return Err(Error::InvalidState);
        }

        Ok(())
    }

    /// Transition to the next registration state
    #[cfg_attr(feature = "noinline", inline(never))]
    fn advance(&mut self) -> Result<(), Error> {
        use RegistrationState as S;

        #[cfg(feature = "log")]
        log::debug!("advancing registration state from: {}", self.state);

        self.state = match self.state {
            S::Init if self.num_delegations > 0 => {
                self.hasher.enter_delegations(self.num_delegations)?;
                self.current_delegation = 0;
                S::Delegations
            }
            S::Init => S::VoteKey,
            S::VoteKey | S::Delegations => S::StakingKey,
            S::StakingKey => S::PaymentAddress,
            S::PaymentAddress => S::Nonce,
            S::Nonce => S::VotingPurpose,
            S::VotingPurpose => S::Confirm,
            S::Confirm => S::Finished,
            S::Finished => return Err(Error::Internal),
        };

        #[cfg(feature = "log")]
        log::debug!("advanced registration state to: {}", self.state);

        Ok(())
    }

    /// Reject denied requests, passing through other outcomes
    fn ensure_not_denied(outcome: PolicyOutcome) -> Result<PolicyOutcome, Error> {
        #[cfg(feature = "log")]
        log::debug!("policy: {}", outcome);

        match outcome {
            PolicyOutcome::Deny => Err(Error::RejectedByPolicy),
            o => Ok(o),
        }
    }

    /// Start a registration with the provided format and delegation count
    #[cfg_attr(feature = "noinline", inline(never))]
    pub fn init(&mut self, format: Format, num_delegations: u32) -> Result<Output, Error> {
        self.check_state(RegistrationState::Init)?;
        self.data.zeroize();

        if num_delegations > MAX_DELEGATIONS {
            return Err(Error::InvalidData);
        }
        if format == Format::Cip15 && num_delegations != 0 {
            #[cfg(feature = "log")]
            log::warn!("delegations are not supported by CIP-15");

            return Err(Error::InvalidData);
        }

        #[cfg(feature = "log")]
        log::debug!("registration format: {:?}, delegations: {}", format, num_delegations);

        self.format = format;
        self.num_delegations = num_delegations as u16;

        self.hasher.enter_registration(format)?;
        self.hasher.enter_payload()?;

        self.advance()?;

        Ok(Output::Ack)
    }

    fn resolve_vote_key<DRV: Driver>(drv: &DRV, key: &VoteKey) -> [u8; PUBLIC_KEY_LEN] {
        match key {
            VoteKey::Key(k) => *k,
            VoteKey::Path(p) => drv.derive_public_key(p.indices()),
        }
    }

    /// Set the vote key (registrations without delegations)
    #[cfg_attr(feature = "noinline", inline(never))]
    pub fn vote_key_update<DRV: Driver, POL: Policy>(
        &mut self,
        drv: &DRV,
        policy: &POL,
        settings: &Settings,
        key: &VoteKey,
    ) -> Result<Output, Error> {
        self.check_state(RegistrationState::VoteKey)?;
        self.data.zeroize();

        let outcome = Self::ensure_not_denied(policy.vote_key(self.format, key))?;

        let public_key = Self::resolve_vote_key(drv, key);
        self.hasher.add_vote_key(&public_key)?;

        self.data = StepData::VoteKey {
            key: key.clone(),
            public_key,
        };

        self.ui_step = match outcome {
            PolicyOutcome::WarnUnusual => UiStep::VoteKeyWarning,
            PolicyOutcome::ShowBeforeResponse => UiStep::VoteKeyDisplay,
            PolicyOutcome::AllowWithoutPrompt => UiStep::VoteKeyRespond,
            _ => return Err(Error::NotImplemented),
        };

        self.run_ui(settings)
    }

    /// Add a weighted delegation
    #[cfg_attr(feature = "noinline", inline(never))]
    pub fn delegation_update<DRV: Driver, POL: Policy>(
        &mut self,
        drv: &DRV,
        policy: &POL,
        settings: &Settings,
        key: &VoteKey,
        weight: u32,
    ) -> Result<Output, Error> {
        self.check_state(RegistrationState::Delegations)?;
        self.data.zeroize();

        let outcome = Self::ensure_not_denied(policy.vote_key(self.format, key))?;

        let public_key = Self::resolve_vote_key(drv, key);
        self.hasher.add_delegation(&public_key, weight)?;

        #[cfg(feature = "log")]
        log::debug!(
            "delegation {}/{}, weight: {}",
            self.current_delegation + 1,
            self.num_delegations,
            weight
        );

        self.data = StepData::Delegation {
            key: key.clone(),
            public_key,
            weight,
        };

        self.ui_step = match outcome {
            PolicyOutcome::WarnUnusual => UiStep::DelegationWarning,
            PolicyOutcome::ShowBeforeResponse => UiStep::DelegationVoteKey,
            PolicyOutcome::AllowWithoutPrompt => UiStep::DelegationRespond,
            _ => return Err(Error::NotImplemented),
        };

        self.run_ui(settings)
    }

    /// Set the staking key used to sign the registration
    #[cfg_attr(feature = "noinline", inline(never))]
    pub fn staking_key_update<DRV: Driver, POL: Policy>(
        &mut self,
        drv: &DRV,
        policy: &POL,
        settings: &Settings,
        path: &Bip44Path,
    ) -> Result<Output, Error> {
        self.check_state(RegistrationState::StakingKey)?;
        self.data.zeroize();

        let outcome = Self::ensure_not_denied(policy.staking_key(path))?;

        #[cfg(feature = "log")]
        log::debug!("staking key path: {}", path);

        let public_key = drv.derive_public_key(path.indices());
        self.hasher.add_staking_key(&public_key)?;

        self.staking_key_path = path.clone();

        self.ui_step = match outcome {
            PolicyOutcome::WarnUnusual => UiStep::StakingKeyWarning,
            PolicyOutcome::ShowBeforeResponse => UiStep::StakingKeyDisplay,
            PolicyOutcome::AllowWithoutPrompt => UiStep::StakingKeyRespond,
            _ => return Err(Error::NotImplemented),
        };

        self.run_ui(settings)
    }

    /// Set the rewards payment address
    #[cfg_attr(feature = "noinline", inline(never))]
    pub fn payment_address_update<DRV: Driver, POL: Policy>(
        &mut self,
        drv: &DRV,
        policy: &POL,
        settings: &Settings,
        network_id: u8,
        destination: &Destination,
    ) -> Result<Output, Error> {
        self.check_state(RegistrationState::PaymentAddress)?;
        self.data.zeroize();

        let outcome = Self::ensure_not_denied(policy.payment_destination(destination, network_id))?;

        let mut address = Address::new();
        match destination {
            Destination::ThirdParty(a) => address
                .extend_from_slice(a)
                .map_err(|_| Error::InvalidData)?,
            Destination::DeviceOwned(p) => derive_address(drv, p, &mut address)?,
        }

        self.hasher.add_payment_address(&address)?;

        self.data = StepData::PaymentAddress(address);

        self.ui_step = match outcome {
            PolicyOutcome::WarnUnusual => UiStep::PaymentAddressWarning,
            PolicyOutcome::ShowBeforeResponse => UiStep::PaymentAddressDisplay,
            PolicyOutcome::AllowWithoutPrompt => UiStep::PaymentAddressRespond,
            _ => return Err(Error::NotImplemented),
        };

        self.run_ui(settings)
    }

    /// Set the registration nonce
    #[cfg_attr(feature = "noinline", inline(never))]
    pub fn nonce_update<POL: Policy>(
        &mut self,
        policy: &POL,
        settings: &Settings,
        nonce: u64,
    ) -> Result<Output, Error> {
        self.check_state(RegistrationState::Nonce)?;
        self.data.zeroize();

        let outcome = Self::ensure_not_denied(policy.nonce(nonce))?;

        #[cfg(feature = "log")]
        log::debug!("nonce: {}", nonce);

        self.hasher.add_nonce(nonce)?;
        self.data = StepData::Nonce(nonce);

        self.ui_step = match outcome {
            PolicyOutcome::ShowBeforeResponse => UiStep::NonceDisplay,
            PolicyOutcome::AllowWithoutPrompt => UiStep::NonceRespond,
            _ => return Err(Error::NotImplemented),
        };

        self.run_ui(settings)
    }

    /// Set the voting purpose, structural only for CIP-15 registrations
    #[cfg_attr(feature = "noinline", inline(never))]
    pub fn voting_purpose_update<POL: Policy>(
        &mut self,
        policy: &POL,
        settings: &Settings,
        voting_purpose: Option<u64>,
    ) -> Result<Output, Error> {
        self.check_state(RegistrationState::VotingPurpose)?;
        self.data.zeroize();

        if voting_purpose.is_some() && self.format != Format::Cip36 {
            #[cfg(feature = "log")]
            log::warn!("voting purpose is not supported by CIP-15");

            return Err(Error::InvalidData);
        }

        // CIP-15 payloads carry no voting purpose
        if self.format == Format::Cip15 {
            self.advance()?;
            return Ok(Output::Ack);
        }

        let voting_purpose = voting_purpose.unwrap_or(0);

        #[cfg(feature = "log")]
        log::debug!("voting purpose: {}", voting_purpose);

        let outcome = Self::ensure_not_denied(policy.voting_purpose(voting_purpose))?;

        self.hasher.add_voting_purpose(voting_purpose)?;
        self.data = StepData::VotingPurpose(voting_purpose);

        self.ui_step = match outcome {
            PolicyOutcome::ShowBeforeResponse => UiStep::VotingPurposeDisplay,
            PolicyOutcome::AllowWithoutPrompt => UiStep::VotingPurposeRespond,
            _ => return Err(Error::NotImplemented),
        };

        self.run_ui(settings)
    }

    /// Finalise the registration, signing the payload hash with the staking key
    #[cfg_attr(feature = "noinline", inline(never))]
    pub fn confirm<DRV: Driver, POL: Policy>(
        &mut self,
        drv: &DRV,
        policy: &POL,
        settings: &Settings,
    ) -> Result<Output, Error> {
        self.check_state(RegistrationState::Confirm)?;
        self.data.zeroize();

        let outcome = Self::ensure_not_denied(policy.confirm())?;

        let mut payload_hash = self.hasher.finalize_payload()?;
        let signature = drv.sign(self.staking_key_path.indices(), &payload_hash);
        payload_hash.zeroize();

        self.hasher.add_signature(&signature)?;
        self.hasher.add_auxiliary_scripts()?;
        self.aux_data_hash = self.hasher.finalize()?;

        #[cfg(feature = "log")]
        log::debug!("aux data hash: {:02x?}", self.aux_data_hash);

        self.data = StepData::Signature(signature);

        self.ui_step = match outcome {
            PolicyOutcome::PromptBeforeResponse => UiStep::ConfirmPrompt,
            PolicyOutcome::AllowWithoutPrompt => Self::confirm_hash_step(settings),
            _ => return Err(Error::NotImplemented),
        };

        self.run_ui(settings)
    }

    /// Run the next UI step, returning a [Screen] to be displayed or the
    /// response once the final step is reached
    #[cfg_attr(feature = "noinline", inline(never))]
    pub fn run_ui(&mut self, settings: &Settings) -> Result<Output, Error> {
        use UiStep::*;

        #[cfg(feature = "log")]
        log::debug!("ui step: {}", self.ui_step);

        let (screen, next) = match self.ui_step {
            Idle => return Err(Error::UnexpectedEvent),

            VoteKeyWarning => (Screen::UnusualVoteKey, VoteKeyDisplay),
            VoteKeyDisplay => (Screen::VoteKey, VoteKeyRespond),
            VoteKeyRespond => return self.respond(),

            DelegationWarning => (Screen::UnusualVoteKey, DelegationVoteKey),
            DelegationVoteKey => (Screen::VoteKey, DelegationWeight),
            DelegationWeight => (Screen::Weight, DelegationRespond),
            DelegationRespond => {
                self.current_delegation += 1;

                self.screen = None;
                self.ui_step = Idle;

                if self.current_delegation == self.num_delegations {
                    self.advance()?;
                }

                return Ok(Output::Ack);
            }

            StakingKeyWarning => (Screen::UnusualRequest, StakingKeyDisplay),
            StakingKeyDisplay => (Screen::StakingKey, StakingKeyRespond),
            StakingKeyRespond => return self.respond(),

            PaymentAddressWarning => (Screen::UnusualRequest, PaymentAddressDisplay),
            PaymentAddressDisplay => (Screen::RewardsAddress, PaymentAddressRespond),
            PaymentAddressRespond => return self.respond(),

            NonceDisplay => (Screen::Nonce, NonceRespond),
            NonceRespond => return self.respond(),

            VotingPurposeDisplay => (Screen::VotingPurpose, VotingPurposeRespond),
            VotingPurposeRespond => return self.respond(),

            ConfirmPrompt => (
                Screen::ConfirmRegistration,
                Self::confirm_hash_step(settings),
            ),
            ConfirmHash => (Screen::AuxDataHash, ConfirmRespond),
            ConfirmRespond => {
                let signature = match &self.data {
                    StepData::Signature(s) => *s,
                    _ => return Err(Error::Internal),
                };

                self.screen = None;
                self.ui_step = Idle;
                self.advance()?;

                return Ok(Output::Registration {
                    aux_data_hash: self.aux_data_hash,
                    signature,
                });
            }
        };

        self.screen = Some(screen);
        self.ui_step = next;

        Ok(Output::Screen(screen))
    }

    /// Step following the confirmation prompt, the hash is shown in expert mode only
    fn confirm_hash_step(settings: &Settings) -> UiStep {
        match settings.expert {
            true => UiStep::ConfirmHash,
            false => UiStep::ConfirmRespond,
        }
    }

    /// Complete the current command with an empty response
    fn respond(&mut self) -> Result<Output, Error> {
        self.screen = None;
        self.ui_step = UiStep::Idle;

        self.advance()?;

        Ok(Output::Ack)
    }
}

impl Zeroize for Registration {
    fn zeroize(&mut self) {
        self.data.zeroize();
        self.staking_key_path.zeroize();
        self.aux_data_hash.zeroize();
        self.hasher.reset();
        self.num_delegations = 0;
        self.current_delegation = 0;
        self.ui_step = UiStep::Idle;
        self.screen = None;
        self.state = RegistrationState::Init;
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.zeroize();
    }
}

// Copyright (c) 2022-2023 The MobileCoin Foundation

//! The [Engine] provides vote key registration for hardware wallets.
//!
//! This handles [Event] inputs and returns [Output] responses to the caller,
//! see [apdu][crate::apdu] for APDU protocol / encoding specifications.
//!
//! Commands that require user interaction return [`Output::Screen`], the
//! platform renders the screen (see [`Screen::body`]) and calls
//! [`Engine::ui_continue`] or [`Engine::ui_reject`] on user input, until a
//! response [Output] is available.

use static_assertions::const_assert;
use strum::{Display, EnumString, EnumVariantNames};
use zeroize::Zeroize;

use ledger_cvote_apdu::{
    destination::MAX_NETWORK_ID, state::RegistrationState, Instruction, AUX_DATA_HASH_LEN,
    SIGNATURE_LEN,
};

mod address;
pub use address::{derive_address, Address};

mod aux_data;
pub use aux_data::{key_hash, AuxDataHasher};

mod error;
pub use error::Error;

mod event;
pub use event::{expected_state, Event};

mod function;
pub use function::Function;

mod output;
pub use output::Output;

mod policy;
pub use policy::{DefaultPolicy, Policy, PolicyOutcome};

mod registration;
pub use registration::Registration;

mod ui;
pub use ui::{Screen, UiStep};

/// Maximum response payload size
pub const RESP_SIZE: usize = 255;

const_assert!(AUX_DATA_HASH_LEN + SIGNATURE_LEN <= RESP_SIZE);

/// Engine internal state enumeration
#[derive(Copy, Clone, PartialEq, Debug, EnumString, Display, EnumVariantNames)]
pub enum State {
    /// Idle state, no signing operation running
    Init,

    /// Vote key registration in progress
    Registration(RegistrationState),

    /// Registration rejected by the user
    Deny,

    /// Registration failed
    Error,
}

/// Runtime engine settings
#[derive(Copy, Clone, PartialEq, Debug, Default)]
pub struct Settings {
    /// Expert mode, enables display of the auxiliary data hash
    pub expert: bool,
}

/// [`Driver`] trait provides platform support for [`Engine`] instances
pub trait Driver {
    /// Derive the ed25519 public key for the provided path
    fn derive_public_key(&self, path: &[u32]) -> [u8; 32];

    /// Sign a message using the ed25519 key for the provided path
    fn sign(&self, path: &[u32], msg: &[u8]) -> [u8; 64];
}

impl<T: Driver> Driver for &mut T {
    fn derive_public_key(&self, path: &[u32]) -> [u8; 32] {
        T::derive_public_key(self, path)
    }

    fn sign(&self, path: &[u32], msg: &[u8]) -> [u8; 64] {
        T::sign(self, path, msg)
    }
}

impl<T: Driver> Driver for &T {
    fn derive_public_key(&self, path: &[u32]) -> [u8; 32] {
        T::derive_public_key(self, path)
    }

    fn sign(&self, path: &[u32], msg: &[u8]) -> [u8; 64] {
        T::sign(self, path, msg)
    }
}

/// [Engine] provides hardware-independent support for vote key registration
pub struct Engine<DRV: Driver, POL: Policy = DefaultPolicy> {
    state: State,
    network_id: u8,
    settings: Settings,

    function: Function,

    drv: DRV,
    policy: POL,
}

impl<DRV: Driver> Engine<DRV> {
    /// Create a new engine instance with the provided driver,
    /// using the [DefaultPolicy]
    pub const fn new(drv: DRV) -> Self {
        Self::new_with_policy(drv, DefaultPolicy)
    }
}

impl<DRV: Driver, POL: Policy> Engine<DRV, POL> {
    /// Create a new engine instance with the provided driver and policy
    pub const fn new_with_policy(drv: DRV, policy: POL) -> Self {
        Self {
            state: State::Init,
            network_id: 0,
            settings: Settings { expert: false },
            function: Function::new(),
            drv,
            policy,
        }
    }

    /// Start a new signing operation for the provided network,
    /// discarding any prior registration
    #[cfg_attr(feature = "noinline", inline(never))]
    pub fn begin(&mut self, network_id: u8) -> Result<(), Error> {
        self.function.clear();
        self.state = State::Init;

        if network_id > MAX_NETWORK_ID {
            return Err(Error::InvalidData);
        }

        #[cfg(feature = "log")]
        log::debug!("begin registration, network id: {}", network_id);

        self.network_id = network_id;
        self.function.registration_init();
        self.state = State::Registration(RegistrationState::Init);

        Ok(())
    }

    /// Handle an incoming APDU, checking state prior to parsing the payload
    #[cfg_attr(feature = "noinline", inline(never))]
    pub fn handle(&mut self, ins: u8, buff: &[u8]) -> Result<Output, Error> {
        let r = match self.state {
            State::Registration(_) => self.function.registration_ref(),
            _ => None,
        };
        let r = match r {
            Some(r) => r,
            None => return Err(Error::InvalidState),
        };

        let ins = match Instruction::try_from(ins) {
            Ok(v) => v,
            Err(_) => {
                #[cfg(feature = "log")]
                log::error!("unknown instruction: 0x{:02x}", ins);

                return self.abort(Error::UnknownInstruction);
            }
        };

        if r.is_busy() || r.state() != expected_state(ins) {
            #[cfg(feature = "log")]
            log::error!(
                "unexpected instruction {:?} in state {} (ui: {})",
                ins,
                r.state(),
                r.ui_step()
            );

            return self.abort(Error::InvalidState);
        }

        let mut evt = match Event::parse(ins, buff) {
            Ok(v) => v,
            Err(_e) => {
                #[cfg(feature = "log")]
                log::error!("failed to parse {:?}: {:?}", ins, _e);

                return self.abort(Error::InvalidData);
            }
        };

        let r = self.update(&evt);
        evt.zeroize();

        r
    }

    /// Handle incoming registration events
    #[cfg_attr(feature = "noinline", inline(never))]
    pub fn update(&mut self, evt: &Event) -> Result<Output, Error> {
        #[cfg(feature = "log")]
        log::debug!("event: {:02x?}", evt);

        let r = match (self.state, self.function.registration()) {
            (State::Registration(_), Some(r)) => r,
            _ => return Err(Error::InvalidState),
        };

        let (drv, policy, settings) = (&self.drv, &self.policy, &self.settings);

        let res = match evt {
            Event::None => Ok(Output::None),
            Event::Init {
                format,
                num_delegations,
            } => r.init(*format, *num_delegations),
            Event::VoteKey(key) => r.vote_key_update(drv, policy, settings, key),
            Event::Delegation { key, weight } => {
                r.delegation_update(drv, policy, settings, key, *weight)
            }
            Event::StakingKey(path) => r.staking_key_update(drv, policy, settings, path),
            Event::PaymentAddress(destination) => {
                r.payment_address_update(drv, policy, settings, self.network_id, destination)
            }
            Event::Nonce(nonce) => r.nonce_update(policy, settings, *nonce),
            Event::VotingPurpose(voting_purpose) => {
                r.voting_purpose_update(policy, settings, *voting_purpose)
            }
            Event::Confirm => r.confirm(drv, policy, settings),
        };

        self.complete(res)
    }

    /// Resume the suspended command following user acknowledgement
    /// of the displayed [Screen]
    #[cfg_attr(feature = "noinline", inline(never))]
    pub fn ui_continue(&mut self) -> Result<Output, Error> {
        let settings = self.settings;

        let res = match (self.state, self.function.registration()) {
            (State::Registration(_), Some(r)) if r.is_busy() => r.run_ui(&settings),
            _ => return Err(Error::UnexpectedEvent),
        };

        self.complete(res)
    }

    /// Reject the displayed prompt, aborting the registration
    pub fn ui_reject(&mut self) -> Result<Output, Error> {
        match self.screen() {
            Some(s) if s.is_prompt() => {
                #[cfg(feature = "log")]
                log::warn!("registration rejected by user");

                self.abort(Error::RejectedByUser)
            }
            _ => Err(Error::UnexpectedEvent),
        }
    }

    /// Screen awaiting user interaction, if any
    pub fn screen(&self) -> Option<Screen> {
        match self.state {
            State::Registration(_) => self.function.registration_ref().and_then(|r| r.screen()),
            _ => None,
        }
    }

    /// Fetch the active registration, for rendering screens
    pub fn registration(&self) -> Option<&Registration> {
        self.function.registration_ref()
    }

    /// Fetch current engine state
    pub fn state(&self) -> State {
        self.state
    }

    /// Network id for the current signing operation
    pub fn network_id(&self) -> u8 {
        self.network_id
    }

    /// Fetch engine settings
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Update engine settings
    pub fn set_settings(&mut self, settings: Settings) {
        self.settings = settings;
    }

    /// Reset engine state
    pub fn reset(&mut self) {
        self.function.clear();
        self.state = State::Init;
    }

    /// Update state following a registration command, aborting on failure
    fn complete(&mut self, res: Result<Output, Error>) -> Result<Output, Error> {
        match res {
            Ok(o) => {
                if let Some(r) = self.function.registration_ref() {
                    self.state = State::Registration(r.state());
                }
                Ok(o)
            }
            Err(e) => self.abort(e),
        }
    }

    /// Abort the current operation, wiping the session
    fn abort(&mut self, e: Error) -> Result<Output, Error> {
        #[cfg(feature = "log")]
        log::error!("registration aborted: {:?}", e);

        self.function.clear();
        self.state = match e {
            Error::RejectedByUser => State::Deny,
            _ => State::Error,
        };

        Err(e)
    }
}

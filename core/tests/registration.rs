//! End-to-end vote key registration tests

use ledger_cvote_core::{
    apdu::{
        destination::{AddressParams, AddressType, Destination, StakingChoice},
        path::{Bip44Path, COIN_ADA, HARDENED, PURPOSE_SHELLEY, PURPOSE_VOTING},
        prelude::*,
        ApduStatic,
    },
    engine::{
        DefaultPolicy, Engine, Error, Output, Policy, PolicyOutcome, Screen, Settings, State,
    },
};

mod helpers;
use helpers::*;

const NETWORK_ID: u8 = 1;

const STAKING_PATH: [u32; 5] = [PURPOSE_SHELLEY, COIN_ADA, HARDENED, 2, 0];

const VOTE_PATH: [u32; 5] = [PURPOSE_VOTING, COIN_ADA, HARDENED, 0, 0];

fn path(p: &[u32]) -> Bip44Path {
    Bip44Path::new(p).unwrap()
}

fn reward_destination() -> Destination {
    Destination::DeviceOwned(AddressParams {
        kind: AddressType::Reward,
        network_id: NETWORK_ID,
        spending_path: path(&STAKING_PATH),
        staking: StakingChoice::None,
    })
}

/// Run a CIP-36 registration with delegations to a device-owned reward address
fn run_cip36_delegations(
    e: &mut Engine<TestDriver>,
    delegations: &[([u8; 32], u32)],
    nonce: u64,
) -> Result<Vec<Exchange>, Error> {
    let mut r = vec![];

    e.begin(NETWORK_ID)?;

    r.push(exchange(
        e,
        &RegistrationInit::new(Format::Cip36, delegations.len() as u32),
    )?);
    for (k, w) in delegations {
        r.push(exchange(e, &DelegationReq::new(VoteKey::Key(*k), *w))?);
    }
    r.push(exchange(e, &StakingKeyReq::new(path(&STAKING_PATH)))?);
    r.push(exchange(e, &PaymentAddressReq::new(reward_destination()))?);
    r.push(exchange(e, &NonceReq::new(nonce))?);
    r.push(exchange(e, &VotingPurposeReq::new(None))?);
    r.push(exchange(e, &ConfirmReq)?);

    Ok(r)
}

fn split_resp(resp: &[u8]) -> ([u8; 32], [u8; 64]) {
    assert_eq!(resp.len(), 96);

    let mut h = [0u8; 32];
    let mut s = [0u8; 64];
    h.copy_from_slice(&resp[..32]);
    s.copy_from_slice(&resp[32..]);

    (h, s)
}

fn reward_address(drv: &TestDriver) -> Vec<u8> {
    let pk = drv.verifying_key(&STAKING_PATH).to_bytes();

    let mut a = vec![0xe0 | NETWORK_ID];
    a.extend_from_slice(&blake2b224(&pk));
    a
}

/// CIP-36 with two weighted delegations
#[test]
fn cip36_delegations() {
    init_logging();

    let drv = TestDriver::new();
    let delegations = [([0x11u8; 32], 1), ([0x22u8; 32], 3)];

    let mut e = Engine::new(TestDriver::new());
    let r = run_cip36_delegations(&mut e, &delegations, 1234).unwrap();

    assert_eq!(e.state(), State::Registration(RegistrationState::Finished));

    // Init returns an empty response without interaction
    assert!(r[0].screens.is_empty());
    assert!(r[0].resp.is_empty());

    // Each delegation shows the key then the weight
    for d in &r[1..3] {
        assert_eq!(&d.screens, &[Screen::VoteKey, Screen::Weight]);
    }

    assert_eq!(&r[3].screens, &[Screen::StakingKey]);
    assert_eq!(&r[4].screens, &[Screen::RewardsAddress]);
    assert_eq!(&r[5].screens, &[Screen::Nonce]);
    assert_eq!(&r[6].screens, &[Screen::VotingPurpose]);
    assert_eq!(&r[7].screens, &[Screen::ConfirmRegistration]);

    let (aux_data_hash, signature) = split_resp(&r[7].resp);

    let reference = Reference {
        format: Format::Cip36,
        vote: Reference::delegations(&delegations),
        staking_key: drv.verifying_key(&STAKING_PATH).to_bytes(),
        address: reward_address(&drv),
        nonce: 1234,
        voting_purpose: 0,
    };

    assert!(verify(
        &drv,
        &STAKING_PATH,
        &reference.payload_hash(),
        &signature
    ));
    assert_eq!(aux_data_hash, reference.aux_data_hash(&signature));
}

/// CIP-36 with a single raw vote key and the default voting purpose
#[test]
fn cip36_vote_key() -> anyhow::Result<()> {
    init_logging();

    let drv = TestDriver::new();
    let vote_key = [0x5au8; 32];

    let mut e = Engine::new(TestDriver::new());
    e.begin(NETWORK_ID)?;

    exchange(&mut e, &RegistrationInit::new(Format::Cip36, 0))?;
    assert_eq!(e.state(), State::Registration(RegistrationState::VoteKey));

    let r = exchange(&mut e, &VoteKeyReq::new(VoteKey::Key(vote_key)))?;
    assert_eq!(&r.screens, &[Screen::VoteKey]);

    exchange(&mut e, &StakingKeyReq::new(path(&STAKING_PATH)))?;
    exchange(&mut e, &PaymentAddressReq::new(reward_destination()))?;
    exchange(&mut e, &NonceReq::new(0))?;
    exchange(&mut e, &VotingPurposeReq::new(None))?;

    let r = exchange(&mut e, &ConfirmReq)?;
    let (aux_data_hash, signature) = split_resp(&r.resp);

    let reference = Reference {
        format: Format::Cip36,
        vote: Reference::vote_key(&vote_key),
        staking_key: drv.verifying_key(&STAKING_PATH).to_bytes(),
        address: reward_address(&drv),
        nonce: 0,
        voting_purpose: 0,
    };

    assert!(verify(
        &drv,
        &STAKING_PATH,
        &reference.payload_hash(),
        &signature
    ));
    assert_eq!(aux_data_hash, reference.aux_data_hash(&signature));

    // Finished sessions accept no further commands
    let r = e.handle(ConfirmReq::INS, &[]);
    assert_eq!(r, Err(Error::InvalidState));

    Ok(())
}

/// CIP-15 with a derived vote key and a third-party address
#[test]
fn cip15_vote_key() {
    init_logging();

    let drv = TestDriver::new();
    let address = hex::decode(
        "01\
        1d227aefa4b773149170885aadba30aab3127cc611ddbc4999def61c\
        1d227aefa4b773149170885aadba30aab3127cc611ddbc4999def61c",
    )
    .unwrap();

    let mut e = Engine::new(TestDriver::new());
    e.begin(NETWORK_ID).unwrap();

    exchange(&mut e, &RegistrationInit::new(Format::Cip15, 0)).unwrap();

    // Path based vote keys are unusual for CIP-15
    let r = exchange(&mut e, &VoteKeyReq::new(VoteKey::Path(path(&VOTE_PATH)))).unwrap();
    assert_eq!(&r.screens, &[Screen::UnusualVoteKey, Screen::VoteKey]);

    exchange(&mut e, &StakingKeyReq::new(path(&STAKING_PATH))).unwrap();

    let r = exchange(
        &mut e,
        &PaymentAddressReq::new(Destination::third_party(&address).unwrap()),
    )
    .unwrap();
    assert_eq!(&r.screens, &[Screen::RewardsAddress]);

    exchange(&mut e, &NonceReq::new(u64::MAX)).unwrap();

    // Voting purpose is structural only
    let r = exchange(&mut e, &VotingPurposeReq::new(None)).unwrap();
    assert!(r.screens.is_empty());

    let r = exchange(&mut e, &ConfirmReq).unwrap();
    let (aux_data_hash, signature) = split_resp(&r.resp);

    let reference = Reference {
        format: Format::Cip15,
        vote: Reference::vote_key(&drv.verifying_key(&VOTE_PATH).to_bytes()),
        staking_key: drv.verifying_key(&STAKING_PATH).to_bytes(),
        address,
        nonce: u64::MAX,
        voting_purpose: 0,
    };

    assert!(verify(
        &drv,
        &STAKING_PATH,
        &reference.payload_hash(),
        &signature
    ));
    assert_eq!(aux_data_hash, reference.aux_data_hash(&signature));
}

/// User rejects the final prompt
#[test]
fn user_reject() {
    init_logging();

    let mut e = Engine::new(TestDriver::new());
    e.begin(NETWORK_ID).unwrap();

    exchange(&mut e, &RegistrationInit::new(Format::Cip36, 0)).unwrap();
    exchange(&mut e, &VoteKeyReq::new(VoteKey::Key([0xab; 32]))).unwrap();
    exchange(&mut e, &StakingKeyReq::new(path(&STAKING_PATH))).unwrap();
    exchange(&mut e, &PaymentAddressReq::new(reward_destination())).unwrap();
    exchange(&mut e, &NonceReq::new(7)).unwrap();
    exchange(&mut e, &VotingPurposeReq::new(Some(0))).unwrap();

    let r = e.handle(ConfirmReq::INS, &[]).unwrap();
    assert_eq!(r, Output::Screen(Screen::ConfirmRegistration));

    assert_eq!(e.ui_reject(), Err(Error::RejectedByUser));
    assert_eq!(e.state(), State::Deny);
    assert!(e.registration().is_none());
    assert_eq!(Error::RejectedByUser.status(), 0x6e09);

    // Further actions fail until restarted
    assert_eq!(e.ui_reject(), Err(Error::UnexpectedEvent));
    assert_eq!(e.ui_continue(), Err(Error::UnexpectedEvent));
    assert_eq!(e.handle(ConfirmReq::INS, &[]), Err(Error::InvalidState));
}

/// Policy denies the staking key path
#[test]
fn policy_deny_staking_key() {
    init_logging();

    let mut e = Engine::new(TestDriver::new());
    e.begin(NETWORK_ID).unwrap();

    exchange(&mut e, &RegistrationInit::new(Format::Cip36, 0)).unwrap();
    exchange(&mut e, &VoteKeyReq::new(VoteKey::Key([0xab; 32]))).unwrap();

    let r = exchange(
        &mut e,
        &StakingKeyReq::new(path(&[PURPOSE_SHELLEY, COIN_ADA, HARDENED, 0, 0])),
    );
    assert_eq!(r, Err(Error::RejectedByPolicy));
    assert_eq!(Error::RejectedByPolicy.status(), 0x6e10);
    assert_eq!(e.state(), State::Error);
    assert!(e.registration().is_none());
}

#[test]
fn deterministic_output() {
    let delegations = [([0x33u8; 32], 10)];

    let mut e1 = Engine::new(TestDriver::new());
    let r1 = run_cip36_delegations(&mut e1, &delegations, 99).unwrap();

    let mut e2 = Engine::new(TestDriver::new());
    let r2 = run_cip36_delegations(&mut e2, &delegations, 99).unwrap();

    assert_eq!(r1, r2);

    // Restarting the same engine yields the same result
    let r3 = run_cip36_delegations(&mut e1, &delegations, 99).unwrap();
    assert_eq!(r1, r3);

    // While a different nonce does not
    let r4 = run_cip36_delegations(&mut e2, &delegations, 100).unwrap();
    assert_ne!(r1.last(), r4.last());
}

#[test]
fn out_of_order_commands() {
    init_logging();

    let mut e = Engine::new(TestDriver::new());
    e.begin(NETWORK_ID).unwrap();

    // Vote key prior to init
    let r = exchange(&mut e, &VoteKeyReq::new(VoteKey::Key([0xab; 32])));
    assert_eq!(r, Err(Error::InvalidState));
    assert_eq!(e.state(), State::Error);

    // Init is not accepted until the engine is restarted
    let r = exchange(&mut e, &RegistrationInit::new(Format::Cip36, 0));
    assert_eq!(r, Err(Error::InvalidState));

    // Vote key in place of delegations
    e.begin(NETWORK_ID).unwrap();
    exchange(&mut e, &RegistrationInit::new(Format::Cip36, 2)).unwrap();
    let r = exchange(&mut e, &VoteKeyReq::new(VoteKey::Key([0xab; 32])));
    assert_eq!(r, Err(Error::InvalidState));

    // Too few delegations
    e.begin(NETWORK_ID).unwrap();
    exchange(&mut e, &RegistrationInit::new(Format::Cip36, 2)).unwrap();
    exchange(&mut e, &DelegationReq::new(VoteKey::Key([0xab; 32]), 1)).unwrap();
    let r = exchange(&mut e, &StakingKeyReq::new(path(&STAKING_PATH)));
    assert_eq!(r, Err(Error::InvalidState));
}

#[test]
fn cip15_constraints() {
    init_logging();

    let mut e = Engine::new(TestDriver::new());

    // CIP-15 does not support delegations
    e.begin(NETWORK_ID).unwrap();
    let r = exchange(&mut e, &RegistrationInit::new(Format::Cip15, 1));
    assert_eq!(r, Err(Error::InvalidData));
    assert_eq!(e.state(), State::Error);

    // Nor an explicit voting purpose
    e.begin(NETWORK_ID).unwrap();
    exchange(&mut e, &RegistrationInit::new(Format::Cip15, 0)).unwrap();
    exchange(&mut e, &VoteKeyReq::new(VoteKey::Key([0xab; 32]))).unwrap();
    exchange(&mut e, &StakingKeyReq::new(path(&STAKING_PATH))).unwrap();
    exchange(&mut e, &PaymentAddressReq::new(reward_destination())).unwrap();
    exchange(&mut e, &NonceReq::new(7)).unwrap();

    let r = exchange(&mut e, &VotingPurposeReq::new(Some(0)));
    assert_eq!(r, Err(Error::InvalidData));
    assert_eq!(Error::InvalidData.status(), 0x6e07);
}

#[test]
fn malformed_payloads() {
    init_logging();

    let mut e = Engine::new(TestDriver::new());

    // Trailing bytes
    e.begin(NETWORK_ID).unwrap();
    let r = e.handle(RegistrationInit::INS, &[0x02, 0x00, 0x00, 0x00, 0x00, 0x00]);
    assert_eq!(r, Err(Error::InvalidData));

    // Delegation count exceeds limit
    e.begin(NETWORK_ID).unwrap();
    let r = e.handle(RegistrationInit::INS, &[0x02, 0x00, 0x01, 0x00, 0x00]);
    assert_eq!(r, Err(Error::InvalidData));

    // Payload on confirm
    e.begin(NETWORK_ID).unwrap();
    let r = e.handle(ConfirmReq::INS, &[0x00]);
    assert_eq!(r, Err(Error::InvalidState));
}

#[test]
fn expert_mode_shows_hash() {
    init_logging();

    let mut e = Engine::new(TestDriver::new());
    e.set_settings(Settings { expert: true });

    let r = run_cip36_delegations(&mut e, &[([0x44u8; 32], 1)], 5).unwrap();

    let confirm = r.last().unwrap();
    assert_eq!(
        &confirm.screens,
        &[Screen::ConfirmRegistration, Screen::AuxDataHash]
    );
}

#[test]
fn network_mismatch_denied() {
    init_logging();

    let mut e = Engine::new(TestDriver::new());
    e.begin(0).unwrap();

    exchange(&mut e, &RegistrationInit::new(Format::Cip36, 0)).unwrap();
    exchange(&mut e, &VoteKeyReq::new(VoteKey::Key([0xab; 32]))).unwrap();
    exchange(&mut e, &StakingKeyReq::new(path(&STAKING_PATH))).unwrap();

    // Reward address for network 1 while signing for network 0
    let r = exchange(&mut e, &PaymentAddressReq::new(reward_destination()));
    assert_eq!(r, Err(Error::RejectedByPolicy));
}

/// Policy warning on every value, with an outcome the nonce step cannot display
struct WarnPolicy;

impl Policy for WarnPolicy {
    fn vote_key(&self, _format: Format, _key: &VoteKey) -> PolicyOutcome {
        PolicyOutcome::WarnUnusual
    }

    fn staking_key(&self, _path: &Bip44Path) -> PolicyOutcome {
        PolicyOutcome::WarnUnusual
    }

    fn payment_destination(&self, _destination: &Destination, _network_id: u8) -> PolicyOutcome {
        PolicyOutcome::WarnUnusual
    }

    fn nonce(&self, _nonce: u64) -> PolicyOutcome {
        PolicyOutcome::WarnUnusual
    }

    fn voting_purpose(&self, _voting_purpose: u64) -> PolicyOutcome {
        PolicyOutcome::AllowWithoutPrompt
    }

    fn confirm(&self) -> PolicyOutcome {
        PolicyOutcome::AllowWithoutPrompt
    }
}

#[test]
fn unmapped_policy_outcome() {
    init_logging();

    let mut e = Engine::new_with_policy(TestDriver::new(), WarnPolicy);
    e.begin(NETWORK_ID).unwrap();

    exchange(&mut e, &RegistrationInit::new(Format::Cip36, 0)).unwrap();

    let r = exchange(&mut e, &VoteKeyReq::new(VoteKey::Key([0xab; 32]))).unwrap();
    assert_eq!(&r.screens, &[Screen::UnusualVoteKey, Screen::VoteKey]);

    let r = exchange(&mut e, &StakingKeyReq::new(path(&STAKING_PATH))).unwrap();
    assert_eq!(&r.screens, &[Screen::UnusualRequest, Screen::StakingKey]);

    let r = exchange(&mut e, &PaymentAddressReq::new(reward_destination())).unwrap();
    assert_eq!(&r.screens, &[Screen::UnusualRequest, Screen::RewardsAddress]);

    // Nonce warnings have no UI mapping
    let r = exchange(&mut e, &NonceReq::new(1));
    assert_eq!(r, Err(Error::NotImplemented));
    assert_eq!(e.state(), State::Error);
}

#[test]
fn silent_policy() {
    init_logging();

    struct AllowPolicy;

    impl Policy for AllowPolicy {
        fn vote_key(&self, _format: Format, _key: &VoteKey) -> PolicyOutcome {
            PolicyOutcome::AllowWithoutPrompt
        }

        fn staking_key(&self, _path: &Bip44Path) -> PolicyOutcome {
            PolicyOutcome::AllowWithoutPrompt
        }

        fn payment_destination(&self, _d: &Destination, _network_id: u8) -> PolicyOutcome {
            PolicyOutcome::AllowWithoutPrompt
        }

        fn nonce(&self, _nonce: u64) -> PolicyOutcome {
            PolicyOutcome::AllowWithoutPrompt
        }

        fn voting_purpose(&self, _voting_purpose: u64) -> PolicyOutcome {
            PolicyOutcome::AllowWithoutPrompt
        }

        fn confirm(&self) -> PolicyOutcome {
            PolicyOutcome::AllowWithoutPrompt
        }
    }

    let mut e = Engine::new_with_policy(TestDriver::new(), AllowPolicy);
    e.begin(NETWORK_ID).unwrap();

    let reqs: Vec<Exchange> = vec![
        exchange(&mut e, &RegistrationInit::new(Format::Cip36, 1)).unwrap(),
        exchange(&mut e, &DelegationReq::new(VoteKey::Key([0x55; 32]), 2)).unwrap(),
        exchange(&mut e, &StakingKeyReq::new(path(&STAKING_PATH))).unwrap(),
        exchange(&mut e, &PaymentAddressReq::new(reward_destination())).unwrap(),
        exchange(&mut e, &NonceReq::new(3)).unwrap(),
        exchange(&mut e, &VotingPurposeReq::new(Some(4))).unwrap(),
        exchange(&mut e, &ConfirmReq).unwrap(),
    ];

    assert!(reqs.iter().all(|r| r.screens.is_empty()));
    assert_eq!(reqs.last().map(|r| r.resp.len()), Some(96));

    // Matches the default policy output for the same inputs
    let mut d = Engine::new_with_policy(TestDriver::new(), DefaultPolicy);
    d.begin(NETWORK_ID).unwrap();
    exchange(&mut d, &RegistrationInit::new(Format::Cip36, 1)).unwrap();
    exchange(&mut d, &DelegationReq::new(VoteKey::Key([0x55; 32]), 2)).unwrap();
    exchange(&mut d, &StakingKeyReq::new(path(&STAKING_PATH))).unwrap();
    exchange(&mut d, &PaymentAddressReq::new(reward_destination())).unwrap();
    exchange(&mut d, &NonceReq::new(3)).unwrap();
    exchange(&mut d, &VotingPurposeReq::new(Some(4))).unwrap();
    let r = exchange(&mut d, &ConfirmReq).unwrap();

    assert_eq!(reqs.last().map(|r| &r.resp), Some(&r.resp));
}

#[test]
fn random_delegations() -> anyhow::Result<()> {
    use rand::{random, Rng};

    init_logging();

    let drv = TestDriver::new();
    let mut rng = rand::thread_rng();

    for _ in 0..4 {
        let delegations: Vec<([u8; 32], u32)> = (0..rng.gen_range(1..8))
            .map(|_| (random(), random()))
            .collect();
        let nonce = random();

        let mut e = Engine::new(TestDriver::new());
        let r = run_cip36_delegations(&mut e, &delegations, nonce)?;

        let (aux_data_hash, signature) = split_resp(&r.last().unwrap().resp);

        let reference = Reference {
            format: Format::Cip36,
            vote: Reference::delegations(&delegations),
            staking_key: drv.verifying_key(&STAKING_PATH).to_bytes(),
            address: reward_address(&drv),
            nonce,
            voting_purpose: 0,
        };

        assert!(verify(
            &drv,
            &STAKING_PATH,
            &reference.payload_hash(),
            &signature
        ));
        assert_eq!(aux_data_hash, reference.aux_data_hash(&signature));
    }

    Ok(())
}

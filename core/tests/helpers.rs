#![allow(unused)]

use ciborium::Value;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use encdec::Encode;
use log::{debug, trace};

use ledger_cvote_core::{
    apdu::{registration::Format, ApduStatic},
    engine::{Driver, Engine, Error, Output, Policy, Screen},
};

/// Fixed seed for deterministic test keys
pub const SEED: [u8; 64] = [
    0x5e, 0xb0, 0x0b, 0xbd, 0xdc, 0xf0, 0x69, 0x08, 0x48, 0x89, 0xa8, 0xab, 0x91, 0x55, 0x56, 0x81,
    0x65, 0xf5, 0xc4, 0x53, 0xcc, 0xb8, 0x5e, 0x70, 0x81, 0x1a, 0xae, 0xd6, 0xf6, 0xda, 0x5f, 0xc1,
    0x9a, 0x5a, 0xc4, 0x0b, 0x38, 0x9c, 0xd3, 0x70, 0xd0, 0x86, 0x20, 0x6d, 0xec, 0x8a, 0xa6, 0xc4,
    0x3d, 0xae, 0xa6, 0x69, 0x0f, 0x20, 0xad, 0x3d, 0x8d, 0x48, 0xb2, 0xd2, 0xce, 0x9e, 0x38, 0xe4,
];

/// Driver implementation for test use
pub struct TestDriver {
    /// BIP39 Mnemonic derived seed
    pub seed: [u8; 64],
}

impl TestDriver {
    pub fn new() -> Self {
        Self { seed: SEED }
    }

    pub fn signing_key(&self, path: &[u32]) -> SigningKey {
        let sk = slip10_ed25519::derive_ed25519_private_key(&self.seed, path);
        SigningKey::from_bytes(&sk)
    }

    pub fn verifying_key(&self, path: &[u32]) -> VerifyingKey {
        self.signing_key(path).verifying_key()
    }
}

impl Driver for TestDriver {
    fn derive_public_key(&self, path: &[u32]) -> [u8; 32] {
        self.verifying_key(path).to_bytes()
    }

    fn sign(&self, path: &[u32], msg: &[u8]) -> [u8; 64] {
        self.signing_key(path).sign(msg).to_bytes()
    }
}

/// Verify a registration signature over the payload hash
pub fn verify(drv: &TestDriver, path: &[u32], payload_hash: &[u8; 32], sig: &[u8; 64]) -> bool {
    drv.verifying_key(path)
        .verify(payload_hash, &Signature::from_bytes(sig))
        .is_ok()
}

/// Setup logging for tests
pub fn init_logging() {
    let _ = simplelog::SimpleLogger::init(log::LevelFilter::Debug, Default::default());
}

/// Result of a single exchange
#[derive(Clone, Debug, PartialEq)]
pub struct Exchange {
    /// Screens displayed prior to the response
    pub screens: Vec<Screen>,
    /// Encoded response payload
    pub resp: Vec<u8>,
}

/// Encode a request APDU and pass it to the engine, acknowledging each
/// displayed screen until a response is available
pub fn exchange<DRV: Driver, POL: Policy, REQ: Encode + ApduStatic + core::fmt::Debug>(
    e: &mut Engine<DRV, POL>,
    req: &REQ,
) -> Result<Exchange, Error> {
    let mut buff = [0u8; 256];

    debug!("cmd: {:?}", req);

    let n = match req.encode(&mut buff) {
        Ok(n) => n,
        Err(_) => panic!("failed to encode {req:?}"),
    };
    assert!(n < 250, "encoded command maximum length exceeded ({n} bytes)");

    trace!("encoded: {:02x?}", &buff[..n]);

    let mut screens = vec![];
    let mut r = e.handle(REQ::INS, &buff[..n])?;

    while let Output::Screen(s) = r {
        // Render screen to check formatting
        let mut line = [0u8; 128];
        let body = s.body(e.registration().unwrap(), &mut line);
        debug!("screen: {} / {}", s.title(), body);
        assert!(!body.starts_with("ENCODE_ERR"));

        screens.push(s);
        r = e.ui_continue()?;
    }

    let n = match r.encode(&mut buff) {
        Ok(n) => n,
        Err(_) => panic!("failed to encode {r:?}"),
    };

    Ok(Exchange {
        screens,
        resp: buff[..n].to_vec(),
    })
}

fn uint(v: u64) -> Value {
    Value::Integer(v.into())
}

/// Independent registration payload builder
pub struct Reference {
    pub format: Format,
    pub vote: Value,
    pub staking_key: [u8; 32],
    pub address: Vec<u8>,
    pub nonce: u64,
    pub voting_purpose: u64,
}

impl Reference {
    /// Vote key entry for a single key
    pub fn vote_key(key: &[u8; 32]) -> Value {
        Value::Bytes(key.to_vec())
    }

    /// Vote key entry for a list of weighted delegations
    pub fn delegations(d: &[([u8; 32], u32)]) -> Value {
        Value::Array(
            d.iter()
                .map(|(k, w)| Value::Array(vec![Value::Bytes(k.to_vec()), uint(*w as u64)]))
                .collect(),
        )
    }

    fn payload(&self) -> Value {
        let mut m = vec![
            (uint(1), self.vote.clone()),
            (uint(2), Value::Bytes(self.staking_key.to_vec())),
            (uint(3), Value::Bytes(self.address.clone())),
            (uint(4), uint(self.nonce)),
        ];
        if self.format == Format::Cip36 {
            m.push((uint(5), uint(self.voting_purpose)));
        }
        Value::Map(m)
    }

    /// Hash of `{61284: payload}`, signed by the staking key
    pub fn payload_hash(&self) -> [u8; 32] {
        blake2b256(&Value::Map(vec![(uint(61284), self.payload())]))
    }

    /// Hash of the complete auxiliary data
    pub fn aux_data_hash(&self, signature: &[u8; 64]) -> [u8; 32] {
        blake2b256(&Value::Array(vec![
            Value::Map(vec![
                (uint(61284), self.payload()),
                (
                    uint(61285),
                    Value::Map(vec![(uint(1), Value::Bytes(signature.to_vec()))]),
                ),
            ]),
            Value::Array(vec![]),
        ]))
    }
}

fn blake2b256(v: &Value) -> [u8; 32] {
    use blake2::{digest::consts::U32, Blake2b, Digest};

    let mut buff = vec![];
    ciborium::ser::into_writer(v, &mut buff).unwrap();

    let mut h = [0u8; 32];
    h.copy_from_slice(&Blake2b::<U32>::new().chain_update(&buff).finalize());
    h
}

/// Blake2b-224 key hash
pub fn blake2b224(d: &[u8]) -> [u8; 28] {
    use blake2::{digest::consts::U28, Blake2b, Digest};

    let mut h = [0u8; 28];
    h.copy_from_slice(&Blake2b::<U28>::new().chain_update(d).finalize());
    h
}

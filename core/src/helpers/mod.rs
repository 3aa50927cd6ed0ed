// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Text formatting helpers for registration screens

use core::str::from_utf8;

use emstr::{helpers::Hex, EncodeStr};

use ledger_cvote_apdu::path::{Bip44Path, HARDENED};

/// Maximum number of bytes displayed in full by [fmt_hex]
const MAX_HEX_BYTES: usize = 32;

/// Number of bytes shown either side of the ellipsis for long values
const HEX_ELIDE_BYTES: usize = 12;

fn finish(buff: &[u8], n: usize) -> &str {
    match from_utf8(&buff[..n]) {
        Ok(v) => v,
        Err(_) => "INVALID_UTF8",
    }
}

/// Format bytes as hex, eliding the middle of values longer than 32 bytes
pub fn fmt_hex<'a>(data: &[u8], buff: &'a mut [u8]) -> &'a str {
    let r = match data.len() > MAX_HEX_BYTES {
        true => emstr::write!(
            &mut buff[..],
            Hex(&data[..HEX_ELIDE_BYTES]),
            "...",
            Hex(&data[data.len() - HEX_ELIDE_BYTES..])
        ),
        false => emstr::write!(&mut buff[..], Hex(data)),
    };

    let n = match r {
        Ok(v) => v,
        Err(_) => return "ENCODE_ERR",
    };

    finish(buff, n)
}

/// Format a derivation path in `m/1852'/1815'/0'/2/0` form
pub fn fmt_path<'a>(path: &Bip44Path, buff: &'a mut [u8]) -> &'a str {
    let mut n = match emstr::write!(&mut buff[..], 'm') {
        Ok(v) => v,
        Err(_) => return "ENCODE_ERR",
    };

    for i in path.indices() {
        let r = match i & HARDENED != 0 {
            true => emstr::write!(&mut buff[n..], '/', i & !HARDENED, '\''),
            false => emstr::write!(&mut buff[n..], '/', *i),
        };

        match r {
            Ok(v) => n += v,
            Err(_) => return "ENCODE_ERR",
        }
    }

    finish(buff, n)
}

/// Format an unsigned integer value
pub fn fmt_u64(value: u64, buff: &mut [u8]) -> &str {
    let n = match emstr::write!(&mut buff[..], value) {
        Ok(v) => v,
        Err(_) => return "ENCODE_ERR",
    };

    finish(buff, n)
}

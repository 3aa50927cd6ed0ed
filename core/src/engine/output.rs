// Copyright (c) 2022-2023 The MobileCoin Foundation

use encdec::Encode;

use ledger_proto::ApduError;

use ledger_cvote_apdu::{registration::ConfirmResp, AUX_DATA_HASH_LEN, SIGNATURE_LEN};

use super::ui::Screen;

/// [`Engine`][super::Engine] outputs (in response to events), typically encoded to response [APDUs][crate::apdu]
#[derive(Clone, PartialEq, Debug)]
pub enum Output {
    None,

    /// Command complete, empty success response
    Ack,

    /// Screen to be displayed before the response is available,
    /// resume with [`Engine::ui_continue`][super::Engine::ui_continue]
    Screen(Screen),

    /// Completed registration
    Registration {
        aux_data_hash: [u8; AUX_DATA_HASH_LEN],
        signature: [u8; SIGNATURE_LEN],
    },
}

impl Output {
    /// Encode an [`Output`] object to a response [APDU]
    #[cfg_attr(feature = "noinline", inline(never))]
    pub fn encode(&self, buff: &mut [u8]) -> Result<usize, ApduError> {
        match self {
            Output::None | Output::Ack | Output::Screen(_) => Ok(0),
            Output::Registration {
                aux_data_hash,
                signature,
            } => ConfirmResp::new(*aux_data_hash, *signature).encode(buff),
        }
    }
}

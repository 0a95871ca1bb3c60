use lazy_static::lazy_static;

use crate::cell::{ArcCell, BagOfCells, TonCellError};

/// Representation hash of the official wallet v5r1 code cell.
pub const WALLET_V5R1_CODE_HASH: &str =
    "20834b7b72b112147e1b2fb457b84e74d1a30f04f737d4f62a668e9552d2b72f";

lazy_static! {
    static ref WALLET_V5R1_CODE: Result<ArcCell, String> =
        BagOfCells::parse_base64(include_str!("../../resources/wallet/wallet_v5r1.code"))
            .and_then(BagOfCells::into_single_root)
            .map_err(|err| err.to_string());
}

pub fn wallet_v5r1_code() -> Result<&'static ArcCell, TonCellError> {
    WALLET_V5R1_CODE
        .as_ref()
        .map_err(|err| TonCellError::InternalError(format!("Bad wallet v5r1 code: {err}")))
}

use thiserror::Error;

use crate::cell::TonCellError;
use crate::types::TonAddressParseError;

#[derive(Error, Debug)]
pub enum TonMessageError {
    #[error("TonCellError ({0})")]
    TonCellError(#[from] TonCellError),

    #[error("Invalid address ({0})")]
    InvalidAddress(#[from] TonAddressParseError),

    #[error("Invalid message ({0})")]
    InvalidMessage(String),
}

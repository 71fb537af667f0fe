use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use crate::cell::{Cell, CellBuilder};
use crate::message::{internal_message_header, InternalMessageOptions, Message, TonMessageError};
use crate::TonAddress;

pub const DEFAULT_WALLET_ID: u32 = 0x29a9a317;
pub const DEFAULT_SEND_MODE: u8 = 3;

/// `valid_until` of a deploy body: the message never expires.
pub const DEPLOY_VALID_UNTIL: u32 = u32::MAX;

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum WalletVersion {
    V2,
    V3,
    V4,
}

/// A single outgoing transfer carried by a wallet transfer body.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct WalletTransfer {
    pub destination: TonAddress,
    /// Amount in nanotons.
    pub amount: BigUint,
    #[serde(default = "default_bounce")]
    pub bounce: bool,
    /// Text comment stored after the zero opcode.
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default = "default_send_mode")]
    pub send_mode: u8,
}

fn default_bounce() -> bool {
    true
}

fn default_send_mode() -> u8 {
    DEFAULT_SEND_MODE
}

impl WalletTransfer {
    pub fn new(destination: TonAddress, amount: BigUint) -> Self {
        WalletTransfer {
            destination,
            amount,
            bounce: default_bounce(),
            comment: None,
            send_mode: DEFAULT_SEND_MODE,
        }
    }

    pub fn with_comment(mut self, comment: &str) -> Self {
        self.comment = Some(comment.to_owned());
        self
    }

    pub fn with_bounce(mut self, bounce: bool) -> Self {
        self.bounce = bounce;
        self
    }

    /// Body of the internal message: `op:32 = 0` and the optional comment.
    pub fn body(&self) -> Result<Cell, TonMessageError> {
        let mut builder = CellBuilder::new();
        builder.store_u32(32, 0)?;
        if let Some(comment) = &self.comment {
            builder.store_string(comment)?;
        }
        Ok(builder.build()?)
    }

    pub fn to_internal_message(&self) -> Result<Cell, TonMessageError> {
        let options = InternalMessageOptions {
            bounce: self.bounce,
            dest_workchain: self.destination.workchain,
            ..Default::default()
        };
        let header =
            internal_message_header(&self.destination.hash_part, &self.amount, &options)?;
        Message::new(header).with_body(self.body()?.to_arc()).build()
    }
}

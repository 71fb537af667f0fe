use crate::cell::{ArcCell, CellBuilder, CellParser, TonCellError};
use crate::tlb_types::TLBObject;
use crate::types::TonHash;
use crate::wallet::versioned::utils::{read_up_to_4_msgs, write_up_to_4_msgs};

/// WalletVersion::V2
#[derive(Debug, PartialEq, Clone)]
pub struct WalletDataV2 {
    pub seqno: u32,
    pub public_key: TonHash,
}

/// https://docs.ton.org/participate/wallets/contracts#wallet-v2
/// signature is not considered as part of msg body
///
/// The contract reads `seqno` before `valid_until`, unlike v3 and v4.
#[derive(Debug, PartialEq, Clone)]
pub struct WalletExtMsgBodyV2 {
    pub msg_seqno: u32,
    pub valid_until: u32,
    pub msgs_modes: Vec<u8>,
    pub msgs: Vec<ArcCell>,
}

impl WalletDataV2 {
    pub fn new(public_key: TonHash) -> Self {
        Self {
            seqno: 0,
            public_key,
        }
    }
}

impl TLBObject for WalletDataV2 {
    fn read(parser: &mut CellParser) -> Result<Self, TonCellError> {
        Ok(Self {
            seqno: parser.load_u32(32)?,
            public_key: parser.load_tonhash()?,
        })
    }

    fn write_to(&self, dst: &mut CellBuilder) -> Result<(), TonCellError> {
        dst.store_u32(32, self.seqno)?;
        dst.store_bytes(&self.public_key)?;
        Ok(())
    }
}

impl TLBObject for WalletExtMsgBodyV2 {
    fn read(parser: &mut CellParser) -> Result<Self, TonCellError> {
        let msg_seqno = parser.load_u32(32)?;
        let valid_until = parser.load_u32(32)?;
        let (msgs_modes, msgs) = read_up_to_4_msgs(parser)?;
        Ok(Self {
            msg_seqno,
            valid_until,
            msgs_modes,
            msgs,
        })
    }

    fn write_to(&self, dst: &mut CellBuilder) -> Result<(), TonCellError> {
        dst.store_u32(32, self.msg_seqno)?;
        dst.store_u32(32, self.valid_until)?;
        write_up_to_4_msgs(dst, &self.msgs, &self.msgs_modes)?;
        Ok(())
    }
}

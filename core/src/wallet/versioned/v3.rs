use crate::cell::{ArcCell, CellBuilder, CellParser, TonCellError};
use crate::tlb_types::TLBObject;
use crate::types::TonHash;
use crate::wallet::versioned::utils::{read_up_to_4_msgs, write_up_to_4_msgs};

/// WalletVersion::V3
#[derive(Debug, PartialEq, Clone)]
pub struct WalletDataV3 {
    pub seqno: u32,
    pub wallet_id: u32,
    pub public_key: TonHash,
}

/// https://docs.ton.org/participate/wallets/contracts#wallet-v3
/// signature is not considered as part of msg body
/// documentation is not correct about body layout
#[derive(Debug, PartialEq, Clone)]
pub struct WalletExtMsgBodyV3 {
    pub subwallet_id: u32,
    pub valid_until: u32,
    pub msg_seqno: u32,
    pub msgs_modes: Vec<u8>,
    pub msgs: Vec<ArcCell>,
}

impl WalletDataV3 {
    pub fn new(wallet_id: u32, public_key: TonHash) -> Self {
        Self {
            seqno: 0,
            wallet_id,
            public_key,
        }
    }
}

impl TLBObject for WalletDataV3 {
    fn read(parser: &mut CellParser) -> Result<Self, TonCellError> {
        Ok(Self {
            seqno: parser.load_u32(32)?,
            wallet_id: parser.load_u32(32)?,
            public_key: parser.load_tonhash()?,
        })
    }

    fn write_to(&self, dst: &mut CellBuilder) -> Result<(), TonCellError> {
        dst.store_u32(32, self.seqno)?;
        dst.store_u32(32, self.wallet_id)?;
        dst.store_bytes(&self.public_key)?;
        Ok(())
    }
}

impl TLBObject for WalletExtMsgBodyV3 {
    fn read(parser: &mut CellParser) -> Result<Self, TonCellError> {
        let subwallet_id = parser.load_u32(32)?;
        let valid_until = parser.load_u32(32)?;
        let msg_seqno = parser.load_u32(32)?;
        let (msgs_modes, msgs) = read_up_to_4_msgs(parser)?;
        Ok(Self {
            subwallet_id,
            valid_until,
            msg_seqno,
            msgs_modes,
            msgs,
        })
    }

    fn write_to(&self, dst: &mut CellBuilder) -> Result<(), TonCellError> {
        dst.store_u32(32, self.subwallet_id)?;
        dst.store_u32(32, self.valid_until)?;
        dst.store_u32(32, self.msg_seqno)?;
        write_up_to_4_msgs(dst, &self.msgs, &self.msgs_modes)?;
        Ok(())
    }
}

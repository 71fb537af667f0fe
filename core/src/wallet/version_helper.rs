use crate::cell::{ArcCell, Cell, CellBuilder, TonCellError};
use crate::tlb_types::TLBObject;
use crate::wallet::{
    WalletDataV2, WalletDataV3, WalletDataV4, WalletExtMsgBodyV2, WalletExtMsgBodyV3,
    WalletExtMsgBodyV4, WalletVersion,
};
use crate::TonHash;

/// Version-dependent cell layouts of the wallet contracts.
pub struct VersionHelper;

impl VersionHelper {
    /// Initial persistent data of a freshly deployed wallet. `wallet_id` is ignored by v2.
    pub fn get_data(
        version: WalletVersion,
        wallet_id: u32,
        public_key: &TonHash,
    ) -> Result<Cell, TonCellError> {
        let public_key = *public_key;
        match version {
            WalletVersion::V2 => WalletDataV2::new(public_key).to_cell(),
            WalletVersion::V3 => WalletDataV3::new(wallet_id, public_key).to_cell(),
            WalletVersion::V4 => WalletDataV4::new(wallet_id, public_key).to_cell(),
        }
    }

    /// Unsigned external message body carrying `msgs` with matching `msgs_modes`.
    pub fn build_ext_msg(
        version: WalletVersion,
        valid_until: u32,
        msg_seqno: u32,
        wallet_id: u32,
        msgs_modes: Vec<u8>,
        msgs: Vec<ArcCell>,
    ) -> Result<Cell, TonCellError> {
        match version {
            WalletVersion::V2 => WalletExtMsgBodyV2 {
                msg_seqno,
                valid_until,
                msgs_modes,
                msgs,
            }
            .to_cell(),
            WalletVersion::V3 => WalletExtMsgBodyV3 {
                subwallet_id: wallet_id,
                valid_until,
                msg_seqno,
                msgs_modes,
                msgs,
            }
            .to_cell(),
            WalletVersion::V4 => WalletExtMsgBodyV4 {
                subwallet_id: wallet_id,
                valid_until,
                msg_seqno,
                opcode: 0,
                msgs_modes,
                msgs,
            }
            .to_cell(),
        }
    }

    /// Prepends `sign` to the bits of `msg_cell`, keeping its references.
    pub fn sign_msg(msg_cell: &Cell, sign: &[u8]) -> Result<Cell, TonCellError> {
        let mut builder = CellBuilder::new();
        builder.store_bytes(sign)?;
        builder.store_remaining(&mut msg_cell.parser())?;
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::BagOfCells;

    const PUBLIC_KEY: TonHash = [
        0xcb, 0xf3, 0x77, 0xc9, 0xb7, 0x36, 0x04, 0xc7, 0x0b, 0xf7, 0x34, 0x88, 0xdd, 0xce, 0xba,
        0x14, 0xf7, 0x63, 0xba, 0xef, 0x2a, 0xc7, 0x0f, 0x68, 0xd1, 0xd6, 0x03, 0x2a, 0x12, 0x01,
        0x49, 0xf4,
    ];

    #[test]
    fn test_get_data() -> anyhow::Result<()> {
        let v2 = VersionHelper::get_data(WalletVersion::V2, 42, &PUBLIC_KEY)?;
        assert_eq!(v2.bit_len(), 32 + 256);

        let v3 = VersionHelper::get_data(WalletVersion::V3, 698983191, &PUBLIC_KEY)?;
        assert_eq!(
            BagOfCells::to_hex_standard(&v3.to_arc())?,
            "b5ee9c7241010101002a0000500000000029a9a317cbf377c9b73604c70bf73488ddceba14f763baef2ac70f68d1d6032a120149f414af5aef"
        );

        let v4 = VersionHelper::get_data(WalletVersion::V4, 698983191, &PUBLIC_KEY)?;
        assert_eq!(
            BagOfCells::to_hex_standard(&v4.to_arc())?,
            "b5ee9c7241010101002b0000510000000029a9a317cbf377c9b73604c70bf73488ddceba14f763baef2ac70f68d1d6032a120149f44013e66a59"
        );
        Ok(())
    }

    #[test]
    fn test_build_ext_msg_prefixes() -> anyhow::Result<()> {
        let msg = Cell::default().to_arc();
        let v2 =
            VersionHelper::build_ext_msg(WalletVersion::V2, 100, 7, 1, vec![3], vec![msg.clone()])?;
        assert_eq!(v2.bit_len(), 32 + 32 + 8);
        let mut parser = v2.parser();
        assert_eq!(parser.load_u32(32)?, 7);
        assert_eq!(parser.load_u32(32)?, 100);

        let v3 =
            VersionHelper::build_ext_msg(WalletVersion::V3, 100, 7, 1, vec![3], vec![msg.clone()])?;
        assert_eq!(v3.bit_len(), 32 * 3 + 8);
        let mut parser = v3.parser();
        assert_eq!(parser.load_u32(32)?, 1);
        assert_eq!(parser.load_u32(32)?, 100);
        assert_eq!(parser.load_u32(32)?, 7);
        assert_eq!(parser.load_u8(8)?, 3);

        let v4 =
            VersionHelper::build_ext_msg(WalletVersion::V4, 100, 7, 1, vec![3], vec![msg])?;
        assert_eq!(v4.bit_len(), 32 * 3 + 8 + 8);
        let mut parser = v4.parser();
        parser.skip_bits(96)?;
        assert_eq!(parser.load_u8(8)?, 0);
        assert_eq!(parser.load_u8(8)?, 3);
        Ok(())
    }

    #[test]
    fn test_build_ext_msg_rejects_mismatched_modes() {
        let msg = Cell::default().to_arc();
        let result = VersionHelper::build_ext_msg(WalletVersion::V3, 0, 0, 0, vec![], vec![msg]);
        assert!(matches!(result, Err(TonCellError::InvalidInput(_))));
    }

    #[test]
    fn test_sign_msg_matches_signed_v3_body() -> anyhow::Result<()> {
        let signed = Cell::from_boc_hex("b5ee9c7201010201008500019a86be376ea96e2f1252377976716a3d252906151feabc8e4b51506405035e45a7b4ff81f783cfe3f86483c822bcbb4f9481804990868bac69caf7af56e30fe70b29a9a317ffffffff000000000301006642007847b4630eb08d9f486fe846d5496878556dfd5a084f82a9a3fb01224e67c84c187a120000000000000000000000000000")?;
        let mut parser = signed.parser();
        let signature = parser.load_bytes(64)?;
        let unsigned = parser.load_remaining()?;

        let restored = VersionHelper::sign_msg(&unsigned, &signature)?;
        assert_eq!(&restored, signed.as_ref());
        Ok(())
    }
}

use std::sync::Arc;

use num_bigint::BigUint;

use crate::cell::{ArcCell, BagOfCells, Cell, CellBuilder, TonCellError};
use crate::crypto::{HashFunctions, Sha2HashFunctions, TextCodec, Utf8TextCodec};
use crate::message::{
    external_message_header, internal_message_header, InternalMessageOptions, Message,
    TonMessageError,
};
use crate::tlb_types::{StateInit, TLBObject};
use crate::wallet::{VersionHelper, WalletTransfer, WalletVersion, DEPLOY_VALID_UNTIL};
use crate::{TonAddress, TonHash};

/// Hex-in, hex-out surface for wallet applications.
///
/// BOC arguments and results are hex strings of single-root bags of cells
/// with CRC32-C. Hashing and text decoding go through the injected
/// [`HashFunctions`] and [`TextCodec`].
#[derive(Clone)]
pub struct TonWalletHelper {
    hashes: Arc<dyn HashFunctions>,
    text_codec: Arc<dyn TextCodec>,
}

impl Default for TonWalletHelper {
    fn default() -> Self {
        TonWalletHelper::new(Arc::new(Sha2HashFunctions), Arc::new(Utf8TextCodec))
    }
}

impl TonWalletHelper {
    pub fn new(hashes: Arc<dyn HashFunctions>, text_codec: Arc<dyn TextCodec>) -> Self {
        TonWalletHelper { hashes, text_codec }
    }

    pub fn create_initial_data(
        &self,
        version: WalletVersion,
        subwallet_id: u32,
        public_key: &[u8],
    ) -> Result<String, TonMessageError> {
        let public_key = TonHash::try_from(public_key).map_err(|_| {
            TonMessageError::InvalidMessage(format!(
                "Public key must be 32 bytes, got {}",
                public_key.len()
            ))
        })?;
        let data = VersionHelper::get_data(version, subwallet_id, &public_key)?;
        to_hex(data)
    }

    /// Body of the first message of a wallet: no transfers and no expiry.
    pub fn create_deploy_body(
        &self,
        version: WalletVersion,
        subwallet_id: u32,
    ) -> Result<String, TonMessageError> {
        let body = VersionHelper::build_ext_msg(
            version,
            DEPLOY_VALID_UNTIL,
            0,
            subwallet_id,
            vec![],
            vec![],
        )?;
        to_hex(body)
    }

    /// Unsigned transfer body; sign its [`Self::create_boc_hash`] and pass the
    /// signature to [`Self::create_boc_with_signature`].
    pub fn create_transfer_body(
        &self,
        version: WalletVersion,
        subwallet_id: u32,
        valid_until: u32,
        seqno: u32,
        transfer: &WalletTransfer,
    ) -> Result<String, TonMessageError> {
        let internal_message = transfer.to_internal_message()?.to_arc();
        let body = VersionHelper::build_ext_msg(
            version,
            valid_until,
            seqno,
            subwallet_id,
            vec![transfer.send_mode],
            vec![internal_message],
        )?;
        to_hex(body)
    }

    pub fn create_boc_hash(&self, boc_hex: &str) -> Result<String, TonMessageError> {
        let cell = BagOfCells::from_standard(boc_hex)?;
        Ok(hex::encode(cell.cell_hash_with(self.hashes.as_ref())))
    }

    pub fn create_boc_with_signature(
        &self,
        boc_hex: &str,
        signature: &[u8],
    ) -> Result<String, TonMessageError> {
        let cell = BagOfCells::from_standard(boc_hex)?;
        let signed = VersionHelper::sign_msg(&cell, signature)?;
        to_hex(signed)
    }

    /// Bits of the root cell as a string of `0` and `1`.
    pub fn get_boc_root_cell_data(&self, boc_hex: &str) -> Result<String, TonMessageError> {
        Ok(BagOfCells::from_standard(boc_hex)?.to_bit_string())
    }

    /// Hash of the `StateInit` built from the given data and code BOCs.
    pub fn initial_condition_data(
        &self,
        data_boc: &[u8],
        code_boc: &[u8],
    ) -> Result<String, TonMessageError> {
        let state_init = state_init_cell(data_boc, code_boc)?;
        Ok(hex::encode(state_init.cell_hash_with(self.hashes.as_ref())))
    }

    pub fn contract_address(
        &self,
        workchain: i32,
        data_boc: &[u8],
        code_boc: &[u8],
    ) -> Result<TonAddress, TonMessageError> {
        let state_init = state_init_cell(data_boc, code_boc)?;
        let hash_part = state_init.cell_hash_with(self.hashes.as_ref());
        Ok(TonAddress::new(workchain, &hash_part))
    }

    /// Appends a reference to a new internal message to the root of `prefix_boc`.
    ///
    /// The internal message body depends on `payload`:
    /// - a bag of cells, binary or hex, is stored as a reference to its root;
    /// - non-empty text is stored after a zero opcode;
    /// - anything else is stored as raw bytes after a zero opcode.
    ///
    /// `state_init` is a bag of cells holding the `StateInit` of the destination.
    #[allow(clippy::too_many_arguments)]
    pub fn transfer(
        &self,
        prefix_boc: &[u8],
        workchain: i32,
        address: &[u8],
        amount: &BigUint,
        bounceable: bool,
        payload: Option<&[u8]>,
        state_init: Option<&[u8]>,
    ) -> Result<String, TonMessageError> {
        let destination = TonAddress::from_bytes(workchain, address)?;
        let prefix = BagOfCells::parse(prefix_boc)?.single_root()?;

        let options = InternalMessageOptions {
            bounce: bounceable,
            dest_workchain: destination.workchain,
            ..Default::default()
        };
        let header = internal_message_header(&destination.hash_part, amount, &options)?;
        let mut message = Message::new(header);
        if let Some(payload) = payload {
            message.with_body(self.payload_body(payload)?.to_arc());
        }
        if let Some(state_init) = state_init {
            let state_init = BagOfCells::parse(state_init)?.single_root()?;
            message.with_state_init_ref(&state_init);
        }

        let mut builder = CellBuilder::new();
        builder.store_cell(&prefix)?;
        builder.store_child(message.build()?)?;
        to_hex(builder.build()?)
    }

    /// Wraps a signed wallet body into an inbound external message to `address`.
    pub fn create_external_message(
        &self,
        workchain: i32,
        address: &[u8],
        signed_body_hex: &str,
        state_init: Option<&StateInit>,
    ) -> Result<String, TonMessageError> {
        let destination = TonAddress::from_bytes(workchain, address)?;
        let signed_body = BagOfCells::from_standard(signed_body_hex)?;

        let mut message = Message::new(external_message_header(&destination)?);
        message.with_body(signed_body);
        if let Some(state_init) = state_init {
            message.with_state_init(state_init.to_cell()?);
        }
        to_hex(message.build()?)
    }

    fn payload_body(&self, payload: &[u8]) -> Result<Cell, TonCellError> {
        if let Some(root) = self.payload_as_boc(payload) {
            log::debug!("transfer payload is a bag of cells, storing it as a reference");
            return CellBuilder::new().store_reference(&root)?.build();
        }

        let mut builder = CellBuilder::new();
        builder.store_u32(32, 0)?;
        match self.text_codec.bytes_to_string(payload) {
            Some(text) if !text.is_empty() => {
                log::debug!("transfer payload is {} bytes of text", payload.len());
                builder.store_bytes(&self.text_codec.string_to_bytes(&text))?;
            }
            _ => {
                log::debug!("transfer payload stored as {} raw bytes", payload.len());
                builder.store_bytes(payload)?;
            }
        }
        builder.build()
    }

    fn payload_as_boc(&self, payload: &[u8]) -> Option<ArcCell> {
        if let Ok(root) = BagOfCells::parse(payload).and_then(BagOfCells::single_root) {
            return Some(root);
        }
        let text = std::str::from_utf8(payload).ok()?;
        let bytes = hex::decode(text.trim()).ok()?;
        BagOfCells::parse(&bytes)
            .and_then(BagOfCells::single_root)
            .ok()
    }
}

fn state_init_cell(data_boc: &[u8], code_boc: &[u8]) -> Result<Cell, TonCellError> {
    let data = BagOfCells::parse(data_boc)?.single_root()?;
    let code = BagOfCells::parse(code_boc)?.single_root()?;
    StateInit::new(code, data).to_cell()
}

fn to_hex(cell: Cell) -> Result<String, TonMessageError> {
    Ok(BagOfCells::to_hex_standard(&cell.to_arc())?)
}

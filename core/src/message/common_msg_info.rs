use num_bigint::BigUint;
use num_traits::Zero;
use serde::{Deserialize, Serialize};

use super::TonMessageError;
use crate::cell::{Cell, CellBuilder};
use crate::{TonAddress, TonHash};

/// Optional fields of an `int_msg_info$0` header.
///
/// Missing JSON fields take the [`Default`] values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InternalMessageOptions {
    /// Hyper cube routing flag.
    pub ihr_disabled: bool,
    /// Message should be bounced if there are errors during processing.
    pub bounce: bool,
    /// Flag that describes, that message itself is a result of bounce.
    pub bounced: bool,
    /// Account id of the sender, `None` for `addr_none`.
    pub src: Option<TonHash>,
    pub src_workchain: i32,
    pub dest_workchain: i32,
    /// Hyper cube routing fee, in nanotons.
    pub ihr_fee: BigUint,
    /// Forwarding fee, in nanotons.
    pub fwd_fee: BigUint,
    /// Logical time of message creation.
    pub created_lt: u64,
    /// Creation unix time.
    pub created_at: u32,
}

impl Default for InternalMessageOptions {
    fn default() -> Self {
        InternalMessageOptions {
            ihr_disabled: true,
            bounce: true,
            bounced: false,
            src: None,
            src_workchain: 0,
            dest_workchain: 0,
            ihr_fee: BigUint::zero(),
            fwd_fee: BigUint::zero(),
            created_lt: 0,
            created_at: 0,
        }
    }
}

/// Builds an `int_msg_info$0` header sending `value` nanotons to `dest`.
///
/// The destination workchain comes from `options.dest_workchain`. Extra
/// currencies are always an empty dictionary.
pub fn internal_message_header(
    dest: &TonHash,
    value: &BigUint,
    options: &InternalMessageOptions,
) -> Result<Cell, TonMessageError> {
    let src = options
        .src
        .map(|hash_part| TonAddress::new(options.src_workchain, &hash_part));
    let dest = TonAddress::new(options.dest_workchain, dest);

    let mut builder = CellBuilder::new();
    builder
        .store_bit(false)? // int_msg_info$0
        .store_bit(options.ihr_disabled)?
        .store_bit(options.bounce)?
        .store_bit(options.bounced)?
        .store_address(src.as_ref())?
        .store_address(Some(&dest))?
        .store_coins(value)?
        .store_empty_dict()? // extra currencies
        .store_coins(&options.ihr_fee)?
        .store_coins(&options.fwd_fee)?
        .store_u64(64, options.created_lt)?
        .store_u32(32, options.created_at)?;
    Ok(builder.build()?)
}

/// Builds an `ext_in_msg_info$10` header with no source and zero import fee.
pub fn external_message_header(dest: &TonAddress) -> Result<Cell, TonMessageError> {
    let mut builder = CellBuilder::new();
    builder
        .store_bit(true)? // is_external
        .store_bit(false)? // inbound
        .store_address(None)?
        .store_address(Some(dest))?
        .store_coins(&BigUint::zero())?;
    Ok(builder.build()?)
}

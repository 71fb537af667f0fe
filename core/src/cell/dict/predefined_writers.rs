use num_bigint::{BigInt, BigUint};

use crate::cell::{ArcCell, CellBuilder, TonCellError};

pub fn val_writer_ref_cell(builder: &mut CellBuilder, val: ArcCell) -> Result<(), TonCellError> {
    builder.store_reference(&val)?;
    Ok(())
}

/// Stores the value in the fewest bits that hold it, at least one.
pub fn val_writer_unsigned_min_size<V>(
    builder: &mut CellBuilder,
    val: V,
) -> Result<(), TonCellError>
where
    BigUint: From<V>,
{
    let val = BigUint::from(val);
    builder.store_uint((val.bits() as usize).max(1), &val)?;
    Ok(())
}

/// Two's complement counterpart of [`val_writer_unsigned_min_size`].
pub fn val_writer_signed_min_size<V>(builder: &mut CellBuilder, val: V) -> Result<(), TonCellError>
where
    BigInt: From<V>,
{
    let val = BigInt::from(val);
    builder.store_int(val.bits() as usize + 1, &val)?;
    Ok(())
}

use crate::cell::{ArcCell, CellBuilder, CellParser, TonCellError};

pub(super) fn write_up_to_4_msgs(
    dst: &mut CellBuilder,
    msgs: &[ArcCell],
    msgs_modes: &[u8],
) -> Result<(), TonCellError> {
    validate_msgs_count(msgs, msgs_modes)?;
    for (msg, mode) in msgs.iter().zip(msgs_modes.iter()) {
        dst.store_u8(8, *mode)?;
        dst.store_reference(msg)?;
    }
    Ok(())
}

/// Reads `(mode, ^message)` pairs until the references run out.
pub(super) fn read_up_to_4_msgs(
    parser: &mut CellParser,
) -> Result<(Vec<u8>, Vec<ArcCell>), TonCellError> {
    let msgs_cnt = parser.remaining_refs();
    let mut msgs_modes = Vec::with_capacity(msgs_cnt);
    let mut msgs = Vec::with_capacity(msgs_cnt);
    for _ in 0..msgs_cnt {
        msgs_modes.push(parser.load_u8(8)?);
        msgs.push(parser.next_reference()?);
    }
    Ok((msgs_modes, msgs))
}

fn validate_msgs_count(msgs: &[ArcCell], msgs_modes: &[u8]) -> Result<(), TonCellError> {
    if msgs.len() > 4 || msgs_modes.len() != msgs.len() {
        let err_str = format!(
            "wrong msgs: modes_len={}, msgs_len={}, max_len=4",
            msgs_modes.len(),
            msgs.len()
        );
        Err(TonCellError::InvalidInput(err_str))
    } else {
        Ok(())
    }
}

use crate::cell::{ArcCell, Cell, CellBuilder, EitherCellLayout};
use crate::message::TonMessageError;

/// A message split into header, optional state init and optional body.
///
/// [`Message::build`] packs all three into one cell: the state init and the
/// body are spliced inline when they fit, otherwise they go to references.
#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    pub header: Cell,
    pub state_init: Option<ArcCell>,
    pub body: Option<ArcCell>,
}

impl Message {
    pub fn new(header: Cell) -> Self {
        Message {
            header,
            state_init: None,
            body: None,
        }
    }

    pub fn with_state_init(&mut self, state_init: Cell) -> &mut Self {
        self.with_state_init_ref(&state_init.to_arc())
    }

    pub fn with_state_init_ref(&mut self, state_init: &ArcCell) -> &mut Self {
        self.state_init = Some(state_init.clone());
        self
    }

    pub fn with_body(&mut self, body: ArcCell) -> &mut Self {
        self.body = Some(body);
        self
    }

    pub fn build(&self) -> Result<Cell, TonMessageError> {
        let mut builder = CellBuilder::new();
        builder.store_cell(&self.header)?;

        match &self.state_init {
            Some(state_init) => {
                builder.store_bit(true)?;
                // Either tag of the state and of the body
                let inline = builder.can_store_inline(state_init, 2);
                log::trace!(
                    "state init of {} bits packed {}",
                    state_init.bit_len(),
                    if inline { "inline" } else { "to ref" }
                );
                builder.store_either_cell_or_cell_ref(state_init, layout(inline))?;
            }
            None => {
                builder.store_bit(false)?;
            }
        }

        match &self.body {
            Some(body) => {
                let inline = builder.can_store_inline(body, 1);
                log::trace!(
                    "body of {} bits packed {}",
                    body.bit_len(),
                    if inline { "inline" } else { "to ref" }
                );
                builder.store_either_cell_or_cell_ref(body, layout(inline))?;
            }
            None => {
                builder.store_bit(false)?;
            }
        }

        Ok(builder.build()?)
    }
}

fn layout(inline: bool) -> EitherCellLayout {
    if inline {
        EitherCellLayout::ToCell
    } else {
        EitherCellLayout::ToRef
    }
}

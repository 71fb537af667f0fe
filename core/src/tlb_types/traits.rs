use crate::cell::{ArcCell, BagOfCells, Cell, CellBuilder, CellParser, TonCellError};

/// A value with a fixed TL-B layout inside a cell.
pub trait TLBObject: Sized {
    fn read(parser: &mut CellParser) -> Result<Self, TonCellError>;

    fn write_to(&self, builder: &mut CellBuilder) -> Result<(), TonCellError>;

    /// Parsing
    ///
    fn from_cell(cell: &Cell) -> Result<Self, TonCellError> {
        cell.parse_fully(Self::read)
    }

    fn from_boc_hex(boc_hex: &str) -> Result<Self, TonCellError> {
        let cell = BagOfCells::from_standard(boc_hex)?;
        Self::from_cell(&cell)
    }

    /// Serialization
    ///
    fn to_cell(&self) -> Result<Cell, TonCellError> {
        let mut builder = CellBuilder::new();
        self.write_to(&mut builder)?;
        builder.build()
    }

    fn to_arc_cell(&self) -> Result<ArcCell, TonCellError> {
        Ok(self.to_cell()?.to_arc())
    }

    fn to_boc_hex(&self) -> Result<String, TonCellError> {
        BagOfCells::to_hex_standard(&self.to_arc_cell()?)
    }
}

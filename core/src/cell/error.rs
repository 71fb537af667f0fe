use thiserror::Error;

use crate::types::TonAddressParseError;

#[derive(Error, Debug)]
pub enum TonCellError {
    #[error("Cell capacity exceeded ({0})")]
    CapacityExceeded(String),

    #[error("Not enough bits in cell builder (Requested: {requested}, remaining: {remaining})")]
    OutOfBits { requested: usize, remaining: usize },

    #[error("Cell must contain at most 4 references (Requested: {0})")]
    TooManyRefs(usize),

    #[error("Value out of range ({0})")]
    ValueOutOfRange(String),

    #[error("Slice underflow (Requested: {requested} {unit}, remaining: {remaining})")]
    SliceUnderflow {
        unit: &'static str,
        requested: usize,
        remaining: usize,
    },

    #[error("Malformed bag of cells ({0})")]
    MalformedBoc(String),

    #[error("Bag of cells serialization error ({0})")]
    BagOfCellsSerializationError(String),

    #[error("Invalid address ({0})")]
    InvalidAddress(String),

    #[error("Internal error ({0})")]
    InternalError(String),

    #[error("Invalid index (Index: {idx}, reference count: {ref_count})")]
    InvalidIndex { idx: usize, ref_count: usize },

    #[error("Invalid cell data ({0})")]
    InvalidCellData(String),

    #[error("Invalid input error ({0})")]
    InvalidInput(String),

    #[error(
        "Non-empty reader (Remaining bits: {remaining_bits}, Remaining refs: {remaining_refs})"
    )]
    NonEmptyReader {
        remaining_bits: usize,
        remaining_refs: usize,
    },

    #[error("{0}")]
    IO(#[from] std::io::Error),
}

pub trait MapTonCellError<R, E>
where
    E: std::error::Error,
{
    fn map_boc_deserialization_error(self) -> Result<R, TonCellError>;

    fn map_boc_serialization_error(self) -> Result<R, TonCellError>;

    fn map_cell_builder_error(self) -> Result<R, TonCellError>;

    fn map_cell_parser_error(self) -> Result<R, TonCellError>;
}

impl<R, E> MapTonCellError<R, E> for Result<R, E>
where
    E: std::error::Error,
{
    fn map_boc_deserialization_error(self) -> Result<R, TonCellError> {
        self.map_err(|e| TonCellError::boc_deserialization_error(e))
    }

    fn map_boc_serialization_error(self) -> Result<R, TonCellError> {
        self.map_err(|e| TonCellError::boc_serialization_error(e))
    }

    fn map_cell_builder_error(self) -> Result<R, TonCellError> {
        self.map_err(|e| TonCellError::cell_builder_error(e))
    }

    fn map_cell_parser_error(self) -> Result<R, TonCellError> {
        self.map_err(|e| TonCellError::cell_parser_error(e))
    }
}

impl TonCellError {
    pub fn boc_serialization_error<T>(e: T) -> TonCellError
    where
        T: ToString,
    {
        TonCellError::BagOfCellsSerializationError(format!(
            "BoC serialization error: {}",
            e.to_string()
        ))
    }

    pub fn boc_deserialization_error<T>(e: T) -> TonCellError
    where
        T: ToString,
    {
        TonCellError::MalformedBoc(format!("BoC deserialization error: {}", e.to_string()))
    }

    pub fn cell_builder_error<T>(e: T) -> TonCellError
    where
        T: ToString,
    {
        TonCellError::InternalError(format!("Cell builder error: {}", e.to_string()))
    }

    pub fn cell_parser_error<T>(e: T) -> TonCellError
    where
        T: ToString,
    {
        TonCellError::InternalError(format!("Cell parser error: {}", e.to_string()))
    }

    pub fn value_out_of_range<T>(value: T, bit_len: usize) -> TonCellError
    where
        T: ToString,
    {
        TonCellError::ValueOutOfRange(format!(
            "Value {} doesn't fit in {} bits",
            value.to_string(),
            bit_len
        ))
    }

    pub fn bits_underflow(requested: usize, remaining: usize) -> TonCellError {
        TonCellError::SliceUnderflow {
            unit: "bits",
            requested,
            remaining,
        }
    }

    pub fn refs_underflow(requested: usize, remaining: usize) -> TonCellError {
        TonCellError::SliceUnderflow {
            unit: "refs",
            requested,
            remaining,
        }
    }
}

impl From<TonAddressParseError> for TonCellError {
    fn from(value: TonAddressParseError) -> Self {
        TonCellError::InvalidAddress(value.to_string())
    }
}

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum LogicalType {
    Boolean,
    Int32,
    Int64,
    Float64,
    String,
    Null,
}

impl LogicalType {
    /// Returns true if values of this type are integers that can be bit-packed.
    #[inline]
    pub fn is_integer(&self) -> bool {
        matches!(self, LogicalType::Int32 | LogicalType::Int64)
    }
}

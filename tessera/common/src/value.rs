use std::fmt;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::error::{ValueError, ValueResult};
use crate::logical_type::LogicalType;

pub type Nullable<T> = Option<T>;

pub type F64 = OrderedFloat<f64>;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarValue {
    Null,
    Boolean(Nullable<bool>),
    Int32(Nullable<i32>),
    Int64(Nullable<i64>),
    Float64(Nullable<F64>),
    String(Nullable<String>),
}

impl ScalarValue {
    /// Returns the typed null value of `ty`.
    pub fn null_of(ty: LogicalType) -> Self {
        match ty {
            LogicalType::Boolean => ScalarValue::Boolean(None),
            LogicalType::Int32 => ScalarValue::Int32(None),
            LogicalType::Int64 => ScalarValue::Int64(None),
            LogicalType::Float64 => ScalarValue::Float64(None),
            LogicalType::String => ScalarValue::String(None),
            LogicalType::Null => ScalarValue::Null,
        }
    }

    pub fn logical_type(&self) -> LogicalType {
        match self {
            ScalarValue::Null => LogicalType::Null,
            ScalarValue::Boolean(_) => LogicalType::Boolean,
            ScalarValue::Int32(_) => LogicalType::Int32,
            ScalarValue::Int64(_) => LogicalType::Int64,
            ScalarValue::Float64(_) => LogicalType::Float64,
            ScalarValue::String(_) => LogicalType::String,
        }
    }

    pub fn is_null(&self) -> bool {
        match self {
            ScalarValue::Null => true,
            ScalarValue::Boolean(v) => v.is_none(),
            ScalarValue::Int32(v) => v.is_none(),
            ScalarValue::Int64(v) => v.is_none(),
            ScalarValue::Float64(v) => v.is_none(),
            ScalarValue::String(v) => v.is_none(),
        }
    }

    /// Widens integer values to `i64`, if this is a non-null integer.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ScalarValue::Int32(v) => v.map(i64::from),
            ScalarValue::Int64(v) => *v,
            _ => None,
        }
    }

    /// Coerces the value into a column of type `ty`.
    ///
    /// An untyped `Null` becomes the typed null of `ty` and `Int32` widens into `Int64`.
    /// Any other mismatch is rejected.
    pub fn cast_to(self, ty: LogicalType) -> ValueResult<Self> {
        let actual = self.logical_type();
        if actual == ty {
            return Ok(self);
        }
        match (self, ty) {
            (ScalarValue::Null, _) => Ok(ScalarValue::null_of(ty)),
            (ScalarValue::Int32(v), LogicalType::Int64) => Ok(ScalarValue::Int64(v.map(i64::from))),
            _ => Err(ValueError::TypeMismatch {
                expected: ty,
                actual,
            }),
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            return f.write_str("NULL");
        }
        match self {
            ScalarValue::Boolean(Some(v)) => write!(f, "{v}"),
            ScalarValue::Int32(Some(v)) => write!(f, "{v}"),
            ScalarValue::Int64(Some(v)) => write!(f, "{v}"),
            ScalarValue::Float64(Some(v)) => write!(f, "{v}"),
            ScalarValue::String(Some(v)) => f.write_str(v),
            _ => f.write_str("NULL"),
        }
    }
}

macro_rules! impl_from_primitive {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for ScalarValue {
                fn from(value: $ty) -> Self {
                    ScalarValue::$variant(Some(value.into()))
                }
            }
        )*
    };
}

impl_from_primitive! {
    bool => Boolean,
    i32 => Int32,
    i64 => Int64,
    f64 => Float64,
    String => String,
}

impl From<&str> for ScalarValue {
    fn from(value: &str) -> Self {
        ScalarValue::String(Some(value.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cast_null_and_widen() {
        assert_eq!(
            ScalarValue::Null.cast_to(LogicalType::String).unwrap(),
            ScalarValue::String(None)
        );
        assert_eq!(
            ScalarValue::from(7i32).cast_to(LogicalType::Int64).unwrap(),
            ScalarValue::Int64(Some(7))
        );
        assert!(ScalarValue::from("x").cast_to(LogicalType::Int64).is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(ScalarValue::from(1.5f64).to_string(), "1.5");
        assert_eq!(ScalarValue::Int64(None).to_string(), "NULL");
        assert_eq!(ScalarValue::from("abc").to_string(), "abc");
    }

    #[test]
    fn test_postcard_keeps_nullability() {
        let bytes = postcard::to_allocvec(&ScalarValue::Int32(None)).unwrap();
        let value: ScalarValue = postcard::from_bytes(&bytes).unwrap();
        assert_eq!(value, ScalarValue::Int32(None));
    }
}

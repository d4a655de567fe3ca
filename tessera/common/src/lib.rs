pub mod constants;
pub mod error;
pub mod frame;
pub mod logical_type;
pub mod types;
pub mod value;

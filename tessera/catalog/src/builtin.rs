//! Functions registered in every catalog at creation time.

use tessera_common::logical_type::LogicalType;

use crate::entry::FunctionSignature;

pub struct BuiltInFunction {
    pub name: &'static str,
    pub signatures: Vec<FunctionSignature>,
}

fn scalar(parameters: &[LogicalType], ret: LogicalType) -> FunctionSignature {
    FunctionSignature::new(parameters.to_vec(), vec![ret])
}

pub fn scalar_functions() -> Vec<BuiltInFunction> {
    use LogicalType::*;
    vec![
        BuiltInFunction {
            name: "LOWER",
            signatures: vec![scalar(&[String], String)],
        },
        BuiltInFunction {
            name: "UPPER",
            signatures: vec![scalar(&[String], String)],
        },
        BuiltInFunction {
            name: "LENGTH",
            signatures: vec![scalar(&[String], Int64)],
        },
        BuiltInFunction {
            name: "ABS",
            signatures: vec![
                scalar(&[Int32], Int32),
                scalar(&[Int64], Int64),
                scalar(&[Float64], Float64),
            ],
        },
        BuiltInFunction {
            name: "COALESCE",
            signatures: vec![
                scalar(&[Int64, Int64], Int64),
                scalar(&[String, String], String),
            ],
        },
    ]
}

pub fn table_functions() -> Vec<BuiltInFunction> {
    use LogicalType::*;
    vec![
        BuiltInFunction {
            name: "SHOW_TABLES",
            signatures: vec![FunctionSignature::new(vec![], vec![Int64, String, String, String])],
        },
        BuiltInFunction {
            name: "TABLE_INFO",
            signatures: vec![FunctionSignature::new(vec![String], vec![
                Int64, String, String, Boolean,
            ])],
        },
        BuiltInFunction {
            name: "DB_VERSION",
            signatures: vec![FunctionSignature::new(vec![], vec![String])],
        },
    ]
}

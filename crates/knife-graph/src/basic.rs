//! Predeclared basic types

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BasicKind {
    Invalid,
    Bool,
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Uintptr,
    Float32,
    Float64,
    Complex64,
    Complex128,
    String,
    UnsafePointer,
    UntypedBool,
    UntypedInt,
    UntypedRune,
    UntypedFloat,
    UntypedString,
    UntypedNil,
}

/// Property flags of a basic type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BasicInfo {
    pub boolean: bool,
    pub integer: bool,
    pub unsigned: bool,
    pub float: bool,
    pub complex: bool,
    pub string: bool,
    pub untyped: bool,
}

impl BasicInfo {
    pub fn is_numeric(&self) -> bool {
        self.integer || self.float || self.complex
    }

    pub fn is_ordered(&self) -> bool {
        self.integer || self.float || self.string
    }
}

impl BasicKind {
    /// Every kind that has a name in the universe scope
    pub const PREDECLARED: &'static [BasicKind] = &[
        BasicKind::Bool,
        BasicKind::Int,
        BasicKind::Int8,
        BasicKind::Int16,
        BasicKind::Int32,
        BasicKind::Int64,
        BasicKind::Uint,
        BasicKind::Uint8,
        BasicKind::Uint16,
        BasicKind::Uint32,
        BasicKind::Uint64,
        BasicKind::Uintptr,
        BasicKind::Float32,
        BasicKind::Float64,
        BasicKind::Complex64,
        BasicKind::Complex128,
        BasicKind::String,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BasicKind::Invalid => "invalid type",
            BasicKind::Bool => "bool",
            BasicKind::Int => "int",
            BasicKind::Int8 => "int8",
            BasicKind::Int16 => "int16",
            BasicKind::Int32 => "int32",
            BasicKind::Int64 => "int64",
            BasicKind::Uint => "uint",
            BasicKind::Uint8 => "uint8",
            BasicKind::Uint16 => "uint16",
            BasicKind::Uint32 => "uint32",
            BasicKind::Uint64 => "uint64",
            BasicKind::Uintptr => "uintptr",
            BasicKind::Float32 => "float32",
            BasicKind::Float64 => "float64",
            BasicKind::Complex64 => "complex64",
            BasicKind::Complex128 => "complex128",
            BasicKind::String => "string",
            BasicKind::UnsafePointer => "unsafe.Pointer",
            BasicKind::UntypedBool => "untyped bool",
            BasicKind::UntypedInt => "untyped int",
            BasicKind::UntypedRune => "untyped rune",
            BasicKind::UntypedFloat => "untyped float",
            BasicKind::UntypedString => "untyped string",
            BasicKind::UntypedNil => "untyped nil",
        }
    }

    pub fn info(self) -> BasicInfo {
        use BasicKind::*;
        let mut info = BasicInfo::default();
        match self {
            Bool => info.boolean = true,
            UntypedBool => {
                info.boolean = true;
                info.untyped = true;
            }
            Int | Int8 | Int16 | Int32 | Int64 => info.integer = true,
            Uint | Uint8 | Uint16 | Uint32 | Uint64 | Uintptr => {
                info.integer = true;
                info.unsigned = true;
            }
            UntypedInt | UntypedRune => {
                info.integer = true;
                info.untyped = true;
            }
            Float32 | Float64 => info.float = true,
            UntypedFloat => {
                info.float = true;
                info.untyped = true;
            }
            Complex64 | Complex128 => info.complex = true,
            String => info.string = true,
            UntypedString => {
                info.string = true;
                info.untyped = true;
            }
            UntypedNil => info.untyped = true,
            Invalid | UnsafePointer => {}
        }
        info
    }
}

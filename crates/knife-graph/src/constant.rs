//! Values of declared constants

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of a [`ConstValue`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstKind {
    Unknown,
    Bool,
    String,
    Int,
    Float,
}

/// The value of a constant declaration as computed by the type checker.
///
/// Integer constants keep 128 bits so that untyped values outside the 64-bit
/// range survive until a typed accessor rejects them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConstValue {
    Unknown,
    Bool(bool),
    String(String),
    Int(i128),
    Float(f64),
}

impl ConstValue {
    pub fn kind(&self) -> ConstKind {
        match self {
            ConstValue::Unknown => ConstKind::Unknown,
            ConstValue::Bool(_) => ConstKind::Bool,
            ConstValue::String(_) => ConstKind::String,
            ConstValue::Int(_) => ConstKind::Int,
            ConstValue::Float(_) => ConstKind::Float,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConstValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConstValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Exact `i64` view of an integer constant
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ConstValue::Int(i) => i64::try_from(*i).ok(),
            _ => None,
        }
    }

    /// Exact `u64` view of an integer constant
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            ConstValue::Int(i) => u64::try_from(*i).ok(),
            _ => None,
        }
    }

    /// Exact `f64` view of an integer or float constant
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ConstValue::Float(f) => Some(*f),
            ConstValue::Int(i) => {
                let f = *i as f64;
                (f as i128 == *i).then_some(f)
            }
            _ => None,
        }
    }

    /// Exact `f32` view of an integer or float constant
    pub fn as_f32(&self) -> Option<f32> {
        let f = self.as_f64()?;
        let narrowed = f as f32;
        (f64::from(narrowed) == f).then_some(narrowed)
    }
}

impl fmt::Display for ConstValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstValue::Unknown => write!(f, "unknown"),
            ConstValue::Bool(b) => write!(f, "{}", b),
            ConstValue::String(s) => write!(f, "{:?}", s),
            ConstValue::Int(i) => write!(f, "{}", i),
            ConstValue::Float(x) => write!(f, "{}", x),
        }
    }
}

//! Constant folding with untyped-constant semantics
//!
//! Integers are exact 128-bit values. Floats are exact rationals, so
//! `0.1 + 0.2 == 0.3` holds the way it does for untyped constants. A float
//! only meets machine precision when it is used as a map key, and then it
//! must convert without rounding.

use std::cmp::Ordering;
use std::fmt;

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{ToPrimitive, Zero};

use crate::error::PathError;
use crate::parser::{BinaryOp, Expr, Parser, UnaryOp};

/// Largest shift count accepted in a constant shift
const MAX_SHIFT: i128 = 127;

/// Bits allowed in the numerator or denominator of a float constant
const MAX_FLOAT_BITS: u64 = 8192;

/// Decimal exponent bound matching [`MAX_FLOAT_BITS`]
const MAX_DECIMAL_EXPONENT: u64 = 2466;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constant {
    Bool(bool),
    Int(i128),
    Float(BigRational),
    String(String),
}

impl Constant {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Constant::Bool(_) => "untyped bool",
            Constant::Int(_) => "untyped int",
            Constant::Float(_) => "untyped float",
            Constant::String(_) => "untyped string",
        }
    }

    /// The integer value of an integer or an integral float
    pub fn as_integer(&self) -> Option<i128> {
        match self {
            Constant::Int(i) => Some(*i),
            Constant::Float(r) if r.is_integer() => r.to_integer().to_i128(),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Constant::Int(_) | Constant::Float(_))
    }

    /// The value as an `f64`, if it converts without rounding
    pub fn to_f64_exact(&self) -> Option<f64> {
        let exact = self.rational()?;
        let value = exact.to_f64().filter(|v| v.is_finite())?;
        (BigRational::from_float(value)? == exact).then_some(value)
    }

    /// The value as an `f32`, if it converts without rounding
    pub fn to_f32_exact(&self) -> Option<f32> {
        let exact = self.rational()?;
        let value = exact.to_f32().filter(|v| v.is_finite())?;
        (BigRational::from_float(value)? == exact).then_some(value)
    }

    fn rational(&self) -> Option<BigRational> {
        match self {
            Constant::Int(i) => Some(BigRational::from_integer(BigInt::from(*i))),
            Constant::Float(r) => Some(r.clone()),
            _ => None,
        }
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Bool(b) => write!(f, "{}", b),
            Constant::Int(i) => write!(f, "{}", i),
            Constant::Float(r) => match r.to_f64().filter(|v| v.is_finite()) {
                Some(v) => write!(f, "{}", v),
                None => write!(f, "{}", r),
            },
            Constant::String(s) => write!(f, "{:?}", s),
        }
    }
}

/// Parse and fold a standalone constant expression such as `1 << 3 + 2`
pub fn fold(source: &str) -> Result<Constant, PathError> {
    let expr = Parser::new(source)?.parse_constant()?;
    fold_expr(&expr)
}

pub(crate) fn fold_expr(expr: &Expr) -> Result<Constant, PathError> {
    match expr {
        Expr::Int(text) => parse_int(text).map(Constant::Int),
        Expr::Float(text) => parse_float(text),
        Expr::Rune(c) => Ok(Constant::Int(i128::from(u32::from(*c)))),
        Expr::String(s) => Ok(Constant::String(s.clone())),
        Expr::Bool(b) => Ok(Constant::Bool(*b)),
        Expr::Unary(op, operand) => unary(*op, fold_expr(operand)?),
        Expr::Binary(op, left, right) => binary(*op, fold_expr(left)?, fold_expr(right)?),
    }
}

fn parse_int(text: &str) -> Result<i128, PathError> {
    let (digits, radix) = match text.get(..2) {
        Some("0x") => (&text[2..], 16),
        Some("0b") => (&text[2..], 2),
        Some("0o") => (&text[2..], 8),
        _ if text.len() > 1 && text.starts_with('0') => (&text[1..], 8),
        _ => (text, 10),
    };
    if let Some(bad) = digits.chars().find(|c| !c.is_digit(radix)) {
        return Err(PathError::parse(
            0,
            format!("invalid digit {:?} in literal {}", bad, text),
        ));
    }
    i128::from_str_radix(digits, radix)
        .map_err(|_| PathError::overflow(format!("integer constant {} is too large", text)))
}

/// Read a decimal literal `m.f e x` as the exact rational it denotes
fn parse_float(text: &str) -> Result<Constant, PathError> {
    let malformed = || PathError::parse(0, format!("malformed float literal {}", text));
    let too_large = || PathError::overflow(format!("float constant {} is too large", text));

    let lower: String = text
        .chars()
        .filter(|c| *c != '_')
        .map(|c| c.to_ascii_lowercase())
        .collect();
    let (body, exp) = match lower.split_once('e') {
        Some((body, exp)) => {
            let digits = exp.trim_start_matches(['+', '-']);
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return Err(malformed());
            }
            (body, exp.parse::<i64>().map_err(|_| too_large())?)
        }
        None => (lower.as_str(), 0),
    };
    let (int_part, frac_part) = body.split_once('.').unwrap_or((body, ""));
    let digits = format!("{}{}", int_part, frac_part);
    let mantissa = BigInt::parse_bytes(digits.as_bytes(), 10).ok_or_else(malformed)?;
    if mantissa.is_zero() {
        return Ok(Constant::Float(BigRational::zero()));
    }

    let scale = i64::try_from(frac_part.len())
        .ok()
        .and_then(|len| exp.checked_sub(len))
        .ok_or_else(too_large)?;
    if scale.unsigned_abs() > MAX_DECIMAL_EXPONENT {
        return Err(too_large());
    }
    // bounded by MAX_DECIMAL_EXPONENT above
    let power = BigInt::from(10u32).pow(scale.unsigned_abs() as u32);
    let value = if scale >= 0 {
        BigRational::from_integer(mantissa * power)
    } else {
        BigRational::new(mantissa, power)
    };
    float_result(value)
}

fn float_result(value: BigRational) -> Result<Constant, PathError> {
    if value.numer().bits() > MAX_FLOAT_BITS || value.denom().bits() > MAX_FLOAT_BITS {
        return Err(PathError::overflow("float constant overflow"));
    }
    Ok(Constant::Float(value))
}

fn unary(op: UnaryOp, x: Constant) -> Result<Constant, PathError> {
    match (op, x) {
        (UnaryOp::Plus, x) if x.is_numeric() => Ok(x),
        (UnaryOp::Neg, Constant::Int(i)) => i
            .checked_neg()
            .map(Constant::Int)
            .ok_or_else(|| PathError::overflow("integer constant overflow")),
        (UnaryOp::Neg, Constant::Float(r)) => Ok(Constant::Float(-r)),
        (UnaryOp::Not, Constant::Bool(b)) => Ok(Constant::Bool(!b)),
        (UnaryOp::Complement, Constant::Int(i)) => Ok(Constant::Int(!i)),
        (op, x) => Err(PathError::mismatch(format!(
            "operator {} not defined on {} ({})",
            match op {
                UnaryOp::Plus => "+",
                UnaryOp::Neg => "-",
                UnaryOp::Not => "!",
                UnaryOp::Complement => "^",
            },
            x,
            x.kind_name()
        ))),
    }
}

fn binary(op: BinaryOp, x: Constant, y: Constant) -> Result<Constant, PathError> {
    match op {
        BinaryOp::LogicalAnd | BinaryOp::LogicalOr => match (&x, &y) {
            (Constant::Bool(a), Constant::Bool(b)) => Ok(Constant::Bool(if op == BinaryOp::LogicalAnd {
                *a && *b
            } else {
                *a || *b
            })),
            _ => Err(undefined(op, &x, &y)),
        },
        BinaryOp::Eq
        | BinaryOp::Ne
        | BinaryOp::Lt
        | BinaryOp::Le
        | BinaryOp::Gt
        | BinaryOp::Ge => compare(op, &x, &y),
        BinaryOp::Shl | BinaryOp::Shr => shift(op, &x, &y),
        _ => arithmetic(op, x, y),
    }
}

fn undefined(op: BinaryOp, x: &Constant, y: &Constant) -> PathError {
    if std::mem::discriminant(x) == std::mem::discriminant(y) {
        PathError::mismatch(format!(
            "operator {} not defined on {} ({})",
            op.symbol(),
            x,
            x.kind_name()
        ))
    } else {
        PathError::mismatch(format!(
            "mismatched types {} and {} in {} {} {}",
            x.kind_name(),
            y.kind_name(),
            x,
            op.symbol(),
            y
        ))
    }
}

fn compare(op: BinaryOp, x: &Constant, y: &Constant) -> Result<Constant, PathError> {
    let ordering = match (x, y) {
        (Constant::Int(a), Constant::Int(b)) => a.cmp(b),
        (Constant::String(a), Constant::String(b)) => a.cmp(b),
        (Constant::Bool(a), Constant::Bool(b)) => {
            if !matches!(op, BinaryOp::Eq | BinaryOp::Ne) {
                return Err(undefined(op, x, y));
            }
            a.cmp(b)
        }
        _ => match (x.rational(), y.rational()) {
            (Some(a), Some(b)) => a.cmp(&b),
            _ => return Err(undefined(op, x, y)),
        },
    };
    let result = match op {
        BinaryOp::Eq => ordering == Ordering::Equal,
        BinaryOp::Ne => ordering != Ordering::Equal,
        BinaryOp::Lt => ordering == Ordering::Less,
        BinaryOp::Le => ordering != Ordering::Greater,
        BinaryOp::Gt => ordering == Ordering::Greater,
        _ => ordering != Ordering::Less,
    };
    Ok(Constant::Bool(result))
}

fn shift(op: BinaryOp, x: &Constant, y: &Constant) -> Result<Constant, PathError> {
    let count = y.as_integer().ok_or_else(|| {
        PathError::mismatch(format!("invalid shift count {} ({})", y, y.kind_name()))
    })?;
    if count < 0 {
        return Err(PathError::mismatch(format!("negative shift count {}", count)));
    }
    let value = x.as_integer().ok_or_else(|| {
        PathError::mismatch(format!("shifted operand {} must be integer", x))
    })?;

    if op == BinaryOp::Shr {
        let count = count.min(MAX_SHIFT) as u32;
        return Ok(Constant::Int(value >> count));
    }
    if value == 0 {
        return Ok(Constant::Int(0));
    }
    if count > MAX_SHIFT {
        return Err(PathError::overflow(format!("shift count {} too large", count)));
    }
    let shifted = value << count as u32;
    if shifted >> count as u32 != value {
        return Err(PathError::overflow("integer constant overflow"));
    }
    Ok(Constant::Int(shifted))
}

fn arithmetic(op: BinaryOp, x: Constant, y: Constant) -> Result<Constant, PathError> {
    match (&x, &y) {
        (Constant::String(a), Constant::String(b)) if op == BinaryOp::Add => {
            Ok(Constant::String(format!("{}{}", a, b)))
        }
        (Constant::Int(a), Constant::Int(b)) => int_arithmetic(op, *a, *b, &x, &y),
        _ => match (x.rational(), y.rational()) {
            (Some(a), Some(b)) => float_arithmetic(op, a, b, &x, &y),
            _ => Err(undefined(op, &x, &y)),
        },
    }
}

fn int_arithmetic(
    op: BinaryOp,
    a: i128,
    b: i128,
    x: &Constant,
    y: &Constant,
) -> Result<Constant, PathError> {
    if matches!(op, BinaryOp::Div | BinaryOp::Rem) && b == 0 {
        return Err(PathError::DivisionByZero);
    }
    let result = match op {
        BinaryOp::Add => a.checked_add(b),
        BinaryOp::Sub => a.checked_sub(b),
        BinaryOp::Mul => a.checked_mul(b),
        BinaryOp::Div => a.checked_div(b),
        BinaryOp::Rem => a.checked_rem(b),
        BinaryOp::And => Some(a & b),
        BinaryOp::AndNot => Some(a & !b),
        BinaryOp::Or => Some(a | b),
        BinaryOp::Xor => Some(a ^ b),
        _ => return Err(undefined(op, x, y)),
    };
    result
        .map(Constant::Int)
        .ok_or_else(|| PathError::overflow("integer constant overflow"))
}

fn float_arithmetic(
    op: BinaryOp,
    a: BigRational,
    b: BigRational,
    x: &Constant,
    y: &Constant,
) -> Result<Constant, PathError> {
    let value = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => {
            if b.is_zero() {
                return Err(PathError::DivisionByZero);
            }
            a / b
        }
        _ => return Err(undefined(op, x, y)),
    };
    float_result(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(src: &str) -> i128 {
        match fold(src).unwrap() {
            Constant::Int(i) => i,
            other => panic!("{} folded to {:?}", src, other),
        }
    }

    fn ratio(numer: i64, denom: i64) -> Constant {
        Constant::Float(BigRational::new(numer.into(), denom.into()))
    }

    #[test]
    fn test_integer_literals() {
        assert_eq!(int("0x_ff"), 255);
        assert_eq!(int("0o17"), 15);
        assert_eq!(int("017"), 15);
        assert_eq!(int("0b1010"), 10);
        assert_eq!(int("1_000_000"), 1_000_000);
        assert_eq!(int("'a'"), 97);
        assert_eq!(
            int("99999999999999999999999999999"),
            99_999_999_999_999_999_999_999_999_999
        );
    }

    #[test]
    fn test_malformed_integer_literals_are_parse_errors() {
        for src in ["09", "0o8", "1 + 0b102"] {
            let err = fold(src).unwrap_err();
            assert!(matches!(err, PathError::Parse { .. }), "{}: {:?}", src, err);
        }
    }

    #[test]
    fn test_integer_operators() {
        assert_eq!(int("7 / 2"), 3);
        assert_eq!(int("-7 / 2"), -3);
        assert_eq!(int("-7 % 2"), -1);
        assert_eq!(int("1 << 10"), 1024);
        assert_eq!(int("-8 >> 1"), -4);
        assert_eq!(int("^0"), -1);
        assert_eq!(int("6 &^ 3"), 4);
        assert_eq!(int("1 + 2 * 3 - 4"), 3);
        assert_eq!(int("2 * (3 + 4)"), 14);
        assert_eq!(int("1.0 << 2"), 4);
    }

    #[test]
    fn test_overflow_and_division() {
        assert!(matches!(fold("1 << 127"), Err(PathError::ConstantOverflow(_))));
        assert!(matches!(fold("1 << 200"), Err(PathError::ConstantOverflow(_))));
        assert_eq!(fold("0 << 200").unwrap(), Constant::Int(0));
        assert_eq!(fold("1 / 0").unwrap_err(), PathError::DivisionByZero);
        assert_eq!(fold("1.5 / 0").unwrap_err(), PathError::DivisionByZero);
        assert!(matches!(fold("1 << -1"), Err(PathError::TypeMismatch(_))));
        assert!(matches!(fold("1e5000"), Err(PathError::ConstantOverflow(_))));
        assert!(matches!(
            fold("1e99999999999999999999"),
            Err(PathError::ConstantOverflow(_))
        ));
        assert_eq!(fold("1e400 / 1e399").unwrap(), ratio(10, 1));
        assert_eq!(fold("0e99999").unwrap(), ratio(0, 1));
    }

    #[test]
    fn test_float_literals_are_exact() {
        assert_eq!(fold("1.5").unwrap(), ratio(3, 2));
        assert_eq!(fold("0.1").unwrap(), ratio(1, 10));
        assert_eq!(fold("1e10").unwrap(), ratio(10_000_000_000, 1));
        assert_eq!(fold("2.5e-3").unwrap(), ratio(1, 400));
        assert_eq!(fold("1_0.2_5").unwrap(), ratio(41, 4));
    }

    #[test]
    fn test_float_arithmetic_is_exact() {
        assert_eq!(fold("0.1 + 0.2 == 0.3").unwrap(), Constant::Bool(true));
        assert_eq!(fold("0.1 * 3 == 0.3").unwrap(), Constant::Bool(true));
        assert_eq!(fold("1 / 3.0 * 3 == 1").unwrap(), Constant::Bool(true));
        assert_eq!(fold("0.5 + 0.25").unwrap(), ratio(3, 4));
        assert_eq!(fold("-(0.5 - 1)").unwrap(), ratio(1, 2));
        assert_eq!(fold("3 / 2.0").unwrap().as_integer(), None);
        assert_eq!(fold("3 * 2.0").unwrap().as_integer(), Some(6));
        assert!(matches!(fold("1.5 % 1"), Err(PathError::TypeMismatch(_))));
    }

    #[test]
    fn test_machine_float_conversion() {
        assert_eq!(fold("0.75").unwrap().to_f64_exact(), Some(0.75));
        assert_eq!(fold("0.1").unwrap().to_f64_exact(), None);
        assert_eq!(fold("0.1 + 0.2").unwrap().to_f64_exact(), None);
        assert_eq!(fold("1 << 53").unwrap().to_f64_exact(), Some(9007199254740992.0));
        assert_eq!(fold("1 << 53 + 1").unwrap().to_f64_exact(), None);
        assert_eq!(fold("16777216").unwrap().to_f32_exact(), Some(16777216.0));
        assert_eq!(fold("16777217").unwrap().to_f32_exact(), None);
        assert_eq!(fold("1e400").unwrap().to_f64_exact(), None);
        assert_eq!(fold(r#""x""#).unwrap().to_f64_exact(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(fold("0.1 + 0.2").unwrap().to_string(), "0.3");
        assert_eq!(fold("1.5").unwrap().to_string(), "1.5");
        assert_eq!(fold(r#""a""#).unwrap().to_string(), r#""a""#);
    }

    #[test]
    fn test_comparisons_and_logic() {
        assert_eq!(fold("100 > 0").unwrap(), Constant::Bool(true));
        assert_eq!(fold("1 == 1.0").unwrap(), Constant::Bool(true));
        assert_eq!(fold("0.3 < 0.1 + 0.2").unwrap(), Constant::Bool(false));
        assert_eq!(fold(r#""a" < "b""#).unwrap(), Constant::Bool(true));
        assert_eq!(fold("true && !false").unwrap(), Constant::Bool(true));
        assert_eq!(fold("1 < 2 || false").unwrap(), Constant::Bool(true));
        assert!(matches!(fold("true < false"), Err(PathError::TypeMismatch(_))));
        assert!(matches!(fold("1 && true"), Err(PathError::TypeMismatch(_))));
    }

    #[test]
    fn test_strings() {
        assert_eq!(
            fold(r#""ab" + `cd`"#).unwrap(),
            Constant::String("abcd".into())
        );
        assert!(matches!(
            fold(r#""key" + 1"#),
            Err(PathError::TypeMismatch(_))
        ));
        assert!(matches!(fold(r#"-"a""#), Err(PathError::TypeMismatch(_))));
    }
}

//! Navigation expressions over nested runtime values
//!
//! A path such as `Bar.N[0]` or `Tags["env"]` is parsed once into a list of
//! selector and index steps and then evaluated against any number of
//! [`Value`] roots. Index expressions are Go constant expressions, folded
//! at parse time.
//!
//! ```
//! use knife_path::{evaluate, Value};
//! use serde_json::json;
//!
//! let root = Value::from(json!({"Bar": {"N": [100, 200]}}));
//! assert_eq!(evaluate("Bar.N[2-1]", &root).unwrap().to_string(), "200");
//! ```

pub mod error;
pub mod eval;
pub mod fold;
pub mod lexer;
pub mod parser;
pub mod value;

pub use error::PathError;
pub use eval::{evaluate, evaluate_into, Path};
pub use fold::{fold, Constant};
pub use parser::Step;
pub use value::{
    FloatKind, FromValue, IntKind, KeyType, Mapping, Navigable, Record, UintKind, Value,
};

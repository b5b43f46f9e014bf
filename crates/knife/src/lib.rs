//! Template-facing facade over the knife domain model
//!
//! [`Knife`] owns a [`knife_core::Session`] over a type graph and hands each
//! package to a [`Renderer`] as [`TemplateData`]: the package view as the
//! navigation root, plus the primitives of [`TemplateData::func_map`].
//!
//! ```
//! use std::sync::Arc;
//! use knife::{Knife, TemplateData};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> knife::Result<()> {
//! let mut graph = knife::knife_graph::TypeGraph::new();
//! graph.new_package("demo", "example.com/demo");
//!
//! let knife = Knife::new(Arc::new(graph));
//! let renderer = |data: &TemplateData| {
//!     let name = data.func_map().call("at", &[data.root(), "Name".into()])?;
//!     Ok::<_, anyhow::Error>(format!("package {}\n", name))
//! };
//! let out = knife.execute(&knife.packages(), Arc::new(renderer)).await?;
//! assert_eq!(out, "package demo\n");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod driver;
pub mod error;
pub mod funcs;
pub mod telemetry;
pub mod template;
pub mod view;

pub use config::{KnifeConfig, LogConfig};
pub use driver::{Knife, Rendered, Renderer};
pub use error::{KnifeError, Result};
pub use template::{FuncMap, TemplateData, TemplateFunc};
pub use view::{Entity, EntityView, PositionView};

pub use knife_core;
pub use knife_core::knife_graph;
pub use knife_path;

//! Build system for sitepipe
//!
//! Runs the four content pipelines over the fixed `src/` → `dist/` layout.
//!
//! # Overview
//!
//! The build consists of:
//! - **Discovery**: Find the sources of each pipeline using fixed glob patterns
//! - **Execution**: Run each pipeline, turning its outcome into a result
//! - **Composition**: Run all pipelines concurrently and collect results in order
//!
//! # Example
//!
//! ```ignore
//! use sitepipe::build::{BuildContext, ParallelBuild};
//! use sitepipe::config::load_config;
//!
//! let loaded = load_config(None, &std::env::current_dir()?)?;
//! let context = BuildContext::new(loaded.config, loaded.root);
//!
//! let result = ParallelBuild::new(context).run();
//! println!("{}", result.summary());
//! ```

pub mod context;
pub mod discovery;
pub mod kind;
pub mod parallel;
pub mod pipeline;
pub mod result;

pub use context::*;
pub use discovery::*;
pub use kind::*;
pub use parallel::*;
pub use pipeline::*;
pub use result::*;

//! sitepipe - Static site asset pipeline
//!
//! This library provides functionality to:
//! - Resolve HTML includes and minify pages
//! - Compile Sass to prefixed, minified CSS
//! - Concatenate and minify JavaScript
//! - Optimize PNG, JPEG, GIF and SVG images
//! - Serve the output with live reload and rebuild on changes

pub mod build;
pub mod cli;
pub mod config;
pub mod pipelines;
pub mod serve;
pub mod tasks;
pub mod watch;

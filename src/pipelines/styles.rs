//! Style pipeline: Sass, vendor prefixes, minification.

use crate::build::{BuildContext, PipelineKind, PipelineOutput};
use crate::pipelines::{format_size, write_output, PipelineError};
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};
use std::path::Path;

/// Entry stylesheet, relative to `src/scss`.
pub const STYLE_ENTRY: &str = "main.scss";

/// Output stylesheet, relative to `dist/css`.
pub const STYLE_OUTPUT: &str = "production.css";

impl<T: std::fmt::Display> From<lightningcss::error::Error<T>> for PipelineError {
    fn from(e: lightningcss::error::Error<T>) -> Self {
        PipelineError::Css(e.to_string())
    }
}

/// Resolve browserslist queries into prefixing targets.
///
/// `Ok(None)` means the queries matched no browser, in which case no
/// prefixes are added.
pub fn resolve_browsers(queries: &[String]) -> Result<Option<Browsers>, PipelineError> {
    Browsers::from_browserslist(queries.iter()).map_err(|e| PipelineError::Css(e.to_string()))
}

/// Compile a Sass entry file to compressed CSS.
///
/// Partials are looked up relative to the entry's directory.
pub fn compile_sass(entry: &Path) -> Result<String, PipelineError> {
    let load_path = entry.parent().unwrap_or_else(|| Path::new("."));
    let options = grass::Options::default()
        .style(grass::OutputStyle::Compressed)
        .load_path(load_path);

    grass::from_path(entry, &options).map_err(|e| PipelineError::Sass(e.to_string()))
}

/// Add vendor prefixes for `browsers` and minify.
pub fn prefix_and_minify(css: &str, browsers: Option<Browsers>) -> Result<String, PipelineError> {
    let targets = browsers.map(Targets::from).unwrap_or_default();

    let mut sheet = StyleSheet::parse(css, ParserOptions::default())?;
    sheet.minify(MinifyOptions { targets, ..MinifyOptions::default() })?;
    let printed =
        sheet.to_css(PrinterOptions { minify: true, targets, ..PrinterOptions::default() })?;

    Ok(printed.code)
}

/// Build `dist/css/production.css` from `src/scss/main.scss`.
///
/// Nothing is written unless every step succeeds.
pub fn run(ctx: &BuildContext) -> Result<PipelineOutput, PipelineError> {
    let mut output = PipelineOutput::default();
    let entry = ctx.src_dir(PipelineKind::Styles).join(STYLE_ENTRY);
    if !entry.is_file() {
        output.warnings.push(format!("no stylesheet entry at {}", entry.display()));
        return Ok(output);
    }

    let browsers = resolve_browsers(&ctx.config().styles.browsers)?;
    let compiled = compile_sass(&entry)?;
    let css = prefix_and_minify(&compiled, browsers)?;

    let target = ctx.out_dir(PipelineKind::Styles).join(STYLE_OUTPUT);
    write_output(&target, css.as_bytes())?;
    tracing::info!("{} {}", STYLE_OUTPUT, format_size(css.len()));

    output.outputs.push(target);
    Ok(output)
}

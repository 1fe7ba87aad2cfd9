//! Script pipeline: concatenate every source under `src/js`, then minify.
//!
//! The bundle is parsed before it is minified, so automatic semicolon
//! insertion is honored and a bundle that does not parse fails the run
//! instead of being written out mangled.

use crate::build::{discover_sources, BuildContext, PipelineKind, PipelineOutput};
use crate::pipelines::{read_source, write_output, PipelineError};
use minify_js::{Session, TopLevelMode};
use std::path::PathBuf;

/// Output bundle, relative to `dist/js`.
pub const SCRIPT_OUTPUT: &str = "production.js";

/// Concatenate sources in order, separated by newlines.
pub fn concat(sources: &[PathBuf]) -> Result<String, PipelineError> {
    let parts = sources.iter().map(|path| read_source(path)).collect::<Result<Vec<_>, _>>()?;
    Ok(parts.join("\n"))
}

/// Minify a JavaScript bundle.
///
/// Top-level names are kept; pages reference the bundle's globals.
pub fn minify(source: &str) -> Result<String, PipelineError> {
    let session = Session::new();
    let mut out = Vec::new();
    minify_js::minify(&session, TopLevelMode::Global, source.as_bytes(), &mut out)
        .map_err(|e| PipelineError::Script(format!("{:?}", e)))?;
    String::from_utf8(out).map_err(|e| PipelineError::Script(e.to_string()))
}

/// Bundle and minify every script into `dist/js/production.js`.
///
/// Without sources nothing is written.
pub fn run(ctx: &BuildContext) -> Result<PipelineOutput, PipelineError> {
    let sources = discover_sources(ctx, PipelineKind::Scripts)?;
    let mut output = PipelineOutput::default();
    if sources.is_empty() {
        return Ok(output);
    }

    let bundle = minify(&concat(&sources)?)?;
    let target = ctx.out_dir(PipelineKind::Scripts).join(SCRIPT_OUTPUT);
    write_output(&target, bundle.as_bytes())?;
    tracing::debug!("bundled {} script(s) into {}", sources.len(), target.display());

    output.outputs.push(target);
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_concat_order_and_separator() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "a.js", "var a = 1;");
        write(temp.path(), "b.js", "var b = 2;");

        let out = concat(&[temp.path().join("a.js"), temp.path().join("b.js")]).unwrap();
        assert_eq!(out, "var a = 1;\nvar b = 2;");
    }

    #[test]
    fn test_minify_strips_comments_and_whitespace() {
        let source = "// greeting\nfunction hello( name ) {\n    return 'hi ' + name;\n}\n";
        let out = minify(source).unwrap();
        assert!(!out.contains("greeting"));
        assert!(out.len() < source.len(), "got {}", out);
        assert!(out.contains("function hello("), "got {}", out);
    }

    #[test]
    fn test_minify_statements_without_semicolons() {
        let out = minify("var a = 1\nvar b = 2\nconsole.log(a + b)\n").unwrap();
        assert!(!out.contains("1var"), "got {}", out);
        assert!(!out.contains("2console"), "got {}", out);
        assert!(out.contains("console.log("), "got {}", out);
    }

    #[test]
    fn test_minify_return_before_line_break() {
        let out = minify("function f() {\n  return\n  42\n}\n").unwrap();
        assert!(!out.contains("return 42"), "got {}", out);
    }

    #[test]
    fn test_minify_rejects_invalid_source() {
        assert!(matches!(minify("function ( {"), Err(PipelineError::Script(_))));
    }

    #[test]
    fn test_run_with_syntax_error_keeps_previous_bundle() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "src/js/app.js", "var ok = 1;");
        let ctx = BuildContext::new(SiteConfig::default(), temp.path().to_path_buf());
        run(&ctx).unwrap();
        let bundle = temp.path().join("dist/js/production.js");
        let before = fs::read_to_string(&bundle).unwrap();

        write(temp.path(), "src/js/app.js", "var broken = ;");
        assert!(matches!(run(&ctx), Err(PipelineError::Script(_))));
        assert_eq!(fs::read_to_string(&bundle).unwrap(), before);
    }

    #[test]
    fn test_run_bundles_sorted_sources() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "src/js/b.js", "var second = 2;");
        write(temp.path(), "src/js/a.js", "var first = 1;");
        write(temp.path(), "src/js/lib/z.js", "var third = 3;");

        let ctx = BuildContext::new(SiteConfig::default(), temp.path().to_path_buf());
        let output = run(&ctx).unwrap();
        assert_eq!(output.outputs.len(), 1);

        let bundle = fs::read_to_string(temp.path().join("dist/js/production.js")).unwrap();
        let first = bundle.find("first").unwrap();
        let second = bundle.find("second").unwrap();
        let third = bundle.find("third").unwrap();
        assert!(first < second && second < third);
    }

    #[test]
    fn test_run_without_sources_writes_nothing() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("src/js")).unwrap();

        let ctx = BuildContext::new(SiteConfig::default(), temp.path().to_path_buf());
        let output = run(&ctx).unwrap();
        assert!(output.outputs.is_empty());
        assert!(!temp.path().join("dist/js/production.js").exists());
    }
}

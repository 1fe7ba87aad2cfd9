//! HTML pipeline: include resolution followed by markup minification.
//!
//! The minifier is a conservative tag scanner. It rewrites start tags
//! (dropping redundant, empty and default-typed attributes) and the raw
//! bodies of `<script>` and `<style>` elements. Text, comments and
//! whitespace between tags pass through unchanged.

use crate::build::{discover_sources, BuildContext, FileError, PipelineKind, PipelineOutput};
use crate::pipelines::include::IncludeResolver;
use crate::pipelines::{static_regex, styles, write_output, PipelineError};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

static START_TAG: OnceLock<Regex> = OnceLock::new();
static ATTRIBUTE: OnceLock<Regex> = OnceLock::new();

const START_TAG_PATTERN: &str = r#"^<([A-Za-z][A-Za-z0-9:-]*)((?:\s+[^\s"'>/=]+(?:\s*=\s*(?:"[^"]*"|'[^']*'|[^\s"'=<>`]+))?)*)\s*(/?)>"#;
const ATTRIBUTE_PATTERN: &str = r#"([^\s"'>/=]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#;

/// Attributes dropped when empty, regardless of element.
const EMPTY_REMOVABLE: [&str; 6] = ["class", "id", "style", "title", "lang", "dir"];

/// `type` values that mark a script as plain JavaScript.
const JS_MIME_TYPES: [&str; 8] = [
    "text/javascript",
    "application/javascript",
    "application/x-javascript",
    "text/ecmascript",
    "application/ecmascript",
    "text/jscript",
    "text/livescript",
    "",
];

/// An attribute as written in a start tag.
struct Attribute<'a> {
    raw: &'a str,
    name: &'a str,
    value: Option<&'a str>,
}

/// Minifies HTML markup.
#[derive(Debug, Clone, Copy)]
pub struct HtmlMinifier {
    minify_css: bool,
}

impl Default for HtmlMinifier {
    fn default() -> Self {
        Self::new(true)
    }
}

impl HtmlMinifier {
    /// Create a minifier; `minify_css` controls `<style>` body minification.
    pub fn new(minify_css: bool) -> Self {
        Self { minify_css }
    }

    /// Minify a complete HTML document.
    pub fn minify(&self, html: &str) -> String {
        let start_tag = static_regex(&START_TAG, START_TAG_PATTERN);
        let mut out = String::with_capacity(html.len());
        let mut pos = 0;

        while let Some(offset) = html[pos..].find('<') {
            let tag_start = pos + offset;
            out.push_str(&html[pos..tag_start]);
            let rest = &html[tag_start..];

            if rest.starts_with("<!--") {
                let end = rest.find("-->").map(|i| i + 3).unwrap_or(rest.len());
                out.push_str(&rest[..end]);
                pos = tag_start + end;
                continue;
            }

            let Some(caps) = start_tag.captures(rest) else {
                out.push('<');
                pos = tag_start + 1;
                continue;
            };

            let whole = caps.get(0).map_or("", |m| m.as_str());
            let name = caps.get(1).map_or("", |m| m.as_str());
            let attrs = caps.get(2).map_or("", |m| m.as_str());
            let self_closing = caps.get(3).is_some_and(|m| !m.as_str().is_empty());

            out.push_str(&self.rewrite_tag(name, attrs, self_closing));
            pos = tag_start + whole.len();

            let raw_kind = if name.eq_ignore_ascii_case("script") {
                Some("script")
            } else if name.eq_ignore_ascii_case("style") {
                Some("style")
            } else {
                None
            };

            if let (Some(raw), false) = (raw_kind, self_closing) {
                let body_end = find_closing_tag(&html[pos..], raw)
                    .map(|i| pos + i)
                    .unwrap_or(html.len());
                out.push_str(&self.rewrite_raw_body(raw, &html[pos..body_end]));
                pos = body_end;
            }
        }

        out.push_str(&html[pos..]);
        out
    }

    fn rewrite_tag(&self, name: &str, attrs: &str, self_closing: bool) -> String {
        let parsed = parse_attributes(attrs);
        let tag = name.to_ascii_lowercase();
        let has_src = parsed.iter().any(|a| a.name.eq_ignore_ascii_case("src"));

        let mut out = format!("<{}", name);
        for attr in &parsed {
            if is_removable(&tag, attr, has_src) {
                continue;
            }
            out.push(' ');
            out.push_str(attr.raw);
        }
        if self_closing {
            out.push('/');
        }
        out.push('>');
        out
    }

    fn rewrite_raw_body(&self, kind: &str, body: &str) -> String {
        let body = strip_comment_wrapper(body);
        if kind != "style" || !self.minify_css || body.trim().is_empty() {
            return body.to_string();
        }

        match styles::prefix_and_minify(body, None) {
            Ok(css) => css,
            Err(e) => {
                tracing::debug!("keeping <style> block as written: {}", e);
                body.to_string()
            }
        }
    }
}

fn parse_attributes(attrs: &str) -> Vec<Attribute<'_>> {
    static_regex(&ATTRIBUTE, ATTRIBUTE_PATTERN)
        .captures_iter(attrs)
        .filter_map(|caps| {
            let raw = caps.get(0)?.as_str();
            let name = caps.get(1)?.as_str();
            let value =
                caps.get(2).or_else(|| caps.get(3)).or_else(|| caps.get(4)).map(|m| m.as_str());
            Some(Attribute { raw, name, value })
        })
        .collect()
}

fn is_removable(tag: &str, attr: &Attribute<'_>, has_src: bool) -> bool {
    let name = attr.name.to_ascii_lowercase();
    let value = attr.value.map(str::trim).unwrap_or("");
    let is_empty = value.is_empty();

    if is_empty && (EMPTY_REMOVABLE.contains(&name.as_str()) || name.starts_with("on")) {
        return true;
    }

    match (tag, name.as_str()) {
        ("input", "value") => is_empty && attr.value.is_some(),
        ("script", "language") => value.eq_ignore_ascii_case("javascript"),
        ("script", "charset") => !has_src,
        ("script", "type") => is_js_mime_type(value),
        ("form", "method") => value.eq_ignore_ascii_case("get"),
        ("input", "type") => value.eq_ignore_ascii_case("text"),
        ("area", "shape") => value.eq_ignore_ascii_case("rect"),
        ("style", "type") | ("link", "type") => value.eq_ignore_ascii_case("text/css"),
        _ => false,
    }
}

fn is_js_mime_type(value: &str) -> bool {
    let essence = value.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
    JS_MIME_TYPES.contains(&essence.as_str())
}

/// Byte offset of `</name` in `rest`, matched case-insensitively.
fn find_closing_tag(rest: &str, name: &str) -> Option<usize> {
    let needle = format!("</{}", name);
    rest.to_ascii_lowercase().find(&needle)
}

/// Remove a `<!-- ... -->` wrapper around a script or style body.
fn strip_comment_wrapper(body: &str) -> &str {
    let trimmed = body.trim();
    let Some(inner) = trimmed.strip_prefix("<!--") else {
        return body;
    };
    let Some(inner) = inner.strip_suffix("-->") else {
        return body;
    };
    let inner = inner.trim_end();
    inner.strip_suffix("//").unwrap_or(inner).trim()
}

/// Resolve includes in a page and minify the result.
pub fn render_page(
    resolver: &IncludeResolver,
    minifier: &HtmlMinifier,
    page: &Path,
) -> Result<String, PipelineError> {
    let expanded = resolver.resolve_file(page)?;
    Ok(minifier.minify(&expanded))
}

/// Render every top-level page of `src/html` into `dist`.
///
/// Each page fails independently; failures are collected as [`FileError`]s.
pub fn run(ctx: &BuildContext) -> Result<PipelineOutput, PipelineError> {
    let sources = discover_sources(ctx, PipelineKind::Html)?;
    let config = &ctx.config().html;
    let resolver =
        IncludeResolver::new(ctx.src_dir(PipelineKind::Html), config.include_prefix.clone());
    let minifier = HtmlMinifier::new(config.minify_css);
    let out_dir = ctx.out_dir(PipelineKind::Html);

    let mut output = PipelineOutput::default();
    for source in sources {
        let Some(file_name) = source.file_name() else {
            continue;
        };
        let target = out_dir.join(file_name);

        let rendered = render_page(&resolver, &minifier, &source)
            .and_then(|page| write_output(&target, page.as_bytes()));
        match rendered {
            Ok(()) => {
                tracing::debug!("rendered {} -> {}", source.display(), target.display());
                output.outputs.push(target);
            }
            Err(e) => output.errors.push(FileError::new(&source, e.to_string())),
        }
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use std::fs;
    use tempfile::TempDir;

    fn minify(html: &str) -> String {
        HtmlMinifier::new(true).minify(html)
    }

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_text_and_comments_preserved() {
        let html = "<p>Hello,   world</p>\n<!-- note -->\n<div>a < b</div>";
        assert_eq!(minify(html), html);
    }

    #[test]
    fn test_redundant_attributes_removed() {
        assert_eq!(
            minify(r#"<form method="get" action="/s"><input type="text" name="q"></form>"#),
            r#"<form action="/s"><input name="q"></form>"#
        );
        assert_eq!(minify(r#"<area shape="rect" href="/">"#), r#"<area href="/">"#);
        assert_eq!(
            minify(r#"<script language="javascript" charset="utf-8">x()</script>"#),
            "<script>x()</script>"
        );
        assert_eq!(
            minify(r#"<script charset="utf-8" src="a.js"></script>"#),
            r#"<script charset="utf-8" src="a.js"></script>"#
        );
    }

    #[test]
    fn test_empty_attributes_removed() {
        assert_eq!(
            minify(r#"<div class="" id=" " title='' onclick="" data-x="">x</div>"#),
            r#"<div data-x="">x</div>"#
        );
        assert_eq!(minify(r#"<input value="" name="a">"#), r#"<input name="a">"#);
    }

    #[test]
    fn test_default_type_attributes_removed() {
        assert_eq!(
            minify(r#"<script type="text/javascript">go()</script>"#),
            "<script>go()</script>"
        );
        assert_eq!(
            minify(r#"<script type="module">go()</script>"#),
            r#"<script type="module">go()</script>"#
        );
        assert_eq!(
            minify(r#"<link rel="stylesheet" type="text/css" href="a.css">"#),
            r#"<link rel="stylesheet" href="a.css">"#
        );
    }

    #[test]
    fn test_case_preserved() {
        assert_eq!(minify(r#"<DIV Class="A" class="">x</DIV>"#), r#"<DIV Class="A">x</DIV>"#);
    }

    #[test]
    fn test_self_closing_tag() {
        assert_eq!(
            minify(r#"<br   /><img src="a.png" alt="" />"#),
            r#"<br/><img src="a.png" alt=""/>"#
        );
    }

    #[test]
    fn test_script_comment_wrapper_removed() {
        assert_eq!(
            minify("<script>\n<!--\nrun();\n//-->\n</script>"),
            "<script>run();</script>"
        );
    }

    #[test]
    fn test_script_body_not_scanned_as_markup() {
        let html = r#"<script>if (a<b) { s = "<div class=''>"; }</script>"#;
        assert_eq!(minify(html), html);
    }

    #[test]
    fn test_style_body_minified() {
        let out = minify("<style type=\"text/css\">\n  a {\n    color: #ff0000;\n  }\n</style>");
        assert_eq!(out, "<style>a{color:red}</style>");
    }

    #[test]
    fn test_style_body_kept_when_css_minify_disabled() {
        let out = HtmlMinifier::new(false).minify("<style>a { color: red; }</style>");
        assert_eq!(out, "<style>a { color: red; }</style>");
    }

    #[test]
    fn test_unterminated_comment() {
        assert_eq!(minify("<p>x</p><!-- open"), "<p>x</p><!-- open");
    }

    #[test]
    fn test_run_writes_one_file_per_page() {
        let temp = TempDir::new().unwrap();
        write(
            temp.path(),
            "src/html/index.html",
            "<body class=\"\">@@include('partials/nav.html', {\"active\": \"home\"})</body>",
        );
        write(temp.path(), "src/html/about.html", "<p>About</p>");
        write(temp.path(), "src/html/partials/nav.html", "<nav>@@active</nav>");

        let ctx = BuildContext::new(SiteConfig::default(), temp.path().to_path_buf());
        let output = run(&ctx).unwrap();

        assert!(output.errors.is_empty());
        assert_eq!(output.outputs.len(), 2);
        let index = fs::read_to_string(temp.path().join("dist/index.html")).unwrap();
        assert_eq!(index, "<body><nav>home</nav></body>");
        assert!(!temp.path().join("dist/partials").exists());
    }

    #[test]
    fn test_run_failing_page_does_not_stop_others() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "src/html/broken.html", "@@include('missing.html')");
        write(temp.path(), "src/html/ok.html", "<p>ok</p>");

        let ctx = BuildContext::new(SiteConfig::default(), temp.path().to_path_buf());
        let output = run(&ctx).unwrap();

        assert_eq!(output.errors.len(), 1);
        assert!(output.errors[0].file.ends_with("broken.html"));
        assert!(temp.path().join("dist/ok.html").exists());
        assert!(!temp.path().join("dist/broken.html").exists());
    }
}

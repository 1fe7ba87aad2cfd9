//! HTML include resolution
//!
//! Supports the `@@include('path')` and `@@include('path', { "key": value })`
//! directives. Paths are resolved relative to a fixed base directory, included
//! files may include further files, and `@@key` placeholders inside an included
//! file are replaced with values from the directive's JSON context.
//!
//! The `@@` prefix is configurable.

use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error type for include resolution failures.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum IncludeError {
    /// Circular include detected
    #[error("Circular include detected: {}", .0.display())]
    CircularInclude(PathBuf),
    /// File not found
    #[error("Include file not found '{}': {1}", .0.display())]
    FileNotFound(PathBuf, String),
    /// IO error reading file
    #[error("Error reading include file '{}': {1}", .0.display())]
    IoError(PathBuf, String),
    /// Malformed include directive
    #[error("Malformed include directive in '{}': {1}", .0.display())]
    Syntax(PathBuf, String),
}

/// A parsed `include(...)` call.
#[derive(Debug, Clone, PartialEq)]
struct Directive {
    /// Path argument as written
    path: String,
    /// Optional JSON context object
    context: Map<String, Value>,
    /// Bytes consumed after the `<prefix>include` keyword
    consumed: usize,
}

/// Resolves include directives against a base directory.
#[derive(Debug, Clone)]
pub struct IncludeResolver {
    base: PathBuf,
    prefix: String,
}

impl IncludeResolver {
    /// Create a resolver for `base` using `prefix` (e.g. `@@`).
    pub fn new(base: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self { base: base.into(), prefix: prefix.into() }
    }

    /// Read a page and resolve every include directive in it.
    pub fn resolve_file(&self, page: &Path) -> Result<String, IncludeError> {
        let canonical = page
            .canonicalize()
            .map_err(|e| IncludeError::FileNotFound(page.to_path_buf(), e.to_string()))?;
        let source = fs::read_to_string(&canonical)
            .map_err(|e| IncludeError::IoError(canonical.clone(), e.to_string()))?;

        let mut stack = vec![canonical.clone()];
        self.expand(&source, &canonical, &Map::new(), &mut stack)
    }


    fn expand(
        &self,
        source: &str,
        origin: &Path,
        context: &Map<String, Value>,
        stack: &mut Vec<PathBuf>,
    ) -> Result<String, IncludeError> {
        let keyword = format!("{}include", self.prefix);
        let mut out = String::with_capacity(source.len());
        let mut rest = source;

        while let Some(pos) = rest.find(&keyword) {
            out.push_str(&rest[..pos]);
            let after = &rest[pos + keyword.len()..];

            match parse_directive(after)
                .map_err(|msg| IncludeError::Syntax(origin.to_path_buf(), msg))?
            {
                Some(directive) => {
                    let included = self.include(&directive, context, stack)?;
                    out.push_str(&included);
                    rest = &after[directive.consumed..];
                }
                None => {
                    out.push_str(&keyword);
                    rest = after;
                }
            }
        }

        out.push_str(rest);
        Ok(out)
    }

    fn include(
        &self,
        directive: &Directive,
        outer: &Map<String, Value>,
        stack: &mut Vec<PathBuf>,
    ) -> Result<String, IncludeError> {
        let resolved = self.base.join(&directive.path);
        let canonical = resolved
            .canonicalize()
            .map_err(|e| IncludeError::FileNotFound(resolved.clone(), e.to_string()))?;

        if stack.contains(&canonical) {
            return Err(IncludeError::CircularInclude(canonical));
        }

        let content = fs::read_to_string(&canonical)
            .map_err(|e| IncludeError::IoError(canonical.clone(), e.to_string()))?;

        let mut context = outer.clone();
        context.extend(directive.context.clone());
        let content = substitute_variables(&content, &self.prefix, &context);

        stack.push(canonical.clone());
        let expanded = self.expand(&content, &canonical, &context, stack);
        stack.pop();
        expanded
    }
}

/// Replace `<prefix>key` placeholders with values from `context`.
///
/// Nested objects are addressed with dotted keys (`@@page.title`). Strings are
/// inserted raw, other values as JSON text. Longer keys are replaced first so
/// `@@title` never clobbers `@@titleSuffix`.
pub fn substitute_variables(content: &str, prefix: &str, context: &Map<String, Value>) -> String {
    let mut vars = Vec::new();
    flatten_context(context, "", &mut vars);
    vars.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));

    let mut result = content.to_string();
    for (key, value) in vars {
        let placeholder = format!("{}{}", prefix, key);
        if result.contains(&placeholder) {
            result = result.replace(&placeholder, &value);
        }
    }
    result
}

fn flatten_context(map: &Map<String, Value>, parent: &str, out: &mut Vec<(String, String)>) {
    for (key, value) in map {
        let name = if parent.is_empty() { key.clone() } else { format!("{}.{}", parent, key) };
        match value {
            Value::Object(inner) => flatten_context(inner, &name, out),
            Value::String(s) => out.push((name, s.clone())),
            other => out.push((name, other.to_string())),
        }
    }
}

fn skip_whitespace(s: &str, mut i: usize) -> usize {
    let bytes = s.as_bytes();
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    i
}

/// Parse the argument list following the include keyword.
///
/// Returns `Ok(None)` when the keyword is not followed by `(`, so that prose
/// mentioning the keyword is left alone.
fn parse_directive(after: &str) -> Result<Option<Directive>, String> {
    let bytes = after.as_bytes();
    let mut i = skip_whitespace(after, 0);
    if bytes.get(i) != Some(&b'(') {
        return Ok(None);
    }
    i = skip_whitespace(after, i + 1);

    let quote = match bytes.get(i) {
        Some(&q) if q == b'\'' || q == b'"' => q,
        _ => return Err("expected a quoted path".to_string()),
    };
    let path_start = i + 1;
    let path_len = after[path_start..]
        .find(quote as char)
        .ok_or_else(|| "unterminated path string".to_string())?;
    let path = after[path_start..path_start + path_len].to_string();
    if path.trim().is_empty() {
        return Err("empty include path".to_string());
    }
    i = skip_whitespace(after, path_start + path_len + 1);

    let mut context = Map::new();
    if bytes.get(i) == Some(&b',') {
        i = skip_whitespace(after, i + 1);
        let mut stream = serde_json::Deserializer::from_str(&after[i..]).into_iter::<Value>();
        match stream.next() {
            Some(Ok(Value::Object(map))) => context = map,
            Some(Ok(_)) => return Err("include context must be a JSON object".to_string()),
            Some(Err(e)) => return Err(format!("invalid include context: {}", e)),
            None => return Err("missing include context".to_string()),
        }
        i = skip_whitespace(after, i + stream.byte_offset());
    }

    if bytes.get(i) != Some(&b')') {
        return Err(format!("expected ')' after include of '{}'", path));
    }

    Ok(Some(Directive { path, context, consumed: i + 1 }))
}

// ABOUTME: Outer structured-document handling: arrow-literal preprocessing, decode, includes, merge

use crate::ast::{Block, FunctionDescriptor};
use crate::class::{ClassDescriptor, ClassRegistry};
use crate::error::{HplError, Position};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// One entry of the document's `imports` list: a bare module name, or a
/// single-key `MODULE: ALIAS` mapping.
#[derive(Debug, Clone)]
pub struct ImportSpec {
    pub module: String,
    pub alias: Option<String>,
}

/// One argument of a `call` directive, resolved greedily per §4.2: integer,
/// then float, then quoted string, else a name looked up at evaluation
/// time.
#[derive(Debug, Clone)]
pub enum CallArg {
    Int(i64),
    Float(f64),
    Str(String),
    Name(String),
}

#[derive(Debug, Clone)]
pub struct CallDirective {
    pub name: String,
    pub args: Vec<CallArg>,
}

/// Everything the evaluator needs to run a program, assembled from the
/// document's `classes`, `objects`, top-level functions, `imports`, and
/// `call` directive, with `includes` already resolved and merged in.
#[derive(Default)]
pub struct ParsedEnvironment {
    pub classes: ClassRegistry,
    /// Declared `objects`: name -> constructor class name.
    pub objects: HashMap<String, String>,
    pub functions: HashMap<String, Rc<FunctionDescriptor>>,
    pub imports: Vec<ImportSpec>,
    pub call: Option<CallDirective>,
}

impl ParsedEnvironment {
    /// Unions `included` into `self`, per §4.2: class/object maps merge
    /// key-by-key with `self`'s own (already-declared) keys winning;
    /// top-level function names present only in the include are imported;
    /// `imports` lists are concatenated. The include's own `call` directive,
    /// if any, is not inherited — only the outermost document's applies.
    fn merge_include(&mut self, included: ParsedEnvironment) {
        for (name, class) in included.classes.iter() {
            if !self.classes.contains(name) {
                self.classes.define_rc(class.clone());
            }
        }
        for (name, class_name) in included.objects {
            self.objects.entry(name).or_insert(class_name);
        }
        for (name, func) in included.functions {
            self.functions.entry(name).or_insert(func);
        }
        self.imports.extend(included.imports);
    }
}

/// Loads and evaluates-ready-parses the document at `path`, recursively
/// resolving `includes` against `search_path` (the module search path, the
/// last of the four resolution steps in §4.2).
pub fn load_document(path: &Path, search_path: &[PathBuf]) -> Result<ParsedEnvironment, HplError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        HplError::value(
            "document",
            format!("failed to read '{}': {e}", path.display()),
            Position::unknown(),
        )
    })?;
    let base_dir = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    load_document_str(&content, &base_dir, search_path)
}

pub(crate) fn load_document_str(
    content: &str,
    base_dir: &Path,
    search_path: &[PathBuf],
) -> Result<ParsedEnvironment, HplError> {
    let rewritten = preprocess_arrow_literals(content)?;
    let value: serde_json::Value = serde_json::from_str(&rewritten).map_err(|e| {
        HplError::syntactic("a well-formed document", format!("parse error: {e}"), 0, 0)
    })?;
    let map = value.as_object().ok_or_else(|| {
        HplError::syntactic("a mapping document", "a non-mapping document", 0, 0)
    })?;

    let mut env = ParsedEnvironment::default();

    if let Some(classes) = map.get("classes").and_then(|v| v.as_object()) {
        for (class_name, members) in classes {
            let members_map = members.as_object().ok_or_else(|| {
                HplError::syntactic(
                    "a class member mapping",
                    format!("non-mapping value for class '{class_name}'"),
                    0,
                    0,
                )
            })?;
            let parent = members_map
                .get("parent")
                .and_then(|v| v.as_str())
                .map(String::from);
            let mut class = ClassDescriptor::new(class_name.clone(), parent);
            for (member_name, member_val) in members_map {
                if member_name == "parent" {
                    continue;
                }
                let body_str = member_val.as_str().ok_or_else(|| {
                    HplError::syntactic(
                        "an arrow-function body string",
                        format!("non-string method '{class_name}.{member_name}'"),
                        0,
                        0,
                    )
                })?;
                let (params, body) = parse_arrow_literal(body_str)?;
                class.methods.insert(
                    member_name.clone(),
                    Rc::new(FunctionDescriptor {
                        name: member_name.clone(),
                        params,
                        body: Rc::new(body),
                    }),
                );
            }
            env.classes.define(class);
        }
    }

    if let Some(objects) = map.get("objects").and_then(|v| v.as_object()) {
        for (name, ctor) in objects {
            let ctor_str = ctor.as_str().ok_or_else(|| {
                HplError::syntactic(
                    "a constructor string",
                    format!("non-string object '{name}'"),
                    0,
                    0,
                )
            })?;
            let class_name = ctor_str.split('(').next().unwrap_or(ctor_str).trim();
            env.objects.insert(name.clone(), class_name.to_string());
        }
    }

    if let Some(imports) = map.get("imports").and_then(|v| v.as_array()) {
        for entry in imports {
            env.imports.push(parse_import_entry(entry)?);
        }
    }

    if let Some(call) = map.get("call").and_then(|v| v.as_str()) {
        env.call = Some(parse_call_directive(call)?);
    }

    let reserved = ["includes", "imports", "classes", "objects", "call"];
    for (key, val) in map {
        if reserved.contains(&key.as_str()) {
            continue;
        }
        if let Some(s) = val.as_str() {
            if s.contains("=>") {
                let (params, body) = parse_arrow_literal(s)?;
                env.functions.insert(
                    key.clone(),
                    Rc::new(FunctionDescriptor {
                        name: key.clone(),
                        params,
                        body: Rc::new(body),
                    }),
                );
            }
        }
    }

    if let Some(includes) = map.get("includes").and_then(|v| v.as_array()) {
        for inc in includes {
            let Some(path_str) = inc.as_str() else {
                continue;
            };
            match resolve_include_path(path_str, base_dir, search_path) {
                Some(resolved) => match load_document(&resolved, search_path) {
                    Ok(included) => env.merge_include(included),
                    Err(e) => tracing::warn!(include = path_str, error = %e, "failed to load include"),
                },
                None => tracing::warn!(include = path_str, "include not found on any resolution path"),
            }
        }
    }

    Ok(env)
}

fn parse_import_entry(value: &serde_json::Value) -> Result<ImportSpec, HplError> {
    if let Some(name) = value.as_str() {
        return Ok(ImportSpec {
            module: name.to_string(),
            alias: None,
        });
    }
    if let Some(map) = value.as_object() {
        if let Some((module, alias_val)) = map.iter().next() {
            let alias = alias_val.as_str().map(String::from);
            return Ok(ImportSpec {
                module: module.clone(),
                alias,
            });
        }
    }
    Err(HplError::syntactic(
        "a module name or single-key alias mapping",
        "a malformed imports entry",
        0,
        0,
    ))
}

/// Parses `NAME` or `NAME(arg1, arg2, …)` per §4.2.
pub fn parse_call_directive(src: &str) -> Result<CallDirective, HplError> {
    let src = src.trim();
    let Some(open) = src.find('(') else {
        return Ok(CallDirective {
            name: src.to_string(),
            args: Vec::new(),
        });
    };
    if !src.ends_with(')') {
        return Err(HplError::syntactic("')'", "end of call directive", 0, 0));
    }
    let name = src[..open].trim().to_string();
    let inner = &src[open + 1..src.len() - 1];
    let parts = split_top_level_commas(inner);
    let args = parts
        .iter()
        .map(|raw| parse_call_arg(raw.trim()))
        .collect();
    Ok(CallDirective { name, args })
}

fn parse_call_arg(raw: &str) -> CallArg {
    if let Ok(n) = raw.parse::<i64>() {
        return CallArg::Int(n);
    }
    if let Ok(n) = raw.parse::<f64>() {
        return CallArg::Float(n);
    }
    if raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"') {
        return CallArg::Str(raw[1..raw.len() - 1].to_string());
    }
    CallArg::Name(raw.to_string())
}

fn split_top_level_commas(src: &str) -> Vec<String> {
    if src.trim().is_empty() {
        return Vec::new();
    }
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_string = false;
    let mut chars = src.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' => {
                in_string = !in_string;
                current.push(c);
            }
            ',' if !in_string => {
                parts.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    parts.push(current);
    parts
}

/// Resolves one `includes` entry per §4.2's four-step order: absolute path,
/// then relative to the including file's directory, then relative to the
/// process working directory, then each module search path entry.
fn resolve_include_path(
    path_str: &str,
    base_dir: &Path,
    search_path: &[PathBuf],
) -> Option<PathBuf> {
    let candidate = PathBuf::from(path_str);
    if candidate.is_absolute() && candidate.is_file() {
        return Some(candidate);
    }
    let relative_to_base = base_dir.join(path_str);
    if relative_to_base.is_file() {
        return Some(relative_to_base);
    }
    if let Ok(cwd) = std::env::current_dir() {
        let relative_to_cwd = cwd.join(path_str);
        if relative_to_cwd.is_file() {
            return Some(relative_to_cwd);
        }
    }
    search_path
        .iter()
        .map(|dir| dir.join(path_str))
        .find(|candidate| candidate.is_file())
}

/// Parses an already-extracted arrow-function literal of the form
/// `(param1, param2, …) => { body }` into its parameter names and parsed
/// body block.
pub fn parse_arrow_literal(src: &str) -> Result<(Vec<String>, Block), HplError> {
    let src = src.trim();
    if !src.starts_with('(') {
        return Err(HplError::syntactic("'('", "arrow-function body", 0, 0));
    }
    let close_paren = find_matching_paren(src, 0)?;
    let params_str = &src[1..close_paren];
    let params: Vec<String> = if params_str.trim().is_empty() {
        Vec::new()
    } else {
        params_str.split(',').map(|s| s.trim().to_string()).collect()
    };

    let rest = src[close_paren + 1..].trim_start();
    let rest = rest
        .strip_prefix("=>")
        .ok_or_else(|| HplError::syntactic("'=>'", "arrow-function body", 0, 0))?
        .trim_start();
    let open_brace = rest
        .find('{')
        .ok_or_else(|| HplError::syntactic("'{'", "arrow-function body", 0, 0))?;
    let close_brace = find_matching_brace(rest, open_brace)?;
    let body_src = &rest[open_brace + 1..close_brace];
    let body = crate::parser::parse_body(body_src)?;
    Ok((params, body))
}

fn find_matching_paren(src: &str, open_idx: usize) -> Result<usize, HplError> {
    let bytes = src.as_bytes();
    let mut depth = 0i32;
    for (i, &b) in bytes.iter().enumerate().skip(open_idx) {
        match b {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(i);
                }
            }
            _ => {}
        }
    }
    Err(HplError::syntactic("matching ')'", "end of input", 0, 0))
}

fn find_matching_brace(src: &str, open_idx: usize) -> Result<usize, HplError> {
    let bytes = src.as_bytes();
    let mut depth = 0i32;
    let mut in_string = false;
    let mut in_comment = false;
    let mut i = open_idx;
    while i < bytes.len() {
        let b = bytes[i];
        if in_comment {
            if b == b'\n' {
                in_comment = false;
            }
            i += 1;
            continue;
        }
        if in_string {
            match b {
                b'\\' => i += 1,
                b'"' => in_string = false,
                _ => {}
            }
            i += 1;
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'#' => in_comment = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    Err(HplError::syntactic("matching '}'", "end of input", 0, 0))
}

/// Rewrites every bare `KEY: (params) => { body }` arrow-function literal
/// in `src` into a quoted JSON string literal, so the result can be decoded
/// with an ordinary JSON parser even though arrow bodies contain unescaped
/// braces and quotes. Per §9's open question, brace/quote balancing inside
/// the body tracks string and `#`-comment state so a `}` or `"` inside a
/// method body's own string literals or comments doesn't end the scan
/// early.
fn preprocess_arrow_literals(src: &str) -> Result<String, HplError> {
    let mut out = String::with_capacity(src.len());
    let bytes = src.as_bytes();
    let mut i = 0usize;
    let mut in_string = false;
    while i < bytes.len() {
        let b = bytes[i];
        if in_string {
            out.push(b as char);
            if b == b'\\' && i + 1 < bytes.len() {
                out.push(bytes[i + 1] as char);
                i += 2;
                continue;
            }
            if b == b'"' {
                in_string = false;
            }
            i += 1;
            continue;
        }
        if b == b'"' {
            in_string = true;
            out.push(b as char);
            i += 1;
            continue;
        }
        if b == b':' {
            if let Some((paren_open, brace_close)) = try_match_arrow_literal(src, i + 1)? {
                let literal = &src[paren_open..=brace_close];
                out.push(':');
                out.push(' ');
                out.push('"');
                for c in literal.chars() {
                    match c {
                        '"' => out.push_str("\\\""),
                        '\\' => out.push_str("\\\\"),
                        '\n' => out.push_str("\\n"),
                        '\r' => {}
                        '\t' => out.push_str("\\t"),
                        other => out.push(other),
                    }
                }
                out.push('"');
                i = brace_close + 1;
                continue;
            }
        }
        out.push(b as char);
        i += 1;
    }
    Ok(out)
}

/// If an arrow-function literal `(params) => { body }` starts at or after
/// `from` (skipping only whitespace), returns the byte range `(paren_open,
/// brace_close)` spanning the whole literal in `src`. Returns `Ok(None)` if
/// what follows isn't an arrow literal at all (an ordinary quoted string
/// value, for instance).
fn try_match_arrow_literal(src: &str, from: usize) -> Result<Option<(usize, usize)>, HplError> {
    let bytes = src.as_bytes();
    let mut j = from;
    while j < bytes.len() && bytes[j].is_ascii_whitespace() {
        j += 1;
    }
    if j >= bytes.len() || bytes[j] != b'(' {
        return Ok(None);
    }
    let paren_open = j;
    let paren_close = find_matching_paren(src, paren_open)?;
    let mut k = paren_close + 1;
    while k < bytes.len() && bytes[k].is_ascii_whitespace() {
        k += 1;
    }
    if !src[k..].starts_with("=>") {
        return Ok(None);
    }
    k += 2;
    while k < bytes.len() && bytes[k].is_ascii_whitespace() {
        k += 1;
    }
    if k >= bytes.len() || bytes[k] != b'{' {
        return Ok(None);
    }
    let brace_close = find_matching_brace(src, k)?;
    Ok(Some((paren_open, brace_close)))
}

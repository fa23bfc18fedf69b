//! Syntax normalizer: rewrites ES module `import`/`export` statements into the call-based
//! form the bundler understands (`require('<specifier>')` plus `exports.<name>` assignments).
//! Text without ESM syntax comes back unchanged.
//!
//! Only top-level statements are considered; lines that start inside a comment, string or
//! template literal are never touched. Dependency loads (`import`, `export .. from`) move to a
//! prologue so they run before the module body, as they would under a native ESM loader.
//! Declarations are exported right after the statement that declares them.

use std::{borrow::Cow, fmt::Write as _, sync::LazyLock};

use log::trace;
use regex::{Captures, Regex};
use thiserror::Error;

use crate::scanner;

const IDENT: &str = r"[A-Za-z_$][\w$]*";

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("^{IDENT}$")).expect("valid regex"));
static IMPORT_BARE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^import\s*['"]([^'"]+)['"]\s*;?$"#).expect("valid regex")
});
static IMPORT_FROM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^import\s+(.+?)\s*\bfrom\s*['"]([^'"]+)['"]\s*;?$"#).expect("valid regex")
});
static EXPORT_DEFAULT_DECL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^(\s*)export\s+default\s+((?:async\s+)?function\*?|class)\s+({IDENT})"
    ))
    .expect("valid regex")
});
static EXPORT_DEFAULT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\s*)export\s+default\s+").expect("valid regex"));
static EXPORT_VARIABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\s*)export\s+((?:const|let|var)\s)").expect("valid regex")
});
static EXPORT_FUNCTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^(\s*)export\s+((?:async\s+)?function\*?\s*({IDENT}))"))
        .expect("valid regex")
});
static EXPORT_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^(\s*)export\s+(class\s+({IDENT}))")).expect("valid regex")
});
static EXPORT_LIST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^export\s*\{([^}]*)\}\s*(?:from\s*['"]([^'"]+)['"])?\s*;?$"#)
        .expect("valid regex")
});
static EXPORT_STAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r#"^export\s*\*\s*(?:as\s+({IDENT})\s+)?from\s*['"]([^'"]+)['"]\s*;?$"#
    ))
    .expect("valid regex")
});

const ES_MODULE_MARKER: &str = "Object.defineProperty(exports, '__esModule', { value: true });";

/// A module statement the normalizer cannot express as `require`/`exports` code
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unsupported module syntax on line {line}: `{statement}`")]
pub struct UnsupportedSyntax {
    /// 1-based line of the statement's first line
    pub line: usize,
    pub statement: String,
}

fn interop_default(expr: &str) -> String {
    format!("(m => m && m.__esModule ? m.default : m)({expr})")
}

/// Normalize `source`, borrowing it when no ESM syntax is present
pub fn normalize(source: &str) -> Result<Cow<'_, str>, UnsupportedSyntax> {
    let lines: Vec<&str> = source.split_inclusive('\n').collect();
    let depths = scanner::line_depths(source);

    let mut normalizer = Normalizer::default();
    let mut body = String::with_capacity(source.len());
    let mut index = 0;

    while index < lines.len() {
        let line = lines[index];
        let content = line_content(line);
        if depths.get(index).copied().flatten() != Some(0) || module_keyword(content).is_none() {
            body.push_str(line);
            index += 1;
            continue;
        }

        let end = statement_end(&lines, &depths, index);
        let statement = &lines[index..end];
        normalizer
            .convert_statement(statement, &mut body)
            .ok_or_else(|| UnsupportedSyntax {
                line: index + 1,
                statement: join_statement(statement),
            })?;
        trace!("normalized statement on line {}", index + 1);
        index = end;
    }

    if !normalizer.changed {
        return Ok(Cow::Borrowed(source));
    }

    let mut out = String::with_capacity(body.len() + 256);
    if normalizer.has_exports {
        out.push_str(ES_MODULE_MARKER);
        out.push('\n');
    }
    // Function declarations are hoisted, so their exports can be bound before anything runs
    for (exported, local) in &normalizer.hoisted_exports {
        let _ = writeln!(out, "exports.{exported} = {local};");
    }
    for load in &normalizer.prologue {
        out.push_str(load);
        out.push('\n');
    }
    out.push_str(&body);
    Ok(Cow::Owned(out))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Keyword {
    Import,
    Export,
}

/// `import`/`export` statement keyword at the start of `content`, if any. Dynamic `import(..)`
/// and `import.meta` are expressions, not statements.
fn module_keyword(content: &str) -> Option<Keyword> {
    let trimmed = content.trim_start();
    [("import", Keyword::Import), ("export", Keyword::Export)]
        .into_iter()
        .find_map(|(word, keyword)| {
            let rest = trimmed.strip_prefix(word)?;
            let next = rest.bytes().next()?;
            let starts_clause = next.is_ascii_whitespace()
                || matches!(next, b'{' | b'*' | b'\'' | b'"');
            (starts_clause && !rest.trim_start().starts_with('(')).then_some(keyword)
        })
}

/// Index one past the last line of the statement starting at `start`
fn statement_end(lines: &[&str], depths: &[Option<u32>], start: usize) -> usize {
    let mut end = start + 1;
    while end < lines.len() {
        if depths.get(end).copied().flatten() == Some(0)
            && !continues_statement(lines[end - 1], lines[end])
        {
            break;
        }
        end += 1;
    }
    end
}

/// Whether `next` carries on the expression left open at the end of `prev`
fn continues_statement(prev: &str, next: &str) -> bool {
    let prev = strip_line_comment(line_content(prev)).trim_end();
    let next = next.trim_start();
    if next.is_empty() || next.starts_with("//") || next.starts_with("/*") {
        return false;
    }
    if prev.ends_with(';') || prev.ends_with("*/") {
        return false;
    }
    let open_end = prev.ends_with("=>")
        || prev.ends_with([
            ',', '=', '+', '-', '*', '/', '%', '&', '|', '^', '?', ':', '(', '[', '{', '<', '>',
            '!', '~', '.',
        ]);
    let continued_start = next.starts_with([
        '.', '?', ':', '+', '-', '%', '&', '|', '^', '=', ',', '>', '<', ')', ']', '}',
    ]);
    open_end || continued_start
}

fn line_content(line: &str) -> &str {
    line.trim_end_matches(['\n', '\r'])
}

/// Cut a trailing `// comment`, ignoring slashes inside quotes
fn strip_line_comment(line: &str) -> &str {
    let bytes = line.as_bytes();
    let mut quote = None;
    let mut pos = 0;
    while pos < bytes.len() {
        match (quote, bytes[pos]) {
            (Some(_), b'\\') => pos += 1,
            (Some(q), byte) if byte == q => quote = None,
            (None, byte @ (b'\'' | b'"' | b'`')) => quote = Some(byte),
            (None, b'/') if bytes.get(pos + 1) == Some(&b'/') => return &line[..pos],
            _ => {}
        }
        pos += 1;
    }
    line
}

/// The statement's lines on one line, comments and surrounding whitespace removed
fn join_statement(lines: &[&str]) -> String {
    lines
        .iter()
        .map(|line| strip_line_comment(line_content(line)).trim())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Keep the line count stable by leaving an empty line per consumed source line
fn push_blank_lines(body: &mut String, lines: &[&str]) {
    for line in lines {
        body.push_str(&line[line_content(line).len()..]);
    }
}

fn ensure_newline(body: &mut String) {
    if !body.is_empty() && !body.ends_with('\n') {
        body.push('\n');
    }
}

#[derive(Debug, Default)]
struct Normalizer {
    changed: bool,
    has_exports: bool,
    temp_counter: usize,
    /// Dependency loads in source order, run before the module body
    prologue: Vec<String>,
    /// (exported name, local binding) pairs bound before the prologue
    hoisted_exports: Vec<(String, String)>,
}

impl Normalizer {
    fn temp_name(&mut self) -> String {
        let name = format!("__reqpack_module_{}", self.temp_counter);
        self.temp_counter += 1;
        name
    }

    /// Convert one statement, appending the body part to `body`. `None` if the statement
    /// has a form this normalizer does not handle.
    fn convert_statement(&mut self, lines: &[&str], body: &mut String) -> Option<()> {
        let first = line_content(lines.first()?);
        let joined = join_statement(lines);

        match module_keyword(first)? {
            Keyword::Import => {
                let load = self.convert_import(&joined)?;
                self.prologue.push(load);
                push_blank_lines(body, lines);
            }
            Keyword::Export => self.convert_export(lines, first, &joined, body)?,
        }
        self.changed = true;
        Some(())
    }

    fn convert_import(&mut self, statement: &str) -> Option<String> {
        if let Some(caps) = IMPORT_BARE.captures(statement) {
            return Some(format!("require('{}');", &caps[1]));
        }
        let caps = IMPORT_FROM.captures(statement)?;
        let (clause, specifier) = (caps[1].trim(), &caps[2]);
        let call = format!("require('{specifier}')");

        let (default_binding, rest) = split_default_binding(clause);
        let bindings = match (default_binding, rest) {
            (Some(name), None) => {
                format!("const {} = {};", identifier(name)?, interop_default(&call))
            }
            (None, Some(rest)) => format!("const {} = {call};", import_pattern(rest)?),
            (Some(name), Some(rest)) => {
                let temp = self.temp_name();
                format!(
                    "const {temp} = {call}; const {} = {}; const {} = {temp};",
                    identifier(name)?,
                    interop_default(&temp),
                    import_pattern(rest)?
                )
            }
            (None, None) => return None,
        };
        Some(bindings)
    }

    fn convert_export(
        &mut self,
        lines: &[&str],
        first: &str,
        joined: &str,
        body: &mut String,
    ) -> Option<()> {
        if let Some(caps) = EXPORT_STAR.captures(joined) {
            let call = format!("require('{}')", &caps[2]);
            self.prologue.push(match caps.get(1) {
                Some(namespace) => format!("exports.{} = {call};", namespace.as_str()),
                None => format!(
                    "(m => {{ for (const k in m) if (k !== 'default' && \
                     !Object.prototype.hasOwnProperty.call(exports, k)) exports[k] = m[k]; }})({call});"
                ),
            });
            self.has_exports = true;
            push_blank_lines(body, lines);
            return Some(());
        }
        if let Some(caps) = EXPORT_LIST.captures(joined) {
            let specifiers = parse_specifier_list(&caps[1])?;
            self.has_exports = true;
            match caps.get(2) {
                Some(specifier) => {
                    let temp = self.temp_name();
                    let mut load = format!("const {temp} = require('{}');", specifier.as_str());
                    for (imported, exported) in specifiers {
                        let _ = write!(load, " exports.{exported} = {temp}.{imported};");
                    }
                    self.prologue.push(load);
                    push_blank_lines(body, lines);
                }
                None => {
                    let indent = &first[..first.len() - first.trim_start().len()];
                    let assignments: Vec<String> = specifiers
                        .into_iter()
                        .map(|(local, exported)| format!("exports.{exported} = {local};"))
                        .collect();
                    body.push_str(indent);
                    body.push_str(&assignments.join(" "));
                    push_blank_lines(body, lines);
                }
            }
            return Some(());
        }

        if let Some(caps) = EXPORT_DEFAULT_DECL.captures(first) {
            let local = caps[3].to_owned();
            if caps[2].starts_with("class") {
                self.declare(lines, &caps, body, &[("default".to_owned(), local)]);
            } else {
                self.hoisted_exports.push(("default".to_owned(), local));
                self.declare(lines, &caps, body, &[]);
            }
            return Some(());
        }
        if let Some(caps) = EXPORT_DEFAULT.captures(first) {
            self.has_exports = true;
            let _ = write!(body, "{}exports.default = {}", &caps[1], &first[caps[0].len()..]);
            body.push_str(&lines[0][first.len()..]);
            body.extend(lines[1..].iter().copied());
            return Some(());
        }
        if let Some(caps) = EXPORT_FUNCTION.captures(first) {
            self.hoisted_exports
                .push((caps[3].to_owned(), caps[3].to_owned()));
            self.declare(lines, &caps, body, &[]);
            return Some(());
        }
        if let Some(caps) = EXPORT_CLASS.captures(first) {
            let name = caps[3].to_owned();
            self.declare(lines, &caps, body, &[(name.clone(), name)]);
            return Some(());
        }
        if let Some(caps) = EXPORT_VARIABLE.captures(first) {
            let declarators = joined
                .trim_start()
                .strip_prefix("export")?
                .trim_start()
                .split_once(char::is_whitespace)?
                .1;
            let names = declared_names(declarators)?;
            let bindings: Vec<(String, String)> =
                names.into_iter().map(|name| (name.clone(), name)).collect();
            self.declare(lines, &caps, body, &bindings);
            return Some(());
        }
        None
    }

    /// Emit a declaration without its `export` keyword, then bind `exports` right after the
    /// statement ends
    fn declare(
        &mut self,
        lines: &[&str],
        caps: &Captures<'_>,
        body: &mut String,
        exports: &[(String, String)],
    ) {
        self.has_exports = true;
        let indent = &caps[1];
        let declaration_start = caps.get(2).map_or(0, |m| m.start());
        body.push_str(indent);
        body.push_str(&lines[0][declaration_start..]);
        body.extend(lines[1..].iter().copied());
        if exports.is_empty() {
            return;
        }
        ensure_newline(body);
        for (exported, local) in exports {
            let _ = writeln!(body, "{indent}exports.{exported} = {local};");
        }
    }
}

/// Split `x, { a }` / `x, * as ns` / `x` / `{ a }` into the default binding and the rest
fn split_default_binding(clause: &str) -> (Option<&str>, Option<&str>) {
    if clause.starts_with('{') || clause.starts_with('*') {
        return (None, Some(clause));
    }
    match clause.split_once(',') {
        Some((default, rest)) => (Some(default.trim()), Some(rest.trim())),
        None => (Some(clause), None),
    }
}

fn identifier(name: &str) -> Option<&str> {
    let name = name.trim();
    IDENTIFIER.is_match(name).then_some(name)
}

/// `* as ns` -> `ns`, `{ a, b as c }` -> `{ a, b: c }`
fn import_pattern(rest: &str) -> Option<String> {
    if let Some(namespace) = rest.strip_prefix('*') {
        let name = namespace.trim().strip_prefix("as")?;
        return identifier(name).map(ToOwned::to_owned);
    }
    let inner = rest.strip_prefix('{')?.strip_suffix('}')?;
    let fields: Vec<String> = parse_specifier_list(inner)?
        .into_iter()
        .map(|(imported, local)| {
            if imported == local {
                local
            } else {
                format!("{imported}: {local}")
            }
        })
        .collect();
    Some(format!("{{ {} }}", fields.join(", ")))
}

/// Parse `a, b as c` into `(a, a), (b, c)` pairs
fn parse_specifier_list(list: &str) -> Option<Vec<(String, String)>> {
    list.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| {
            let mut parts = item.split_whitespace();
            let name = parts.next()?.to_owned();
            match (parts.next(), parts.next(), parts.next()) {
                (None, _, _) => Some((name.clone(), name)),
                (Some("as"), Some(alias), None) => Some((name, alias.to_owned())),
                _ => None,
            }
        })
        .collect()
}

/// Names bound by a `const`/`let`/`var` declarator list such as `a = 1, { b, c: [d] } = o`
fn declared_names(declarators: &str) -> Option<Vec<String>> {
    let declarators = declarators.trim().trim_end_matches(';');
    let mut names = Vec::new();
    for declarator in split_top_level(declarators, b',') {
        if declarator.trim().is_empty() {
            continue;
        }
        let binding = match find_top_level(declarator, &[b'=']) {
            Some(eq) => &declarator[..eq],
            None => declarator,
        };
        pattern_names(binding, &mut names)?;
    }
    (!names.is_empty()).then_some(names)
}

/// Collect the identifiers bound by a binding pattern, defaults included
fn pattern_names(pattern: &str, names: &mut Vec<String>) -> Option<()> {
    let pattern = pattern.trim();
    let pattern = pattern.strip_prefix("...").unwrap_or(pattern).trim();
    let pattern = match find_top_level(pattern, &[b'=']) {
        Some(eq) => pattern[..eq].trim(),
        None => pattern,
    };

    if let Some(inner) = pattern.strip_prefix('{').and_then(|p| p.strip_suffix('}')) {
        for property in split_top_level(inner, b',') {
            let property = property.trim();
            if property.is_empty() {
                continue;
            }
            // `key: target` binds the target; shorthand `a` or `a = 1` binds the key
            let target = match find_top_level(property, &[b':', b'=']) {
                Some(pos) if property.as_bytes()[pos] == b':' => &property[pos + 1..],
                _ => property,
            };
            pattern_names(target, names)?;
        }
    } else if let Some(inner) = pattern.strip_prefix('[').and_then(|p| p.strip_suffix(']')) {
        for element in split_top_level(inner, b',') {
            if !element.trim().is_empty() {
                pattern_names(element, names)?;
            }
        }
    } else {
        names.push(identifier(pattern)?.to_owned());
    }
    Some(())
}

/// Position of the first byte in `targets` outside brackets and string literals
fn find_top_level(text: &str, targets: &[u8]) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0u32;
    let mut quote = None;
    let mut pos = 0;
    while pos < bytes.len() {
        let byte = bytes[pos];
        match quote {
            Some(_) if byte == b'\\' => pos += 1,
            Some(q) if byte == q => quote = None,
            Some(_) => {}
            None => match byte {
                b'\'' | b'"' | b'`' => quote = Some(byte),
                b'(' | b'[' | b'{' => depth += 1,
                b')' | b']' | b'}' => depth = depth.saturating_sub(1),
                b'=' if depth == 0 && matches!(bytes.get(pos + 1), Some(b'=' | b'>')) => {
                    pos += 1;
                }
                _ if depth == 0 && targets.contains(&byte) => return Some(pos),
                _ => {}
            },
        }
        pos += 1;
    }
    None
}

/// Split `text` at `separator` bytes outside brackets and string literals
fn split_top_level(text: &str, separator: u8) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut rest = text;
    while let Some(pos) = find_top_level(rest, &[separator]) {
        parts.push(&rest[..pos]);
        rest = &rest[pos + 1..];
    }
    parts.push(rest);
    parts
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::scanner::dependency_specifiers;

    fn normalized(source: &str) -> String {
        normalize(source)
            .expect("supported module syntax")
            .into_owned()
    }

    #[test]
    fn test_commonjs_is_borrowed_unchanged() {
        let source = "const a = require('./a');\nmodule.exports = a + 1;\n";
        assert!(matches!(normalize(source), Ok(Cow::Borrowed(s)) if s == source));
    }

    #[test]
    fn test_import_forms() {
        let source = "import './polyfill';\nimport * as ns from './ns';\nimport { a, b as c } from \"./named\";\nimport def from './def';\n";
        let expected = "require('./polyfill');\nconst ns = require('./ns');\nconst { a, b: c } = require('./named');\nconst def = (m => m && m.__esModule ? m.default : m)(require('./def'));\n\n\n\n\n";
        assert_eq!(normalized(source), expected);
    }

    #[test]
    fn test_default_with_named_import() {
        assert_eq!(
            normalized("import React, { useState } from 'react';"),
            "const __reqpack_module_0 = require('react'); const React = (m => m && m.__esModule ? m.default : m)(__reqpack_module_0); const { useState } = __reqpack_module_0;\n"
        );
    }

    #[test]
    fn test_imports_load_before_the_body() {
        let source = "console.log('main start');\nimport './dep';\nimport { x } from './x'; // used below\n";
        assert_eq!(
            normalized(source),
            "require('./dep');\nconst { x } = require('./x');\nconsole.log('main start');\n\n\n"
        );
    }

    #[test]
    fn test_multi_line_import() {
        let source = "import {\n  a,\n  b as c,\n} from './multi';\nuse(a, c);\n";
        assert_eq!(
            normalized(source),
            "const { a, b: c } = require('./multi');\n\n\n\n\nuse(a, c);\n"
        );
    }

    #[test]
    fn test_export_declarations() {
        let source = "export const x = 1;\nexport function f() {}\nexport class C {}\nexport default x + 1;\n";
        let expected = "Object.defineProperty(exports, '__esModule', { value: true });\nexports.f = f;\nconst x = 1;\nexports.x = x;\nfunction f() {}\nclass C {}\nexports.C = C;\nexports.default = x + 1;\n";
        assert_eq!(normalized(source), expected);
    }

    #[test]
    fn test_export_default_function_keeps_binding() {
        assert_eq!(
            normalized("export default function main() {}\n"),
            "Object.defineProperty(exports, '__esModule', { value: true });\nexports.default = main;\nfunction main() {}\n"
        );
    }

    #[test]
    fn test_multi_line_class_is_exported_after_its_body() {
        let source = "export class Counter {\n  inc() {\n    return 1;\n  }\n}\nrun();\n";
        assert_eq!(
            normalized(source),
            "Object.defineProperty(exports, '__esModule', { value: true });\nclass Counter {\n  inc() {\n    return 1;\n  }\n}\nexports.Counter = Counter;\nrun();\n"
        );
    }

    #[test]
    fn test_every_declarator_is_exported() {
        let source = "export const a = 1, b = [2, 3], c = f(4, 5);\n";
        assert_eq!(
            normalized(source),
            "Object.defineProperty(exports, '__esModule', { value: true });\nconst a = 1, b = [2, 3], c = f(4, 5);\nexports.a = a;\nexports.b = b;\nexports.c = c;\n"
        );
    }

    #[test]
    fn test_destructuring_export() {
        let source = "export const { a, b: [c, , ...d], e = 1, ...rest } = obj;\n";
        let out = normalized(source);
        assert!(out.starts_with(ES_MODULE_MARKER));
        assert!(out.contains("const { a, b: [c, , ...d], e = 1, ...rest } = obj;\n"));
        assert!(out.ends_with(
            "exports.a = a;\nexports.c = c;\nexports.d = d;\nexports.e = e;\nexports.rest = rest;\n"
        ));
    }

    #[test]
    fn test_multi_line_initializer_is_exported_after_the_statement() {
        let source = "export const config = {\n  port: 80,\n};\nstart(config);\n";
        assert_eq!(
            normalized(source),
            "Object.defineProperty(exports, '__esModule', { value: true });\nconst config = {\n  port: 80,\n};\nexports.config = config;\nstart(config);\n"
        );
    }

    #[test]
    fn test_export_lists_and_reexports() {
        let source = "const a = 1, b = 2;\nexport { a, b as bee };\nexport { x as y } from './x';\nexport * from './all';\nexport * as ns from './ns';\n";
        let out = normalized(source);
        assert!(out.contains("exports.a = a; exports.bee = b;"));
        assert!(out.contains(
            "const __reqpack_module_0 = require('./x'); exports.y = __reqpack_module_0.x;"
        ));
        assert!(out.contains("exports.ns = require('./ns');"));
        assert_eq!(dependency_specifiers(&out), vec!["./x", "./all", "./ns"]);
    }

    #[test]
    fn test_template_and_comment_lines_are_untouched() {
        let source = "const tpl = `\nimport x from './nothing'\n`;\n/*\nexport default 1;\n*/\nconsole.log(tpl.trim());\n";
        assert!(matches!(normalize(source), Ok(Cow::Borrowed(s)) if s == source));
    }

    #[test]
    fn test_dynamic_import_is_not_a_statement() {
        let source = "import('./lazy').then(run);\nconst meta = import.meta;\n";
        assert!(matches!(normalize(source), Ok(Cow::Borrowed(_))));
    }

    #[test]
    fn test_unsupported_forms_are_errors() {
        let err = normalize("const a = 1;\nimport x from './a'; console.log(x);\n")
            .expect_err("trailing code after the import");
        assert_eq!(err.line, 2);
        assert!(normalize("export const [a.b] = c;\n").is_err());
        assert!(normalize("export enum Color {}\n").is_err());
    }
}

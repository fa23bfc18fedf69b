//! Lexical scanner for module reference calls
//!
//! Finds `require('<specifier>')` and `require(<id>)` call sites in JavaScript text while
//! skipping comments, string literals, template literals and regular expression literals,
//! so text that merely contains a specifier is never mistaken for a reference.

use std::ops::Range;

use indexmap::IndexSet;

/// Argument of a module reference call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequireArgument<'a> {
    /// A string literal specifier, without its quotes
    Specifier(&'a str),
    /// A graph-local integer id
    Id(u32),
}

/// A `require(...)` call found in source text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequireCall<'a> {
    pub argument: RequireArgument<'a>,
    /// Byte span of the whole call, from `require` through the closing parenthesis
    pub call_span: Range<usize>,
    /// Byte span of the argument token (quotes included for string literals)
    pub argument_span: Range<usize>,
}

impl<'a> RequireCall<'a> {
    pub fn specifier(&self) -> Option<&'a str> {
        match self.argument {
            RequireArgument::Specifier(specifier) => Some(specifier),
            RequireArgument::Id(_) => None,
        }
    }

    pub fn id(&self) -> Option<u32> {
        match self.argument {
            RequireArgument::Id(id) => Some(id),
            RequireArgument::Specifier(_) => None,
        }
    }
}

/// Find every module reference call in `source`, in source order
pub fn find_require_calls(source: &str) -> Vec<RequireCall<'_>> {
    let mut scanner = Scanner::new(source);
    scanner.run();
    scanner.calls
}

/// Ordered, de-duplicated specifiers of all string-literal reference calls
pub fn dependency_specifiers(source: &str) -> Vec<String> {
    find_require_calls(source)
        .iter()
        .filter_map(RequireCall::specifier)
        .collect::<IndexSet<_>>()
        .into_iter()
        .map(ToOwned::to_owned)
        .collect()
}

/// Bracket depth at the start of each line of `source`, or `None` for a line that starts
/// inside a comment, string or template literal. Top-level statements start at depth 0.
pub fn line_depths(source: &str) -> Vec<Option<u32>> {
    let mut scanner = Scanner::new(source);
    scanner.run();

    let mut starts = scanner.line_starts.iter().peekable();
    let mut offset = 0;
    source
        .split_inclusive('\n')
        .map(|line| {
            while starts.next_if(|(start, _)| *start < offset).is_some() {}
            let depth = starts
                .next_if(|(start, _)| *start == offset)
                .map(|&(_, depth)| depth);
            offset += line.len();
            depth
        })
        .collect()
}

/// What the last significant token was, used to tell a regex literal from a division
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Prev {
    Start,
    Punct(u8),
    /// Identifier, literal or closing bracket: a following `/` divides
    Operand,
    /// Keyword after which an expression starts
    Keyword,
}

const KEYWORDS_BEFORE_EXPRESSION: &[&str] = &[
    "return", "typeof", "instanceof", "in", "of", "new", "delete", "void", "throw", "case", "do",
    "else", "yield", "await",
];

struct Scanner<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    prev: Prev,
    /// Open brace count inside each active template literal interpolation
    template_depths: Vec<u32>,
    /// Open `(`, `[`, `{` and `${`
    depth: u32,
    /// Offset and bracket depth of every line start reached outside comments and literals
    line_starts: Vec<(usize, u32)>,
    calls: Vec<RequireCall<'a>>,
}

impl<'a> Scanner<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
            prev: Prev::Start,
            template_depths: Vec::new(),
            depth: 0,
            line_starts: vec![(0, 0)],
            calls: Vec::new(),
        }
    }

    fn peek(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn run(&mut self) {
        while let Some(byte) = self.peek(0) {
            match byte {
                b'\n' => {
                    self.pos += 1;
                    self.line_starts.push((self.pos, self.depth));
                }
                b if b.is_ascii_whitespace() => self.pos += 1,
                b'/' if self.peek(1) == Some(b'/') => self.skip_line_comment(),
                b'/' if self.peek(1) == Some(b'*') => self.skip_block_comment(),
                b'/' if self.regex_allowed() => {
                    self.skip_regex();
                    self.prev = Prev::Operand;
                }
                b'\'' | b'"' => {
                    // An unterminated literal (or a misread regex) only swallows its own line
                    self.pos = skip_string(self.bytes, self.pos)
                        .unwrap_or_else(|| line_end(self.bytes, self.pos));
                    self.prev = Prev::Operand;
                }
                b'`' => {
                    self.pos += 1;
                    self.scan_template_chunk();
                }
                b if is_ident_start(b) => self.scan_identifier(),
                b if b.is_ascii_digit() => {
                    while self.peek(0).is_some_and(is_ident_part) || self.peek(0) == Some(b'.') {
                        self.pos += 1;
                    }
                    self.prev = Prev::Operand;
                }
                b'{' => {
                    if let Some(depth) = self.template_depths.last_mut() {
                        *depth += 1;
                    }
                    self.pos += 1;
                    self.depth += 1;
                    self.prev = Prev::Punct(b'{');
                }
                b'}' => {
                    self.pos += 1;
                    self.depth = self.depth.saturating_sub(1);
                    match self.template_depths.last_mut() {
                        Some(0) => {
                            self.template_depths.pop();
                            self.scan_template_chunk();
                        }
                        Some(depth) => {
                            *depth -= 1;
                            self.prev = Prev::Punct(b'}');
                        }
                        None => self.prev = Prev::Punct(b'}'),
                    }
                }
                b'(' | b'[' => {
                    self.pos += 1;
                    self.depth += 1;
                    self.prev = Prev::Punct(byte);
                }
                b')' | b']' => {
                    self.pos += 1;
                    self.depth = self.depth.saturating_sub(1);
                    self.prev = Prev::Operand;
                }
                other => {
                    self.pos += 1;
                    self.prev = Prev::Punct(other);
                }
            }
        }
    }

    fn regex_allowed(&self) -> bool {
        !matches!(self.prev, Prev::Operand)
    }

    fn skip_line_comment(&mut self) {
        while let Some(byte) = self.peek(0) {
            if byte == b'\n' {
                break;
            }
            self.pos += 1;
        }
    }

    fn skip_block_comment(&mut self) {
        self.pos += 2;
        match self.src[self.pos..].find("*/") {
            Some(offset) => self.pos += offset + 2,
            None => self.pos = self.bytes.len(),
        }
    }

    fn skip_regex(&mut self) {
        self.pos += 1;
        let mut in_class = false;
        while let Some(byte) = self.peek(0) {
            match byte {
                b'\\' => self.pos += 1,
                b'[' => in_class = true,
                b']' => in_class = false,
                b'/' if !in_class => {
                    self.pos += 1;
                    break;
                }
                // Not a regex after all; resume scanning on the next line
                b'\n' => break,
                _ => {}
            }
            self.pos += 1;
        }
        while self.peek(0).is_some_and(is_ident_part) {
            self.pos += 1;
        }
    }

    /// Scan template text until the closing backtick or the next `${`
    fn scan_template_chunk(&mut self) {
        while let Some(byte) = self.peek(0) {
            match byte {
                b'\\' => self.pos += 2,
                b'`' => {
                    self.pos += 1;
                    self.prev = Prev::Operand;
                    return;
                }
                b'$' if self.peek(1) == Some(b'{') => {
                    self.pos += 2;
                    self.depth += 1;
                    self.template_depths.push(0);
                    self.prev = Prev::Punct(b'{');
                    return;
                }
                _ => self.pos += 1,
            }
        }
        self.pos = self.bytes.len();
    }

    fn scan_identifier(&mut self) {
        let start = self.pos;
        while self.peek(0).is_some_and(is_ident_part) {
            self.pos += 1;
        }
        let word = &self.src[start..self.pos];
        let is_member_access = self.prev == Prev::Punct(b'.');

        if word == "require" && !is_member_access {
            if let Some(call) = self.match_call(start) {
                self.pos = call.call_span.end;
                self.calls.push(call);
                self.prev = Prev::Operand;
                return;
            }
        }

        self.prev = if !is_member_access && KEYWORDS_BEFORE_EXPRESSION.contains(&word) {
            Prev::Keyword
        } else {
            Prev::Operand
        };
    }

    /// Match `( <literal> )` after a `require` identifier starting at `start`
    fn match_call(&self, start: usize) -> Option<RequireCall<'a>> {
        let mut pos = skip_whitespace(self.bytes, self.pos);
        if self.bytes.get(pos) != Some(&b'(') {
            return None;
        }
        pos = skip_whitespace(self.bytes, pos + 1);

        let arg_start = pos;
        let argument = match *self.bytes.get(pos)? {
            b'\'' | b'"' => {
                pos = skip_string(self.bytes, pos)?;
                RequireArgument::Specifier(&self.src[arg_start + 1..pos - 1])
            }
            b if b.is_ascii_digit() => {
                while self.bytes.get(pos).is_some_and(u8::is_ascii_digit) {
                    pos += 1;
                }
                if self.bytes.get(pos).copied().is_some_and(is_ident_part) {
                    return None;
                }
                RequireArgument::Id(self.src[arg_start..pos].parse().ok()?)
            }
            _ => return None,
        };
        let arg_end = pos;

        pos = skip_whitespace(self.bytes, pos);
        if self.bytes.get(pos) != Some(&b')') {
            return None;
        }

        Some(RequireCall {
            argument,
            call_span: start..pos + 1,
            argument_span: arg_start..arg_end,
        })
    }
}

/// Skip a quoted string starting at `start`, returning the index after the closing quote.
/// Returns `None` for an unterminated literal.
fn skip_string(bytes: &[u8], start: usize) -> Option<usize> {
    let quote = bytes[start];
    let mut pos = start + 1;
    while let Some(&byte) = bytes.get(pos) {
        match byte {
            b'\\' => pos += 2,
            b'\n' => return None,
            b if b == quote => return Some(pos + 1),
            _ => pos += 1,
        }
    }
    None
}

/// Index of the next newline at or after `pos`, or the end of input
fn line_end(bytes: &[u8], pos: usize) -> usize {
    bytes[pos..]
        .iter()
        .position(|&byte| byte == b'\n')
        .map_or(bytes.len(), |offset| pos + offset)
}

fn skip_whitespace(bytes: &[u8], mut pos: usize) -> usize {
    while bytes.get(pos).is_some_and(u8::is_ascii_whitespace) {
        pos += 1;
    }
    pos
}

fn is_ident_start(byte: u8) -> bool {
    byte.is_ascii_alphabetic() || byte == b'_' || byte == b'$' || byte >= 0x80
}

fn is_ident_part(byte: u8) -> bool {
    is_ident_start(byte) || byte.is_ascii_digit()
}

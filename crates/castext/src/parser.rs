/*
 * parser.rs
 * Copyright (c) 2025 CASText contributors
 */

//! Template parser.
//!
//! A single left-to-right scan over the source. Block tags nest with a stack,
//! math-mode delimiters in the literal text are tracked so that each `{@ @}`
//! segment knows how it will be wrapped.

use crate::ast::{
    Assignment, DefineBlock, Delimiter, ErrorMarker, FactSheetRef, ForeachBlock, IfBlock,
    MathSegment, Node, Text, walk,
};
use crate::error::{ErrorKind, ParseError};
use crate::forbidden;
use crate::options::ContextMode;
use castext_error_reporting::DiagnosticMessage;
use castext_source_map::{FileId, SourceContext, SourceInfo};

/// Templates are always parsed as file 0 of their source context.
pub const TEMPLATE_FILE: FileId = FileId(0);

/// Always literal, even between `@` delimiters.
pub const PLUGINFILE_MARKER: &str = "@@PLUGINFILE@@";

const MATH_ENVIRONMENTS: &[&str] = &[
    "equation",
    "equation*",
    "align",
    "align*",
    "alignat",
    "alignat*",
    "flalign",
    "flalign*",
    "gather",
    "gather*",
    "multline",
    "multline*",
    "eqnarray",
    "eqnarray*",
    "displaymath",
    "math",
];

/// A parsed template.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    source: String,
    mode: ContextMode,
    nodes: Vec<Node>,
    diagnostics: Vec<DiagnosticMessage>,
    fatal: Option<ParseError>,
}

impl Template {
    /// Parse a template. Never fails: problems are recorded as diagnostics
    /// and [`ErrorMarker`] nodes.
    pub fn compile(source: &str, mode: ContextMode) -> Template {
        Parser::new(source).run(mode)
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn mode(&self) -> ContextMode {
        self.mode
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Parse diagnostics, fatal and otherwise.
    pub fn diagnostics(&self) -> &[DiagnosticMessage] {
        &self.diagnostics
    }

    /// The error that stopped parsing, if any.
    pub fn fatal_error(&self) -> Option<&ParseError> {
        self.fatal.as_ref()
    }

    pub fn is_fatal(&self) -> bool {
        self.fatal.is_some()
    }

    /// A source context holding this template as [`TEMPLATE_FILE`], for
    /// rendering diagnostics with source snippets.
    pub fn source_context(&self, path: impl Into<String>) -> SourceContext {
        let mut ctx = SourceContext::new();
        ctx.add_file(path.into(), self.source.clone());
        ctx
    }

    /// Every raw expression in document order, without evaluating anything.
    ///
    /// Foreach bodies appear once; they are not unrolled.
    pub fn raw_expressions(&self) -> Vec<&str> {
        let mut out = Vec::new();
        walk(&self.nodes, &mut |node| match node {
            Node::Math(segment) => out.push(segment.expression()),
            Node::If(block) => out.push(block.test.as_str()),
            Node::Define(block) => {
                out.extend(block.assignments.iter().map(|a| a.expression.as_str()));
            }
            Node::Foreach(block) => {
                out.extend(block.variables.iter().map(|v| v.expression.as_str()));
            }
            _ => {}
        });
        out
    }

    /// Names bound by define and foreach blocks, in document order.
    fn binding_names(&self) -> Vec<&str> {
        let mut out = Vec::new();
        walk(&self.nodes, &mut |node| match node {
            Node::Define(block) => out.extend(block.assignments.iter().map(|a| a.name.as_str())),
            Node::Foreach(block) => out.extend(block.variables.iter().map(|v| v.name.as_str())),
            _ => {}
        });
        out
    }

    /// Whether any raw expression, or any name bound by a block, uses one of
    /// `words` as an identifier.
    pub fn check_forbidden_words<W: AsRef<str>>(&self, words: &[W]) -> bool {
        forbidden::contains_any(self.raw_expressions(), words)
            || forbidden::contains_any(self.binding_names(), words)
    }
}

/// Parse a template, failing on errors that prevent expansion.
pub fn parse(source: &str, mode: ContextMode) -> Result<Template, ParseError> {
    let template = Template::compile(source, mode);
    match template.fatal {
        Some(err) => Err(err),
        None => Ok(template),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockKind {
    If,
    Foreach,
}

impl BlockKind {
    fn name(self) -> &'static str {
        match self {
            BlockKind::If => "if",
            BlockKind::Foreach => "foreach",
        }
    }
}

struct OpenBlock {
    kind: BlockKind,
    test: String,
    variables: Vec<Assignment>,
    invalid: Option<ErrorMarker>,
    start: usize,
    tag_end: usize,
    children: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum MathRegion {
    Paren,
    Bracket,
    Environment(String),
}

impl MathRegion {
    fn opener(&self) -> String {
        match self {
            MathRegion::Paren => "\\(".to_string(),
            MathRegion::Bracket => "\\[".to_string(),
            MathRegion::Environment(env) => format!("\\begin{{{env}}}"),
        }
    }

    fn delimiter(&self) -> Delimiter {
        match self {
            MathRegion::Paren => Delimiter::Inline,
            MathRegion::Environment(env) if env == "math" => Delimiter::Inline,
            _ => Delimiter::Display,
        }
    }
}

type Attribute = (String, String, usize, usize);

struct Parser<'a> {
    source: &'a str,
    pos: usize,
    text_start: usize,
    root: Vec<Node>,
    stack: Vec<OpenBlock>,
    math: Option<(MathRegion, usize)>,
    diagnostics: Vec<DiagnosticMessage>,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Parser {
            source,
            pos: 0,
            text_start: 0,
            root: Vec::new(),
            stack: Vec::new(),
            math: None,
            diagnostics: Vec::new(),
        }
    }

    fn run(mut self, mode: ContextMode) -> Template {
        let fatal = match self.scan() {
            Ok(()) => None,
            Err(err) => {
                tracing::debug!(code = err.kind.code(), message = %err.message, "fatal parse error");
                self.recover(&err);
                Some(err)
            }
        };
        Template {
            source: self.source.to_string(),
            mode,
            nodes: self.root,
            diagnostics: self.diagnostics,
            fatal,
        }
    }

    fn info(&self, start: usize, end: usize) -> SourceInfo {
        SourceInfo::from_offsets(TEMPLATE_FILE, self.source, start, end)
    }

    fn children(&mut self) -> &mut Vec<Node> {
        match self.stack.last_mut() {
            Some(block) => &mut block.children,
            None => &mut self.root,
        }
    }

    fn flush_text(&mut self, end: usize) {
        if end > self.text_start {
            let node = Node::Text(Text {
                text: self.source[self.text_start..end].to_string(),
                source_info: self.info(self.text_start, end),
            });
            self.children().push(node);
        }
        self.text_start = self.text_start.max(end);
    }

    fn marker(&mut self, kind: ErrorKind, message: String, start: usize, end: usize) -> ErrorMarker {
        let location = self.info(start, end);
        self.diagnostics.push(
            kind.diagnostic()
                .problem(message.clone())
                .with_location(location.clone())
                .build(),
        );
        ErrorMarker {
            kind,
            message,
            source_info: location,
        }
    }

    fn scan(&mut self) -> Result<(), ParseError> {
        if self.source.is_empty() {
            let node = Node::Text(Text {
                text: String::new(),
                source_info: self.info(0, 0),
            });
            self.root.push(node);
            return Ok(());
        }
        while self.pos < self.source.len() {
            let rest = &self.source[self.pos..];
            if rest.starts_with(PLUGINFILE_MARKER) {
                self.pos += PLUGINFILE_MARKER.len();
            } else if rest.starts_with("[[") {
                self.block_tag()?;
            } else if rest.starts_with("{@") || rest.starts_with("{#") {
                self.segment()?;
            } else if rest.starts_with('\\') {
                self.backslash()?;
            } else {
                self.pos += rest.chars().next().map_or(1, char::len_utf8);
            }
        }

        self.flush_text(self.source.len());
        if let Some(block) = self.stack.last() {
            let name = block.kind.name();
            return Err(ParseError::new(
                ErrorKind::UnclosedBlock,
                format!("The [[ {name} ]] block is never closed."),
                self.info(block.start, block.tag_end),
            ));
        }
        if let Some((region, start)) = &self.math {
            let opener = region.opener();
            return Err(ParseError::new(
                ErrorKind::UnbalancedMathDelimiters,
                format!("The math region opened with `{opener}` is never closed."),
                self.info(*start, start + opener.len()),
            ));
        }
        Ok(())
    }

    /// Keep what was parsed, mark the failure and close every open block.
    fn recover(&mut self, err: &ParseError) {
        self.flush_text(err.location.start_offset().min(self.source.len()));
        self.diagnostics.push(err.to_diagnostic());
        let marker = Node::Error(ErrorMarker {
            kind: err.kind,
            message: err.message.clone(),
            source_info: err.location.clone(),
        });
        self.children().push(marker);
        while let Some(block) = self.stack.pop() {
            let node = self.finish_block(block, self.source.len());
            self.children().push(node);
        }
    }

    fn finish_block(&self, block: OpenBlock, end: usize) -> Node {
        if let Some(marker) = block.invalid {
            return Node::Error(marker);
        }
        let source_info = self.info(block.start, end);
        match block.kind {
            BlockKind::If => Node::If(IfBlock {
                test: block.test,
                children: block.children,
                source_info,
            }),
            BlockKind::Foreach => Node::Foreach(ForeachBlock {
                variables: block.variables,
                children: block.children,
                source_info,
            }),
        }
    }

    fn block_tag(&mut self) -> Result<(), ParseError> {
        let source = self.source;
        let start = self.pos;
        let mut i = skip_whitespace(source, start + 2);
        let closing = source[i..].starts_with('/');
        if closing {
            i = skip_whitespace(source, i + 1);
        }
        let name_end = i + source[i..]
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(source.len() - i);
        let name = &source[i..name_end];
        let boundary = source[name_end..]
            .chars()
            .next()
            .is_some_and(|c| c.is_whitespace() || c == '/' || c == ']' || (c == ':' && name == "facts"));

        if !matches!(name, "if" | "define" | "foreach" | "facts") || !boundary {
            self.pos += 2;
            return Ok(());
        }

        let Some(end) = find_tag_end(source, name_end) else {
            return Err(ParseError::new(
                ErrorKind::UnterminatedTag,
                format!("The [[ {name} ]] tag is never closed with ]]."),
                self.info(start, name_end),
            ));
        };
        let tag_end = end + 2;
        self.flush_text(start);
        self.pos = tag_end;
        self.text_start = tag_end;

        let content = &source[name_end..end];
        if closing {
            self.close_block(name, start, tag_end)
        } else {
            self.open_tag(name, content, name_end, start, tag_end);
            Ok(())
        }
    }

    fn close_block(&mut self, name: &str, start: usize, end: usize) -> Result<(), ParseError> {
        match self.stack.last() {
            Some(block) if block.kind.name() == name => {}
            Some(block) => {
                let open = block.kind.name();
                return Err(ParseError::new(
                    ErrorKind::UnmatchedClosingTag,
                    format!("The closing tag [[/ {name} ]] does not match the open [[ {open} ]] block."),
                    self.info(start, end),
                ));
            }
            None => {
                return Err(ParseError::new(
                    ErrorKind::UnmatchedClosingTag,
                    format!("The closing tag [[/ {name} ]] has no matching opening tag."),
                    self.info(start, end),
                ));
            }
        }
        if let Some(block) = self.stack.pop() {
            tracing::trace!(block = block.kind.name(), "closed block");
            let node = self.finish_block(block, end);
            self.children().push(node);
        }
        Ok(())
    }

    fn open_tag(&mut self, name: &str, content: &str, content_offset: usize, start: usize, end: usize) {
        let trimmed = content.trim_end();
        let self_closing = trimmed.ends_with('/');
        let attributes = if self_closing {
            &trimmed[..trimmed.len() - 1]
        } else {
            content
        };

        if name == "facts" {
            let key = content.strip_prefix(':').map(str::trim).unwrap_or_default();
            let node = if key.is_empty() {
                Node::Error(self.marker(
                    ErrorKind::MalformedAttributes,
                    "A fact sheet reference needs a key, as in [[facts:calc_product_rule]].".to_string(),
                    start,
                    end,
                ))
            } else {
                Node::FactSheet(FactSheetRef {
                    key: key.to_string(),
                    source_info: self.info(start, end),
                })
            };
            self.children().push(node);
            return;
        }

        let parsed = parse_attributes(attributes, content_offset);
        let kind = match name {
            "if" => BlockKind::If,
            "foreach" => BlockKind::Foreach,
            _ => {
                let node = match parsed {
                    Err(message) => {
                        Node::Error(self.marker(ErrorKind::MalformedAttributes, message, start, end))
                    }
                    Ok(pairs) if pairs.is_empty() => Node::Error(self.marker(
                        ErrorKind::MissingAttribute,
                        "Define-block needs at least one name=\"value\" pair.".to_string(),
                        start,
                        end,
                    )),
                    Ok(pairs) => Node::Define(DefineBlock {
                        assignments: self.assignments(pairs),
                        source_info: self.info(start, end),
                    }),
                };
                self.children().push(node);
                return;
            }
        };

        let mut block = OpenBlock {
            kind,
            test: String::new(),
            variables: Vec::new(),
            invalid: None,
            start,
            tag_end: end,
            children: Vec::new(),
        };
        match (kind, parsed) {
            (_, Err(message)) => {
                block.invalid = Some(self.marker(ErrorKind::MalformedAttributes, message, start, end));
            }
            (BlockKind::If, Ok(pairs)) => match pairs.into_iter().find(|(n, ..)| n == "test") {
                Some((_, test, ..)) => block.test = test,
                None => {
                    block.invalid = Some(self.marker(
                        ErrorKind::MissingAttribute,
                        "If-block needs a test attribute.".to_string(),
                        start,
                        end,
                    ));
                }
            },
            (BlockKind::Foreach, Ok(pairs)) if pairs.is_empty() => {
                block.invalid = Some(self.marker(
                    ErrorKind::MissingAttribute,
                    "Foreach-block needs at least one variable=\"list\" pair.".to_string(),
                    start,
                    end,
                ));
            }
            (BlockKind::Foreach, Ok(pairs)) => block.variables = self.assignments(pairs),
        }

        tracing::trace!(block = name, self_closing, "opened block");
        if self_closing {
            let node = self.finish_block(block, end);
            self.children().push(node);
        } else {
            self.stack.push(block);
        }
    }

    fn assignments(&self, pairs: Vec<Attribute>) -> Vec<Assignment> {
        pairs
            .into_iter()
            .map(|(name, expression, start, end)| Assignment {
                name,
                expression,
                source_info: self.info(start, end),
            })
            .collect()
    }

    fn segment(&mut self) -> Result<(), ParseError> {
        let source = self.source;
        let start = self.pos;
        let value = source[start..].starts_with("{#");
        let (open, close) = if value { ("{#", "#}") } else { ("{@", "@}") };
        let body_start = start + open.len();

        let Some(end) = find_segment_end(source, body_start, close) else {
            return Err(ParseError::new(
                ErrorKind::UnterminatedSegment,
                format!("The math segment starting with `{open}` is never closed with `{close}`."),
                self.info(start, body_start),
            ));
        };
        let segment_end = end + close.len();
        self.flush_text(start);
        self.pos = segment_end;
        self.text_start = segment_end;

        let raw = &source[body_start..end];
        let node = if raw.trim().is_empty() {
            Node::Error(self.marker(
                ErrorKind::EmptySegment,
                format!("The math segment `{open}{raw}{close}` is empty."),
                start,
                segment_end,
            ))
        } else {
            let delimiter = match (&self.math, value) {
                (_, true) => Delimiter::Value,
                (None, false) => Delimiter::Implicit,
                (Some((region, _)), false) => region.delimiter(),
            };
            Node::Math(MathSegment {
                delimiter,
                raw: raw.to_string(),
                source_info: self.info(start, segment_end),
            })
        };
        self.children().push(node);
        Ok(())
    }

    fn backslash(&mut self) -> Result<(), ParseError> {
        let source = self.source;
        let rest = &source[self.pos..];
        if rest.starts_with("\\\\") {
            self.pos += 2;
            return Ok(());
        }
        if rest.starts_with("\\(") {
            return self.open_math(MathRegion::Paren, 2);
        }
        if rest.starts_with("\\[") {
            return self.open_math(MathRegion::Bracket, 2);
        }
        if rest.starts_with("\\)") {
            return self.close_math(&MathRegion::Paren, 2);
        }
        if rest.starts_with("\\]") {
            return self.close_math(&MathRegion::Bracket, 2);
        }
        for (prefix, opening) in [("\\begin{", true), ("\\end{", false)] {
            let Some(after) = rest.strip_prefix(prefix) else {
                continue;
            };
            let Some(close) = after.find('}') else { break };
            let env = &after[..close];
            if !MATH_ENVIRONMENTS.contains(&env) {
                break;
            }
            let len = prefix.len() + close + 1;
            let region = MathRegion::Environment(env.to_string());
            return if opening {
                self.open_math(region, len)
            } else {
                self.close_math(&region, len)
            };
        }
        self.pos += 1;
        Ok(())
    }

    fn open_math(&mut self, region: MathRegion, len: usize) -> Result<(), ParseError> {
        if let Some((open, _)) = &self.math {
            return Err(ParseError::new(
                ErrorKind::UnbalancedMathDelimiters,
                format!(
                    "`{}` cannot be nested inside the math region opened with `{}`.",
                    &self.source[self.pos..self.pos + len],
                    open.opener()
                ),
                self.info(self.pos, self.pos + len),
            ));
        }
        self.math = Some((region, self.pos));
        self.pos += len;
        Ok(())
    }

    fn close_math(&mut self, region: &MathRegion, len: usize) -> Result<(), ParseError> {
        let source = self.source;
        let closer = &source[self.pos..self.pos + len];
        match &self.math {
            Some((open, _)) if open == region => {
                self.math = None;
                self.pos += len;
                Ok(())
            }
            Some((open, _)) => Err(ParseError::new(
                ErrorKind::UnbalancedMathDelimiters,
                format!(
                    "`{closer}` does not close the math region opened with `{}`.",
                    open.opener()
                ),
                self.info(self.pos, self.pos + len),
            )),
            None => Err(ParseError::new(
                ErrorKind::UnbalancedMathDelimiters,
                format!("`{closer}` closes a math region that was never opened."),
                self.info(self.pos, self.pos + len),
            )),
        }
    }
}

fn skip_whitespace(source: &str, from: usize) -> usize {
    from + source[from..]
        .find(|c: char| !c.is_whitespace())
        .unwrap_or(source.len() - from)
}

/// Offset of the `]]` ending a tag, ignoring `]]` inside quoted values.
fn find_tag_end(source: &str, from: usize) -> Option<usize> {
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (offset, c) in source[from..].char_indices() {
        let at = from + offset;
        match quote {
            Some(_) if escaped => escaped = false,
            Some(_) if c == '\\' => escaped = true,
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '"' || c == '\'' => quote = Some(c),
            None if source[at..].starts_with("]]") => return Some(at),
            None => {}
        }
    }
    None
}

/// Offset of `close`, skipping CAS strings and the plugin file marker.
fn find_segment_end(source: &str, from: usize, close: &str) -> Option<usize> {
    let mut at = from;
    let mut in_string = false;
    while at < source.len() {
        let rest = &source[at..];
        let c = rest.chars().next()?;
        if in_string {
            if c == '\\' {
                at += 1 + rest[1..].chars().next().map_or(0, char::len_utf8);
                continue;
            }
            if c == '"' {
                in_string = false;
            }
        } else if rest.starts_with(PLUGINFILE_MARKER) {
            at += PLUGINFILE_MARKER.len();
            continue;
        } else if rest.starts_with(close) {
            return Some(at);
        } else if c == '"' {
            in_string = true;
        }
        at += c.len_utf8();
    }
    None
}

/// Parse `name="value" name='value' ...`, returning pairs with the byte
/// range of each pair offset by `base`.
fn parse_attributes(text: &str, base: usize) -> Result<Vec<Attribute>, String> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut out: Vec<Attribute> = Vec::new();
    let mut i = 0;

    loop {
        while i < chars.len() && chars[i].1.is_whitespace() {
            i += 1;
        }
        let Some(&(start, first)) = chars.get(i) else { break };
        if !(first.is_alphabetic() || first == '_' || first == '%') {
            return Err(format!("Unexpected `{first}` in block attributes."));
        }
        let name_start = i;
        while i < chars.len() && (chars[i].1.is_alphanumeric() || chars[i].1 == '_' || chars[i].1 == '%') {
            i += 1;
        }
        let name: String = chars[name_start..i].iter().map(|(_, c)| c).collect();

        while i < chars.len() && chars[i].1.is_whitespace() {
            i += 1;
        }
        if chars.get(i).map(|(_, c)| *c) != Some('=') {
            return Err(format!("Attribute `{name}` needs a value, as in {name}=\"...\"."));
        }
        i += 1;
        while i < chars.len() && chars[i].1.is_whitespace() {
            i += 1;
        }
        let quote = match chars.get(i) {
            Some((_, q @ ('"' | '\''))) => *q,
            _ => return Err(format!("The value of `{name}` must be quoted.")),
        };
        i += 1;

        let mut value = String::new();
        let mut closed = None;
        while let Some(&(offset, c)) = chars.get(i) {
            i += 1;
            if c == quote {
                closed = Some(offset + c.len_utf8());
                break;
            }
            if c == '\\'
                && let Some(&(_, next)) = chars.get(i)
                && (next == quote || next == '\\')
            {
                value.push(next);
                i += 1;
                continue;
            }
            value.push(c);
        }
        let Some(end) = closed else {
            return Err(format!("The value of `{name}` is missing its closing quote."));
        };
        if out.iter().any(|(n, ..)| *n == name) {
            return Err(format!("Attribute `{name}` is given more than once."));
        }
        out.push((name, value, base + start, base + end));
    }

    Ok(out)
}

/*
 * ast.rs
 * Copyright (c) 2025 CASText contributors
 */

//! Template tree.

use crate::error::ErrorKind;
use castext_source_map::SourceInfo;

/// How a math segment's display form is wrapped in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    /// `{@ @}` inside an explicit `\( \)` region.
    Inline,
    /// `{@ @}` inside `\[ \]` or a math environment.
    Display,
    /// `{@ @}` in text mode, wrapped as `\( \)`.
    Implicit,
    /// `{# #}`, the bare value.
    Value,
}

/// A node in the template tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Text(Text),
    Math(MathSegment),
    If(IfBlock),
    Define(DefineBlock),
    Foreach(ForeachBlock),
    FactSheet(FactSheetRef),
    Error(ErrorMarker),
}

impl Node {
    pub fn source_info(&self) -> &SourceInfo {
        match self {
            Node::Text(n) => &n.source_info,
            Node::Math(n) => &n.source_info,
            Node::If(n) => &n.source_info,
            Node::Define(n) => &n.source_info,
            Node::Foreach(n) => &n.source_info,
            Node::FactSheet(n) => &n.source_info,
            Node::Error(n) => &n.source_info,
        }
    }
}

/// Literal text, reproduced byte for byte.
#[derive(Debug, Clone, PartialEq)]
pub struct Text {
    pub text: String,
    pub source_info: SourceInfo,
}

/// A `{@ @}` or `{# #}` segment.
#[derive(Debug, Clone, PartialEq)]
pub struct MathSegment {
    pub delimiter: Delimiter,
    /// Segment body as written, surrounding whitespace included.
    pub raw: String,
    pub source_info: SourceInfo,
}

impl MathSegment {
    /// The expression with surrounding whitespace removed.
    pub fn expression(&self) -> &str {
        self.raw.trim()
    }
}

/// `name="expression"`, as used by define and foreach.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub name: String,
    pub expression: String,
    pub source_info: SourceInfo,
}

/// `[[ if test="..." ]] ... [[/ if ]]`. There is no else branch.
#[derive(Debug, Clone, PartialEq)]
pub struct IfBlock {
    pub test: String,
    pub children: Vec<Node>,
    pub source_info: SourceInfo,
}

/// `[[ define a="..." b="..." /]]`
#[derive(Debug, Clone, PartialEq)]
pub struct DefineBlock {
    pub assignments: Vec<Assignment>,
    pub source_info: SourceInfo,
}

/// `[[ foreach I="..." K="..." ]] ... [[/ foreach ]]`
#[derive(Debug, Clone, PartialEq)]
pub struct ForeachBlock {
    pub variables: Vec<Assignment>,
    pub children: Vec<Node>,
    pub source_info: SourceInfo,
}

/// `[[facts:KEY]]`
#[derive(Debug, Clone, PartialEq)]
pub struct FactSheetRef {
    pub key: String,
    pub source_info: SourceInfo,
}

/// Placeholder for a block that could not be formed. Produces no output.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorMarker {
    pub kind: ErrorKind,
    pub message: String,
    pub source_info: SourceInfo,
}

/// Visit every node depth-first in document order.
pub fn walk<'a>(nodes: &'a [Node], visit: &mut impl FnMut(&'a Node)) {
    for node in nodes {
        visit(node);
        match node {
            Node::If(block) => walk(&block.children, visit),
            Node::Foreach(block) => walk(&block.children, visit),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use castext_source_map::FileId;

    fn info() -> SourceInfo {
        SourceInfo::from_offsets(FileId(0), "", 0, 0)
    }

    fn text(s: &str) -> Node {
        Node::Text(Text {
            text: s.to_string(),
            source_info: info(),
        })
    }

    #[test]
    fn test_segment_expression_is_trimmed() {
        let segment = MathSegment {
            delimiter: Delimiter::Implicit,
            raw: " 1/(1+x^2) ".to_string(),
            source_info: info(),
        };
        assert_eq!(segment.expression(), "1/(1+x^2)");
    }

    #[test]
    fn test_walk_visits_children_in_order() {
        let tree = vec![
            text("a"),
            Node::If(IfBlock {
                test: "true".into(),
                children: vec![text("b"), text("c")],
                source_info: info(),
            }),
            text("d"),
        ];
        let mut seen = Vec::new();
        walk(&tree, &mut |node| {
            if let Node::Text(t) = node {
                seen.push(t.text.as_str());
            }
        });
        assert_eq!(seen, vec!["a", "b", "c", "d"]);
    }
}

//! Template Renderer — prompt templates with interpolation and conditional sections.
//!
//! Supported syntax:
//! - `{{field}}`             escaped interpolation
//! - `{{{field}}}`           raw interpolation (caller already sanitized the value)
//! - `{{#if field}}...{{/if}}` and `{{#if field}}...{{else}}...{{/if}}`, nestable
//!
//! Templates are parsed once into a node tree at registration and rendered
//! per invocation. Unknown variables render as the empty string.

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TemplateError {
    #[error("unterminated tag starting at byte {offset}")]
    UnterminatedTag { offset: usize },

    #[error("empty variable name at byte {offset}")]
    EmptyVariable { offset: usize },

    #[error("unknown block helper '{helper}' at byte {offset}")]
    UnknownHelper { helper: String, offset: usize },

    #[error("'{tag}' at byte {offset} has no matching '{{{{#if}}}}'")]
    UnbalancedBlock { tag: String, offset: usize },

    #[error("'{{{{#if {field}}}}}' opened at byte {offset} is never closed")]
    UnclosedIf { field: String, offset: usize },
}

/// One node of a parsed template.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Text(String),
    Variable { path: String, escape: bool },
    Conditional {
        path: String,
        then: Vec<Node>,
        otherwise: Vec<Node>,
    },
}

/// A compiled template. Cheap to share; rendering never mutates it.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    source: String,
    nodes: Vec<Node>,
}

impl Template {
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let nodes = Parser::new(source).parse()?;
        Ok(Self {
            source: source.to_string(),
            nodes,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn render(&self, context: &Map<String, Value>) -> String {
        let mut out = String::with_capacity(self.source.len());
        render_nodes(&self.nodes, context, &mut out);
        out
    }
}

/// One-shot convenience: parse then render.
pub fn render(template: &str, context: &Map<String, Value>) -> Result<String, TemplateError> {
    Ok(Template::parse(template)?.render(context))
}

// ────────────────────────────────────────────────────────────────────────────
// Parser
// ────────────────────────────────────────────────────────────────────────────

enum Tag {
    Variable { path: String, escape: bool },
    If { path: String },
    Else,
    EndIf,
}

/// An `{{#if}}` whose body is still being collected.
struct OpenBlock {
    path: String,
    offset: usize,
    /// Nodes preceding the block in the enclosing scope.
    enclosing: Vec<Node>,
    /// Set once `{{else}}` is seen.
    then_branch: Option<Vec<Node>>,
}

struct Parser<'a> {
    source: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Self { source, pos: 0 }
    }

    fn parse(mut self) -> Result<Vec<Node>, TemplateError> {
        let mut stack: Vec<OpenBlock> = Vec::new();
        let mut current: Vec<Node> = Vec::new();

        while self.pos < self.source.len() {
            let rest = &self.source[self.pos..];
            let Some(start) = rest.find("{{") else {
                current.push(Node::Text(rest.to_string()));
                self.pos = self.source.len();
                break;
            };

            if start > 0 {
                current.push(Node::Text(rest[..start].to_string()));
            }
            let offset = self.pos + start;
            let tag = self.read_tag(offset)?;

            match tag {
                Tag::Variable { path, escape } => current.push(Node::Variable { path, escape }),
                Tag::If { path } => {
                    stack.push(OpenBlock {
                        path,
                        offset,
                        enclosing: std::mem::take(&mut current),
                        then_branch: None,
                    });
                }
                Tag::Else => match stack.last_mut() {
                    Some(block) if block.then_branch.is_none() => {
                        block.then_branch = Some(std::mem::take(&mut current));
                    }
                    _ => {
                        return Err(TemplateError::UnbalancedBlock {
                            tag: "{{else}}".to_string(),
                            offset,
                        })
                    }
                },
                Tag::EndIf => {
                    let Some(block) = stack.pop() else {
                        return Err(TemplateError::UnbalancedBlock {
                            tag: "{{/if}}".to_string(),
                            offset,
                        });
                    };
                    let body = std::mem::replace(&mut current, block.enclosing);
                    let (then, otherwise) = match block.then_branch {
                        Some(then) => (then, body),
                        None => (body, Vec::new()),
                    };
                    current.push(Node::Conditional {
                        path: block.path,
                        then,
                        otherwise,
                    });
                }
            }
        }

        if let Some(block) = stack.pop() {
            return Err(TemplateError::UnclosedIf {
                field: block.path,
                offset: block.offset,
            });
        }

        Ok(current)
    }

    /// Reads the tag starting at `offset` (which points at `{{`) and advances past it.
    fn read_tag(&mut self, offset: usize) -> Result<Tag, TemplateError> {
        let rest = &self.source[offset..];

        if let Some(inner) = rest.strip_prefix("{{{") {
            let end = inner
                .find("}}}")
                .ok_or(TemplateError::UnterminatedTag { offset })?;
            self.pos = offset + 3 + end + 3;
            let path = inner[..end].trim();
            if path.is_empty() {
                return Err(TemplateError::EmptyVariable { offset });
            }
            return Ok(Tag::Variable {
                path: path.to_string(),
                escape: false,
            });
        }

        let inner = &rest[2..];
        let end = inner
            .find("}}")
            .ok_or(TemplateError::UnterminatedTag { offset })?;
        self.pos = offset + 2 + end + 2;
        let body = inner[..end].trim();

        if let Some(helper) = body.strip_prefix('#') {
            let mut parts = helper.split_whitespace();
            return match (parts.next(), parts.next(), parts.next()) {
                (Some("if"), Some(path), None) => Ok(Tag::If {
                    path: path.to_string(),
                }),
                (Some("if"), None, _) => Err(TemplateError::EmptyVariable { offset }),
                _ => Err(TemplateError::UnknownHelper {
                    helper: helper.to_string(),
                    offset,
                }),
            };
        }

        match body {
            "else" => Ok(Tag::Else),
            "/if" => Ok(Tag::EndIf),
            "" => Err(TemplateError::EmptyVariable { offset }),
            _ if body.starts_with('/') => Err(TemplateError::UnknownHelper {
                helper: body.to_string(),
                offset,
            }),
            path => Ok(Tag::Variable {
                path: path.to_string(),
                escape: true,
            }),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Rendering
// ────────────────────────────────────────────────────────────────────────────

fn render_nodes(nodes: &[Node], context: &Map<String, Value>, out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Variable { path, escape } => match lookup(context, path) {
                Some(value) => {
                    let text = stringify(value);
                    if *escape {
                        push_escaped(out, &text);
                    } else {
                        out.push_str(&text);
                    }
                }
                None => debug!("template variable '{}' not in context", path),
            },
            Node::Conditional {
                path,
                then,
                otherwise,
            } => {
                if lookup(context, path).is_some_and(is_truthy) {
                    render_nodes(then, context, out);
                } else {
                    render_nodes(otherwise, context, out);
                }
            }
        }
    }
}

fn lookup<'v>(context: &'v Map<String, Value>, path: &str) -> Option<&'v Value> {
    let mut segments = path.split('.');
    let mut value = context.get(segments.next()?)?;
    for segment in segments {
        value = value.as_object()?.get(segment)?;
    }
    Some(value)
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(stringify)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Bool(_) | Value::Number(_) | Value::Object(_) => value.to_string(),
    }
}

fn push_escaped(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '`' => out.push_str("&#x60;"),
            '=' => out.push_str("&#x3D;"),
            // Braces too, so interpolated text can never form a tag.
            '{' => out.push_str("&#123;"),
            '}' => out.push_str("&#125;"),
            _ => out.push(c),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

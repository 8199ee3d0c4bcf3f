use std::fmt;
use std::ops::Range;

use codespan_reporting::diagnostic::{Diagnostic, Label, Severity};
use indexmap::IndexMap;
use serde_json::Value;

use crate::block::{
    Block, BlockKind, BlockMap, Blocks, ContributeTarget, ObjectBody, Parser, Scalar,
};

/// Errors found while loading a trace, with source location when known.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceError {
    pub message: String,
    pub span: Option<Range<usize>>,
    pub file_id: usize,
    pub notes: Vec<String>,
}

impl TraceError {
    pub fn error(message: impl Into<String>, span: Option<Range<usize>>, file_id: usize) -> Self {
        TraceError {
            message: message.into(),
            span,
            file_id,
            notes: Vec::new(),
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Convert to a codespan-reporting Diagnostic for display.
    pub fn to_diagnostic(&self) -> Diagnostic<usize> {
        let labels = match &self.span {
            Some(span) => vec![Label::primary(self.file_id, span.clone())],
            None => Vec::new(),
        };
        Diagnostic::new(Severity::Error)
            .with_message(&self.message)
            .with_labels(labels)
            .with_notes(self.notes.clone())
    }
}

impl fmt::Display for TraceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for TraceError {}

/// Parse a JSON trace document into its root [`Blocks`].
pub fn parse_trace(source: &str, file_id: usize) -> Result<Blocks, TraceError> {
    let value: Value = serde_json::from_str(source).map_err(|e| {
        let offset = byte_offset(source, e.line(), e.column());
        let end = source[offset..]
            .chars()
            .next()
            .map_or(offset, |c| offset + c.len_utf8());
        TraceError::error(format!("invalid JSON: {}", e), Some(offset..end), file_id)
    })?;
    let blocks = Decoder { file_id }.blocks(value, "")?;
    tracing::debug!(file_id, "trace loaded");
    Ok(blocks)
}

impl Blocks {
    /// Decode an already-parsed JSON value.
    pub fn from_value(value: Value) -> Result<Blocks, TraceError> {
        Decoder { file_id: 0 }.blocks(value, "")
    }
}

/// serde_json reports 1-based lines and columns.
fn byte_offset(source: &str, line: usize, column: usize) -> usize {
    let line_start: usize = source
        .split_inclusive('\n')
        .take(line.saturating_sub(1))
        .map(str::len)
        .sum();
    let offset = (line_start + column.saturating_sub(1)).min(source.len());
    // Clamp back to a char boundary so the slice in `parse_trace` is valid.
    (0..=offset)
        .rev()
        .find(|&i| source.is_char_boundary(i))
        .unwrap_or(0)
}

/// Append one JSON pointer segment.
fn pointer(path: &str, segment: &str) -> String {
    format!("{}/{}", path, segment.replace('~', "~0").replace('/', "~1"))
}

type Fields = IndexMap<String, Value>;

struct Decoder {
    file_id: usize,
}

impl Decoder {
    fn shape(&self, message: impl Into<String>, path: &str) -> TraceError {
        let location = if path.is_empty() { "/" } else { path };
        TraceError::error(message, None, self.file_id).with_note(format!("at {}", location))
    }

    fn blocks(&self, value: Value, path: &str) -> Result<Blocks, TraceError> {
        match value {
            Value::String(text) => Ok(Blocks::Scalar(Scalar::Text(text))),
            Value::Number(number) => Ok(Blocks::Scalar(Scalar::Number(number))),
            Value::Array(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| self.blocks(item, &pointer(path, &i.to_string())))
                .collect::<Result<Vec<_>, _>>()
                .map(Blocks::Sequence),
            Value::Object(map) => {
                let mut fields: Fields = map.into_iter().collect();
                let kind_name = match fields.get("kind") {
                    None => return self.block_map(fields, path).map(Blocks::Mapping),
                    Some(kind) => kind.as_str().map(str::to_owned),
                };
                let kind = match &kind_name {
                    Some(name) => self.kind(name, &mut fields, path)?,
                    None => None,
                };
                match kind {
                    Some(kind) => self.block(kind, fields, path).map(Blocks::from),
                    // nothing was taken out of `fields`, so the object is intact
                    None => {
                        tracing::debug!(path, "unrecognized block kind kept verbatim");
                        Ok(Blocks::Unrecognized(fields.into_iter().collect()))
                    }
                }
            }
            Value::Bool(_) | Value::Null => Err(self.shape(
                "expected text, number, block, list or mapping",
                path,
            )),
        }
    }

    fn block_map(&self, fields: Fields, path: &str) -> Result<BlockMap, TraceError> {
        fields
            .into_iter()
            .map(|(name, value)| {
                let child = pointer(path, &name);
                self.blocks(value, &child).map(|blocks| (name, blocks))
            })
            .collect()
    }

    /// Decode the kind-specific fields. `None` for a kind this crate does
    /// not know, in which case `fields` is left untouched.
    fn kind(
        &self,
        kind_name: &str,
        fields: &mut Fields,
        path: &str,
    ) -> Result<Option<BlockKind>, TraceError> {
        let kind = match kind_name {
            "model" => BlockKind::Model {
                input: self.take_blocks(fields, "input", path)?,
            },
            "code" => BlockKind::Code {
                code: self.require_blocks(fields, kind_name, "code", path)?,
            },
            "api" => BlockKind::Api {
                input: self.take_blocks(fields, "input", path)?,
            },
            "get" => BlockKind::Get,
            "data" => BlockKind::Data,
            "if" => BlockKind::If {
                then: self.take_blocks(fields, "then", path)?,
                else_: self.take_blocks(fields, "else", path)?,
                if_result: self.take_bool(fields, "if_result", path)?,
            },
            "read" => BlockKind::Read,
            "include" => BlockKind::Include,
            "function" => BlockKind::Function {
                function: take_value(fields, "function"),
                returns: self.require_blocks(fields, kind_name, "return", path)?,
            },
            "call" => BlockKind::Call {
                call: take_value(fields, "call"),
                args: take_value(fields, "args"),
            },
            "document" => BlockKind::Document {
                document: self.require_blocks(fields, kind_name, "document", path)?,
            },
            "sequence" => BlockKind::Sequence {
                sequence: self.require_blocks(fields, kind_name, "sequence", path)?,
            },
            "array" => BlockKind::Array {
                array: self.require_blocks(fields, kind_name, "array", path)?,
            },
            "object" => BlockKind::Object {
                object: self.object_body(fields, path)?,
            },
            "message" => BlockKind::Message {
                role: self.take_string(fields, "role", path)?,
                content: self.require_blocks(fields, kind_name, "content", path)?,
            },
            "repeat" => BlockKind::Repeat {
                repeat: self.require_blocks(fields, kind_name, "repeat", path)?,
            },
            "repeat_until" => BlockKind::RepeatUntil {
                repeat: self.require_blocks(fields, kind_name, "repeat", path)?,
            },
            "for" => BlockKind::For {
                repeat: self.require_blocks(fields, kind_name, "repeat", path)?,
            },
            "empty" => BlockKind::Empty,
            "error" => BlockKind::Error {
                program: self.take_blocks(fields, "program", path)?,
            },
            _ => return Ok(None),
        };
        Ok(Some(kind))
    }

    fn block(&self, kind: BlockKind, mut fields: Fields, path: &str) -> Result<Block, TraceError> {
        fields.shift_remove("kind");
        let mut block = Block::new(kind);
        block.description = self.take_string(&mut fields, "description", path)?;
        block.def = self.take_string(&mut fields, "def", path)?;
        block.defs = match fields.shift_remove("defs") {
            None | Some(Value::Null) => None,
            Some(Value::Object(map)) => {
                Some(self.block_map(map.into_iter().collect(), &pointer(path, "defs"))?)
            }
            Some(_) => return Err(self.shape("`defs` must be a mapping", &pointer(path, "defs"))),
        };
        block.contribute = self.take_contribute(&mut fields, path)?;
        block.result = take_value(&mut fields, "result");
        block.parser = self.take_parser(&mut fields, path)?;
        block.trace = self.take_blocks(&mut fields, "trace", path)?;
        block.fallback = self.take_blocks(&mut fields, "fallback", path)?;
        block.location = take_value(&mut fields, "location");
        block.attrs = fields;
        Ok(block)
    }

    fn object_body(&self, fields: &mut Fields, path: &str) -> Result<ObjectBody, TraceError> {
        let here = pointer(path, "object");
        match fields.shift_remove("object") {
            Some(Value::Array(items)) => match self.blocks(Value::Array(items), &here)? {
                Blocks::Sequence(entries) => Ok(ObjectBody::Entries(entries)),
                _ => Err(self.shape("`object` entries must be a list", &here)),
            },
            Some(Value::Object(map)) => self
                .block_map(map.into_iter().collect(), &here)
                .map(ObjectBody::Fields),
            None | Some(Value::Null) => {
                Err(self.shape("`object` block is missing `object`", path))
            }
            Some(_) => Err(self.shape("`object` must be a list or a mapping", &here)),
        }
    }

    fn take_parser(&self, fields: &mut Fields, path: &str) -> Result<Option<Parser>, TraceError> {
        let here = pointer(path, "parser");
        match fields.shift_remove("parser") {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(name)) => Ok(Some(Parser::Named(name))),
            Some(Value::Object(map)) => {
                let mut attrs: Fields = map.into_iter().collect();
                Ok(Some(match self.take_blocks(&mut attrs, "pdl", &here)? {
                    Some(pdl) => Parser::Pdl { pdl, attrs },
                    None => Parser::Other(attrs),
                }))
            }
            Some(_) => Err(self.shape("`parser` must be text or a mapping", &here)),
        }
    }

    fn take_blocks(
        &self,
        fields: &mut Fields,
        key: &str,
        path: &str,
    ) -> Result<Option<Blocks>, TraceError> {
        match fields.shift_remove(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => self.blocks(value, &pointer(path, key)).map(Some),
        }
    }

    fn require_blocks(
        &self,
        fields: &mut Fields,
        kind: &str,
        key: &str,
        path: &str,
    ) -> Result<Blocks, TraceError> {
        self.take_blocks(fields, key, path)?
            .ok_or_else(|| self.shape(format!("`{}` block is missing `{}`", kind, key), path))
    }

    fn take_string(
        &self,
        fields: &mut Fields,
        key: &str,
        path: &str,
    ) -> Result<Option<String>, TraceError> {
        match fields.shift_remove(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(text)) => Ok(Some(text)),
            Some(_) => Err(self.shape(format!("`{}` must be text", key), &pointer(path, key))),
        }
    }

    fn take_bool(
        &self,
        fields: &mut Fields,
        key: &str,
        path: &str,
    ) -> Result<Option<bool>, TraceError> {
        match fields.shift_remove(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Bool(flag)) => Ok(Some(flag)),
            Some(_) => Err(self.shape(format!("`{}` must be a boolean", key), &pointer(path, key))),
        }
    }

    fn take_contribute(
        &self,
        fields: &mut Fields,
        path: &str,
    ) -> Result<Option<Vec<ContributeTarget>>, TraceError> {
        let here = pointer(path, "contribute");
        let items = match fields.shift_remove("contribute") {
            None | Some(Value::Null) => return Ok(None),
            Some(Value::Array(items)) => items,
            Some(_) => return Err(self.shape("`contribute` must be a list", &here)),
        };
        items
            .iter()
            .map(|item| {
                item.as_str()
                    .and_then(ContributeTarget::from_name)
                    .ok_or_else(|| {
                        self.shape(
                            format!("unknown contribute target {}", item),
                            &here,
                        )
                        .with_note("expected `result` or `context`")
                    })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some)
    }
}

fn take_value(fields: &mut Fields, key: &str) -> Option<Value> {
    fields.shift_remove(key).filter(|value| !value.is_null())
}

//! Generic traversal over the child subtrees of a block.
//!
//! Every kind lists its child positions here once; whole-tree transforms
//! such as the code cleanup are written against [`Block::map_children`]
//! and never match on kinds themselves.

use crate::block::{Block, BlockKind, BlockMap, Blocks, ObjectBody, Parser};

impl Block {
    /// Rebuild this block with `f` applied to each child subtree: the
    /// `defs` values, the kind's own children, `trace`, the program of a
    /// `pdl` parser and `fallback`.
    /// Non-child fields are moved over untouched.
    pub fn map_children<F>(self, f: &mut F) -> Block
    where
        F: FnMut(Blocks) -> Blocks,
    {
        let Block {
            kind,
            description,
            def,
            defs,
            contribute,
            result,
            parser,
            trace,
            fallback,
            location,
            attrs,
        } = self;
        let defs = defs.map(|defs| map_entries(defs, f));
        let kind = kind.map_children(f);
        let trace = trace.map(|trace| f(trace));
        let parser = parser.map(|parser| match parser {
            Parser::Pdl { pdl, attrs } => Parser::Pdl { pdl: f(pdl), attrs },
            other => other,
        });
        let fallback = fallback.map(|fallback| f(fallback));
        Block {
            kind,
            description,
            def,
            defs,
            contribute,
            result,
            parser,
            trace,
            fallback,
            location,
            attrs,
        }
    }

    /// The same child positions as [`Block::map_children`], in the same order.
    pub fn children(&self) -> Vec<&Blocks> {
        let mut children: Vec<&Blocks> = Vec::new();
        if let Some(defs) = &self.defs {
            children.extend(defs.values());
        }
        self.kind.push_children(&mut children);
        children.extend(self.trace.as_ref());
        if let Some(Parser::Pdl { pdl, .. }) = &self.parser {
            children.push(pdl);
        }
        children.extend(self.fallback.as_ref());
        children
    }
}

fn map_entries<F>(map: BlockMap, f: &mut F) -> BlockMap
where
    F: FnMut(Blocks) -> Blocks,
{
    map.into_iter().map(|(name, value)| (name, f(value))).collect()
}

impl BlockKind {
    fn map_children<F>(self, f: &mut F) -> BlockKind
    where
        F: FnMut(Blocks) -> Blocks,
    {
        match self {
            BlockKind::Model { input } => BlockKind::Model {
                input: input.map(|input| f(input)),
            },
            BlockKind::Code { code } => BlockKind::Code { code: f(code) },
            BlockKind::Api { input } => BlockKind::Api {
                input: input.map(|input| f(input)),
            },
            BlockKind::If {
                then,
                else_,
                if_result,
            } => BlockKind::If {
                then: then.map(|then| f(then)),
                else_: else_.map(|else_| f(else_)),
                if_result,
            },
            BlockKind::Function { function, returns } => BlockKind::Function {
                function,
                returns: f(returns),
            },
            BlockKind::Document { document } => BlockKind::Document {
                document: f(document),
            },
            BlockKind::Sequence { sequence } => BlockKind::Sequence {
                sequence: f(sequence),
            },
            BlockKind::Array { array } => BlockKind::Array { array: f(array) },
            BlockKind::Object { object } => BlockKind::Object {
                object: match object {
                    ObjectBody::Entries(entries) => {
                        ObjectBody::Entries(entries.into_iter().map(|entry| f(entry)).collect())
                    }
                    ObjectBody::Fields(fields) => ObjectBody::Fields(map_entries(fields, f)),
                },
            },
            BlockKind::Message { role, content } => BlockKind::Message {
                role,
                content: f(content),
            },
            BlockKind::Repeat { repeat } => BlockKind::Repeat { repeat: f(repeat) },
            BlockKind::RepeatUntil { repeat } => BlockKind::RepeatUntil { repeat: f(repeat) },
            BlockKind::For { repeat } => BlockKind::For { repeat: f(repeat) },
            BlockKind::Error { program } => BlockKind::Error {
                program: program.map(|program| f(program)),
            },
            kind @ (BlockKind::Get
            | BlockKind::Data
            | BlockKind::Read
            | BlockKind::Include
            | BlockKind::Call { .. }
            | BlockKind::Empty) => kind,
        }
    }

    fn push_children<'a>(&'a self, children: &mut Vec<&'a Blocks>) {
        match self {
            BlockKind::Model { input } | BlockKind::Api { input } => children.extend(input.as_ref()),
            BlockKind::Code { code } => children.push(code),
            BlockKind::If { then, else_, .. } => {
                children.extend(then.as_ref());
                children.extend(else_.as_ref());
            }
            BlockKind::Function { returns, .. } => children.push(returns),
            BlockKind::Document { document } => children.push(document),
            BlockKind::Sequence { sequence } => children.push(sequence),
            BlockKind::Array { array } => children.push(array),
            BlockKind::Object { object } => match object {
                ObjectBody::Entries(entries) => children.extend(entries.iter()),
                ObjectBody::Fields(fields) => children.extend(fields.values()),
            },
            BlockKind::Message { content, .. } => children.push(content),
            BlockKind::Repeat { repeat }
            | BlockKind::RepeatUntil { repeat }
            | BlockKind::For { repeat } => children.push(repeat),
            BlockKind::Error { program } => children.extend(program.as_ref()),
            BlockKind::Get
            | BlockKind::Data
            | BlockKind::Read
            | BlockKind::Include
            | BlockKind::Call { .. }
            | BlockKind::Empty => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn block(value: serde_json::Value) -> Block {
        match Blocks::from_value(value).unwrap() {
            Blocks::Block(block) => *block,
            other => panic!("expected a block, got {:?}", other),
        }
    }

    #[test]
    fn children_in_order() {
        let block = block(json!({
            "kind": "if",
            "defs": {"d": "D"},
            "then": "T",
            "else": "E",
            "fallback": "F",
        }));
        let texts: Vec<_> = block.children().into_iter().cloned().collect();
        assert_eq!(
            texts,
            vec![
                Blocks::text("D"),
                Blocks::text("T"),
                Blocks::text("E"),
                Blocks::text("F"),
            ]
        );
    }

    #[test]
    fn map_visits_every_child_once_including_scalars() {
        let block = block(json!({
            "kind": "object",
            "object": {"a": "1", "b": "2"},
            "trace": "3",
        }));
        let mut seen = Vec::new();
        let mapped = block.clone().map_children(&mut |child| {
            seen.push(child.clone());
            child
        });
        assert_eq!(mapped, block);
        assert_eq!(seen, vec![Blocks::text("1"), Blocks::text("2"), Blocks::text("3")]);
    }

    #[test]
    fn map_leaves_non_child_fields() {
        let block = block(json!({
            "kind": "message",
            "role": "user",
            "content": "hi",
            "result": "hi",
            "def": "m",
        }));
        let mapped = block.clone().map_children(&mut |_| Blocks::text("X"));
        assert_eq!(
            mapped.kind,
            BlockKind::Message {
                role: Some("user".into()),
                content: Blocks::text("X"),
            }
        );
        assert_eq!(mapped.result, block.result);
        assert_eq!(mapped.def, block.def);
    }

    /// Replaces every child with its position in the visit.
    fn numbered(block: Block) -> Block {
        let mut next = 0;
        block.map_children(&mut |_| {
            next += 1;
            Blocks::text(next.to_string())
        })
    }

    #[test]
    fn model_and_api_input() {
        for kind in ["model", "api"] {
            let mapped = numbered(block(json!({"kind": kind, "input": "in", "trace": "t"})));
            assert_eq!(mapped.children(), vec![&Blocks::text("1"), &Blocks::text("2")]);
            assert!(matches!(
                mapped.kind,
                BlockKind::Model { input: Some(ref input) } | BlockKind::Api { input: Some(ref input) }
                    if *input == Blocks::text("1")
            ));
        }
    }

    #[test]
    fn code_body() {
        let mapped = numbered(block(json!({"kind": "code", "lan": "python", "code": "print(1)"})));
        assert_eq!(mapped.kind, BlockKind::Code { code: Blocks::text("1") });
        assert_eq!(mapped.attr("lan"), Some(&json!("python")));
    }

    #[test]
    fn function_return() {
        let mapped = numbered(block(json!({
            "kind": "function",
            "function": {"x": "str"},
            "return": "${ x }",
        })));
        assert_eq!(
            mapped.kind,
            BlockKind::Function {
                function: Some(json!({"x": "str"})),
                returns: Blocks::text("1"),
            }
        );
    }

    #[test]
    fn document_body() {
        let mapped = numbered(block(json!({"kind": "document", "document": ["a", "b"]})));
        assert_eq!(mapped.kind, BlockKind::Document { document: Blocks::text("1") });
    }

    #[test]
    fn repeat_until_and_for_bodies() {
        let until = numbered(block(json!({"kind": "repeat_until", "repeat": "r", "until": "c"})));
        assert_eq!(until.kind, BlockKind::RepeatUntil { repeat: Blocks::text("1") });
        let for_loop = numbered(block(json!({
            "kind": "for",
            "for": {"i": [1, 2]},
            "repeat": "r",
            "trace": ["a", "b"],
        })));
        assert_eq!(for_loop.kind, BlockKind::For { repeat: Blocks::text("1") });
        assert_eq!(for_loop.trace, Some(Blocks::text("2")));
    }

    #[test]
    fn error_program() {
        let mapped = numbered(block(json!({"kind": "error", "program": "p", "msg": "boom"})));
        assert_eq!(mapped.kind, BlockKind::Error { program: Some(Blocks::text("1")) });
        let bare = block(json!({"kind": "error", "msg": "boom"}));
        assert!(bare.children().is_empty());
    }

    #[test]
    fn pdl_parser_program_sits_between_trace_and_fallback() {
        let original = block(json!({
            "kind": "model",
            "model": "m",
            "parser": {"description": "d", "pdl": "p"},
            "trace": "t",
            "fallback": "f",
        }));
        assert_eq!(
            original.children(),
            vec![&Blocks::text("t"), &Blocks::text("p"), &Blocks::text("f")]
        );
        let mapped = numbered(original);
        let Some(Parser::Pdl { pdl, attrs }) = &mapped.parser else {
            panic!("parser lost its program");
        };
        assert_eq!(pdl, &Blocks::text("2"));
        assert_eq!(attrs.get("description"), Some(&json!("d")));

        let named = block(json!({"kind": "model", "model": "m", "parser": "json"}));
        assert!(named.children().is_empty());
    }

    #[test]
    fn leaf_kinds_have_no_children() {
        let call = block(json!({"kind": "call", "call": "f", "args": {"x": 1}}));
        assert!(call.children().is_empty());
    }
}

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::block::{Block, BlockKind, BlockMap, Blocks, ObjectBody, Parser, Scalar};

/// Canonical structural text of a trace subtree (pretty JSON).
pub fn to_structural_text(blocks: &Blocks) -> String {
    format!("{:#}", blocks.to_value())
}

impl Scalar {
    pub fn to_value(&self) -> Value {
        match self {
            Scalar::Text(text) => Value::String(text.clone()),
            Scalar::Number(number) => Value::Number(number.clone()),
        }
    }
}

impl Blocks {
    pub fn to_value(&self) -> Value {
        match self {
            Blocks::Scalar(scalar) => scalar.to_value(),
            Blocks::Block(block) => block.to_value(),
            Blocks::Sequence(items) => Value::Array(items.iter().map(Blocks::to_value).collect()),
            Blocks::Mapping(map) => Value::Object(map_to_object(map)),
            Blocks::Unrecognized(object) => Value::Object(object.clone()),
        }
    }
}

fn map_to_object(map: &BlockMap) -> Map<String, Value> {
    map.iter()
        .map(|(name, blocks)| (name.clone(), blocks.to_value()))
        .collect()
}

impl Block {
    /// Key order: kind, description, defs, kind fields, attrs, def,
    /// contribute, result, trace, parser, fallback, location.
    pub fn to_value(&self) -> Value {
        let mut out = Map::new();
        out.insert("kind".into(), Value::String(self.kind.name().into()));
        if let Some(description) = &self.description {
            out.insert("description".into(), Value::String(description.clone()));
        }
        if let Some(defs) = &self.defs {
            out.insert("defs".into(), Value::Object(map_to_object(defs)));
        }
        write_kind_fields(&self.kind, &mut out);
        for (name, value) in &self.attrs {
            out.insert(name.clone(), value.clone());
        }
        if let Some(def) = &self.def {
            out.insert("def".into(), Value::String(def.clone()));
        }
        if let Some(contribute) = &self.contribute {
            let targets = contribute
                .iter()
                .map(|target| Value::String(target.as_str().into()))
                .collect();
            out.insert("contribute".into(), Value::Array(targets));
        }
        if let Some(result) = &self.result {
            out.insert("result".into(), result.clone());
        }
        if let Some(trace) = &self.trace {
            out.insert("trace".into(), trace.to_value());
        }
        if let Some(parser) = &self.parser {
            out.insert("parser".into(), parser.to_value());
        }
        if let Some(fallback) = &self.fallback {
            out.insert("fallback".into(), fallback.to_value());
        }
        if let Some(location) = &self.location {
            out.insert("location".into(), location.clone());
        }
        Value::Object(out)
    }
}

impl Parser {
    pub fn to_value(&self) -> Value {
        match self {
            Parser::Named(name) => Value::String(name.clone()),
            Parser::Pdl { pdl, attrs } => {
                let mut out: Map<String, Value> = attrs.clone().into_iter().collect();
                put(&mut out, "pdl", pdl);
                Value::Object(out)
            }
            Parser::Other(attrs) => Value::Object(attrs.clone().into_iter().collect()),
        }
    }
}

fn write_kind_fields(kind: &BlockKind, out: &mut Map<String, Value>) {
    match kind {
        BlockKind::Model { input } | BlockKind::Api { input } => {
            if let Some(input) = input {
                put(out, "input", input);
            }
        }
        BlockKind::Code { code } => put(out, "code", code),
        BlockKind::If {
            then,
            else_,
            if_result,
        } => {
            if let Some(then) = then {
                put(out, "then", then);
            }
            if let Some(else_) = else_ {
                put(out, "else", else_);
            }
            if let Some(if_result) = if_result {
                out.insert("if_result".into(), Value::Bool(*if_result));
            }
        }
        BlockKind::Function { function, returns } => {
            if let Some(function) = function {
                out.insert("function".into(), function.clone());
            }
            out.insert("return".into(), returns.to_value());
        }
        BlockKind::Call { call, args } => {
            if let Some(call) = call {
                out.insert("call".into(), call.clone());
            }
            if let Some(args) = args {
                out.insert("args".into(), args.clone());
            }
        }
        BlockKind::Document { document } => put(out, "document", document),
        BlockKind::Sequence { sequence } => put(out, "sequence", sequence),
        BlockKind::Array { array } => put(out, "array", array),
        BlockKind::Object { object } => {
            let value = match object {
                ObjectBody::Entries(entries) => {
                    Value::Array(entries.iter().map(Blocks::to_value).collect())
                }
                ObjectBody::Fields(fields) => Value::Object(map_to_object(fields)),
            };
            out.insert("object".into(), value);
        }
        BlockKind::Message { role, content } => {
            if let Some(role) = role {
                out.insert("role".into(), Value::String(role.clone()));
            }
            out.insert("content".into(), content.to_value());
        }
        BlockKind::Repeat { repeat }
        | BlockKind::RepeatUntil { repeat }
        | BlockKind::For { repeat } => put(out, "repeat", repeat),
        BlockKind::Error { program } => {
            if let Some(program) = program {
                put(out, "program", program);
            }
        }
        BlockKind::Get | BlockKind::Data | BlockKind::Read | BlockKind::Include | BlockKind::Empty => {}
    }
}

fn put(out: &mut Map<String, Value>, key: &str, blocks: &Blocks) {
    out.insert(key.into(), blocks.to_value());
}

impl Serialize for Blocks {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Blocks {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Blocks::from_value(value).map_err(|e| {
            let notes = e.notes.join(", ");
            if notes.is_empty() {
                D::Error::custom(e.message)
            } else {
                D::Error::custom(format!("{} ({})", e.message, notes))
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn canonical_key_order() {
        let blocks = Blocks::from_value(json!({
            "location": {"file": "a.pdl"},
            "result": "x",
            "def": "name",
            "model": "granite",
            "kind": "model",
            "input": "hello",
        }))
        .unwrap();
        let value = blocks.to_value();
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["kind", "input", "model", "def", "result", "location"]);
    }

    #[test]
    fn structural_text_is_pretty_json() {
        let blocks = Blocks::from_value(json!({"kind": "get", "get": "x"})).unwrap();
        assert_eq!(
            to_structural_text(&blocks),
            "{\n  \"kind\": \"get\",\n  \"get\": \"x\"\n}"
        );
    }

    #[test]
    fn reload_of_serialized_trace_is_equal() {
        let original = json!({
            "kind": "sequence",
            "defs": {"x": {"kind": "data", "data": [1, 2], "contribute": []}},
            "sequence": [
                "text",
                {"kind": "if", "if": "c", "then": "a", "if_result": false},
                {"kind": "for", "for": {"i": [1, 2]}, "repeat": "${ i }", "trace": [["1"], ["2"]]},
                {"kind": "object", "object": {"k": {"kind": "message", "role": "user", "content": "v"}}},
                {"kind": "function", "function": {"x": "str"}, "return": "${ x }"},
                {"kind": "call", "call": "f", "args": {"x": "1"}, "trace": "1"},
            ],
        });
        let blocks = Blocks::from_value(original).unwrap();
        let reloaded: Blocks =
            serde_json::from_str(&to_structural_text(&blocks)).expect("reload");
        assert_eq!(reloaded, blocks);
    }

    #[test]
    fn parser_and_unrecognized_nodes_survive_reload() {
        let blocks = Blocks::from_value(json!({
            "kind": "sequence",
            "sequence": [
                {"kind": "model", "model": "m", "parser": {"description": "pairs", "pdl": ["x"]}},
                {"kind": "code", "code": "1", "parser": "yaml"},
                {"kind": "teleport", "to": "mars"},
            ],
        }))
        .unwrap();
        let text = to_structural_text(&blocks);
        assert!(text.contains("\"parser\": {\n        \"description\""));
        let reloaded: Blocks = serde_json::from_str(&text).expect("reload");
        assert_eq!(reloaded, blocks);
    }

    #[test]
    fn deserialize_reports_decoder_notes() {
        let err = serde_json::from_str::<Blocks>(r#"{"kind": "get", "defs": 1}"#).unwrap_err();
        assert!(err.to_string().contains("`defs` must be a mapping (at /defs)"));
    }
}

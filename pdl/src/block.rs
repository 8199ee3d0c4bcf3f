use indexmap::IndexMap;
use serde_json::{Map, Number, Value};

/// Named subtrees, kept in authored order (`defs`, `object` fields, kind-less mappings).
pub type BlockMap = IndexMap<String, Blocks>;

/// A leaf of the trace tree. Scalars are already-final results.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Text(String),
    Number(Number),
}

/// The recursive value every part of a trace is made of.
#[derive(Debug, Clone, PartialEq)]
pub enum Blocks {
    Scalar(Scalar),
    Block(Box<Block>),
    Sequence(Vec<Blocks>),
    /// A JSON object without a `kind` field.
    Mapping(BlockMap),
    /// A JSON object whose `kind` is not one this crate knows, kept verbatim.
    Unrecognized(Map<String, Value>),
}

impl Blocks {
    pub fn text(text: impl Into<String>) -> Self {
        Blocks::Scalar(Scalar::Text(text.into()))
    }

    /// The empty text, used wherever an optional branch is absent.
    pub fn empty() -> Self {
        Blocks::text(String::new())
    }

    pub fn as_block(&self) -> Option<&Block> {
        match self {
            Blocks::Block(block) => Some(block),
            _ => None,
        }
    }
}

impl From<Block> for Blocks {
    fn from(block: Block) -> Self {
        Blocks::Block(Box::new(block))
    }
}

/// Where a block's result is sent once computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContributeTarget {
    Result,
    Context,
}

impl ContributeTarget {
    pub fn as_str(self) -> &'static str {
        match self {
            ContributeTarget::Result => "result",
            ContributeTarget::Context => "context",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "result" => Some(ContributeTarget::Result),
            "context" => Some(ContributeTarget::Context),
            _ => None,
        }
    }
}

/// The body of an `object` block: either a list of entries or named fields.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectBody {
    Entries(Vec<Blocks>),
    Fields(BlockMap),
}

/// How the raw result of a block was parsed.
#[derive(Debug, Clone, PartialEq)]
pub enum Parser {
    /// `json`, `yaml` and other parsers named by a string.
    Named(String),
    /// A PDL program run over the raw result.
    Pdl {
        pdl: Blocks,
        /// `description` and anything else next to `pdl`.
        attrs: IndexMap<String, Value>,
    },
    /// Regex parsers and other parser objects; opaque.
    Other(IndexMap<String, Value>),
}

/// Kind-specific part of a block. Every variant owns its child subtrees;
/// other authored fields of the kind live in [`Block::attrs`].
#[derive(Debug, Clone, PartialEq)]
pub enum BlockKind {
    Model {
        input: Option<Blocks>,
    },
    Code {
        code: Blocks,
    },
    Api {
        input: Option<Blocks>,
    },
    Get,
    Data,
    If {
        then: Option<Blocks>,
        else_: Option<Blocks>,
        /// Outcome of the condition; `None` until evaluated.
        if_result: Option<bool>,
    },
    Read,
    Include,
    Function {
        /// Parameter signature.
        function: Option<Value>,
        returns: Blocks,
    },
    Call {
        call: Option<Value>,
        args: Option<Value>,
    },
    Document {
        document: Blocks,
    },
    Sequence {
        sequence: Blocks,
    },
    Array {
        array: Blocks,
    },
    Object {
        object: ObjectBody,
    },
    Message {
        role: Option<String>,
        content: Blocks,
    },
    Repeat {
        repeat: Blocks,
    },
    RepeatUntil {
        repeat: Blocks,
    },
    For {
        repeat: Blocks,
    },
    Empty,
    Error {
        program: Option<Blocks>,
    },
}

impl BlockKind {
    /// The `kind` discriminant as written in a trace.
    pub fn name(&self) -> &'static str {
        match self {
            BlockKind::Model { .. } => "model",
            BlockKind::Code { .. } => "code",
            BlockKind::Api { .. } => "api",
            BlockKind::Get => "get",
            BlockKind::Data => "data",
            BlockKind::If { .. } => "if",
            BlockKind::Read => "read",
            BlockKind::Include => "include",
            BlockKind::Function { .. } => "function",
            BlockKind::Call { .. } => "call",
            BlockKind::Document { .. } => "document",
            BlockKind::Sequence { .. } => "sequence",
            BlockKind::Array { .. } => "array",
            BlockKind::Object { .. } => "object",
            BlockKind::Message { .. } => "message",
            BlockKind::Repeat { .. } => "repeat",
            BlockKind::RepeatUntil { .. } => "repeat_until",
            BlockKind::For { .. } => "for",
            BlockKind::Empty => "empty",
            BlockKind::Error { .. } => "error",
        }
    }
}

/// One step of a program trace.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub kind: BlockKind,
    pub description: Option<String>,
    /// Name this block is bound to in its enclosing scope.
    pub def: Option<String>,
    pub defs: Option<BlockMap>,
    pub contribute: Option<Vec<ContributeTarget>>,
    pub result: Option<Value>,
    pub parser: Option<Parser>,
    /// Recorded iterations (loops) or the unwound callee (calls), most recent last.
    pub trace: Option<Blocks>,
    pub fallback: Option<Blocks>,
    /// Source position; opaque.
    pub location: Option<Value>,
    /// Remaining authored fields, in source order.
    pub attrs: IndexMap<String, Value>,
}

impl Block {
    pub fn new(kind: BlockKind) -> Self {
        Block {
            kind,
            description: None,
            def: None,
            defs: None,
            contribute: None,
            result: None,
            parser: None,
            trace: None,
            fallback: None,
            location: None,
            attrs: IndexMap::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&Value> {
        self.attrs.get(name)
    }

    fn contributes(&self, target: ContributeTarget) -> bool {
        self.contribute
            .as_ref()
            .is_some_and(|targets| targets.contains(&target))
    }

    /// `contribute` is present and does not include `result`.
    pub fn is_result_hidden(&self) -> bool {
        self.contribute.is_some() && !self.contributes(ContributeTarget::Result)
    }

    /// `contribute` is exactly `[]` or `[context]`: the summary shows nothing.
    pub fn hides_summary(&self) -> bool {
        matches!(
            self.contribute.as_deref(),
            Some([]) | Some([ContributeTarget::Context])
        )
    }

    /// `contribute` names both targets, which is the default.
    pub fn contributes_everywhere(&self) -> bool {
        self.contributes(ContributeTarget::Result) && self.contributes(ContributeTarget::Context)
    }
}

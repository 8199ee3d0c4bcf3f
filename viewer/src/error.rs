use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// A non-scalar node without a `kind`. Carries its escaped structural text.
    #[error("missing kind:\n{html}")]
    MissingKind { html: String },
    /// A node whose `kind` is not one of the known kinds. Carries its escaped structural text.
    #[error("unknown kind:\n{html}")]
    UnknownKind { html: String },
    #[error("no display node at path {0:?}")]
    NoNodeAtPath(Vec<usize>),
}

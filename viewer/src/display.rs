use std::fmt;

use pdl::Blocks;

use crate::error::RenderError;
use crate::escape::htmlize_str;
use crate::loop_trace::show_loop_trace;
use crate::render::show_blocks;
use crate::toggle::show_output;

/// A run of sibling display nodes.
pub type Fragment<'a> = Vec<DisplayNode<'a>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Element {
    Div,
    Fieldset,
    Pre,
}

impl Element {
    pub fn tag_name(self) -> &'static str {
        match self {
            Element::Div => "div",
            Element::Fieldset => "fieldset",
            Element::Pre => "pre",
        }
    }
}

/// Visual category attached to a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Block,
    ResultHidden,
    /// The kind of the block being displayed, as written in the trace.
    Kind(&'static str),
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tag::Block => write!(f, "block"),
            Tag::ResultHidden => write!(f, "result-hidden"),
            Tag::Kind(kind) => write!(f, "kind-{}", kind.replace('_', "-")),
        }
    }
}

/// What a click on a node replaces it with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClickAction<'a> {
    /// Summary view to full rendering.
    ShowBlocks(&'a Blocks),
    /// Full rendering back to the summary view.
    ShowOutput(&'a Blocks),
    /// Disclosure marker to the earlier iterations of a loop.
    RevealIterations(&'a [Blocks]),
}

impl<'a> ClickAction<'a> {
    pub fn perform(self) -> Result<Fragment<'a>, RenderError> {
        match self {
            ClickAction::ShowBlocks(data) => show_blocks(data),
            ClickAction::ShowOutput(data) => Ok(vec![show_output(data)]),
            ClickAction::RevealIterations(trace) => show_loop_trace(trace),
        }
    }
}

/// One node of the display tree. Text in `html` is already escaped.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayNode<'a> {
    pub element: Element,
    pub tags: Vec<Tag>,
    pub label: Option<String>,
    pub html: Option<String>,
    pub children: Fragment<'a>,
    pub on_click: Option<ClickAction<'a>>,
    /// Subtree published to the code slot on hover.
    pub on_hover: Option<&'a Blocks>,
}

impl<'a> DisplayNode<'a> {
    pub fn new(element: Element) -> Self {
        DisplayNode {
            element,
            tags: Vec::new(),
            label: None,
            html: None,
            children: Vec::new(),
            on_click: None,
            on_hover: None,
        }
    }

    /// A `<pre>` holding raw text.
    pub fn pre(text: &str) -> Self {
        DisplayNode::new(Element::Pre).with_html(htmlize_str(text))
    }

    pub fn with_tag(mut self, tag: Tag) -> Self {
        self.tag(tag);
        self
    }

    pub fn tag(&mut self, tag: Tag) {
        if !self.tags.contains(&tag) {
            self.tags.push(tag);
        }
    }

    pub fn has_tag(&self, tag: Tag) -> bool {
        self.tags.contains(&tag)
    }

    pub fn with_html(mut self, html: impl Into<String>) -> Self {
        self.html = Some(html.into());
        self
    }

    pub fn with_children(mut self, children: Fragment<'a>) -> Self {
        self.children = children;
        self
    }

    pub fn on_click(mut self, action: ClickAction<'a>) -> Self {
        self.on_click = Some(action);
        self
    }

    /// Concatenated text of this subtree, labels excluded.
    pub fn text(&self) -> String {
        let mut out = self.html.clone().unwrap_or_default();
        for child in &self.children {
            out.push_str(&child.text());
        }
        out
    }
}

/// Static HTML for the node; click and hover actions are not emitted.
impl fmt::Display for DisplayNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = self.element.tag_name();
        write!(f, "<{}", tag)?;
        if !self.tags.is_empty() {
            let classes: Vec<String> = self.tags.iter().map(Tag::to_string).collect();
            write!(f, " class=\"{}\"", classes.join(" "))?;
        }
        write!(f, ">")?;
        if let Some(label) = &self.label {
            write!(f, "<legend>{}</legend>", htmlize_str(label))?;
        }
        if let Some(html) = &self.html {
            write!(f, "{}", html)?;
        }
        for child in &self.children {
            write!(f, "{}", child)?;
        }
        write!(f, "</{}>", tag)
    }
}

pub fn fragment_to_html(fragment: &[DisplayNode<'_>]) -> String {
    fragment.iter().map(DisplayNode::to_string).collect()
}

//! The two terse views of a node: the summary shown until a node is
//! expanded, and the result-or-code view used inside block bodies.

use pdl::{Blocks, blocks_code_cleanup, to_structural_text};

use crate::display::{ClickAction, DisplayNode, Element, Tag};
use crate::escape::{PLACEHOLDER, htmlize_opt, htmlize_scalar, htmlize_str};

/// Summary view. A click expands it into the full rendering of `data`.
pub fn show_output(data: &Blocks) -> DisplayNode<'_> {
    let mut node = DisplayNode::new(Element::Div)
        .with_tag(Tag::Block)
        .on_click(ClickAction::ShowBlocks(data));
    let html = match data {
        Blocks::Scalar(scalar) => htmlize_scalar(scalar),
        Blocks::Block(block) if block.hides_summary() => {
            node.tag(Tag::ResultHidden);
            PLACEHOLDER.to_string()
        }
        Blocks::Block(block) => htmlize_opt(block.result.as_ref()),
        Blocks::Sequence(_) | Blocks::Mapping(_) | Blocks::Unrecognized(_) => {
            PLACEHOLDER.to_string()
        }
    };
    node.with_html(html)
}

/// The computed result when there is one, else the cleaned code.
pub fn show_result_or_code(data: &Blocks) -> DisplayNode<'_> {
    match data {
        Blocks::Scalar(scalar) => show_value(htmlize_scalar(scalar)),
        Blocks::Block(block) if block.result.is_some() => {
            show_value(htmlize_opt(block.result.as_ref()))
        }
        _ => show_code(data),
    }
}

fn show_value<'a>(html: String) -> DisplayNode<'a> {
    DisplayNode::new(Element::Div).with_html(html)
}

pub fn show_code(data: &Blocks) -> DisplayNode<'_> {
    DisplayNode::new(Element::Pre).with_html(htmlize_str(&code_text(data)))
}

/// Structural text of `data` after cleanup.
pub fn code_text(data: &Blocks) -> String {
    to_structural_text(&blocks_code_cleanup(data))
}

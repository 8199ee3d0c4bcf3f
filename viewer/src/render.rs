use std::slice;

use pdl::{Block, BlockKind, BlockMap, Blocks, ObjectBody, to_structural_text};
use serde_json::{Map, Value};

use crate::display::{ClickAction, DisplayNode, Element, Fragment, Tag};
use crate::error::RenderError;
use crate::escape::{PLACEHOLDER, htmlize_str};
use crate::loop_trace::{show_defs, show_loop_trace};
use crate::toggle::{show_output, show_result_or_code};

/// Stands in for an absent `then` or `else` branch.
static EMPTY: Blocks = Blocks::Scalar(pdl::Scalar::Text(String::new()));

/// Render any trace value. Sequences are flattened into one fragment.
pub fn show_blocks(blocks: &Blocks) -> Result<Fragment<'_>, RenderError> {
    match blocks {
        Blocks::Sequence(items) => {
            let mut fragment = Vec::new();
            for item in items {
                fragment.extend(show_blocks(item)?);
            }
            Ok(fragment)
        }
        other => Ok(vec![show_block(other)?]),
    }
}

/// Render one node. Scalars become summary views; blocks become a
/// container that collapses to its summary when clicked.
pub fn show_block(data: &Blocks) -> Result<DisplayNode<'_>, RenderError> {
    let block = match data {
        Blocks::Scalar(_) => return Ok(show_output(data)),
        Blocks::Block(block) => block,
        Blocks::Sequence(_) | Blocks::Mapping(_) => {
            let html = htmlize_str(&to_structural_text(data));
            tracing::warn!("trace node without a kind");
            return Err(RenderError::MissingKind { html });
        }
        Blocks::Unrecognized(object) => {
            let html = htmlize_str(&to_structural_text(data));
            tracing::warn!(kind = ?object.get("kind"), "trace node of unknown kind");
            return Err(RenderError::UnknownKind { html });
        }
    };

    let mut container = DisplayNode::new(Element::Div).on_click(ClickAction::ShowOutput(data));
    container.on_hover = Some(data);
    if let Some(defs) = block.defs.as_ref().filter(|defs| !defs.is_empty()) {
        container.children.extend(show_defs(defs)?);
    }

    let mut body = DisplayNode::new(Element::Fieldset)
        .with_tag(Tag::Block)
        .with_tag(Tag::Kind(block.kind.name()));
    body.label = block.def.clone().filter(|name| !name.is_empty());
    if block.is_result_hidden() {
        body.tag(Tag::ResultHidden);
    }
    fill_body(data, block, &mut body)?;
    container.children.push(body);
    Ok(container)
}

fn fill_body<'a>(
    data: &'a Blocks,
    block: &'a Block,
    body: &mut DisplayNode<'a>,
) -> Result<(), RenderError> {
    match &block.kind {
        BlockKind::Model { .. }
        | BlockKind::Code { .. }
        | BlockKind::Api { .. }
        | BlockKind::Get
        | BlockKind::Data
        | BlockKind::Read
        | BlockKind::Include
        | BlockKind::Error { .. } => body.children.push(show_result_or_code(data)),
        BlockKind::If {
            then,
            else_,
            if_result,
        } => match if_result {
            None => body.children.push(show_result_or_code(data)),
            Some(true) => body.children.extend(show_blocks(then.as_ref().unwrap_or(&EMPTY))?),
            Some(false) => body.children.extend(show_blocks(else_.as_ref().unwrap_or(&EMPTY))?),
        },
        BlockKind::Function { function, returns } => {
            body.tag(Tag::ResultHidden);
            body.children.push(structural_label(&[("function", function.as_ref())]));
            body.children.extend(show_blocks(returns)?);
        }
        BlockKind::Call { call, args } => match &block.trace {
            Some(trace) => {
                body.children.push(structural_label(&[
                    ("call", call.as_ref()),
                    ("args", args.as_ref()),
                ]));
                body.children.extend(show_blocks(trace)?);
            }
            None => body.children.push(show_result_or_code(data)),
        },
        BlockKind::Document { document } => body.children.extend(show_blocks(document)?),
        BlockKind::Sequence { sequence } => body.children.extend(show_blocks(sequence)?),
        BlockKind::Array { array } => match array {
            Blocks::Sequence(items) => body.children.extend(show_array(items)?),
            reference => {
                body.children.push(DisplayNode::pre("["));
                body.children.extend(show_blocks(reference)?);
                body.children.push(DisplayNode::pre("]"));
            }
        },
        BlockKind::Object { object } => match object {
            ObjectBody::Entries(entries) => body.children.extend(show_array(entries)?),
            ObjectBody::Fields(fields) => body.children.extend(show_object(fields)?),
        },
        BlockKind::Message { role, content } => {
            let role = role.as_deref().unwrap_or_default();
            body.children.push(DisplayNode::pre(&format!("{}: ", role)));
            body.children.extend(show_blocks(content)?);
        }
        BlockKind::Repeat { repeat }
        | BlockKind::RepeatUntil { repeat }
        | BlockKind::For { repeat } => {
            let iterations = match &block.trace {
                Some(Blocks::Sequence(items)) => items.as_slice(),
                Some(trace) => slice::from_ref(trace),
                None => slice::from_ref(repeat),
            };
            body.children.extend(show_loop_trace(iterations)?);
        }
        BlockKind::Empty => body.html = Some(PLACEHOLDER.to_string()),
    }
    Ok(())
}

/// `[`, each element followed by `,`, then `]`.
pub fn show_array(items: &[Blocks]) -> Result<Fragment<'_>, RenderError> {
    let mut fragment = vec![DisplayNode::pre("[")];
    for item in items {
        fragment.extend(show_blocks(item)?);
        fragment.push(DisplayNode::pre(","));
    }
    fragment.push(DisplayNode::pre("]"));
    Ok(fragment)
}

/// `{`, each `key:` and value followed by `,`, then `}`.
pub fn show_object(fields: &BlockMap) -> Result<Fragment<'_>, RenderError> {
    let mut fragment = vec![DisplayNode::pre("{")];
    for (key, value) in fields {
        fragment.push(DisplayNode::pre(&format!("{}:", key)));
        fragment.extend(show_blocks(value)?);
        fragment.push(DisplayNode::pre(","));
    }
    fragment.push(DisplayNode::pre("}"));
    Ok(fragment)
}

/// A `<pre>` with the structural text of a few named fields.
fn structural_label<'a>(fields: &[(&str, Option<&Value>)]) -> DisplayNode<'a> {
    let object: Map<String, Value> = fields
        .iter()
        .map(|(name, value)| (name.to_string(), value.cloned().unwrap_or(Value::Null)))
        .collect();
    DisplayNode::pre(&format!("{:#}", Value::Object(object)))
}

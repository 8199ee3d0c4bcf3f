use pdl::{BlockMap, Blocks};

use crate::display::{ClickAction, DisplayNode, Element, Fragment, Tag};
use crate::error::RenderError;
use crate::render::show_blocks;

/// Marker standing for the iterations not yet revealed.
pub const ELLIPSIS: &str = "···";

/// Render the last iteration. Earlier ones sit behind a marker that,
/// when clicked, becomes the rendering of all but the last iteration.
pub fn show_loop_trace(trace: &[Blocks]) -> Result<Fragment<'_>, RenderError> {
    let Some((last, earlier)) = trace.split_last() else {
        return Ok(Vec::new());
    };
    let mut fragment = Vec::with_capacity(2);
    if !earlier.is_empty() {
        fragment.push(
            DisplayNode::new(Element::Div)
                .with_html(ELLIPSIS)
                .on_click(ClickAction::RevealIterations(earlier)),
        );
    }
    fragment.push(
        DisplayNode::new(Element::Div)
            .with_tag(Tag::Block)
            .with_tag(Tag::Kind("sequence"))
            .with_children(show_blocks(last)?),
    );
    Ok(fragment)
}

/// One labeled panel per definition, results hidden.
pub fn show_defs(defs: &BlockMap) -> Result<Fragment<'_>, RenderError> {
    let mut fragment = Vec::with_capacity(defs.len());
    for (name, value) in defs {
        let mut panel = DisplayNode::new(Element::Fieldset)
            .with_tag(Tag::ResultHidden)
            .with_children(show_blocks(value)?);
        panel.label = Some(name.clone());
        fragment.push(panel);
    }
    Ok(fragment)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn iterations() -> Vec<Blocks> {
        vec![Blocks::text("i1"), Blocks::text("i2"), Blocks::text("i3")]
    }

    #[test]
    fn empty_trace_renders_nothing() {
        assert!(show_loop_trace(&[]).unwrap().is_empty());
    }

    #[test]
    fn single_iteration_has_no_marker() {
        let trace = vec![Blocks::text("only")];
        let fragment = show_loop_trace(&trace).unwrap();
        assert_eq!(fragment.len(), 1);
        assert_eq!(fragment[0].tags, vec![Tag::Block, Tag::Kind("sequence")]);
        assert_eq!(fragment[0].text(), "only");
    }

    #[test]
    fn marker_reveals_all_but_last() {
        let trace = iterations();
        let fragment = show_loop_trace(&trace).unwrap();
        assert_eq!(fragment.len(), 2);
        assert_eq!(fragment[0].html.as_deref(), Some(ELLIPSIS));
        assert_eq!(fragment[0].on_click, Some(ClickAction::RevealIterations(&trace[..2])));
        assert_eq!(fragment[1].text(), "i3");
    }

    #[test]
    fn defs_in_mapping_order() {
        let defs: BlockMap = [("b", "2"), ("a", "1")]
            .into_iter()
            .map(|(name, value)| (name.to_string(), Blocks::text(value)))
            .collect();
        let panels = show_defs(&defs).unwrap();
        let labels: Vec<_> = panels.iter().map(|p| p.label.clone().unwrap()).collect();
        assert_eq!(labels, vec!["b", "a"]);
        assert!(panels.iter().all(|p| p.has_tag(Tag::ResultHidden)));
    }
}

use pdl::Blocks;

use crate::config::ViewerConfig;
use crate::display::{DisplayNode, Fragment};
use crate::error::RenderError;
use crate::page::render_page;
use crate::render::show_blocks;
use crate::toggle::code_text;

/// The single external "current code" surface. Writes replace its contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeSlot {
    pub id: String,
    pub text: Option<String>,
}

/// A rendered trace together with the interaction state a host keeps:
/// which rendering each node currently shows and what the code slot holds.
#[derive(Debug)]
pub struct Session<'a> {
    root: Fragment<'a>,
    code: CodeSlot,
}

impl<'a> Session<'a> {
    pub fn new(trace: &'a Blocks, code_slot_id: impl Into<String>) -> Result<Self, RenderError> {
        let _span = tracing::debug_span!("render").entered();
        let root = show_blocks(trace)?;
        tracing::debug!(nodes = root.len(), "trace rendered");
        Ok(Session {
            root,
            code: CodeSlot {
                id: code_slot_id.into(),
                text: None,
            },
        })
    }

    pub fn root(&self) -> &[DisplayNode<'a>] {
        &self.root
    }

    pub fn code(&self) -> &CodeSlot {
        &self.code
    }

    pub fn node(&self, path: &[usize]) -> Option<&DisplayNode<'a>> {
        let (&first, rest) = path.split_first()?;
        let mut node = self.root.get(first)?;
        for &index in rest {
            node = node.children.get(index)?;
        }
        Some(node)
    }

    /// Deliver a click to the node at `path`. It bubbles up to the nearest
    /// node with a click action, which is replaced by that action's rendering.
    pub fn activate(&mut self, path: &[usize]) -> Result<(), RenderError> {
        let chain = self.chain(path)?;
        let target = chain
            .iter()
            .enumerate()
            .rev()
            .find_map(|(depth, node)| node.on_click.map(|action| (depth, action)));
        let Some((depth, action)) = target else {
            tracing::debug!(?path, "click without handler");
            return Ok(());
        };

        let replacement = action.perform()?;
        tracing::debug!(?path, depth, nodes = replacement.len(), "node replaced");
        let index = path[depth];
        let siblings = self
            .siblings_mut(&path[..depth])
            .ok_or_else(|| RenderError::NoNodeAtPath(path.to_vec()))?;
        siblings.splice(index..=index, replacement);
        Ok(())
    }

    /// Deliver a hover to the node at `path`, publishing the cleaned code
    /// of the nearest node that has a hover action.
    pub fn hover(&mut self, path: &[usize]) -> Result<(), RenderError> {
        let source = self
            .chain(path)?
            .into_iter()
            .rev()
            .find_map(|node| node.on_hover);
        if let Some(data) = source {
            self.code.text = Some(code_text(data));
            tracing::debug!(?path, slot = %self.code.id, "code slot updated");
        }
        Ok(())
    }

    /// The whole page as static HTML.
    pub fn to_html(&self, config: &ViewerConfig, css: &str) -> String {
        render_page(&self.root, self.code.text.as_deref(), config, css)
    }

    /// Every node from the root fragment down to `path`.
    fn chain(&self, path: &[usize]) -> Result<Vec<&DisplayNode<'a>>, RenderError> {
        let missing = || RenderError::NoNodeAtPath(path.to_vec());
        if path.is_empty() {
            return Err(missing());
        }
        let mut chain = Vec::with_capacity(path.len());
        let mut level: &[DisplayNode<'a>] = &self.root;
        for &index in path {
            let node = level.get(index).ok_or_else(missing)?;
            chain.push(node);
            level = &node.children;
        }
        Ok(chain)
    }

    fn siblings_mut(&mut self, parent: &[usize]) -> Option<&mut Fragment<'a>> {
        let mut level = &mut self.root;
        for &index in parent {
            level = &mut level.get_mut(index)?.children;
        }
        Some(level)
    }
}

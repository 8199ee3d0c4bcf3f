use crate::block::{Block, Blocks};

/// Strip computed and volatile information from a subtree, leaving what
/// was authored. The input is never modified.
pub fn blocks_code_cleanup(blocks: &Blocks) -> Blocks {
    clean(blocks.clone())
}

pub fn block_code_cleanup(block: &Block) -> Block {
    clean_block(block.clone())
}

fn clean(blocks: Blocks) -> Blocks {
    match blocks {
        Blocks::Scalar(_) => blocks,
        Blocks::Block(block) => Blocks::Block(Box::new(clean_block(*block))),
        Blocks::Sequence(items) => Blocks::Sequence(items.into_iter().map(clean).collect()),
        Blocks::Mapping(map) => {
            Blocks::Mapping(map.into_iter().map(|(name, value)| (name, clean(value))).collect())
        }
        // children of an unknown kind cannot be located; only the top level is cleaned
        Blocks::Unrecognized(mut object) => {
            for key in ["result", "trace", "location"] {
                object.shift_remove(key);
            }
            Blocks::Unrecognized(object)
        }
    }
}

fn clean_block(mut block: Block) -> Block {
    block.result = None;
    block.trace = None;
    // [result, context] is the default
    if block.contributes_everywhere() {
        block.contribute = None;
    }
    if block.defs.as_ref().is_some_and(|defs| defs.is_empty()) {
        block.defs = None;
    }
    block.location = None;
    block.map_children(&mut clean)
}

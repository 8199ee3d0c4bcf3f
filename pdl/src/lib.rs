pub mod block;
pub mod cleanup;
pub mod loader;
pub mod serialize;
pub mod visit;

pub use block::{
    Block, BlockKind, BlockMap, Blocks, ContributeTarget, ObjectBody, Parser, Scalar,
};
pub use cleanup::{block_code_cleanup, blocks_code_cleanup};
pub use loader::{TraceError, parse_trace};
pub use serialize::to_structural_text;

pub mod config;
pub mod display;
pub mod error;
pub mod escape;
pub mod loop_trace;
pub mod page;
pub mod render;
pub mod session;
pub mod toggle;

pub use config::ViewerConfig;
pub use display::{ClickAction, DisplayNode, Element, Fragment, Tag};
pub use error::RenderError;
pub use escape::{PLACEHOLDER, htmlize, htmlize_str};
pub use loop_trace::{show_defs, show_loop_trace};
pub use render::{show_array, show_block, show_blocks, show_object};
pub use session::{CodeSlot, Session};
pub use toggle::{code_text, show_code, show_output, show_result_or_code};

//! Pipeline: metric input → output plugin.

mod forward;
mod input;
mod stats;

pub use forward::Pipeline;
pub use input::open_input;

pub mod markers;
pub mod overlay;
pub mod tree;

pub use markers::*;
pub use overlay::*;
pub use tree::*;

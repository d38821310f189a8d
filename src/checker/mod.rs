pub mod correction;
pub mod rules;
pub mod source;

pub use correction::*;
pub use rules::*;
pub use source::*;

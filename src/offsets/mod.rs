pub mod utf16;
pub mod splice;
pub mod locate;

pub use utf16::*;
pub use splice::*;
pub use locate::*;

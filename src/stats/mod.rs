pub mod counter;
pub mod deferred;
pub mod relay;
pub mod storage;

pub use counter::*;
pub use deferred::Deferred;
pub use relay::*;
pub use storage::*;

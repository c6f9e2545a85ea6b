pub mod event;
pub mod offering;
pub mod period;
pub mod version;

pub use event::*;
pub use offering::*;
pub use period::*;
pub use version::*;

pub mod builder;
pub mod format;
pub mod layout;
pub mod model;
pub mod types;
pub mod verify;

pub use builder::*;
pub use format::*;
pub use layout::*;
pub use model::*;
pub use types::*;
pub use verify::*;

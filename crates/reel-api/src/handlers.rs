//! Request handlers.

pub mod assemble;
pub mod clips;
pub mod download;
pub mod export;
pub mod health;

pub use assemble::*;
pub use clips::*;
pub use download::*;
pub use export::*;
pub use health::*;

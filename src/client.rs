//! Divination client: the single entry point for the presentation layer.
//!
//! Keep the public surface small: one call that runs a full exchange and one
//! diagnostic accessor. Implementation details are split into submodules under
//! `src/client/`.

pub mod builder;
pub mod core;
pub mod outcome;
mod session;

pub use builder::DivinationClientBuilder;
pub use core::DivinationClient;
pub use outcome::ExchangeResult;

//! Out-of-process mod compilation.
//!
//! The host (`modforge`) discovers sources and references, launches the
//! helper (`modforge-compiler`) and drives it over a framed binary protocol on
//! the helper's stdin/stdout. The helper accumulates one [`session`] and
//! answers a single `Compile` with either a library image or diagnostics.

pub mod compiler;
pub mod config;
pub mod driver;
pub mod host;
pub mod layout;
pub mod protocol;
pub mod session;
pub mod supervisor;
pub mod telemetry;

//! Helper-side compilation state built up one action at a time.
//!
//! The session only grows: symbols, parsed units and references are appended
//! until the single `Compile`. A source file is parsed with the
//! [`ParseConfig`] captured when its `AddSourceFile` arrives, so symbols added
//! later never reach files parsed earlier. Callers rely on this by sending
//! global symbols before any file actions.

mod state;
mod unit;

#[cfg(test)]
mod tests;

pub use state::{CompilerSession, SessionError};
pub use unit::{LanguageVersion, ParseConfig, ReferenceHandle, ReferenceOrigin, SourceUnit};

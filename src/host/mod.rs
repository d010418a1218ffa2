//! Host-side session driver.
//!
//! Turns the files on disk into one ordered action plan: derived symbols
//! first, then sources, then references in category order, then the
//! optional compatibility shim. [`run_session`] pushes that plan through a
//! [`HelperChannel`](crate::supervisor::HelperChannel) and routes the single
//! result to a [`LibraryLoader`] or a [`DiagnosticSink`].

mod collaborators;
mod discovery;
mod plan;
mod session;
mod symbols;


pub use collaborators::{
    CollectingSink, DiagnosticSink, FileLoader, LibraryLoader, MemoryLoader, TeeSink, TracingSink,
};
pub use discovery::{
    discover, scan, Discovered, DiscoveryRoots, RootCategory, REFERENCE_EXTENSION,
    SOURCE_EXTENSION,
};
pub use plan::{HostIdentity, SessionPlan};
pub use session::{
    compile_mods, run_session, HostError, HostRequest, SessionOutcome, SessionReport,
};
pub use symbols::{
    derive_symbols, HostVersion, VersionError, BASELINE_SYMBOL, DEBUG_SYMBOL, RELEASE_LINES,
};

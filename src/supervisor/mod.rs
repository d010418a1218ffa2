//! Host-side ownership of the helper process.
//!
//! The supervisor resolves how to start `modforge-compiler`, owns both pipe
//! ends, sequences frames onto stdin, reads the single result frame from
//! stdout and always reaps the child. Standard error is inherited so helper
//! diagnostics never mix with protocol bytes.

mod error;
mod escape;
mod launch;
mod process;


pub use error::SupervisorError;
pub use escape::{
    escape_argument, join_arguments, split_argument_line, ArgumentLineError, ESCAPED_CHARS,
};
pub use launch::{is_native_executable, CommandLine, LaunchMode, LaunchSpec};
pub use process::{HelperProcess, SupervisorOptions};

use crate::protocol::{ActionFrame, CompileOutcome};

/// The outgoing half of a session as seen by the session driver.
pub trait HelperChannel {
    fn send(&mut self, frame: &ActionFrame) -> Result<(), SupervisorError>;
    fn read_outcome(&mut self) -> Result<CompileOutcome, SupervisorError>;
}

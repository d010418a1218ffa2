//! Helper-side read loop: one action at a time against one session.
//!
//! Each frame is decoded once by
//! [`ActionFrame::read_payload`](crate::protocol::ActionFrame::read_payload)
//! and routed by [`dispatch`], an exhaustive match over the closed frame set.
//! Handlers receive the decoded payload and never touch the input stream.
//! Unknown codes stop the loop before any further byte is read.

mod dispatch;
mod handlers;


pub use dispatch::{
    dispatch, run_driver_loop, DispatchContext, DispatchError, DriverStats, Flow, HelperEnvironment,
};

//! Isle CLI
//!
//! Dispatch pipeline, usage text and user-facing error reporting for the
//! `isle` binary.

pub mod dispatch;
pub mod help;
pub mod output;

pub use dispatch::Dispatcher;

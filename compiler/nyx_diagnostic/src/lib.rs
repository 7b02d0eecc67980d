//! Diagnostics for the Nyx front-end.
//!
//! The engine builds one diagnostic at a time: [`DiagnosticsEngine::report`]
//! opens a builder, typed arguments are attached in order, and the
//! diagnostic is formatted and handed to the consumer the moment the
//! argument count required by its format template is reached. Reporting a
//! new diagnostic while another is still pending flushes the pending one
//! first.
//!
//! Format templates use `{n}` placeholders referring to argument `n`;
//! whitespace inside the braces is skipped. Severity derives from the
//! diagnostic id. A suppression counter mutes emission entirely while the
//! parser speculates.
//!
//! This crate also hosts the [`SourceManager`], which maps URIs to dense
//! file ids, lazily loads contents through a [`SourceProvider`], and
//! recovers line/column pairs from byte offsets.

mod consumer;
mod diag;
mod engine;
mod render;
mod source;

pub use consumer::{CollectingConsumer, DiagnosticConsumer, SilentConsumer};
pub use diag::{DiagId, Diagnostic, Severity};
pub use engine::{
    format_message, required_argument_count, DiagArgument, DiagnosticBuilder, DiagnosticTextProvider,
    DiagnosticsEngine,
};
pub use render::{render_all, render_diagnostic};
pub use source::{SourceManager, SourceProvider};

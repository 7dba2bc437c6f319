//! Pages build pipeline.
//!
//! Turns a project directory (a `_worker.js` script or a functions tree)
//! into a compiled worker, optionally packaged as a deterministic multipart
//! upload payload.
//!
//! # Module Organization
//!
//! - [`resolve`] - Build mode selection
//! - [`bindings`] - `--bindings` blob parsing
//! - [`builder`] - Delegated compilation
//! - [`translate`] - Builder failure mapping
//! - [`packager`] - Multipart upload envelope
//! - [`output`] - Final artifact writing
//! - [`pipeline`] - Orchestration of the above

pub mod bindings;
pub mod builder;
pub mod error;
pub mod output;
pub mod packager;
pub mod pipeline;
pub mod report;
pub mod resolve;
pub mod settings;
pub mod temp;
pub mod translate;

pub use bindings::{BindingSet, extract_bindings};
pub use builder::{
    BuildError, Builder, BundleResult, BundleType, CommandBuilder, FunctionsOptions, Module,
    ModuleContent, ModuleType, RawWorkerOptions,
};
pub use error::{Error, Result};
pub use packager::{EncodedForm, WorkerUpload, package};
pub use pipeline::{BuildOutcome, Pipeline};
pub use report::{BuildEvent, LogReporter, RecordingReporter, Reporter};
pub use resolve::{BuildMode, resolve_build_mode};
pub use settings::BuildSettings;
pub use temp::{IdGenerator, SequentialIds, UuidIds};

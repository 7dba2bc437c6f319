//! Packaging of a compiled bundle into an upload payload.
//!
//! The packager re-reads the compiled entry from disk, wraps it in a
//! [`WorkerUpload`] with every deploy-time field unset, and encodes the
//! result as `multipart/form-data`:
//!
//! 1. `metadata` - JSON [`WorkerMetadata`]
//! 2. the main module
//! 3. every additional module, in bundle order

mod envelope;
mod multipart;

pub use envelope::{Binding, BindingTable, UsageModel, WorkerMetadata, WorkerUpload};
pub use multipart::{EncodedForm, MultipartForm, Part};

use crate::bundler::builder::{BundleResult, Module, ModuleContent, ModuleType};
use crate::bundler::error::{Error, ErrorExt, Result};
use bytes::Bytes;
use std::path::Path;

/// Name of the metadata part.
pub const METADATA_PART: &str = "metadata";

/// Name of the main module: the entry point's file name.
pub fn main_module_name(entry: &Path) -> Result<String> {
    entry
        .file_name()
        .and_then(|n| n.to_str())
        .map(String::from)
        .ok_or_else(|| Error::InvalidPath {
            path: entry.to_path_buf(),
            reason: "entry point has no UTF-8 file name".to_string(),
        })
}

/// Builds the upload envelope for a bundle, reading the entry from disk.
pub async fn worker_upload(bundle: &BundleResult) -> Result<WorkerUpload> {
    let entry = &bundle.resolved_entry_point_path;
    let name = main_module_name(entry)?;
    let module_type = ModuleType::from(bundle.bundle_type);

    let content = if module_type.is_text() {
        ModuleContent::Text(
            tokio::fs::read_to_string(entry)
                .await
                .fs_context("reading compiled entry", entry)?,
        )
    } else {
        ModuleContent::Binary(
            tokio::fs::read(entry)
                .await
                .fs_context("reading compiled entry", entry)?,
        )
    };

    Ok(WorkerUpload {
        name: name.clone(),
        main: Module {
            name,
            content,
            module_type,
        },
        modules: bundle.modules.clone(),
        bindings: BindingTable::default(),
        migrations: None,
        compatibility_date: None,
        compatibility_flags: None,
        usage_model: None,
        logpush: None,
        unsafe_config: None,
    })
}

/// Encodes an upload envelope as a multipart form.
pub fn encode_upload(upload: &WorkerUpload) -> Result<EncodedForm> {
    let metadata = serde_json::to_vec(&upload.metadata())?;

    let mut form = MultipartForm::new();
    form.part(METADATA_PART, None, "application/json", metadata);
    for module in std::iter::once(&upload.main).chain(&upload.modules) {
        form.part(
            module.name.clone(),
            Some(module.name.clone()),
            module.module_type.content_type(),
            Bytes::copy_from_slice(module.content.as_bytes()),
        );
    }

    Ok(form.encode())
}

/// Packages a compiled bundle into upload-ready bytes.
///
/// Pure with respect to the on-disk entry and the bundle description:
/// packaging twice without a rebuild yields identical bytes.
pub async fn package(bundle: &BundleResult) -> Result<EncodedForm> {
    let upload = worker_upload(bundle).await?;
    for (field, value) in upload.summary() {
        log::debug!("  {:<20} {}", field, value);
    }
    let encoded = encode_upload(&upload)?;
    log::info!(
        "Packaged {} ({} modules, {} bytes)",
        upload.name,
        upload.modules.len() + 1,
        encoded.body.len()
    );
    Ok(encoded)
}

//! Extraction of deploy-time binding identifiers from the `--bindings` blob.

use crate::error::{PagesError, Result};
use std::collections::BTreeSet;

/// Binding category holding D1 database bindings.
pub const D1_DATABASES: &str = "d1_databases";

/// Binding identifiers recovered from the serialized bindings blob.
///
/// `None` means the blob was never supplied, which the deployment API treats
/// differently from a supplied blob with no entries for a category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindingSet {
    /// D1 database binding names.
    pub d1_databases: Option<BTreeSet<String>>,
}

impl BindingSet {
    /// D1 binding names in sorted order, empty when unset.
    pub fn d1_database_ids(&self) -> Vec<String> {
        self.d1_databases
            .as_ref()
            .map(|ids| ids.iter().cloned().collect())
            .unwrap_or_default()
    }
}

/// Parses the optional bindings blob.
///
/// Only the D1 category is extracted. A blob without that category (or with
/// a non-object value for it) yields an empty, but present, set.
pub fn extract_bindings(blob: Option<&str>) -> Result<BindingSet> {
    let Some(blob) = blob else {
        return Ok(BindingSet::default());
    };

    let parsed: serde_json::Value =
        serde_json::from_str(blob).map_err(|source| PagesError::BindingParse { source })?;

    let d1_databases = parsed
        .get(D1_DATABASES)
        .and_then(|v| v.as_object())
        .map(|databases| databases.keys().cloned().collect())
        .unwrap_or_default();

    log::debug!("Extracted D1 bindings: {:?}", d1_databases);

    Ok(BindingSet {
        d1_databases: Some(d1_databases),
    })
}

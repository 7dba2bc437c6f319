//! Upload envelope schema.
//!
//! Mirrors the platform's worker-init descriptor. This crate only uploads
//! code, so every deploy-time field is left unset; they exist so the shape
//! of the payload is fixed and a later step can fill them in.

use crate::bundler::builder::Module;
use serde::Serialize;
use serde_json::{Map, Value};

/// Usage model of the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UsageModel {
    Bundled,
    Unbound,
    Standard,
}

/// A single named binding within a category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Binding {
    pub name: String,
    /// Category-specific fields (`id`, `bucket_name`, ...).
    #[serde(flatten)]
    pub config: Map<String, Value>,
}

/// Deploy-time bindings, one optional list per category.
///
/// `None` means "not configured", which the API distinguishes from an
/// explicitly empty list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BindingTable {
    pub vars: Option<Vec<Binding>>,
    pub kv_namespaces: Option<Vec<Binding>>,
    pub durable_objects: Option<Vec<Binding>>,
    pub r2_buckets: Option<Vec<Binding>>,
    pub d1_databases: Option<Vec<Binding>>,
    pub services: Option<Vec<Binding>>,
    pub queues: Option<Vec<Binding>>,
    pub analytics_engine_datasets: Option<Vec<Binding>>,
}

impl BindingTable {
    /// Flattens the table into the metadata `bindings` list.
    ///
    /// Each entry is tagged with its wire `type`; unset categories contribute
    /// nothing.
    pub fn to_metadata(&self) -> Vec<Value> {
        let categories: [(&str, &Option<Vec<Binding>>); 8] = [
            ("plain_text", &self.vars),
            ("kv_namespace", &self.kv_namespaces),
            ("durable_object_namespace", &self.durable_objects),
            ("r2_bucket", &self.r2_buckets),
            ("d1", &self.d1_databases),
            ("service", &self.services),
            ("queue", &self.queues),
            ("analytics_engine", &self.analytics_engine_datasets),
        ];

        categories
            .into_iter()
            .filter_map(|(kind, bindings)| bindings.as_ref().map(|b| (kind, b)))
            .flat_map(|(kind, bindings)| {
                bindings.iter().map(move |binding| {
                    let mut entry = binding.config.clone();
                    entry.insert("type".to_string(), Value::from(kind));
                    entry.insert("name".to_string(), Value::from(binding.name.clone()));
                    Value::Object(entry)
                })
            })
            .collect()
    }
}

/// Everything uploaded for one worker.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerUpload {
    pub name: String,
    pub main: Module,
    pub modules: Vec<Module>,
    pub bindings: BindingTable,
    pub migrations: Option<Value>,
    pub compatibility_date: Option<String>,
    pub compatibility_flags: Option<Vec<String>>,
    pub usage_model: Option<UsageModel>,
    pub logpush: Option<bool>,
    pub unsafe_config: Option<Value>,
}

/// The `metadata` part of the upload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkerMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_module: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_part: Option<String>,
    pub bindings: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub migrations: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compatibility_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compatibility_flags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage_model: Option<UsageModel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logpush: Option<bool>,
    #[serde(rename = "unsafe", skip_serializing_if = "Option::is_none")]
    pub unsafe_config: Option<Value>,
}

impl WorkerUpload {
    /// Metadata describing this upload.
    ///
    /// ES module workers reference their entry as `main_module`;
    /// service-worker scripts use `body_part`.
    pub fn metadata(&self) -> WorkerMetadata {
        let is_module = self.main.module_type == crate::bundler::builder::ModuleType::Esm;
        WorkerMetadata {
            main_module: is_module.then(|| self.main.name.clone()),
            body_part: (!is_module).then(|| self.main.name.clone()),
            bindings: self.bindings.to_metadata(),
            migrations: self.migrations.clone(),
            compatibility_date: self.compatibility_date.clone(),
            compatibility_flags: self.compatibility_flags.clone(),
            usage_model: self.usage_model,
            logpush: self.logpush,
            unsafe_config: self.unsafe_config.clone(),
        }
    }

    /// Human-readable `(field, value)` rows for logging.
    pub fn summary(&self) -> Vec<(&'static str, String)> {
        fn or_unset<T: ToString>(value: Option<T>) -> String {
            value.map(|v| v.to_string()).unwrap_or_else(|| "unset".to_string())
        }

        vec![
            ("name", self.name.clone()),
            (
                "main module",
                format!("{} ({} bytes)", self.main.name, self.main.content.as_bytes().len()),
            ),
            ("modules", self.modules.len().to_string()),
            ("bindings", self.bindings.to_metadata().len().to_string()),
            ("compatibility date", or_unset(self.compatibility_date.as_deref())),
            (
                "compatibility flags",
                or_unset(self.compatibility_flags.as_ref().map(|f| f.join(","))),
            ),
            ("usage model", or_unset(self.usage_model.map(|m| format!("{:?}", m).to_lowercase()))),
            ("logpush", or_unset(self.logpush)),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::builder::{ModuleContent, ModuleType};

    fn upload(module_type: ModuleType) -> WorkerUpload {
        WorkerUpload {
            name: "index.mjs".into(),
            main: Module {
                name: "index.mjs".into(),
                content: ModuleContent::Text("export default {}".into()),
                module_type,
            },
            modules: vec![],
            bindings: BindingTable::default(),
            migrations: None,
            compatibility_date: None,
            compatibility_flags: None,
            usage_model: None,
            logpush: None,
            unsafe_config: None,
        }
    }

    #[test]
    fn unset_fields_are_omitted() {
        let json = serde_json::to_value(upload(ModuleType::Esm).metadata()).unwrap();
        assert_eq!(json, serde_json::json!({ "main_module": "index.mjs", "bindings": [] }));
    }

    #[test]
    fn service_worker_uses_body_part() {
        let metadata = upload(ModuleType::CommonJs).metadata();
        assert_eq!(metadata.body_part.as_deref(), Some("index.mjs"));
        assert_eq!(metadata.main_module, None);
    }

    #[test]
    fn flattens_configured_bindings() {
        let mut config = Map::new();
        config.insert("id".into(), Value::from("abc"));
        let table = BindingTable {
            d1_databases: Some(vec![Binding {
                name: "DB".into(),
                config,
            }]),
            kv_namespaces: Some(vec![]),
            ..Default::default()
        };
        assert_eq!(
            table.to_metadata(),
            vec![serde_json::json!({ "type": "d1", "name": "DB", "id": "abc" })]
        );
    }

    #[test]
    fn summary_marks_unset_fields() {
        let rows = upload(ModuleType::Esm).summary();
        assert!(rows.contains(&("compatibility date", "unset".to_string())));
        assert!(rows.contains(&("main module", "index.mjs (17 bytes)".to_string())));
    }
}

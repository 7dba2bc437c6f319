//! [`Builder`] backed by an external esbuild-compatible executable.

use super::entry::{EntryContext, render_entry};
use super::routes::discover_routes;
use super::routes_json::routes_json;
use super::{
    BuildError, Builder, BundleResult, BundleType, FunctionsOptions, Module, ModuleContent,
    ModuleType, RawWorkerOptions, find_compiler,
};
use anyhow::Context;
use path_absolutize::Absolutize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

/// Compiles projects by invoking an external compiler process.
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    compiler: Option<PathBuf>,
    project_root: PathBuf,
}

/// Flags shared by every compiler invocation.
struct CompileRequest<'a> {
    entry: &'a Path,
    outfile: &'a Path,
    minify: bool,
    sourcemap: bool,
    watch: bool,
}

impl CommandBuilder {
    /// Creates a builder.
    ///
    /// # Arguments
    ///
    /// * `compiler` - Explicit compiler path; looked up lazily when `None`
    /// * `project_root` - Directory relative paths are resolved against
    pub fn new(compiler: Option<PathBuf>, project_root: PathBuf) -> Self {
        Self {
            compiler,
            project_root,
        }
    }

    fn absolute(&self, path: &Path) -> anyhow::Result<PathBuf> {
        Ok(path
            .absolutize_from(&self.project_root)
            .with_context(|| format!("failed to resolve {}", path.display()))?
            .into_owned())
    }

    fn compiler_args(request: &CompileRequest<'_>, metafile: &Path) -> Vec<String> {
        let mut args = vec![
            request.entry.display().to_string(),
            "--bundle".to_string(),
            "--format=esm".to_string(),
            "--target=es2022".to_string(),
            "--platform=browser".to_string(),
            "--conditions=worker,browser".to_string(),
            "--loader:.wasm=copy".to_string(),
            "--loader:.txt=copy".to_string(),
            "--loader:.html=copy".to_string(),
            "--loader:.bin=copy".to_string(),
            "--log-level=warning".to_string(),
            format!("--outfile={}", request.outfile.display()),
            format!("--metafile={}", metafile.display()),
        ];
        if request.minify {
            args.push("--minify".to_string());
        }
        if request.sourcemap {
            args.push("--sourcemap".to_string());
        }
        args
    }

    /// Runs one compilation and collects its outputs.
    async fn compile(&self, request: CompileRequest<'_>) -> Result<BundleResult, BuildError> {
        let compiler = find_compiler(self.compiler.as_deref(), &self.project_root)?;
        let outfile = self.absolute(request.outfile)?;

        if let Some(parent) = outfile.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let metafile = tempfile::Builder::new()
            .prefix("pages-bundle-meta-")
            .suffix(".json")
            .tempfile()
            .context("failed to create metafile")?;

        let request = CompileRequest {
            outfile: &outfile,
            ..request
        };
        let args = Self::compiler_args(&request, metafile.path());
        log::debug!("Running {} {}", compiler.display(), args.join(" "));

        let output = Command::new(&compiler)
            .args(&args)
            .current_dir(&self.project_root)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .with_context(|| format!("failed to run {}", compiler.display()))?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            return Err(anyhow::anyhow!(
                "Build failed ({} exited with {}):\n{}",
                compiler.display(),
                output.status,
                stderr.trim()
            )
            .into());
        }
        for line in stderr.lines().filter(|l| !l.trim().is_empty()) {
            log::warn!("{}", line);
        }

        if !outfile.is_file() {
            return Err(anyhow::anyhow!(
                "{} reported success but wrote no output to {}",
                compiler.display(),
                outfile.display()
            )
            .into());
        }

        let modules = self.collect_modules(metafile.path(), &outfile).await?;

        if request.watch {
            self.spawn_watcher(&compiler, args);
        }

        Ok(BundleResult {
            resolved_entry_point_path: outfile,
            modules,
            bundle_type: BundleType::Esm,
        })
    }

    /// Reads every emitted output other than the entry and its source map.
    async fn collect_modules(&self, metafile: &Path, outfile: &Path) -> anyhow::Result<Vec<Module>> {
        let raw = tokio::fs::read_to_string(metafile)
            .await
            .with_context(|| format!("failed to read metafile {}", metafile.display()))?;
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }

        let meta: serde_json::Value = serde_json::from_str(&raw).context("invalid metafile")?;
        let Some(outputs) = meta.get("outputs").and_then(|o| o.as_object()) else {
            return Ok(Vec::new());
        };

        let base = outfile.parent().unwrap_or(self.project_root.as_path());
        let mut modules = Vec::new();

        for key in outputs.keys() {
            let path = self.absolute(Path::new(key))?;
            if path == outfile || path.extension().is_some_and(|e| e == "map") {
                continue;
            }

            let module_type = module_type_for(&path);
            let content = if module_type.is_text() {
                ModuleContent::Text(tokio::fs::read_to_string(&path).await?)
            } else {
                ModuleContent::Binary(tokio::fs::read(&path).await?)
            };
            let name = path
                .strip_prefix(base)
                .unwrap_or(&path)
                .to_string_lossy()
                .replace('\\', "/");

            log::debug!("Collected module {} ({:?})", name, module_type);
            modules.push(Module {
                name,
                content,
                module_type,
            });
        }

        Ok(modules)
    }

    /// Leaves the compiler rebuilding on change after the initial build.
    fn spawn_watcher(&self, compiler: &Path, mut args: Vec<String>) {
        args.push("--watch=forever".to_string());

        let child = Command::new(compiler)
            .args(&args)
            .current_dir(&self.project_root)
            .stdin(Stdio::null())
            .spawn();

        match child {
            Ok(mut child) => {
                log::info!("Watching for changes...");
                tokio::spawn(async move {
                    match child.wait().await {
                        Ok(status) => log::info!("Watcher exited with {}", status),
                        Err(e) => log::warn!("Watcher failed: {}", e),
                    }
                });
            }
            Err(e) => log::warn!("Could not start watcher: {}", e),
        }
    }
}

fn module_type_for(path: &Path) -> ModuleType {
    match path.extension().and_then(|e| e.to_str()) {
        Some("js" | "mjs") => ModuleType::Esm,
        Some("cjs") => ModuleType::CommonJs,
        Some("txt" | "html") => ModuleType::Text,
        Some("wasm") => ModuleType::Wasm,
        _ => ModuleType::Binary,
    }
}

async fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let json = serde_json::to_string_pretty(value)?;
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("failed to write {}", path.display()))
}

impl Builder for CommandBuilder {
    async fn build_raw_worker(&self, options: RawWorkerOptions) -> Result<BundleResult, BuildError> {
        log::info!(
            "Compiling raw worker {} from {}",
            options.input.display(),
            options.directory.display()
        );

        let input = self.absolute(&options.input)?;
        self.compile(CompileRequest {
            entry: &input,
            outfile: &options.outfile,
            minify: options.minify,
            sourcemap: options.sourcemap,
            watch: options.watch,
        })
        .await
    }

    async fn build_functions(&self, options: FunctionsOptions) -> Result<BundleResult, BuildError> {
        let directory = self.absolute(&options.functions_directory)?;
        if !directory.is_dir() {
            return Err(BuildError::NoRoutes {
                directory: options.functions_directory,
            });
        }

        let routes = discover_routes(&directory)?;
        if routes.is_empty() {
            return Err(BuildError::NoRoutes {
                directory: options.functions_directory,
            });
        }

        if let Some(path) = &options.output_config_path {
            write_json(path, &serde_json::json!({ "routes": routes })).await?;
            log::info!("Wrote route config to {}", path.display());
        }

        if let Some(path) = &options.output_routes_path {
            write_json(path, &routes_json(&routes)).await?;
            log::info!("Wrote routes file to {}", path.display());
        }

        let source = render_entry(&EntryContext {
            functions_directory: &directory,
            routes: &routes,
            fallback_service: &options.fallback_service,
            d1_databases: &options.d1_databases,
            plugin: options.plugin,
        })?;

        let entry_path = self.absolute(&options.entry_path)?;
        if let Some(parent) = entry_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        tokio::fs::write(&entry_path, source)
            .await
            .with_context(|| format!("failed to write {}", entry_path.display()))?;

        self.compile(CompileRequest {
            entry: &entry_path,
            outfile: &options.outfile,
            minify: options.minify,
            sourcemap: options.sourcemap,
            watch: options.watch,
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_extensions_to_module_types() {
        assert_eq!(module_type_for(Path::new("chunk.mjs")), ModuleType::Esm);
        assert_eq!(module_type_for(Path::new("a.wasm")), ModuleType::Wasm);
        assert_eq!(module_type_for(Path::new("page.html")), ModuleType::Text);
        assert_eq!(module_type_for(Path::new("blob.dat")), ModuleType::Binary);
    }

    #[test]
    fn passes_minify_and_sourcemap_flags() {
        let request = CompileRequest {
            entry: Path::new("/in.js"),
            outfile: Path::new("/out.mjs"),
            minify: true,
            sourcemap: true,
            watch: false,
        };
        let args = CommandBuilder::compiler_args(&request, Path::new("/meta.json"));
        assert_eq!(args[0], "/in.js");
        assert!(args.contains(&"--outfile=/out.mjs".to_string()));
        assert!(args.contains(&"--minify".to_string()));
        assert!(args.contains(&"--sourcemap".to_string()));
    }

    #[tokio::test]
    async fn missing_functions_directory_has_no_routes() {
        let dir = tempfile::tempdir().unwrap();
        let builder = CommandBuilder::new(None, dir.path().to_path_buf());
        let err = builder
            .build_functions(FunctionsOptions {
                functions_directory: PathBuf::from("functions"),
                outfile: PathBuf::from("_worker.js"),
                entry_path: dir.path().join("entry.mjs"),
                output_config_path: None,
                output_routes_path: None,
                minify: false,
                sourcemap: false,
                watch: false,
                plugin: false,
                fallback_service: "ASSETS".into(),
                node_compat: false,
                d1_databases: vec![],
                build_output_directory: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, BuildError::NoRoutes { .. }));
    }
}

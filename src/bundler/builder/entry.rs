//! Generated entry script for a functions tree.
//!
//! Renders [`ENTRY_TEMPLATE`] with the route table so the compiler has a
//! single module importing every handler.

use super::routes::{RouteConfig, handler_file};
use super::template::ENTRY_TEMPLATE;
use anyhow::Context;
use handlebars::Handlebars;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::path::Path;

/// Inputs for rendering the entry script.
pub struct EntryContext<'a> {
    /// Absolute functions directory; handler imports are resolved against it.
    pub functions_directory: &'a Path,
    pub routes: &'a [RouteConfig],
    pub fallback_service: &'a str,
    pub d1_databases: &'a [String],
    pub plugin: bool,
}

/// Renders the entry script source.
pub fn render_entry(ctx: &EntryContext<'_>) -> anyhow::Result<String> {
    let mut handlebars = Handlebars::new();
    handlebars.register_escape_fn(handlebars::no_escape);

    // One import per distinct `file:export`, in first-seen order.
    let mut identifiers: BTreeMap<String, String> = BTreeMap::new();
    let mut imports: Vec<Value> = Vec::new();
    let mut identifier_for = |reference: &str| -> anyhow::Result<String> {
        if let Some(identifier) = identifiers.get(reference) {
            return Ok(identifier.clone());
        }
        let (file, export) = handler_file(ctx.functions_directory, reference)
            .with_context(|| format!("malformed handler reference '{}'", reference))?;
        let identifier = format!("__handler_{}", imports.len());
        imports.push(json!({
            "name": export,
            "identifier": identifier,
            "path": js_string(&file.to_string_lossy())?,
        }));
        identifiers.insert(reference.to_string(), identifier.clone());
        Ok(identifier)
    };

    let mut routes = Vec::with_capacity(ctx.routes.len());
    for route in ctx.routes {
        let middlewares = route
            .middleware
            .iter()
            .map(|r| identifier_for(r))
            .collect::<anyhow::Result<Vec<_>>>()?;
        let modules = route
            .module
            .iter()
            .map(|r| identifier_for(r))
            .collect::<anyhow::Result<Vec<_>>>()?;

        routes.push(json!({
            "route_path": js_string(&route.route_path)?,
            "mount_path": js_string(&route.mount_path)?,
            "method": match &route.method {
                Some(method) => js_string(method)?,
                None => "undefined".to_string(),
            },
            "middlewares": middlewares,
            "modules": modules,
            "exact": route_matcher(&route.route_path, true).to_js()?,
            "prefix": route_matcher(&route.mount_path, false).to_js()?,
        }));
    }

    let data = json!({
        "generator": format!("{}@{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
        "imports": imports,
        "routes": routes,
        "fallback_service": js_string(ctx.fallback_service)?,
        "d1_databases": serde_json::to_string(ctx.d1_databases)?,
        "plugin": ctx.plugin,
    });

    handlebars
        .register_template_string("entry.js", ENTRY_TEMPLATE)
        .context("failed to register entry template")?;

    handlebars
        .render("entry.js", &data)
        .context("failed to render entry template")
}

/// Regex source and parameter keys for a route pattern.
#[derive(Debug, PartialEq, Eq)]
struct RouteMatcher {
    source: String,
    /// Parameter name and whether it spans multiple segments.
    keys: Vec<(String, bool)>,
}

impl RouteMatcher {
    fn to_js(&self) -> anyhow::Result<Value> {
        let keys: Vec<Value> = self
            .keys
            .iter()
            .map(|(name, repeat)| json!({ "name": name, "repeat": repeat }))
            .collect();
        Ok(json!({
            "source": js_string(&self.source)?,
            "keys": serde_json::to_string(&keys)?,
        }))
    }
}

/// Compiles `/a/:id/:rest*` into a regex matching the whole pathname
/// (`end`) or a pathname prefix.
///
/// A repeat parameter also matches zero segments, so `/:path*` matches `/`.
fn route_matcher(path: &str, end: bool) -> RouteMatcher {
    let mut source = String::from("^");
    let mut keys = Vec::new();

    for segment in path.split('/').filter(|s| !s.is_empty()) {
        match segment.strip_prefix(':').filter(|p| !p.is_empty()) {
            Some(param) => {
                let (name, repeat) = match param.strip_suffix('*') {
                    Some(name) => (name, true),
                    None => (param, false),
                };
                source.push_str(if repeat { "(?:/(.+?))?" } else { "/([^/]+)" });
                keys.push((name.to_string(), repeat));
            }
            None => {
                source.push('/');
                source.push_str(&regex::escape(segment));
            }
        }
    }

    source.push_str(if end { "/?$" } else { "(?:/|$)" });
    RouteMatcher { source, keys }
}

/// JSON string literal, which is also a valid JS string literal.
fn js_string(value: &str) -> anyhow::Result<String> {
    Ok(serde_json::to_string(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(path: &str, method: Option<&str>, module: &str) -> RouteConfig {
        RouteConfig {
            route_path: path.to_string(),
            mount_path: "/".to_string(),
            method: method.map(String::from),
            middleware: vec![],
            module: vec![module.to_string()],
        }
    }

    #[test]
    fn imports_each_handler_once() {
        let routes = vec![
            route("/a", Some("GET"), "a.js:onRequestGet"),
            route("/a", None, "a.js:onRequest"),
            route("/b", None, "a.js:onRequest"),
        ];
        let source = render_entry(&EntryContext {
            functions_directory: Path::new("/project/functions"),
            routes: &routes,
            fallback_service: "ASSETS",
            d1_databases: &["DB".to_string()],
            plugin: false,
        })
        .unwrap();

        assert_eq!(source.matches("import {").count(), 2);
        assert!(source.contains("import { onRequestGet as __handler_0 } from \"/project/functions/a.js\";"));
        assert!(source.contains("method: \"GET\""));
        assert!(source.contains("method: undefined"));
        assert!(source.contains("const fallbackService = \"ASSETS\";"));
        assert!(source.contains("const d1Databases = [\"DB\"];"));
        assert!(source.contains("async fetch(request, env, ctx)"));
    }

    fn captures<'a>(matcher: &RouteMatcher, path: &'a str) -> Option<Vec<Option<&'a str>>> {
        let regex = regex::Regex::new(&matcher.source).unwrap();
        regex
            .captures(path)
            .map(|c| c.iter().skip(1).map(|m| m.map(|m| m.as_str())).collect())
    }

    #[test]
    fn root_catch_all_matches_root() {
        let matcher = route_matcher("/:path*", true);
        assert_eq!(matcher.keys, vec![("path".to_string(), true)]);
        assert_eq!(captures(&matcher, "/"), Some(vec![None]));
        assert_eq!(captures(&matcher, "/a/b"), Some(vec![Some("a/b")]));
        assert_eq!(captures(&matcher, "/a/b/"), Some(vec![Some("a/b")]));
    }

    #[test]
    fn nested_catch_all_matches_its_mount() {
        let matcher = route_matcher("/docs/:path*", true);
        assert_eq!(captures(&matcher, "/docs"), Some(vec![None]));
        assert_eq!(captures(&matcher, "/docs/x"), Some(vec![Some("x")]));
        assert_eq!(captures(&matcher, "/documents"), None);
    }

    #[test]
    fn single_params_accept_any_name() {
        let matcher = route_matcher("/users/:user-id", true);
        assert_eq!(matcher.keys, vec![("user-id".to_string(), false)]);
        assert_eq!(captures(&matcher, "/users/42"), Some(vec![Some("42")]));
        assert_eq!(captures(&matcher, "/users/42/posts"), None);
        assert_eq!(captures(&matcher, "/users/:user-id"), Some(vec![Some(":user-id")]));
    }

    #[test]
    fn static_segments_are_literal_and_prefixes_stop_at_segments() {
        let exact = route_matcher("/a.b", true);
        assert!(captures(&exact, "/a.b").is_some());
        assert!(captures(&exact, "/axb").is_none());

        let prefix = route_matcher("/api", false);
        assert!(captures(&prefix, "/api").is_some());
        assert!(captures(&prefix, "/api/users").is_some());
        assert!(captures(&prefix, "/apiary").is_none());
    }

    #[test]
    fn rendered_routes_embed_their_matchers() {
        let routes = vec![route("/:path*", None, "[[path]].js:onRequest")];
        let source = render_entry(&EntryContext {
            functions_directory: Path::new("/fns"),
            routes: &routes,
            fallback_service: "ASSETS",
            d1_databases: &[],
            plugin: false,
        })
        .unwrap();

        assert!(source.contains(r#"exact: { regex: new RegExp("^(?:/(.+?))?/?$"), keys: [{"name":"path","repeat":true}] }"#));
        assert!(source.contains("value === undefined ? []"));
    }

    #[test]
    fn plugin_mode_exports_factory() {
        let routes = vec![route("/", None, "index.js:onRequest")];
        let source = render_entry(&EntryContext {
            functions_directory: Path::new("/fns"),
            routes: &routes,
            fallback_service: "ASSETS",
            d1_databases: &[],
            plugin: true,
        })
        .unwrap();

        assert!(source.contains("export default function (pluginArgs)"));
        assert!(!source.contains("async fetch(request, env, ctx)"));
    }
}

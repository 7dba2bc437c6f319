//! File-path route discovery for a functions directory.
//!
//! Every `.js`/`.mjs`/`.ts`/`.mts` file under the directory is scanned for
//! exported `onRequest*` handlers. The file's relative path becomes the
//! route:
//!
//! | file                          | route             |
//! |-------------------------------|-------------------|
//! | `index.ts`                    | `/`               |
//! | `api/users/[id].ts`           | `/api/users/:id`  |
//! | `docs/[[path]].ts`            | `/docs/:path*`    |
//! | `api/_middleware.ts`          | middleware `/api` |

use regex::Regex;
use serde::Serialize;
use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

const HANDLER_EXTENSIONS: [&str; 4] = ["js", "mjs", "ts", "mts"];

const MIDDLEWARE_STEM: &str = "_middleware";

const HANDLER_NAMES: [(&str, Option<&str>); 8] = [
    ("onRequest", None),
    ("onRequestGet", Some("GET")),
    ("onRequestPost", Some("POST")),
    ("onRequestPut", Some("PUT")),
    ("onRequestPatch", Some("PATCH")),
    ("onRequestDelete", Some("DELETE")),
    ("onRequestHead", Some("HEAD")),
    ("onRequestOptions", Some("OPTIONS")),
];

static DECLARED_EXPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"export\s+(?:async\s+)?(?:function\s*\*?|const|let|var)\s*([A-Za-z_$][\w$]*)",
    )
    .expect("declared export regex is valid")
});

static EXPORT_LIST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"export\s*\{([^}]*)\}").expect("export list regex is valid"));

/// One entry of the route table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteConfig {
    /// URL pattern, e.g. `/api/:id`.
    pub route_path: String,
    /// Directory-level path the route is mounted under.
    pub mount_path: String,
    /// HTTP method, `None` for all methods.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Middleware handlers as `relative/file.ts:exportName`.
    pub middleware: Vec<String>,
    /// Route handlers as `relative/file.ts:exportName`.
    pub module: Vec<String>,
}

impl RouteConfig {
    fn segments(&self) -> Vec<&str> {
        self.route_path.split('/').filter(|s| !s.is_empty()).collect()
    }
}

/// Scans `directory` and returns the sorted route table.
///
/// Returns an empty table (not an error) when the directory holds no
/// handler exports; the caller decides what zero routes means.
pub fn discover_routes(directory: &Path) -> anyhow::Result<Vec<RouteConfig>> {
    let mut routes: Vec<RouteConfig> = Vec::new();

    for entry in walkdir::WalkDir::new(directory)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = entry?;
        if !entry.file_type().is_file() || !is_handler_file(entry.path()) {
            continue;
        }

        let relative = entry.path().strip_prefix(directory)?;
        let source = std::fs::read_to_string(entry.path())?;
        let handlers = exported_handlers(&source);
        if handlers.is_empty() {
            log::debug!("No handlers exported from {}", relative.display());
            continue;
        }

        let (route_path, mount_path, is_middleware) = route_paths(relative);
        let file_ref = module_reference(relative);

        for (export, method) in handlers {
            let reference = format!("{}:{}", file_ref, export);
            let method = method.map(String::from);

            let index = match routes
                .iter()
                .position(|r| r.route_path == route_path && r.method == method)
            {
                Some(index) => index,
                None => {
                    routes.push(RouteConfig {
                        route_path: route_path.clone(),
                        mount_path: mount_path.clone(),
                        method,
                        middleware: Vec::new(),
                        module: Vec::new(),
                    });
                    routes.len() - 1
                }
            };
            let route = &mut routes[index];

            if is_middleware {
                route.middleware.push(reference);
            } else {
                route.module.push(reference);
            }
        }
    }

    routes.sort_by(compare_routes);
    log::info!("Discovered {} routes in {}", routes.len(), directory.display());
    Ok(routes)
}

fn is_handler_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    if name.ends_with(".d.ts") || name.ends_with(".d.mts") {
        return false;
    }
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| HANDLER_EXTENSIONS.contains(&ext))
}

/// Handler exports of a source file, with their HTTP method.
fn exported_handlers(source: &str) -> Vec<(&'static str, Option<&'static str>)> {
    let source = strip_comments_and_literals(source);
    let source = source.as_str();
    let mut names: Vec<String> = DECLARED_EXPORT
        .captures_iter(source)
        .map(|c| c[1].to_string())
        .collect();

    for list in EXPORT_LIST.captures_iter(source) {
        for item in list[1].split(',') {
            // `local as exported` exports `exported`
            if let Some(name) = item.split_whitespace().last() {
                names.push(name.to_string());
            }
        }
    }

    HANDLER_NAMES
        .iter()
        .filter(|(handler, _)| names.iter().any(|n| n == handler))
        .copied()
        .collect()
}

/// Returns `(route_path, mount_path, is_middleware)` for a relative file path.
fn route_paths(relative: &Path) -> (String, String, bool) {
    let stem = relative
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();

    let mount_segments: Vec<String> = relative
        .parent()
        .map(|p| {
            p.components()
                .filter_map(|c| c.as_os_str().to_str())
                .map(convert_segment)
                .collect()
        })
        .unwrap_or_default();

    let mount_path = join_route(&mount_segments);
    if stem == MIDDLEWARE_STEM {
        return (mount_path.clone(), mount_path, true);
    }

    let mut route_segments = mount_segments;
    if stem != "index" {
        route_segments.push(convert_segment(stem));
    }

    (join_route(&route_segments), mount_path, false)
}

fn convert_segment(segment: &str) -> String {
    if let Some(name) = segment
        .strip_prefix("[[")
        .and_then(|s| s.strip_suffix("]]"))
    {
        format!(":{}*", name)
    } else if let Some(name) = segment.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
        format!(":{}", name)
    } else {
        segment.to_string()
    }
}

fn join_route(segments: &[String]) -> String {
    format!("/{}", segments.join("/"))
}

fn module_reference(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|c| c.as_os_str().to_str())
        .collect::<Vec<_>>()
        .join("/")
}

/// Most specific routes first.
fn compare_routes(a: &RouteConfig, b: &RouteConfig) -> Ordering {
    let segments_a = a.segments();
    let segments_b = b.segments();

    if segments_a.len() != segments_b.len() {
        return segments_b.len().cmp(&segments_a.len());
    }

    for (sa, sb) in segments_a.iter().zip(&segments_b) {
        let wildcard = (sa.ends_with('*'), sb.ends_with('*'));
        if wildcard.0 != wildcard.1 {
            return if wildcard.0 { Ordering::Greater } else { Ordering::Less };
        }
        let param = (sa.starts_with(':'), sb.starts_with(':'));
        if param.0 != param.1 {
            return if param.0 { Ordering::Greater } else { Ordering::Less };
        }
    }

    match (&a.method, &b.method) {
        (Some(_), None) => return Ordering::Less,
        (None, Some(_)) => return Ordering::Greater,
        _ => {}
    }

    a.route_path
        .cmp(&b.route_path)
        .then_with(|| a.method.cmp(&b.method))
}

/// Absolute path of a handler file referenced as `relative/file.ts:export`.
pub(super) fn handler_file(directory: &Path, reference: &str) -> Option<(PathBuf, String)> {
    let (file, export) = reference.rsplit_once(':')?;
    Some((directory.join(file), export.to_string()))
}

/// Blanks out comments and string/template literal bodies so export
/// detection only sees code. Newlines are kept.
fn strip_comments_and_literals(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '/' if chars.peek() == Some(&'/') => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for c in chars.by_ref() {
                    if c == '\n' {
                        out.push('\n');
                    }
                    if prev == '*' && c == '/' {
                        break;
                    }
                    prev = c;
                }
                out.push(' ');
            }
            '"' | '\'' | '`' => {
                out.push(c);
                while let Some(inner) = chars.next() {
                    match inner {
                        '\\' => {
                            chars.next();
                        }
                        '\n' => {
                            out.push('\n');
                            // unterminated single-line string
                            if c != '`' {
                                break;
                            }
                        }
                        _ if inner == c => {
                            out.push(c);
                            break;
                        }
                        _ => {}
                    }
                }
            }
            _ => out.push(c),
        }
    }

    out
}

//! `_routes.json` generation.
//!
//! The routes file tells the platform which requests must invoke Functions;
//! everything else is served straight from static assets.

use super::RouteConfig;
use serde::{Deserialize, Serialize};

/// Schema version of `_routes.json`.
pub const ROUTES_JSON_VERSION: u32 = 1;

/// Upper bound on include + exclude rules accepted by the platform.
const MAX_ROUTING_RULES: usize = 100;

/// Contents of a `_routes.json` file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutesJson {
    pub version: u32,
    pub description: String,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

/// Builds the routes file for a route table.
pub fn routes_json(routes: &[RouteConfig]) -> RoutesJson {
    let mut include = consolidate(routes.iter().map(glob_pattern).collect());

    if include.len() > MAX_ROUTING_RULES {
        log::warn!(
            "{} include rules exceed the limit of {}; routing every request to Functions",
            include.len(),
            MAX_ROUTING_RULES
        );
        include = vec!["/*".to_string()];
    }

    RoutesJson {
        version: ROUTES_JSON_VERSION,
        description: format!(
            "Generated by {}@{}",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION")
        ),
        include,
        exclude: Vec::new(),
    }
}

/// Glob matching every request a route can handle.
///
/// Routes are cut at their first dynamic segment; middleware covers its
/// whole mount path.
fn glob_pattern(route: &RouteConfig) -> String {
    let mut static_segments = Vec::new();
    let mut dynamic = false;

    for segment in route.route_path.split('/').filter(|s| !s.is_empty()) {
        if segment.starts_with(':') {
            dynamic = true;
            break;
        }
        static_segments.push(segment);
    }

    let prefix = if static_segments.is_empty() {
        String::new()
    } else {
        format!("/{}", static_segments.join("/"))
    };

    if dynamic || !route.middleware.is_empty() {
        format!("{}/*", prefix)
    } else if prefix.is_empty() {
        "/".to_string()
    } else {
        prefix
    }
}

/// Drops duplicates and patterns already covered by a broader wildcard.
fn consolidate(mut patterns: Vec<String>) -> Vec<String> {
    patterns.sort();
    patterns.dedup();

    let wildcards: Vec<String> = patterns
        .iter()
        .filter_map(|p| p.strip_suffix("/*").map(String::from))
        .collect();

    patterns
        .iter()
        .filter(|pattern| {
            !wildcards.iter().any(|base| {
                let wildcard = format!("{}/*", base);
                *pattern != &wildcard
                    && (pattern.as_str() == base || pattern.starts_with(&format!("{}/", base)))
            })
        })
        .cloned()
        .collect()
}

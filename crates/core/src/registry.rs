//! Route registry loading.
//!
//! `routes.json` is a hand-maintained array of [`RouteDescriptor`]s. It is
//! validated as a whole: a registry with a duplicate or malformed path is
//! rejected rather than partially used.

use crate::error::{Error, Result};
use crate::types::RouteDescriptor;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Load and validate the route registry from disk
pub fn parse_route_registry<P: AsRef<Path>>(path: P) -> Result<Vec<RouteDescriptor>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| {
        Error::Registry(format!("cannot read {}: {}", path.display(), e))
    })?;
    parse_route_registry_str(&content)
}

/// Parse the registry from a JSON string (useful for testing)
pub fn parse_route_registry_str(content: &str) -> Result<Vec<RouteDescriptor>> {
    let routes: Vec<RouteDescriptor> = serde_json::from_str(content)
        .map_err(|e| Error::Registry(format!("malformed JSON: {}", e)))?;
    validate_routes(&routes)?;
    Ok(routes)
}

fn validate_routes(routes: &[RouteDescriptor]) -> Result<()> {
    let mut seen = HashSet::new();

    for route in routes {
        validate_route_path(&route.path)?;

        // `/servizi` and `/servizi/` prerender to the same index.html
        if !seen.insert(normalized_path(&route.path)) {
            return Err(Error::Registry(format!("duplicate path '{}'", route.path)));
        }

        if route.title.trim().is_empty() {
            return Err(Error::Registry(format!("empty title for '{}'", route.path)));
        }

        if !(0.0..=1.0).contains(&route.priority) {
            return Err(Error::Registry(format!(
                "priority {} out of range 0.0-1.0 for '{}'",
                route.priority, route.path
            )));
        }

        if let Some(image) = &route.og_image
            && !(image.starts_with("https://") || image.starts_with('/'))
        {
            return Err(Error::Registry(format!(
                "ogImage must be absolute https:// or site-relative for '{}': '{}'",
                route.path, image
            )));
        }
    }

    Ok(())
}

fn normalized_path(path: &str) -> &str {
    match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    }
}

/// A route path is site-absolute, has no query or fragment, and cannot climb
/// out of the output directory when mapped to `<path>/index.html`.
pub fn validate_route_path(path: &str) -> Result<()> {
    if !path.starts_with('/') {
        return Err(Error::Registry(format!(
            "path must start with '/': '{}'",
            path
        )));
    }
    if path.contains(['?', '#', '\\']) || path.contains(char::is_whitespace) {
        return Err(Error::Registry(format!(
            "path contains characters not allowed in a route: '{}'",
            path
        )));
    }
    if path.split('/').any(|segment| segment == ".." || segment == ".") {
        return Err(Error::Registry(format!(
            "path contains relative segments: '{}'",
            path
        )));
    }
    Ok(())
}

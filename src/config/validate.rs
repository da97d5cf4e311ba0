// src/config/validate.rs

use std::path::{Component, Path};

use crate::config::model::{ConfigFile, DirsSection, RawConfigFile};
use crate::errors::{Result, SitedagError};

/// Browser names accepted in `[css.browsers]`.
pub const KNOWN_BROWSERS: &[&str] = &[
    "android", "chrome", "edge", "firefox", "ie", "ios_saf", "opera", "safari", "samsung",
];

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = SitedagError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_dirs(&cfg.dirs)?;
    validate_server(cfg)?;
    validate_css(cfg)?;
    Ok(())
}

fn validate_dirs(dirs: &DirsSection) -> Result<()> {
    let roles = [
        ("src", dirs.src.as_str(), true),
        ("dev", dirs.dev.as_str(), true),
        ("dist", dirs.dist.as_str(), true),
        ("assets", dirs.assets.as_str(), false),
        ("project_root", dirs.project_root.as_str(), false),
    ];

    for (name, value, required) in roles {
        // "." and "./" name the working root itself.
        if required && normalized(value).is_empty() {
            return Err(SitedagError::ConfigError(format!(
                "[dirs].{name} must name a directory below the root (got {value:?})"
            )));
        }
        let path = Path::new(value);
        if path.is_absolute() || value.starts_with('/') || value.starts_with('\\') {
            return Err(SitedagError::ConfigError(format!(
                "[dirs].{name} must be a relative path (got {value:?})"
            )));
        }
        if path.components().any(|c| matches!(c, Component::ParentDir)) {
            return Err(SitedagError::ConfigError(format!(
                "[dirs].{name} must not contain '..' (got {value:?})"
            )));
        }
    }

    // src, dev and dist must be disjoint trees: dev/dist are wiped and
    // rewritten, and src is watched.
    let trees = [
        ("src", normalized(&dirs.src)),
        ("dev", normalized(&dirs.dev)),
        ("dist", normalized(&dirs.dist)),
    ];
    for (i, (a_name, a)) in trees.iter().enumerate() {
        for (b_name, b) in trees.iter().skip(i + 1) {
            if trees_overlap(a, b) {
                return Err(SitedagError::ConfigError(format!(
                    "[dirs].{a_name} ({a:?}) and [dirs].{b_name} ({b:?}) must not overlap"
                )));
            }
        }
    }

    Ok(())
}

/// `""` is the root itself and contains every other tree.
fn trees_overlap(a: &str, b: &str) -> bool {
    a.is_empty()
        || b.is_empty()
        || a == b
        || a.starts_with(&format!("{b}/"))
        || b.starts_with(&format!("{a}/"))
}

fn normalized(value: &str) -> String {
    value
        .split(['/', '\\'])
        .filter(|s| !s.is_empty() && *s != ".")
        .collect::<Vec<_>>()
        .join("/")
}

fn validate_server(cfg: &RawConfigFile) -> Result<()> {
    if cfg.server.host.trim().is_empty() {
        return Err(SitedagError::ConfigError(
            "[server].host must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_css(cfg: &RawConfigFile) -> Result<()> {
    for (browser, version) in cfg.css.browsers.iter() {
        if !KNOWN_BROWSERS.contains(&browser.as_str()) {
            return Err(SitedagError::ConfigError(format!(
                "[css.browsers] unknown browser '{browser}' (expected one of {})",
                KNOWN_BROWSERS.join(", ")
            )));
        }
        if parse_browser_version(version).is_none() {
            return Err(SitedagError::ConfigError(format!(
                "[css.browsers].{browser} has invalid version {version:?}"
            )));
        }
    }

    parse_compatibility(&cfg.css.minify_compatibility).map_err(SitedagError::ConfigError)?;
    Ok(())
}

/// Parse `"major[.minor[.patch]]"` into the packed form used by CSS targets
/// (`major << 16 | minor << 8 | patch`).
pub fn parse_browser_version(s: &str) -> Option<u32> {
    let mut parts = s.trim().split('.');
    let major: u32 = parts.next()?.parse().ok()?;
    let minor: u32 = match parts.next() {
        Some(p) => p.parse().ok()?,
        None => 0,
    };
    let patch: u32 = match parts.next() {
        Some(p) => p.parse().ok()?,
        None => 0,
    };
    if parts.next().is_some() || major > 0xffff || minor > 0xff || patch > 0xff {
        return None;
    }
    Some((major << 16) | (minor << 8) | patch)
}

/// Parse a minifier compatibility mode.
///
/// - `"ie8"`, `"ie9"`, ... -> `Some(packed ie version)`
/// - `"*"` or `""` -> `None` (no legacy constraint)
pub fn parse_compatibility(s: &str) -> std::result::Result<Option<u32>, String> {
    let s = s.trim();
    if s.is_empty() || s == "*" {
        return Ok(None);
    }
    s.strip_prefix("ie")
        .and_then(parse_browser_version)
        .map(Some)
        .ok_or_else(|| {
            format!("[css].minify_compatibility must look like \"ie9\" or \"*\" (got {s:?})")
        })
}

// src/tasks/css.rs

//! Shared `lightningcss` plumbing for the `sass` and `cssmin` tasks.

use std::collections::BTreeMap;
use std::fmt::Display;
use std::path::Path;

use lightningcss::error::Error as CssError;
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};

use crate::config::{parse_browser_version, parse_compatibility};
use crate::tasks::FileError;

/// Prefixing targets from the `[css.browsers]` table.
///
/// Versions were validated at config load; an unparseable entry is skipped.
pub fn browser_targets(browsers: &BTreeMap<String, String>) -> Targets {
    let mut out = Browsers::default();
    for (name, version) in browsers {
        let Some(v) = parse_browser_version(version) else {
            continue;
        };
        let slot = match name.as_str() {
            "android" => &mut out.android,
            "chrome" => &mut out.chrome,
            "edge" => &mut out.edge,
            "firefox" => &mut out.firefox,
            "ie" => &mut out.ie,
            "ios_saf" => &mut out.ios_saf,
            "opera" => &mut out.opera,
            "safari" => &mut out.safari,
            "samsung" => &mut out.samsung,
            _ => continue,
        };
        *slot = Some(v);
    }
    Targets::from(out)
}

/// Minifier targets from a compatibility mode such as `"ie9"`.
pub fn compatibility_targets(mode: &str) -> Targets {
    match parse_compatibility(mode) {
        Ok(Some(ie)) => Targets::from(Browsers {
            ie: Some(ie),
            ..Browsers::default()
        }),
        _ => Targets::default(),
    }
}

/// Parse, transform for `targets` and print a stylesheet.
///
/// With `minify == false` the output is pretty-printed; in both cases
/// vendor prefixes required by `targets` are added.
pub fn process(
    source: &str,
    file: &Path,
    targets: Targets,
    minify: bool,
) -> Result<String, FileError> {
    let filename = file.to_string_lossy().into_owned();
    let mut sheet = StyleSheet::parse(
        source,
        ParserOptions {
            filename,
            ..ParserOptions::default()
        },
    )
    .map_err(|e| css_error(file, e))?;

    sheet
        .minify(MinifyOptions {
            targets: targets.clone(),
            ..MinifyOptions::default()
        })
        .map_err(|e| css_error(file, e))?;

    let printed = sheet
        .to_css(PrinterOptions {
            minify,
            targets,
            ..PrinterOptions::default()
        })
        .map_err(|e| css_error(file, e))?;

    Ok(printed.code)
}

fn css_error<T: Display>(file: &Path, err: CssError<T>) -> FileError {
    match err.loc {
        // lightningcss lines are 0-based, columns 1-based.
        Some(loc) => FileError::with_location(
            file,
            loc.line as usize + 1,
            loc.column as usize,
            err.kind.to_string(),
        ),
        None => FileError::new(file, err.kind.to_string()),
    }
}

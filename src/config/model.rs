// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::paths::DirRoles;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [dirs]
/// src = "_src"
/// dev = "dev"
/// dist = "dist"
/// assets = "assets"
/// project_root = ""
///
/// [server]
/// port = 3000
///
/// [css.browsers]
/// ie = "9"
///
/// [template.data]
/// title = "Home"
/// ```
///
/// All sections are optional and have defaults matching the conventional
/// `_src` / `dev` / `dist` layout.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub dirs: DirsSection,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub css: CssSection,

    #[serde(default)]
    pub js: JsSection,

    #[serde(default)]
    pub template: TemplateSection,
}

/// Validated configuration.
///
/// Only constructible through `TryFrom<RawConfigFile>` (see `validate.rs`),
/// so holders can rely on the directory roles being relative and distinct.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    dirs: DirRoles,
    pub server: ServerSection,
    pub css: CssSection,
    pub js: JsSection,
    pub template: TemplateSection,
}

impl ConfigFile {
    /// Construct without validation. Callers must have validated `raw`.
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        let RawConfigFile {
            dirs,
            server,
            css,
            js,
            template,
        } = raw;
        Self {
            dirs: dirs.into(),
            server,
            css,
            js,
            template,
        }
    }

    /// Directory role map used by every task.
    pub fn dirs(&self) -> &DirRoles {
        &self.dirs
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self::new_unchecked(RawConfigFile::default())
    }
}

/// `[dirs]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DirsSection {
    #[serde(default = "default_src")]
    pub src: String,
    #[serde(default = "default_dev")]
    pub dev: String,
    #[serde(default = "default_dist")]
    pub dist: String,
    #[serde(default = "default_assets")]
    pub assets: String,
    #[serde(default)]
    pub project_root: String,
}

fn default_src() -> String {
    "_src".to_string()
}

fn default_dev() -> String {
    "dev".to_string()
}

fn default_dist() -> String {
    "dist".to_string()
}

fn default_assets() -> String {
    "assets".to_string()
}

impl Default for DirsSection {
    fn default() -> Self {
        Self {
            src: default_src(),
            dev: default_dev(),
            dist: default_dist(),
            assets: default_assets(),
            project_root: String::new(),
        }
    }
}

impl From<DirsSection> for DirRoles {
    fn from(d: DirsSection) -> Self {
        DirRoles {
            src: d.src,
            dev: d.dev,
            dist: d.dist,
            assets: d.assets,
            project_root: d.project_root,
        }
    }
}

/// `[server]` section for the development server.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerSection {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// `[css]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CssSection {
    /// Minimum browser versions (e.g. `ie = "9"`, `android = "4.4"`) used for
    /// vendor prefixing of compiled Sass.
    #[serde(default = "default_browsers")]
    pub browsers: BTreeMap<String, String>,

    /// Compatibility mode for CSS minification, e.g. `"ie9"`.
    #[serde(default = "default_minify_compatibility")]
    pub minify_compatibility: String,
}

/// Roughly "last 3 versions, ie 9" at the time the layout was set up.
fn default_browsers() -> BTreeMap<String, String> {
    [
        ("android", "4.1"),
        ("chrome", "38"),
        ("firefox", "33"),
        ("ie", "9"),
        ("ios_saf", "7"),
        ("opera", "25"),
        ("safari", "6.1"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

fn default_minify_compatibility() -> String {
    "ie9".to_string()
}

impl Default for CssSection {
    fn default() -> Self {
        Self {
            browsers: default_browsers(),
            minify_compatibility: default_minify_compatibility(),
        }
    }
}

/// Which comments survive JS minification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CommentPolicy {
    /// Keep `/*! ... */` blocks and comments tagged `@license` / `@preserve`.
    #[default]
    Some,
    /// Strip every comment.
    None,
}

/// `[js]` section.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct JsSection {
    #[serde(default)]
    pub preserve_comments: CommentPolicy,
}

/// `[template]` section.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct TemplateSection {
    /// Variables available to `<%= name %>` / `<%- name %>` in templates.
    #[serde(default)]
    pub data: BTreeMap<String, String>,
}

// src/paths.rs

//! Directory roles and path composition.
//!
//! Every task input/output path is derived from a [`DirRoles`] value by
//! joining one or more roles with a fixed sub-path. The result is always
//! relative to the working root; callers join it onto the root when they
//! touch the filesystem.

use std::fmt;
use std::path::{Path, PathBuf};

/// Logical directory role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Source tree (`_src`).
    Src,
    /// Development output tree (`dev`).
    Dev,
    /// Distribution output tree (`dist`).
    Dist,
    /// Assets subtree name (`assets`), nested under `project_root`.
    Assets,
    /// Optional project-root prefix inside src/dev/dist (often empty).
    ProjectRoot,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Role::Src => "src",
            Role::Dev => "dev",
            Role::Dist => "dist",
            Role::Assets => "assets",
            Role::ProjectRoot => "project_root",
        };
        f.write_str(s)
    }
}

/// Immutable role -> relative path map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirRoles {
    pub src: String,
    pub dev: String,
    pub dist: String,
    pub assets: String,
    pub project_root: String,
}

impl Default for DirRoles {
    fn default() -> Self {
        Self {
            src: "_src".to_string(),
            dev: "dev".to_string(),
            dist: "dist".to_string(),
            assets: "assets".to_string(),
            project_root: String::new(),
        }
    }
}

impl DirRoles {
    /// Raw configured value for a role.
    pub fn get(&self, role: Role) -> &str {
        match role {
            Role::Src => &self.src,
            Role::Dev => &self.dev,
            Role::Dist => &self.dist,
            Role::Assets => &self.assets,
            Role::ProjectRoot => &self.project_root,
        }
    }

    /// Join `role` with `subpaths`.
    ///
    /// Empty and `.` segments are dropped, so an empty `project_root` never
    /// yields a doubled separator or a `./` component.
    pub fn resolve<S: AsRef<str>>(&self, role: Role, subpaths: &[S]) -> PathBuf {
        let base = join_segments(Path::new(""), [self.get(role)]);
        join_segments(&base, subpaths.iter().map(|s| s.as_ref()))
    }

    /// `<root_role>/<project_root>/<assets>/<sub...>`.
    pub fn asset_path(&self, root_role: Role, sub: &str) -> PathBuf {
        self.resolve(root_role, &[self.project_root.as_str(), self.assets.as_str(), sub])
    }

    /// `<root_role>/<project_root>`.
    pub fn project_path(&self, root_role: Role) -> PathBuf {
        self.resolve(root_role, &[self.project_root.as_str()])
    }
}

/// Append path segments to `base`.
///
/// Each segment may itself contain `/` (or `\`); it is split and every
/// non-empty, non-`.` component is pushed. Leading separators are ignored so
/// a segment can never turn the result into an absolute path.
pub fn join_segments<'a, I>(base: &Path, segments: I) -> PathBuf
where
    I: IntoIterator<Item = &'a str>,
{
    let mut out = base.to_path_buf();
    for seg in segments {
        for part in seg.split(['/', '\\']) {
            if part.is_empty() || part == "." {
                continue;
            }
            out.push(part);
        }
    }
    out
}

/// Render a relative path with forward slashes (glob/URL form).
pub fn to_slash(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

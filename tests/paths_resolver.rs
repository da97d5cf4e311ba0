// tests/paths_resolver.rs

use std::path::{Path, PathBuf};

use proptest::prelude::*;
use sitedag::paths::{DirRoles, Role, join_segments, to_slash};

fn segment() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z]{1,6}",
        "[a-z]{1,4}/[a-z]{1,4}",
        Just(String::new()),
        Just(".".to_string()),
    ]
}

proptest! {
    #[test]
    fn join_is_associative(
        base in "[a-z]{0,5}",
        a in proptest::collection::vec(segment(), 0..4),
        b in proptest::collection::vec(segment(), 0..4),
    ) {
        let base = PathBuf::from(base);
        let stepwise = join_segments(
            &join_segments(&base, a.iter().map(String::as_str)),
            b.iter().map(String::as_str),
        );
        let at_once = join_segments(&base, a.iter().chain(b.iter()).map(String::as_str));
        prop_assert_eq!(stepwise, at_once);
    }

    #[test]
    fn joined_paths_never_contain_empty_or_dot_components(
        segs in proptest::collection::vec(segment(), 0..6),
    ) {
        let joined = join_segments(Path::new(""), segs.iter().map(String::as_str));
        let rendered = to_slash(&joined);
        prop_assert!(!rendered.contains("//"));
        prop_assert!(!rendered.starts_with('/'));
        prop_assert!(rendered.split('/').all(|c| c != "."));
    }
}

#[test]
fn empty_project_root_adds_no_component() {
    let dirs = DirRoles::default();
    assert_eq!(dirs.asset_path(Role::Src, "sass"), PathBuf::from("_src/assets/sass"));
    assert_eq!(dirs.asset_path(Role::Dev, "js/lib"), PathBuf::from("dev/assets/js/lib"));
    assert_eq!(dirs.project_path(Role::Dist), PathBuf::from("dist"));
}

#[test]
fn project_root_is_inserted_between_role_and_assets() {
    let dirs = DirRoles {
        project_root: "site".to_string(),
        ..DirRoles::default()
    };
    assert_eq!(
        dirs.asset_path(Role::Dev, "css"),
        PathBuf::from("dev/site/assets/css")
    );
    assert_eq!(
        dirs.resolve(Role::Src, &["site", "", ".", "index.html"]),
        PathBuf::from("_src/site/index.html")
    );
}

#[test]
fn leading_separators_cannot_make_a_path_absolute() {
    let joined = join_segments(Path::new("dev"), ["/etc/passwd"]);
    assert_eq!(joined, PathBuf::from("dev/etc/passwd"));
    assert!(joined.is_relative());
}

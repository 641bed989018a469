use std::fs;

use fstree::TreeError;
use tempfile::TempDir;

use crate::integration::support::{child_names, open, sidecar};

#[test]
fn display_order_survives_reload() {
    let temp_dir = TempDir::new().unwrap();
    let mut tree = open(temp_dir.path());
    let root = tree.root();
    for name in ["zeta", "alpha", "mid"] {
        tree.leaf_insert(name, name.to_string(), root).unwrap();
    }
    let alpha = tree.find_by_name("alpha").unwrap();
    tree.move_inside_last(alpha, root).unwrap();
    assert_eq!(child_names(&tree, root), ["zeta", "mid", "alpha"]);

    tree.reload().unwrap();
    let root = tree.root();
    assert_eq!(child_names(&tree, root), ["zeta", "mid", "alpha"]);
    assert_eq!(sidecar(temp_dir.path()), ["zeta", "mid", "alpha"]);
}

#[test]
fn missing_sidecar_falls_back_to_name_order_and_is_rewritten() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("b.txt"), "").unwrap();
    fs::write(temp_dir.path().join("a.txt"), "").unwrap();
    fs::create_dir(temp_dir.path().join("c")).unwrap();

    let tree = open(temp_dir.path());
    assert_eq!(child_names(&tree, tree.root()), ["a", "b", "c"]);
    assert_eq!(sidecar(temp_dir.path()), ["a", "b", "c"]);
}

#[test]
fn malformed_sidecar_is_rewritten() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("b.txt"), "").unwrap();
    fs::write(temp_dir.path().join("a.txt"), "").unwrap();
    fs::write(temp_dir.path().join(".index.json"), "{\"not\": \"a list\"").unwrap();

    let tree = open(temp_dir.path());
    assert_eq!(child_names(&tree, tree.root()), ["a", "b"]);
    assert_eq!(sidecar(temp_dir.path()), ["a", "b"]);
}

#[test]
fn entries_unknown_to_sidecar_go_last_and_stale_keys_are_dropped() {
    let temp_dir = TempDir::new().unwrap();
    for name in ["a", "b", "c", "d"] {
        fs::write(temp_dir.path().join(format!("{}.txt", name)), name).unwrap();
    }
    fs::write(
        temp_dir.path().join(".index.json"),
        r#"["c", "gone", "a"]"#,
    )
    .unwrap();

    let tree = open(temp_dir.path());
    assert_eq!(child_names(&tree, tree.root()), ["c", "a", "b", "d"]);
    assert_eq!(sidecar(temp_dir.path()), ["c", "a", "b", "d"]);
}

#[test]
fn undecodable_and_reserved_entries_are_skipped() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("ok.txt"), "fine").unwrap();
    fs::write(temp_dir.path().join("bad%G1.txt"), "").unwrap();
    fs::write(temp_dir.path().join("trunc%2.txt"), "").unwrap();
    fs::create_dir(temp_dir.path().join("dir%zz")).unwrap();
    fs::write(temp_dir.path().join(".index.tmp"), "[]").unwrap();
    fs::write(temp_dir.path().join("readme.md"), "not a leaf").unwrap();

    let tree = open(temp_dir.path());
    assert_eq!(child_names(&tree, tree.root()), ["ok"]);
}

#[test]
fn nested_folders_restore_their_own_order() {
    let temp_dir = TempDir::new().unwrap();
    let mut tree = open(temp_dir.path());
    let root = tree.root();
    let folder = tree.create_folder(root).unwrap();
    let x = tree.leaf_insert("x", String::new(), folder).unwrap();
    tree.leaf_insert("y", String::new(), folder).unwrap();
    tree.move_inside_last(x, folder).unwrap();

    tree.reload().unwrap();
    let folder = tree.find_by_name("New Folder").unwrap();
    assert_eq!(child_names(&tree, folder), ["y", "x"]);
    assert_eq!(
        sidecar(&temp_dir.path().join("New%20Folder")),
        ["y", "x"]
    );
}

#[test]
fn handles_from_before_reload_are_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let mut tree = open(temp_dir.path());
    let root = tree.root();
    let leaf = tree.leaf_insert("leaf", String::new(), root).unwrap();

    tree.reload().unwrap();

    assert!(!tree.contains(leaf));
    assert!(matches!(tree.name(leaf), Err(TreeError::InvalidHandle(_))));
    assert!(matches!(
        tree.create_folder(root),
        Err(TreeError::InvalidHandle(_))
    ));
    let fresh = tree.find_by_name("leaf").unwrap();
    assert_eq!(fresh.id(), leaf.id());
    assert_ne!(fresh, leaf);
}

#[test]
fn base_path_occupied_by_file_is_replaced() {
    let temp_dir = TempDir::new().unwrap();
    let base = temp_dir.path().join("tree");
    fs::write(&base, "stray").unwrap();

    let mut tree = open(&base);
    assert!(base.is_dir());
    let root = tree.root();
    tree.leaf_insert("first", String::new(), root).unwrap();
    assert!(base.join("first.txt").is_file());
}

#[test]
fn flush_writes_nothing_when_clean() {
    let temp_dir = TempDir::new().unwrap();
    let mut tree = open(temp_dir.path());
    let root = tree.root();
    let leaf = tree.leaf_insert("leaf", "v".to_string(), root).unwrap();

    assert!(!tree.is_dirty(leaf).unwrap());
    assert!(!tree.is_dirty(root).unwrap());
    tree.flush().unwrap();
    assert_eq!(
        fs::read_to_string(temp_dir.path().join("leaf.txt")).unwrap(),
        "v"
    );
}

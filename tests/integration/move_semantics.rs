use std::fs;
use std::sync::mpsc;

use fstree::{TreeError, TreeEvent};
use tempfile::TempDir;

use crate::integration::support::{child_names, open, sidecar};

#[test]
fn move_inside_first_into_empty_folder() {
    let temp_dir = TempDir::new().unwrap();
    let mut tree = open(temp_dir.path());
    let root = tree.root();
    let f1 = tree.create_folder(root).unwrap();
    let a = tree.leaf_insert("A", "a".to_string(), root).unwrap();

    tree.move_inside_first(a, f1).unwrap();

    assert_eq!(tree.children(f1).unwrap(), vec![a]);
    assert_eq!(tree.parent(a).unwrap(), Some(f1));
    let folder_dir = temp_dir.path().join("New%20Folder");
    assert_eq!(fs::read_to_string(folder_dir.join("A.txt")).unwrap(), "a");
    assert!(!temp_dir.path().join("A.txt").exists());
    assert_eq!(sidecar(&folder_dir), ["A"]);
    assert_eq!(sidecar(temp_dir.path()), ["New%20Folder"]);
}

#[test]
fn move_index_is_clamped_final_position() {
    let temp_dir = TempDir::new().unwrap();
    let mut tree = open(temp_dir.path());
    let root = tree.root();
    let folder = tree.create_folder(root).unwrap();
    for name in ["p", "q"] {
        tree.leaf_insert(name, String::new(), folder).unwrap();
    }
    let moved = tree.leaf_insert("m", String::new(), root).unwrap();

    tree.move_inside_at_index(moved, folder, 1).unwrap();
    assert_eq!(child_names(&tree, folder), ["p", "m", "q"]);

    tree.move_inside_at_index(moved, root, 42).unwrap();
    assert_eq!(child_names(&tree, root), ["New Folder", "m"]);

    tree.move_inside_at_index(moved, folder, 42).unwrap();
    assert_eq!(child_names(&tree, folder), ["p", "q", "m"]);
}

#[test]
fn move_before_and_after_across_parents() {
    let temp_dir = TempDir::new().unwrap();
    let mut tree = open(temp_dir.path());
    let root = tree.root();
    let folder = tree.create_folder(root).unwrap();
    let p = tree.leaf_insert("p", String::new(), folder).unwrap();
    let q = tree.leaf_insert("q", String::new(), folder).unwrap();
    let x = tree.leaf_insert("x", String::new(), root).unwrap();
    let y = tree.leaf_insert("y", String::new(), root).unwrap();

    tree.move_before(x, q).unwrap();
    assert_eq!(child_names(&tree, folder), ["p", "x", "q"]);

    tree.move_after(y, p).unwrap();
    assert_eq!(child_names(&tree, folder), ["p", "y", "x", "q"]);
    assert_eq!(child_names(&tree, root), ["New Folder"]);

    tree.reload().unwrap();
    let folder = tree.find_by_name("New Folder").unwrap();
    assert_eq!(child_names(&tree, folder), ["p", "y", "x", "q"]);
}

#[test]
fn moving_into_own_subtree_changes_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let mut tree = open(temp_dir.path());
    let root = tree.root();
    let outer = tree.create_folder(root).unwrap();
    let inner = tree.create_folder(outer).unwrap();
    let (tx, rx) = mpsc::channel();
    tree.subscribe(tx);

    let err = tree.move_inside_last(outer, inner).unwrap_err();
    assert!(matches!(err, TreeError::RecursiveTarget { .. }));

    assert_eq!(tree.parent(outer).unwrap(), Some(root));
    assert_eq!(tree.parent(inner).unwrap(), Some(outer));
    assert!(temp_dir
        .path()
        .join("New%20Folder")
        .join("New%20Folder")
        .is_dir());
    assert!(rx.try_recv().is_err());
}

#[test]
fn moving_root_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let mut tree = open(temp_dir.path());
    let root = tree.root();
    let folder = tree.create_folder(root).unwrap();
    assert!(matches!(
        tree.move_inside_first(root, folder),
        Err(TreeError::RootNode)
    ));
}

#[test]
fn folder_move_announces_descendants_in_pre_order() {
    let temp_dir = TempDir::new().unwrap();
    let mut tree = open(temp_dir.path());
    let root = tree.root();
    let target = tree.create_folder(root).unwrap();
    let moving = tree.create_folder(root).unwrap();
    let child = tree.create_folder(moving).unwrap();
    let grandchild = tree.leaf_insert("g", "deep".to_string(), child).unwrap();
    let sibling = tree.leaf_insert("s", String::new(), moving).unwrap();
    let (tx, rx) = mpsc::channel();
    tree.subscribe(tx);

    tree.move_inside_first(moving, target).unwrap();

    let events: Vec<TreeEvent> = rx.try_iter().collect();
    assert_eq!(
        events,
        vec![
            TreeEvent::Deleted { parent: root, item: moving },
            TreeEvent::Added { parent: target, item: moving },
            TreeEvent::Added { parent: moving, item: child },
            TreeEvent::Added { parent: child, item: grandchild },
            TreeEvent::Added { parent: moving, item: sibling },
        ]
    );

    let moved_dir = temp_dir
        .path()
        .join("New%20Folder")
        .join("New%20Folder%20-%201");
    assert_eq!(
        fs::read_to_string(moved_dir.join("New%20Folder").join("g.txt")).unwrap(),
        "deep"
    );
    assert_eq!(sidecar(&moved_dir), ["New%20Folder", "s"]);
    assert_eq!(tree.path_of(grandchild).unwrap(), moved_dir.join("New%20Folder").join("g.txt"));
}

#[test]
fn move_onto_existing_path_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let mut tree = open(temp_dir.path());
    let root = tree.root();
    let folder = tree.create_folder(root).unwrap();
    let leaf = tree.leaf_insert("clash", "mine".to_string(), root).unwrap();
    fs::write(
        temp_dir.path().join("New%20Folder").join("clash.txt"),
        "theirs",
    )
    .unwrap();

    let err = tree.move_inside_first(leaf, folder).unwrap_err();
    assert!(matches!(err, TreeError::NameCollision(_)));
    assert_eq!(tree.parent(leaf).unwrap(), Some(root));
    assert_eq!(
        fs::read_to_string(temp_dir.path().join("clash.txt")).unwrap(),
        "mine"
    );
}

#[test]
fn move_rejects_display_name_taken_by_raw_entry() {
    let temp_dir = TempDir::new().unwrap();
    let mut tree = open(temp_dir.path());
    let root = tree.root();
    tree.create_folder(root).unwrap();
    let folder_dir = temp_dir.path().join("New%20Folder");
    fs::write(folder_dir.join("a b.txt"), "raw").unwrap();

    tree.reload().unwrap();
    let root = tree.root();
    let folder = tree.find_by_name("New Folder").unwrap();
    assert_eq!(child_names(&tree, folder), ["a b"]);
    let leaf = tree.leaf_insert("a b", "encoded".to_string(), root).unwrap();
    let (tx, rx) = mpsc::channel();
    tree.subscribe(tx);

    let err = tree.move_inside_last(leaf, folder).unwrap_err();
    assert!(matches!(err, TreeError::NameCollision(_)));
    assert_eq!(tree.parent(leaf).unwrap(), Some(root));
    assert_eq!(child_names(&tree, folder), ["a b"]);
    assert!(rx.try_recv().is_err());
    assert_eq!(fs::read_to_string(folder_dir.join("a b.txt")).unwrap(), "raw");
    assert_eq!(
        fs::read_to_string(temp_dir.path().join("a%20b.txt")).unwrap(),
        "encoded"
    );
    assert!(!folder_dir.join("a%20b.txt").exists());
}

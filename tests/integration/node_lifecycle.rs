use std::fs;
use std::sync::mpsc;

use fstree::{TreeError, TreeEvent};
use tempfile::TempDir;

use crate::integration::support::{child_names, open, sidecar};

#[test]
fn created_folders_are_uniquified_and_leaf_survives_reload() {
    let temp_dir = TempDir::new().unwrap();
    let mut tree = open(temp_dir.path());
    let root = tree.root();

    let first = tree.create_folder(root).unwrap();
    let second = tree.create_folder(root).unwrap();
    assert_eq!(tree.name(first).unwrap(), "New Folder");
    assert_eq!(tree.name(second).unwrap(), "New Folder - 1");

    tree.leaf_insert("alpha", "payload".to_string(), root)
        .unwrap();

    tree.reload().unwrap();
    let root = tree.root();
    assert_eq!(
        child_names(&tree, root),
        ["New Folder", "New Folder - 1", "alpha"]
    );
    let alpha = tree.find_by_name("alpha").unwrap();
    assert_eq!(tree.leaf_payload(alpha).unwrap(), "payload");
    assert!(!tree.is_container(alpha).unwrap());
}

#[test]
fn leaf_create_uniquifies_but_leaf_insert_rejects() {
    let temp_dir = TempDir::new().unwrap();
    let mut tree = open(temp_dir.path());
    let root = tree.root();

    tree.leaf_create(root, "one".to_string(), "note").unwrap();
    let copy = tree.leaf_create(root, "two".to_string(), "note").unwrap();
    assert_eq!(tree.name(copy).unwrap(), "note - 1");

    let before = child_names(&tree, root);
    let err = tree
        .leaf_insert("note", "three".to_string(), root)
        .unwrap_err();
    assert!(matches!(err, TreeError::NameCollision(name) if name == "note"));
    assert_eq!(child_names(&tree, root), before);
    assert_eq!(
        fs::read_to_string(temp_dir.path().join("note.txt")).unwrap(),
        "one"
    );
}

#[test]
fn reserved_and_empty_names_are_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let mut tree = open(temp_dir.path());
    let root = tree.root();

    assert!(matches!(
        tree.leaf_insert(".index", String::new(), root),
        Err(TreeError::ReservedName(_))
    ));
    assert!(matches!(
        tree.leaf_create(root, String::new(), ".index"),
        Err(TreeError::ReservedName(_))
    ));
    assert!(matches!(
        tree.leaf_insert("", String::new(), root),
        Err(TreeError::EmptyName)
    ));

    let folder = tree.create_folder(root).unwrap();
    assert!(matches!(
        tree.rename(folder, ".index"),
        Err(TreeError::ReservedName(_))
    ));
    assert!(matches!(tree.rename(folder, ""), Err(TreeError::EmptyName)));
    assert_eq!(tree.name(folder).unwrap(), "New Folder");
}

#[test]
fn leaves_cannot_hold_children() {
    let temp_dir = TempDir::new().unwrap();
    let mut tree = open(temp_dir.path());
    let root = tree.root();
    let leaf = tree.leaf_insert("leaf", String::new(), root).unwrap();

    assert!(matches!(
        tree.create_folder(leaf),
        Err(TreeError::NotAFolder(_))
    ));
    assert!(matches!(
        tree.leaf_replace(root, String::new()),
        Err(TreeError::NotALeaf(_))
    ));
    assert!(tree.children(leaf).unwrap().is_empty());
}

#[test]
fn rename_moves_entry_and_rejects_collisions() {
    let temp_dir = TempDir::new().unwrap();
    let mut tree = open(temp_dir.path());
    let root = tree.root();
    let folder = tree.create_folder(root).unwrap();
    tree.leaf_insert("inside", "x".to_string(), folder)
        .unwrap();
    let other = tree.leaf_insert("other", String::new(), root).unwrap();

    tree.rename(folder, "Projects/2024").unwrap();
    let renamed = temp_dir.path().join("Projects%2F2024");
    assert!(renamed.join("inside.txt").is_file());
    assert!(!temp_dir.path().join("New%20Folder").exists());
    assert_eq!(sidecar(temp_dir.path()), ["Projects%2F2024", "other"]);

    tree.rename(folder, "Projects/2024").unwrap();
    assert!(matches!(
        tree.rename(other, "Projects/2024"),
        Err(TreeError::NameCollision(_))
    ));
    assert!(matches!(tree.rename(root, "x"), Err(TreeError::RootNode)));

    tree.reload().unwrap();
    assert!(tree.find_by_name("Projects/2024").is_some());
}

#[test]
fn remove_deletes_subtree_on_disk_and_in_memory() {
    let temp_dir = TempDir::new().unwrap();
    let mut tree = open(temp_dir.path());
    let root = tree.root();
    let outer = tree.create_folder(root).unwrap();
    let inner = tree.create_folder(outer).unwrap();
    let leaf = tree.leaf_insert("deep", "d".to_string(), inner).unwrap();
    let keep = tree.leaf_insert("keep", "k".to_string(), root).unwrap();
    assert_eq!(tree.len(), 5);

    tree.remove(outer).unwrap();

    assert!(!temp_dir.path().join("New%20Folder").exists());
    assert_eq!(tree.len(), 2);
    for gone in [outer, inner, leaf] {
        assert!(matches!(tree.name(gone), Err(TreeError::InvalidHandle(_))));
    }
    assert!(tree.contains(keep));
    assert_eq!(sidecar(temp_dir.path()), ["keep"]);
    assert!(matches!(tree.remove(root), Err(TreeError::RootNode)));
}

#[test]
fn observers_see_events_in_order_and_nothing_on_failure() {
    let temp_dir = TempDir::new().unwrap();
    let mut tree = open(temp_dir.path());
    let root = tree.root();
    let (tx, rx) = mpsc::channel();
    let subscription = tree.subscribe(tx);

    let folder = tree.create_folder(root).unwrap();
    let leaf = tree.leaf_insert("a", String::new(), folder).unwrap();
    tree.leaf_replace(leaf, "b".to_string()).unwrap();
    tree.rename(leaf, "renamed").unwrap();
    tree.remove(leaf).unwrap();

    assert!(tree.leaf_insert(".index", String::new(), root).is_err());
    assert!(tree.rename(folder, "").is_err());
    assert!(tree.remove(leaf).is_err());

    let events: Vec<TreeEvent> = rx.try_iter().collect();
    assert_eq!(
        events,
        vec![
            TreeEvent::Added { parent: root, item: folder },
            TreeEvent::Added { parent: folder, item: leaf },
            TreeEvent::Changed { item: leaf },
            TreeEvent::Changed { item: leaf },
            TreeEvent::Deleted { parent: folder, item: leaf },
        ]
    );

    assert!(tree.unsubscribe(subscription));
    tree.create_folder(root).unwrap();
    assert!(rx.try_recv().is_err());
}

#[test]
fn closure_observers_are_called_in_subscription_order() {
    use std::cell::RefCell;
    use std::rc::Rc;

    let temp_dir = TempDir::new().unwrap();
    let mut tree = open(temp_dir.path());
    let root = tree.root();
    let log = Rc::new(RefCell::new(Vec::new()));

    let first = Rc::clone(&log);
    tree.subscribe(move |_: &TreeEvent| first.borrow_mut().push("first"));
    let second = Rc::clone(&log);
    tree.subscribe(move |_: &TreeEvent| second.borrow_mut().push("second"));

    tree.create_folder(root).unwrap();
    assert_eq!(*log.borrow(), ["first", "second"]);
}

use std::fs;
use std::path::Path;
use std::sync::mpsc;

use fstree::{DisplayValue, EntryInfo, LeafAdapter, TreeError, TreeStore};
use tempfile::TempDir;

use crate::integration::support::sidecar;

/// Text leaves whose save fails for the payload "bad".
struct RejectingAdapter;

impl LeafAdapter for RejectingAdapter {
    type Payload = String;

    fn is_leaf(&self, entry: &EntryInfo<'_>) -> bool {
        !entry.is_dir && entry.file_name.ends_with(".txt")
    }

    fn leaf_file_name(&self, encoded: &str) -> String {
        format!("{}.txt", encoded)
    }

    fn encoded_from_file_name<'n>(&self, file_name: &'n str) -> &'n str {
        file_name.strip_suffix(".txt").unwrap_or(file_name)
    }

    fn load_leaf(&self, path: &Path) -> Result<String, TreeError> {
        fs::read_to_string(path).map_err(|e| TreeError::Payload(e.to_string()))
    }

    fn save_leaf(&self, path: &Path, payload: &String) -> Result<(), TreeError> {
        if payload == "bad" {
            return Err(TreeError::Payload("rejected".to_string()));
        }
        fs::write(path, payload).map_err(|e| TreeError::Payload(e.to_string()))
    }

    fn render_column(&self, name: &str, _payload: &String, _column: usize) -> DisplayValue {
        DisplayValue::text(name)
    }
}

fn open(dir: &Path) -> TreeStore<RejectingAdapter> {
    TreeStore::open(dir, RejectingAdapter).unwrap()
}

#[test]
fn failed_insert_rolls_back() {
    let temp_dir = TempDir::new().unwrap();
    let mut tree = open(temp_dir.path());
    let root = tree.root();
    tree.leaf_insert("g", "ok".to_string(), root).unwrap();
    let (tx, rx) = mpsc::channel();
    tree.subscribe(tx);
    let len = tree.len();

    let err = tree.leaf_insert("b", "bad".to_string(), root).unwrap_err();
    assert!(matches!(err, TreeError::Payload(_)));
    assert_eq!(tree.len(), len);
    assert!(!tree.has_child_named(root, "b").unwrap());
    assert_eq!(sidecar(temp_dir.path()), ["g"]);
    assert!(!temp_dir.path().join("b.txt").exists());

    assert!(tree.leaf_create(root, "bad".to_string(), "Fresh").is_err());
    assert_eq!(tree.len(), len);
    assert_eq!(sidecar(temp_dir.path()), ["g"]);
    assert!(rx.try_recv().is_err());

    tree.reload().unwrap();
    assert_eq!(tree.len(), len);
}

#[test]
fn failed_update_restores_payload() {
    let temp_dir = TempDir::new().unwrap();
    let mut tree = open(temp_dir.path());
    let root = tree.root();
    let leaf = tree.leaf_insert("good", "ok".to_string(), root).unwrap();
    let (tx, rx) = mpsc::channel();
    tree.subscribe(tx);

    assert!(tree.leaf_replace(leaf, "bad".to_string()).is_err());
    assert_eq!(tree.leaf_payload(leaf).unwrap(), "ok");

    assert!(tree
        .update_leaf(leaf, |payload| *payload = "bad".to_string())
        .is_err());
    assert_eq!(tree.leaf_payload(leaf).unwrap(), "ok");

    assert!(rx.try_recv().is_err());
    assert_eq!(
        fs::read_to_string(temp_dir.path().join("good.txt")).unwrap(),
        "ok"
    );
}

#[test]
fn failed_delete_keeps_node() {
    let temp_dir = TempDir::new().unwrap();
    let mut tree = open(temp_dir.path());
    let root = tree.root();
    let folder = tree.create_folder(root).unwrap();
    let leaf = tree.leaf_insert("x", "ok".to_string(), folder).unwrap();
    let folder_dir = temp_dir.path().join("New%20Folder");
    fs::remove_dir_all(&folder_dir).unwrap();
    fs::write(&folder_dir, "not a folder").unwrap();
    let (tx, rx) = mpsc::channel();
    tree.subscribe(tx);
    let len = tree.len();

    assert!(tree.remove(leaf).is_err());
    assert!(tree.contains(leaf));
    assert_eq!(tree.parent(leaf).unwrap(), Some(folder));
    assert_eq!(tree.children(folder).unwrap(), vec![leaf]);
    assert_eq!(tree.len(), len);
    assert!(rx.try_recv().is_err());
}

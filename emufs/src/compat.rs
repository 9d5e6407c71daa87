//! The boolean / `-1` / empty-list contract native callers were written
//! against. Every failure is logged here and never reaches the caller.

use std::fmt::Display;

use crate::tree::DocumentTree;

pub struct CompatTree<'a> {
    tree: &'a DocumentTree,
}

fn or_log<T, D: Display + ?Sized>(op: &str, path: &D, res: crate::Result<T>, default: T) -> T {
    match res {
        Ok(v) => v,
        Err(e) => {
            log::error!("{} failed for {}: {}", op, path, e);
            default
        }
    }
}

impl<'a> CompatTree<'a> {
    pub fn new(tree: &'a DocumentTree) -> Self {
        Self { tree }
    }

    pub fn create_file(&self, filepath: &str, name: &str) -> bool {
        let res = self.tree.create_file(filepath, name).map(|_| true);
        or_log("create_file", filepath, res, false)
    }

    pub fn create_dir(&self, filepath: &str, name: &str) -> bool {
        let res = self.tree.create_dir(filepath, name).map(|_| true);
        or_log("create_dir", filepath, res, false)
    }

    #[cfg(unix)]
    pub fn open_content_uri(&self, filepath: &str, mode: &str) -> i32 {
        let res = self.tree.open_content_uri(filepath, mode);
        or_log("open_content_uri", filepath, res, -1)
    }

    pub fn get_filename(&self, filepath: &str) -> String {
        let res = self.tree.file_name(filepath);
        or_log("get_filename", filepath, res, String::new())
    }

    pub fn get_files_name(&self, filepath: &str) -> Vec<String> {
        let res = self.tree.list(filepath);
        or_log("get_files_name", filepath, res, Vec::new())
    }

    pub fn get_file_size(&self, filepath: &str) -> i64 {
        let res = self
            .tree
            .file_size(filepath)
            .map(|it| i64::try_from(it).unwrap_or(i64::MAX));
        or_log("get_file_size", filepath, res, 0)
    }

    pub fn is_directory(&self, filepath: &str) -> bool {
        let res = self.tree.is_directory(filepath);
        or_log("is_directory", filepath, res, false)
    }

    pub fn exists(&self, filepath: &str) -> bool {
        let res = self.tree.exists(filepath);
        or_log("exists", filepath, res, false)
    }

    pub fn copy_file(&self, source: &str, destination_parent: &str, destination_name: &str) -> bool {
        let res = self
            .tree
            .copy_file(source, destination_parent, destination_name)
            .map(|_| true);
        or_log("copy_file", source, res, false)
    }

    pub fn rename_file(&self, filepath: &str, destination: &str) -> bool {
        let res = self.tree.rename(filepath, destination).map(|_| true);
        or_log("rename_file", filepath, res, false)
    }

    pub fn delete_document(&self, filepath: &str) -> bool {
        let res = self.tree.delete(filepath).map(|_| true);
        or_log("delete_document", filepath, res, false)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::testing::{tmp_context, TestContext, TreeEntry};
    use rstest::*;

    const PKG: &str = "org.example.emu";

    fn rooted(ctx: &TestContext) -> DocumentTree {
        DocumentTree::with_root(PKG, ctx.to_abs("user")).expect("creating tree")
    }

    #[rstest]
    fn test_create_exists_delete(tmp_context: TestContext) {
        let tree = rooted(&tmp_context);
        let compat = CompatTree::new(&tree);
        assert!(compat.create_file("log", "emu_log.txt"));
        assert!(compat.exists("log/emu_log.txt"));
        assert!(!compat.create_file("log", "emu_log.txt"));
        assert!(compat.delete_document("log/emu_log.txt"));
        assert!(!compat.exists("log/emu_log.txt"));
        assert!(!compat.delete_document("log/emu_log.txt"));
    }

    #[rstest]
    #[case("sdmc", "Nintendo 3DS", "sdmc/Nintendo 3DS")]
    #[case("sdmc", "Nintendo 3DS/title", "sdmc/Nintendo 3DS/title")]
    fn test_create_dir(
        tmp_context: TestContext,
        #[case] parent: &str,
        #[case] name: &str,
        #[case] expected: &str,
    ) {
        let tree = rooted(&tmp_context);
        let compat = CompatTree::new(&tree);
        assert!(compat.create_dir(parent, name));
        assert!(compat.is_directory(expected));
        assert!(!compat.create_dir(parent, name));
    }

    #[rstest]
    fn test_listing_never_absent(tmp_context: TestContext) {
        let tree = rooted(&tmp_context);
        let compat = CompatTree::new(&tree);
        assert!(compat.get_files_name("does/not/exist").is_empty());

        tmp_context
            .create_tree(&[("user/regular.txt", TreeEntry::TxtFile("abc"))])
            .expect("creating tree");
        // Listing a plain file is an error underneath, still an empty list here
        assert!(compat.get_files_name("regular.txt").is_empty());
        assert_eq!(compat.get_file_size("regular.txt"), 3);
        assert_eq!(compat.get_filename("regular.txt"), "regular.txt");
    }

    #[rstest]
    fn test_rename(tmp_context: TestContext) {
        let tree = rooted(&tmp_context);
        let compat = CompatTree::new(&tree);
        tmp_context
            .create_tree(&[("user/states/a.bin", TreeEntry::EmptyFile)])
            .expect("creating tree");
        assert!(compat.rename_file("states/a.bin", "states/b.bin"));
        assert!(!compat.exists("states/a.bin"));
        assert!(compat.exists("states/b.bin"));
        assert!(!compat.rename_file("states/a.bin", "states/c.bin"));
    }

    #[rstest]
    fn test_copy_always_false(tmp_context: TestContext) {
        let tree = rooted(&tmp_context);
        let compat = CompatTree::new(&tree);
        tmp_context
            .create_tree(&[("user/a.txt", TreeEntry::EmptyFile)])
            .expect("creating tree");
        assert!(!compat.copy_file("a.txt", "", "b.txt"));
    }

    #[rstest]
    fn test_no_root_collapses_to_sentinels() {
        let tree = DocumentTree::new(PKG);
        let compat = CompatTree::new(&tree);
        assert!(!compat.exists("log"));
        assert!(!compat.is_directory("log"));
        assert!(!compat.create_file("log", "x"));
        assert!(!compat.create_dir("log", "x"));
        assert_eq!(compat.get_file_size("log"), 0);
        assert_eq!(compat.get_filename("log"), "");
        assert!(compat.get_files_name("log").is_empty());
        #[cfg(unix)]
        assert_eq!(compat.open_content_uri("log", "r"), -1);
    }

    #[rstest]
    #[cfg(unix)]
    fn test_open_content_uri(tmp_context: TestContext) {
        use std::fs::File;
        use std::os::fd::FromRawFd;

        let tree = rooted(&tmp_context);
        let compat = CompatTree::new(&tree);
        tmp_context
            .create_tree(&[("user/rom.3ds", TreeEntry::BinFile(&[0u8; 16]))])
            .expect("creating tree");
        let fd = compat.open_content_uri("rom.3ds", "r");
        assert!(fd >= 0);
        drop(unsafe { File::from_raw_fd(fd) });
        assert_eq!(compat.open_content_uri("rom.3ds", "nope"), -1);
    }
}

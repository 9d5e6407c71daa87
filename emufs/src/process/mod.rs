//! Working out which of the application's processes we are running in.
//!
//! The name is looked up through a list of [ProcessNameSource]s, cheapest
//! first, and the first non-empty answer is kept for the rest of the
//! process's life.

use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;

pub mod abi;
pub use abi::AbiSupport;

pub mod table;
pub use table::{ProcFsTable, ProcessTable, RunningProcess};

pub const PROC_ROOT: &'static str = "/proc";

/// One way of finding out the current process name
pub trait ProcessNameSource: Send + Sync {
    /// Short name used when logging
    fn label(&self) -> &'static str;

    /// The process name, or `None` if this source can't tell. Failures are
    /// never reported beyond that.
    fn process_name(&self) -> Option<String>;
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(String::from(trimmed))
    }
}

/// The name the runtime reports for itself: the first argument in
/// `/proc/self/cmdline`, which Android sets to the process name.
pub struct CmdlineSource {
    proc_root: PathBuf,
}

impl CmdlineSource {
    pub fn new<P: Into<PathBuf>>(proc_root: P) -> Self {
        Self {
            proc_root: proc_root.into(),
        }
    }
}

impl ProcessNameSource for CmdlineSource {
    fn label(&self) -> &'static str {
        "cmdline"
    }

    fn process_name(&self) -> Option<String> {
        let raw = std::fs::read(self.proc_root.join("self").join("cmdline")).ok()?;
        let argv0 = raw.split(|b| *b == 0).next()?;
        non_empty(&String::from_utf8_lossy(argv0))
    }
}

/// The kernel's task name from `/proc/self/comm`.
///
/// This is truncated to 15 bytes so it is only consulted when the full name
/// is unavailable.
pub struct CommSource {
    proc_root: PathBuf,
}

impl CommSource {
    pub fn new<P: Into<PathBuf>>(proc_root: P) -> Self {
        Self {
            proc_root: proc_root.into(),
        }
    }
}

impl ProcessNameSource for CommSource {
    fn label(&self) -> &'static str {
        "comm"
    }

    fn process_name(&self) -> Option<String> {
        let comm = std::fs::read_to_string(self.proc_root.join("self").join("comm")).ok()?;
        non_empty(&comm)
    }
}

/// Find our own pid in the application's process table
pub struct ProcessTableSource<T: ProcessTable> {
    table: T,
    pid: u32,
}

impl<T: ProcessTable> ProcessTableSource<T> {
    pub fn new(table: T, pid: u32) -> Self {
        Self { table, pid }
    }

    pub fn for_current_process(table: T) -> Self {
        Self::new(table, std::process::id())
    }
}

impl<T: ProcessTable> ProcessNameSource for ProcessTableSource<T> {
    fn label(&self) -> &'static str {
        "process table"
    }

    fn process_name(&self) -> Option<String> {
        let procs = match self.table.running_processes() {
            Ok(v) => v,
            Err(e) => {
                log::trace!("failed to list running processes: {}", e);
                return None;
            }
        };
        procs
            .into_iter()
            .find(|it| it.pid == self.pid)
            .and_then(|it| non_empty(&it.name))
    }
}

pub struct ProcessIdentifier {
    sources: Vec<Box<dyn ProcessNameSource>>,
    name: OnceCell<String>,
}

impl ProcessIdentifier {
    pub fn new(sources: Vec<Box<dyn ProcessNameSource>>) -> Self {
        Self {
            sources,
            name: OnceCell::new(),
        }
    }

    /// The standard lookup order against the real `/proc`
    pub fn system() -> Self {
        Self::with_proc_root(PROC_ROOT)
    }

    pub fn with_proc_root<P: AsRef<Path>>(proc_root: P) -> Self {
        let root = proc_root.as_ref();
        Self::new(vec![
            Box::new(CmdlineSource::new(root)),
            Box::new(CommSource::new(root)),
            Box::new(ProcessTableSource::for_current_process(ProcFsTable::new(
                root,
            ))),
        ])
    }

    /// The current process name, looked up on first use.
    ///
    /// A lookup where every source comes up empty isn't remembered, so the
    /// next call tries again.
    pub fn current_process_name(&self) -> Option<&str> {
        if let Some(name) = self.name.get() {
            return Some(name.as_str());
        }

        let found = self.sources.iter().find_map(|source| {
            let name = source.process_name();
            log::trace!("process name from {}: {:?}", source.label(), name);
            name.filter(|it| !it.is_empty())
        });

        match found {
            Some(name) => Some(self.name.get_or_init(|| name).as_str()),
            None => {
                log::warn!("unable to determine the current process name");
                None
            }
        }
    }

    /// Whether this is the application's main process, which carries the bare
    /// package name. Secondary processes are named `<package>:<suffix>`.
    pub fn is_main_process(&self, package: &str) -> bool {
        self.current_process_name()
            .map_or(false, |name| name == package)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::testing::{tmp_context, MockProcessNameSource, MockProcessTable, TestContext, TreeEntry};
    use rstest::*;

    fn source_returning(name: Option<&'static str>, times: usize) -> Box<dyn ProcessNameSource> {
        let mut source = MockProcessNameSource::new();
        source.expect_label().return_const("mock");
        source
            .expect_process_name()
            .times(times)
            .returning(move || name.map(String::from));
        Box::new(source)
    }

    #[rstest]
    fn test_first_success_wins() {
        let ident = ProcessIdentifier::new(vec![
            source_returning(None, 1),
            source_returning(Some("org.example.emu:emu"), 1),
            source_returning(Some("never.asked"), 0),
        ]);
        assert_eq!(ident.current_process_name(), Some("org.example.emu:emu"));
    }

    #[rstest]
    fn test_empty_names_fall_through() {
        let ident = ProcessIdentifier::new(vec![
            source_returning(Some(""), 1),
            source_returning(Some("org.example.emu"), 1),
        ]);
        assert_eq!(ident.current_process_name(), Some("org.example.emu"));
    }

    #[rstest]
    fn test_cached_after_first_success() {
        // The source may only be asked once even though we ask three times
        let ident = ProcessIdentifier::new(vec![source_returning(Some("org.example.emu"), 1)]);
        for _ in 0..3 {
            assert_eq!(ident.current_process_name(), Some("org.example.emu"));
        }
    }

    #[rstest]
    fn test_cache_ignores_later_changes() {
        let mut calls = 0;
        let mut source = MockProcessNameSource::new();
        source.expect_label().return_const("changing");
        source.expect_process_name().returning(move || {
            calls += 1;
            Some(format!("name-{calls}"))
        });
        let ident = ProcessIdentifier::new(vec![Box::new(source)]);
        assert_eq!(ident.current_process_name(), Some("name-1"));
        assert_eq!(ident.current_process_name(), Some("name-1"));
    }

    #[rstest]
    fn test_failure_is_not_cached() {
        let mut results = vec![Some(String::from("late.name")), None];
        let mut source = MockProcessNameSource::new();
        source.expect_label().return_const("flaky");
        source
            .expect_process_name()
            .times(2)
            .returning(move || results.pop().flatten());
        let ident = ProcessIdentifier::new(vec![Box::new(source)]);
        assert_eq!(ident.current_process_name(), None);
        assert_eq!(ident.current_process_name(), Some("late.name"));
    }

    #[rstest]
    fn test_no_sources() {
        let ident = ProcessIdentifier::new(Vec::new());
        assert_eq!(ident.current_process_name(), None);
        assert!(!ident.is_main_process("org.example.emu"));
    }

    #[rstest]
    fn test_is_main_process() {
        let main = ProcessIdentifier::new(vec![source_returning(Some("org.example.emu"), 1)]);
        assert!(main.is_main_process("org.example.emu"));
        let secondary =
            ProcessIdentifier::new(vec![source_returning(Some("org.example.emu:emu"), 1)]);
        assert!(!secondary.is_main_process("org.example.emu"));
    }

    #[rstest]
    fn test_table_source_matches_pid() {
        let mut table = MockProcessTable::new();
        table.expect_running_processes().returning(|| {
            Ok(vec![
                RunningProcess::new(10, "org.example.emu"),
                RunningProcess::new(11, "org.example.emu:emu"),
            ])
        });
        let source = ProcessTableSource::new(table, 11);
        assert_eq!(source.process_name().as_deref(), Some("org.example.emu:emu"));
    }

    #[rstest]
    fn test_table_source_failure_is_none() {
        let mut table = MockProcessTable::new();
        table
            .expect_running_processes()
            .returning(|| Err(std::io::Error::from(std::io::ErrorKind::PermissionDenied).into()));
        let source = ProcessTableSource::new(table, 11);
        assert_eq!(source.process_name(), None);

        let mut table = MockProcessTable::new();
        table
            .expect_running_processes()
            .returning(|| Ok(vec![RunningProcess::new(10, "org.example.emu")]));
        let source = ProcessTableSource::new(table, 11);
        assert_eq!(source.process_name(), None);
    }

    #[rstest]
    fn test_cmdline_source(tmp_context: TestContext) {
        tmp_context
            .create_tree(&[(
                "proc/self/cmdline",
                TreeEntry::BinFile(b"org.example.emu:emu\0--flag\0"),
            )])
            .expect("creating proc tree");
        let source = CmdlineSource::new(tmp_context.to_abs("proc"));
        assert_eq!(source.process_name().as_deref(), Some("org.example.emu:emu"));
    }

    #[rstest]
    fn test_cmdline_source_empty(tmp_context: TestContext) {
        tmp_context
            .create_tree(&[("proc/self/cmdline", TreeEntry::EmptyFile)])
            .expect("creating proc tree");
        let source = CmdlineSource::new(tmp_context.to_abs("proc"));
        assert_eq!(source.process_name(), None);
        let missing = CmdlineSource::new(tmp_context.to_abs("nowhere"));
        assert_eq!(missing.process_name(), None);
    }

    #[rstest]
    fn test_comm_source(tmp_context: TestContext) {
        tmp_context
            .create_tree(&[("proc/self/comm", TreeEntry::TxtFile("ple.emu:emu\n"))])
            .expect("creating proc tree");
        let source = CommSource::new(tmp_context.to_abs("proc"));
        assert_eq!(source.process_name().as_deref(), Some("ple.emu:emu"));
    }

    #[rstest]
    fn test_tiers_in_order(tmp_context: TestContext) {
        // No cmdline, so comm answers
        tmp_context
            .create_tree(&[
                ("proc/self/cmdline", TreeEntry::EmptyFile),
                ("proc/self/comm", TreeEntry::TxtFile("emu-worker\n")),
            ])
            .expect("creating proc tree");
        let ident = ProcessIdentifier::with_proc_root(tmp_context.to_abs("proc"));
        assert_eq!(ident.current_process_name(), Some("emu-worker"));
    }

    #[rstest]
    #[cfg(any(target_os = "linux", target_os = "android"))]
    fn test_system_lookup() {
        let ident = ProcessIdentifier::system();
        let name = ident.current_process_name().expect("linux always has a name");
        assert!(!name.is_empty());
    }
}

use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunningProcess {
    pub pid: u32,
    pub name: String,
}

impl RunningProcess {
    pub fn new<S: Into<String>>(pid: u32, name: S) -> Self {
        Self {
            pid,
            name: name.into(),
        }
    }
}

/// Snapshot of the processes belonging to the host application
pub trait ProcessTable: Send + Sync {
    fn running_processes(&self) -> crate::Result<Vec<RunningProcess>>;
}

impl<T> ProcessTable for Box<T>
where
    T: ProcessTable + ?Sized,
{
    fn running_processes(&self) -> crate::Result<Vec<RunningProcess>> {
        self.as_ref().running_processes()
    }
}

/// [ProcessTable] built by walking `/proc`.
///
/// Android runs every process of an application under the application's
/// uid, so only processes sharing our real uid are listed.
pub struct ProcFsTable {
    proc_root: PathBuf,
    uid: Option<u32>,
}

#[cfg(unix)]
fn current_uid() -> Option<u32> {
    // SAFETY: getuid has no preconditions and cannot fail
    Some(unsafe { libc::getuid() })
}

#[cfg(not(unix))]
fn current_uid() -> Option<u32> {
    None
}

impl ProcFsTable {
    pub fn new<P: Into<PathBuf>>(proc_root: P) -> Self {
        Self {
            proc_root: proc_root.into(),
            uid: current_uid(),
        }
    }

    /// Only list processes owned by `uid`, or everything if `None`
    pub fn with_uid(mut self, uid: Option<u32>) -> Self {
        self.uid = uid;
        self
    }

    fn read_process(&self, dir: &Path, pid: u32) -> Option<RunningProcess> {
        let status = fs::read_to_string(dir.join("status")).ok()?;
        let (status_name, uid) = parse_status(&status);

        if let Some(want) = self.uid {
            if uid != Some(want) {
                return None;
            }
        }

        let from_cmdline = fs::read(dir.join("cmdline")).ok().and_then(|raw| {
            let argv0 = raw.split(|b| *b == 0).next()?;
            let name = String::from_utf8_lossy(argv0).trim().to_string();
            if name.is_empty() {
                None
            } else {
                Some(name)
            }
        });

        let name = from_cmdline.or(status_name)?;
        Some(RunningProcess { pid, name })
    }
}

/// Pulls the `Name:` and real uid out of a `/proc/<pid>/status` file
fn parse_status(status: &str) -> (Option<String>, Option<u32>) {
    let mut name = None;
    let mut uid = None;
    for line in status.lines() {
        if let Some(rest) = line.strip_prefix("Name:") {
            name = Some(rest.trim().to_string()).filter(|it| !it.is_empty());
        } else if let Some(rest) = line.strip_prefix("Uid:") {
            uid = rest.split_whitespace().next().and_then(|it| it.parse().ok());
        }
        if name.is_some() && uid.is_some() {
            break;
        }
    }
    (name, uid)
}

impl ProcessTable for ProcFsTable {
    fn running_processes(&self) -> crate::Result<Vec<RunningProcess>> {
        let mut procs = Vec::new();
        for entry in fs::read_dir(&self.proc_root)? {
            let entry = entry?;
            let name = entry.file_name();
            let pid = match name.to_string_lossy().parse::<u32>() {
                Ok(v) => v,
                Err(_) => continue,
            };
            // Processes can exit while we're looking, that's fine
            if let Some(p) = self.read_process(&entry.path(), pid) {
                procs.push(p);
            }
        }
        procs.sort_by_key(|it| it.pid);
        Ok(procs)
    }
}

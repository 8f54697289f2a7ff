// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::debug;
use nix::unistd::Pid;

use crate::error::{Error, Result};

pub const PROC_ROOT: &str = "/proc";

/// Live view of the processes whose parent is the supervisor.
pub trait ChildEnumerator {
    fn children(&self) -> Result<Vec<Pid>>;
}

/// Reads the kernel's child lists under `<proc>/<pid>/task/*/children`.
///
/// The kernel attaches a child to the thread that forked it (or, for
/// reparented orphans, to whichever thread it picked as reaper), so every
/// task of the process is read and the results are merged.
#[derive(Debug, Clone)]
pub struct ProcChildren {
    task_dir: PathBuf,
}

impl ProcChildren {
    /// Fails if the main thread's child list cannot be read.
    pub fn new(proc_root: &Path, pid: Pid) -> Result<Self> {
        let task_dir = proc_root.join(pid.to_string()).join("task");
        let main_list = task_dir.join(pid.to_string()).join("children");
        fs::read_to_string(&main_list).map_err(|source| Error::ChildListUnavailable {
            path: main_list.clone(),
            source,
        })?;
        Ok(Self { task_dir })
    }

    /// Child lists of the current process, as seen through `/proc`.
    pub fn for_current_process() -> Result<Self> {
        Self::new(Path::new(PROC_ROOT), nix::unistd::getpid())
    }
}

impl ChildEnumerator for ProcChildren {
    fn children(&self) -> Result<Vec<Pid>> {
        let unavailable = |path: &Path, source| Error::ChildListUnavailable {
            path: path.to_path_buf(),
            source,
        };

        let mut pids = Vec::new();
        let tasks = fs::read_dir(&self.task_dir).map_err(|e| unavailable(&self.task_dir, e))?;
        for task in tasks {
            let task = task.map_err(|e| unavailable(&self.task_dir, e))?;
            let path = task.path().join("children");
            let contents = match fs::read_to_string(&path) {
                Ok(contents) => contents,
                // The thread exited between the listing and the read.
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    debug!("skipping vanished task {}", task.path().display());
                    continue;
                }
                Err(e) => return Err(unavailable(&path, e)),
            };
            for pid in parse_child_list(&path, &contents)? {
                if !pids.contains(&pid) {
                    pids.push(pid);
                }
            }
        }
        Ok(pids)
    }
}

/// Parse the space-separated pid list of a `children` file.
pub fn parse_child_list(path: &Path, contents: &str) -> Result<Vec<Pid>> {
    contents
        .split_ascii_whitespace()
        .map(|entry| match entry.parse::<i32>() {
            Ok(raw) if raw > 0 => Ok(Pid::from_raw(raw)),
            _ => Err(Error::MalformedChildList {
                path: path.to_path_buf(),
                entry: entry.to_string(),
            }),
        })
        .collect()
}

use std::sync::Mutex;

use sysinfo::{Pid, Process, ProcessRefreshKind, ProcessesToUpdate, Signal, System};

use crate::core::traits::process_tree::ProcessTree;

/// Process table backed by `sysinfo`, which reads `/proc` on Linux.
#[derive(Debug)]
pub struct SysinfoProcessTree {
    system: Mutex<System>,
}

impl SysinfoProcessTree {
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
        }
    }

    fn with_process<F>(&self, pid: u32, action: F) -> bool
    where
        F: FnOnce(&Process) -> bool,
    {
        let Ok(mut system) = self.system.lock() else {
            tracing::error!("Process table lock poisoned");
            return false;
        };
        let target = Pid::from_u32(pid);
        system.refresh_processes(ProcessesToUpdate::Some(&[target]), true);

        system.process(target).map(action).unwrap_or(false)
    }
}

impl Default for SysinfoProcessTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessTree for SysinfoProcessTree {
    fn children(&self, pid: u32) -> Vec<u32> {
        let Ok(mut system) = self.system.lock() else {
            tracing::error!("Process table lock poisoned");
            return Vec::new();
        };
        system.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::nothing(),
        );

        let parent = Pid::from_u32(pid);
        let mut children: Vec<u32> = system
            .processes()
            .values()
            .filter(|process| process.thread_kind().is_none())
            .filter(|process| process.parent() == Some(parent))
            .map(|process| process.pid().as_u32())
            .collect();
        children.sort_unstable();
        children
    }

    fn interrupt(&self, pid: u32) -> bool {
        self.with_process(pid, |process| {
            process.kill_with(Signal::Interrupt).unwrap_or(false)
        })
    }

    fn terminate(&self, pid: u32) -> bool {
        self.with_process(pid, Process::kill)
    }
}

#[cfg(test)]
mod tests {
    use std::process::Stdio;

    use tokio::process::Command;

    use super::*;

    #[tokio::test]
    async fn test_lists_spawned_child() {
        let tree = SysinfoProcessTree::new();
        let mut child = Command::new("sleep")
            .arg("5")
            .stdout(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .expect("Failed to spawn sleep");
        let child_pid = child.id().expect("child has a pid");

        let children = tree.children(std::process::id());
        assert!(children.contains(&child_pid), "{:?}", children);

        assert!(tree.terminate(child_pid));
        let status = child.wait().await.expect("Failed to wait for child");
        assert!(!status.success());
    }

    #[test]
    fn test_unknown_pid_has_no_children() {
        let tree = SysinfoProcessTree::new();
        assert!(tree.children(u32::MAX - 1).is_empty());
        assert!(!tree.terminate(u32::MAX - 1));
    }
}

use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::core::traits::process_tree::ProcessTree;

/// Process table whose single child only becomes visible after a scripted
/// number of empty polls.
#[derive(Debug)]
pub struct ProcessTreeStub {
    child: Option<u32>,
    empty_polls: u32,
    polls: AtomicU32,
    terminated: Mutex<Vec<u32>>,
}

impl ProcessTreeStub {
    pub fn new(child: Option<u32>, empty_polls: u32) -> Self {
        Self {
            child,
            empty_polls,
            polls: AtomicU32::new(0),
            terminated: Mutex::new(Vec::new()),
        }
    }

    pub fn polls(&self) -> u32 {
        self.polls.load(Ordering::SeqCst)
    }

    pub fn terminated(&self) -> Vec<u32> {
        self.terminated
            .lock()
            .map(|pids| pids.clone())
            .unwrap_or_default()
    }
}

impl ProcessTree for ProcessTreeStub {
    #[tracing::instrument]
    fn children(&self, pid: u32) -> Vec<u32> {
        let seen = self.polls.fetch_add(1, Ordering::SeqCst);
        match self.child {
            Some(child) if seen >= self.empty_polls => vec![child],
            _ => Vec::new(),
        }
    }

    fn interrupt(&self, pid: u32) -> bool {
        tracing::debug!("Stub interrupt: pid={}", pid);
        Some(pid) == self.child
    }

    fn terminate(&self, pid: u32) -> bool {
        tracing::debug!("Stub terminate: pid={}", pid);
        if let Ok(mut pids) = self.terminated.lock() {
            pids.push(pid);
        }
        Some(pid) == self.child
    }
}

/// Read access to the OS process table, plus the signals the supervisor
/// needs for cleanup.
pub trait ProcessTree: std::fmt::Debug + Send + Sync {
    /// Direct children of `pid` currently visible in the process table.
    fn children(&self, pid: u32) -> Vec<u32>;

    /// Asks `pid` to stop so it can flush its output. Returns `false` if the
    /// process was not found or the signal is unsupported.
    fn interrupt(&self, pid: u32) -> bool;

    /// Forcibly terminates `pid`. Returns `false` if the process was not found.
    fn terminate(&self, pid: u32) -> bool;
}

use crate::core::{domain::DiscoveryPolicy, traits::process_tree::ProcessTree};

/// Finds the process that actually runs the workload.
///
/// The harness usually forks the workload as its only child, but some
/// harness builds exec in place and never fork. Polls `policy.attempts`
/// times, `policy.interval` apart, and falls back to `harness_pid` itself
/// once the attempts are used up or `harness_running` reports that the
/// harness has already exited.
#[tracing::instrument(skip(tree, harness_running))]
pub async fn discover<F>(
    tree: &dyn ProcessTree,
    harness_pid: u32,
    policy: &DiscoveryPolicy,
    mut harness_running: F,
) -> u32
where
    F: FnMut() -> bool,
{
    for attempt in 1..=policy.attempts {
        if let Some(child) = tree.children(harness_pid).into_iter().min() {
            tracing::debug!("Discovered worker {} on attempt {}", child, attempt);
            return child;
        }
        if !harness_running() {
            tracing::debug!("Harness {} exited before a worker appeared", harness_pid);
            return harness_pid;
        }
        if attempt < policy.attempts {
            tokio::time::sleep(policy.interval).await;
        }
    }

    tracing::warn!(
        "No child of harness {} appeared after {} attempts, monitoring the harness itself",
        harness_pid,
        policy.attempts
    );
    harness_pid
}

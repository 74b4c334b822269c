//! Parallel split-build driver.
//!
//! Runs one build process per page group concurrently and collects a report
//! per group. Each child is handed its group as an explicit page list, so
//! groups never render the same page twice.

use std::{
    ffi::OsString,
    fmt,
    path::PathBuf,
    process::Stdio,
    time::{Duration, Instant},
};

use mpa_core::{Config, PageFilter, PageId};
use thiserror::Error;
use tokio::{process::Command, task::JoinSet};
use tracing::{debug, error, info, warn};

/// Split build errors.
#[derive(Debug, Error)]
pub enum SplitError {
    /// One or more groups failed.
    #[error("{} of {total} build groups failed: {failed:?}", failed.len())]
    GroupsFailed { failed: Vec<usize>, total: usize },

    /// A group task panicked.
    #[error("build group task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Result type for split operations.
pub type Result<T> = std::result::Result<T, SplitError>;

/// Template of the command run for every group.
///
/// Each group runs `<program> <args...> --page [id1,id2,...]`.
#[derive(Debug, Clone)]
pub struct GroupCommand {
    program: PathBuf,
    args: Vec<OsString>,
    envs: Vec<(OsString, OsString)>,
}

impl GroupCommand {
    /// Create a command template for `program`.
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            envs: Vec::new(),
        }
    }

    /// Append a base argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append base arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set an environment variable for every child.
    #[must_use]
    pub fn env(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    /// Arguments passed to the child building `pages`.
    #[must_use]
    pub fn args_for(&self, pages: &[PageId]) -> Vec<OsString> {
        let mut args = self.args.clone();
        args.push("--page".into());
        args.push(PageFilter::from_ids(pages).to_string().into());
        args
    }

    /// Environment variables set on every child.
    #[must_use]
    pub fn envs(&self) -> &[(OsString, OsString)] {
        &self.envs
    }

    fn command_for(&self, pages: &[PageId]) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(self.args_for(pages))
            .envs(self.envs.iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

/// How a group ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupOutcome {
    /// Exited with status zero.
    Succeeded,
    /// Exited with a non-zero status, or was killed by a signal.
    Failed { code: Option<i32> },
    /// Exited cleanly but wrote to stderr while stderr is treated as failure.
    Stderr,
    /// Exceeded the per-process timeout and was killed.
    TimedOut(Duration),
    /// Killed after another group failed.
    Cancelled,
    /// The process could not be started.
    SpawnFailed(String),
}

impl GroupOutcome {
    /// Whether the group succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

impl fmt::Display for GroupOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Succeeded => f.write_str("succeeded"),
            Self::Failed { code: Some(code) } => write!(f, "failed with exit code {code}"),
            Self::Failed { code: None } => f.write_str("terminated by signal"),
            Self::Stderr => f.write_str("failed: wrote to stderr"),
            Self::TimedOut(limit) => write!(f, "timed out after {}s", limit.as_secs()),
            Self::Cancelled => f.write_str("cancelled"),
            Self::SpawnFailed(reason) => write!(f, "failed to start: {reason}"),
        }
    }
}

/// Result of one group.
#[derive(Debug, Clone)]
pub struct GroupReport {
    /// Launch index of the group.
    pub index: usize,
    /// Pages assigned to the group.
    pub pages: Vec<PageId>,
    /// How the process ended.
    pub outcome: GroupOutcome,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
    /// Wall time from spawn to exit or kill.
    pub duration: Duration,
}

impl GroupReport {
    fn new(index: usize, pages: Vec<PageId>, outcome: GroupOutcome) -> Self {
        Self {
            index,
            pages,
            outcome,
            stdout: String::new(),
            stderr: String::new(),
            duration: Duration::ZERO,
        }
    }

    /// Whether the group succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }
}

/// Reports of every group, in launch order.
#[derive(Debug, Clone, Default)]
pub struct SplitSummary {
    /// One report per group, indexed by launch order.
    pub reports: Vec<GroupReport>,
    /// Wall time of the whole fan-out.
    pub duration: Duration,
}

impl SplitSummary {
    /// Whether every group succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.reports.iter().all(GroupReport::is_success)
    }

    /// Launch indices of failed groups.
    #[must_use]
    pub fn failed(&self) -> Vec<usize> {
        self.reports
            .iter()
            .filter(|r| !r.is_success())
            .map(|r| r.index)
            .collect()
    }

    /// Total number of pages across all groups.
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.reports.iter().map(|r| r.pages.len()).sum()
    }

    /// Convert into an error when any group failed.
    pub fn into_result(self) -> Result<Self> {
        let failed = self.failed();
        if failed.is_empty() {
            Ok(self)
        } else {
            Err(SplitError::GroupsFailed {
                failed,
                total: self.reports.len(),
            })
        }
    }
}

/// Runs page groups as concurrent child processes.
#[derive(Debug, Clone)]
pub struct SplitDriver {
    command: GroupCommand,
    timeout: Option<Duration>,
    fail_fast: bool,
    fail_on_stderr: bool,
}

impl SplitDriver {
    /// Create a driver running `command` for every group.
    #[must_use]
    pub fn new(command: GroupCommand) -> Self {
        Self {
            command,
            timeout: None,
            fail_fast: false,
            fail_on_stderr: false,
        }
    }

    /// Create a driver from the split configuration.
    ///
    /// Children get the memory ceiling variable and a production-mode override.
    #[must_use]
    pub fn from_config(config: &Config, command: GroupCommand) -> Self {
        let command = command
            .env(&config.split.memory_env, config.split.memory_mb.to_string())
            .env(Config::env_key("build", "mode"), "production");

        Self::new(command)
            .with_timeout(config.split_timeout())
            .with_fail_fast(config.split.fail_fast)
            .with_fail_on_stderr(config.split.fail_on_stderr)
    }

    /// Kill any child running longer than `timeout`.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Kill the remaining children once one group fails.
    #[must_use]
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Treat stderr output from a successful child as a failure.
    #[must_use]
    pub fn with_fail_on_stderr(mut self, fail_on_stderr: bool) -> Self {
        self.fail_on_stderr = fail_on_stderr;
        self
    }

    /// The command template.
    #[must_use]
    pub fn command(&self) -> &GroupCommand {
        &self.command
    }

    /// Run every group concurrently and wait for all of them.
    ///
    /// Reports come back in launch order whatever the completion order.
    pub async fn run(&self, groups: Vec<Vec<PageId>>) -> Result<SplitSummary> {
        let start = Instant::now();
        let total = groups.len();
        info!(groups = total, "starting split build");

        let mut tasks = JoinSet::new();
        for (index, pages) in groups.iter().enumerate() {
            let cmd = self.command.command_for(pages);
            let pages = pages.clone();
            let timeout = self.timeout;
            let fail_on_stderr = self.fail_on_stderr;

            debug!(group = index, pages = pages.len(), "spawning group");
            tasks.spawn(run_group(index, pages, cmd, timeout, fail_on_stderr));
        }

        let mut slots: Vec<Option<GroupReport>> = (0..total).map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            let report = match joined {
                Ok(report) => report,
                Err(e) if e.is_cancelled() => continue,
                Err(e) => return Err(e.into()),
            };

            if report.is_success() {
                info!(group = report.index, ms = report.duration.as_millis() as u64, "group finished");
            } else {
                error!(group = report.index, outcome = %report.outcome, "group failed");
                if self.fail_fast && !tasks.is_empty() {
                    warn!(remaining = tasks.len(), "cancelling remaining groups");
                    tasks.abort_all();
                }
            }

            let index = report.index;
            slots[index] = Some(report);
        }

        let reports = slots
            .into_iter()
            .zip(groups)
            .enumerate()
            .map(|(index, (slot, pages))| {
                slot.unwrap_or_else(|| GroupReport::new(index, pages, GroupOutcome::Cancelled))
            })
            .collect();

        let summary = SplitSummary {
            reports,
            duration: start.elapsed(),
        };
        info!(
            groups = total,
            failed = summary.failed().len(),
            duration_ms = summary.duration.as_millis() as u64,
            "split build complete"
        );

        Ok(summary)
    }
}

async fn run_group(
    index: usize,
    pages: Vec<PageId>,
    mut cmd: Command,
    timeout: Option<Duration>,
    fail_on_stderr: bool,
) -> GroupReport {
    let start = Instant::now();

    let child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => return GroupReport::new(index, pages, GroupOutcome::SpawnFailed(e.to_string())),
    };

    // Dropping the wait future drops the child, which kills it.
    let waited = match timeout {
        Some(limit) => match tokio::time::timeout(limit, child.wait_with_output()).await {
            Ok(waited) => waited,
            Err(_) => {
                let mut report = GroupReport::new(index, pages, GroupOutcome::TimedOut(limit));
                report.duration = start.elapsed();
                return report;
            }
        },
        None => child.wait_with_output().await,
    };

    let output = match waited {
        Ok(output) => output,
        Err(e) => return GroupReport::new(index, pages, GroupOutcome::SpawnFailed(e.to_string())),
    };

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

    let outcome = if !output.status.success() {
        GroupOutcome::Failed {
            code: output.status.code(),
        }
    } else if !stderr.trim().is_empty() {
        if fail_on_stderr {
            GroupOutcome::Stderr
        } else {
            warn!(group = index, "group succeeded but wrote to stderr");
            GroupOutcome::Succeeded
        }
    } else {
        GroupOutcome::Succeeded
    };

    GroupReport {
        index,
        pages,
        outcome,
        stdout,
        stderr,
        duration: start.elapsed(),
    }
}

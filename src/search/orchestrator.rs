//! Search orchestration state machine / 搜索编排状态机
//!
//! Owns the query, the displayed result set and its provenance for one view.
//! Local filtering happens synchronously on every query change; remote
//! outcomes are applied through a guarded compare-and-swap on the active
//! `(term, limit)` so a slow response for an old query never overwrites a
//! fresher view.
//!
//! The machine itself never sleeps or performs I/O: it hands out
//! [`SearchTicket`]s and the caller (the session loop) debounces them, runs
//! the remote client and feeds the outcome back.

use std::sync::Arc;

use serde::Serialize;

use crate::models::{DirectoryEntry, Provenance, ResponseLimit};
use super::filter::filter_entries;
use super::remote::RemoteOutcome;

/// Orchestrator phase / 编排阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// No query, full dataset shown / 空闲
    Idle,
    /// Local results shown, no remote call outstanding / 本地过滤
    Filtering,
    /// Local results shown, remote call outstanding / 远程搜索中
    Searching,
    /// Remote outcome applied / 已合并远程结果
    Reconciled,
}

/// Status tag of the current outcome / 当前结果状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Pending,
    LocalOnly,
    RemoteConfirmed,
    RemoteFailed,
}

/// What the view displays / 视图展示的结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchOutcome {
    pub status: OutcomeStatus,
    pub results: Vec<DirectoryEntry>,
    pub provenance: Provenance,
    pub elapsed_ms: Option<u64>,
    pub has_searched: bool,
}

/// Current term and limit / 当前查询
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct QueryState {
    pub term: String,
    pub limit: ResponseLimit,
}

impl QueryState {
    pub fn is_empty(&self) -> bool {
        self.term.trim().is_empty()
    }
}

/// The `(term, limit)` a remote search was requested for / 远程搜索凭据
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchTicket {
    pub term: String,
    pub limit: ResponseLimit,
}

pub struct SearchOrchestrator {
    dataset: Arc<Vec<DirectoryEntry>>,
    query: QueryState,
    outcome: SearchOutcome,
    phase: Phase,
    in_flight: Option<SearchTicket>,
}

impl SearchOrchestrator {
    pub fn new(dataset: Arc<Vec<DirectoryEntry>>) -> Self {
        Self::with_limit(dataset, ResponseLimit::default())
    }

    pub fn with_limit(dataset: Arc<Vec<DirectoryEntry>>, limit: ResponseLimit) -> Self {
        let outcome = idle_outcome(&dataset);
        Self {
            dataset,
            query: QueryState { term: String::new(), limit },
            outcome,
            phase: Phase::Idle,
            in_flight: None,
        }
    }

    pub fn query(&self) -> &QueryState {
        &self.query
    }

    pub fn outcome(&self) -> &SearchOutcome {
        &self.outcome
    }

    pub fn results(&self) -> &[DirectoryEntry] {
        &self.outcome.results
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_loading(&self) -> bool {
        self.phase == Phase::Searching
    }

    /// Non-empty query with zero local matches / 查询无结果
    pub fn shows_empty_message(&self) -> bool {
        self.outcome.has_searched && !self.query.is_empty() && self.outcome.results.is_empty()
    }

    /// User edited the term / 用户修改查询
    ///
    /// Recomputes the local results immediately. Returns the ticket to
    /// debounce when the term is non-empty; `None` means any pending or
    /// in-flight remote outcome is now obsolete.
    pub fn on_query_change(&mut self, term: &str) -> Option<SearchTicket> {
        self.query.term = term.to_string();

        if self.query.is_empty() {
            self.reset_to_idle();
            return None;
        }

        self.apply_local_filter();
        Some(self.current_ticket())
    }

    /// Limit changes alone never trigger a remote call / 仅修改条数不触发远程搜索
    pub fn set_limit(&mut self, limit: ResponseLimit) {
        self.query.limit = limit;
    }

    /// Form submit: re-issue the current term with the current limit / 提交表单
    pub fn submit(&mut self) -> Option<SearchTicket> {
        let term = self.query.term.clone();
        self.on_query_change(&term)
    }

    /// Debounce window elapsed for `ticket` / 防抖结束
    ///
    /// Returns false when the ticket is stale and no remote call should start.
    pub fn begin_remote(&mut self, ticket: &SearchTicket) -> bool {
        if !self.is_current(ticket) {
            tracing::debug!("Skipping remote search for stale term '{}'", ticket.term);
            return false;
        }

        self.phase = Phase::Searching;
        self.outcome.status = OutcomeStatus::Pending;
        self.in_flight = Some(ticket.clone());
        true
    }

    /// Remote call for `ticket` resolved / 远程搜索返回
    ///
    /// Applies the outcome only when `ticket` still matches the active query.
    /// Returns whether it was applied.
    pub fn apply_remote(&mut self, ticket: &SearchTicket, remote: RemoteOutcome) -> bool {
        let was_in_flight = self.in_flight.as_ref() == Some(ticket);
        if was_in_flight {
            self.in_flight = None;
        }

        if !self.is_current(ticket) {
            tracing::debug!(
                "Ignoring stale remote outcome for '{}' (active '{}')",
                ticket.term,
                self.query.term
            );
            if was_in_flight && self.phase == Phase::Searching {
                self.phase = Phase::Filtering;
                self.outcome.status = OutcomeStatus::LocalOnly;
            }
            return false;
        }

        match remote {
            RemoteOutcome::Found { results, elapsed_ms, .. } => {
                self.outcome = SearchOutcome {
                    status: OutcomeStatus::RemoteConfirmed,
                    results,
                    provenance: Provenance::Backend,
                    elapsed_ms: Some(elapsed_ms),
                    has_searched: true,
                };
            }
            RemoteOutcome::Failed { elapsed_ms, reason } => {
                tracing::debug!("Keeping local results for '{}': {}", ticket.term, reason);
                self.outcome.status = OutcomeStatus::RemoteFailed;
                self.outcome.elapsed_ms = Some(elapsed_ms);
            }
        }
        self.phase = Phase::Reconciled;
        true
    }

    fn current_ticket(&self) -> SearchTicket {
        SearchTicket {
            term: self.query.term.clone(),
            limit: self.query.limit,
        }
    }

    fn is_current(&self, ticket: &SearchTicket) -> bool {
        !self.query.is_empty() && ticket.term == self.query.term && ticket.limit == self.query.limit
    }

    fn apply_local_filter(&mut self) {
        self.outcome = SearchOutcome {
            status: OutcomeStatus::LocalOnly,
            results: filter_entries(&self.dataset, &self.query.term),
            provenance: Provenance::Mock,
            elapsed_ms: self.outcome.elapsed_ms,
            has_searched: true,
        };
        self.phase = Phase::Filtering;
        self.in_flight = None;
    }

    fn reset_to_idle(&mut self) {
        self.outcome = idle_outcome(&self.dataset);
        self.phase = Phase::Idle;
        self.in_flight = None;
    }
}

fn idle_outcome(dataset: &[DirectoryEntry]) -> SearchOutcome {
    SearchOutcome {
        status: OutcomeStatus::LocalOnly,
        results: dataset.to_vec(),
        provenance: Provenance::None,
        elapsed_ms: None,
        has_searched: false,
    }
}

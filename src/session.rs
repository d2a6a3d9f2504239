//! Per-view search session / 单视图搜索会话
//!
//! One session owns the whole state of one view: orchestrator, accordion,
//! debouncer and stats poller. It runs as a single task so every event is
//! handled to completion before the next one, and pushes a full
//! [`SessionView`] after each change.
//!
//! Event sources:
//! - client events (user input)
//! - internal events (debounce fired, remote search resolved)
//! - stats poller updates

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};
use uuid::Uuid;

use crate::accordion::AccordionState;
use crate::models::{DirectoryEntry, Provenance, ResponseLimit};
use crate::search::debounce::DebouncedInvoker;
use crate::search::orchestrator::{OutcomeStatus, Phase, SearchOrchestrator, SearchTicket};
use crate::search::remote::{RemoteOutcome, RemoteSearchClient};
use crate::stats::{StatsPoller, StatsSource, StatsView};

/// Preset searches offered next to the input / 快捷搜索标签
pub const QUICK_TAGS: [&str; 7] = [
    "Insurance",
    "Banks",
    "Importers",
    "Exporters",
    "Pharmacies",
    "Finance",
    "Mining",
];

/// User input / 用户输入事件
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    Query { term: String },
    SetLimit { limit: u32 },
    Submit,
    Toggle { url: String },
    Clear,
}

#[derive(Debug)]
enum SessionEvent {
    DebounceFired(SearchTicket),
    RemoteResolved(SearchTicket, RemoteOutcome),
}

/// Session timing settings / 会话参数
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub debounce: Duration,
    pub stats_interval: Duration,
    pub stats_fallback_total: u64,
    pub default_limit: ResponseLimit,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(800),
            stats_interval: crate::stats::DEFAULT_POLL_INTERVAL,
            stats_fallback_total: crate::stats::FALLBACK_TOTAL_REQUESTS,
            default_limit: ResponseLimit::default(),
        }
    }
}

/// One rendered result / 单条结果展示数据
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultCard {
    #[serde(flatten)]
    pub entry: DirectoryEntry,
    pub summary: String,
    pub website_link: Option<String>,
    pub expanded: bool,
}

/// Snapshot pushed to the view after every change / 推送给视图的快照
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionView {
    pub session_id: Uuid,
    pub term: String,
    pub limit: u32,
    pub phase: Phase,
    pub status: OutcomeStatus,
    pub provenance: Provenance,
    pub loading: bool,
    pub elapsed_ms: Option<u64>,
    pub has_searched: bool,
    pub result_count: usize,
    pub results: Vec<ResultCard>,
    pub expanded: Option<String>,
    pub empty_message: Option<String>,
    pub stats: StatsView,
    pub quick_tags: Vec<&'static str>,
}

pub struct SearchSession {
    id: Uuid,
    orchestrator: SearchOrchestrator,
    accordion: AccordionState,
    debouncer: DebouncedInvoker<SearchTicket>,
    client: Arc<RemoteSearchClient>,
    poller: StatsPoller,
    stats: watch::Receiver<StatsView>,
    stats_open: bool,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
    events_rx: mpsc::UnboundedReceiver<SessionEvent>,
}

impl SearchSession {
    /// Must be called inside a tokio runtime: starts the stats poller / 需在运行时内调用
    pub fn new(
        dataset: Arc<Vec<DirectoryEntry>>,
        client: Arc<RemoteSearchClient>,
        stats_source: Arc<dyn StatsSource>,
        settings: &SessionSettings,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let fire_tx = events_tx.clone();
        let debouncer = DebouncedInvoker::new(settings.debounce, move |ticket| {
            let _ = fire_tx.send(SessionEvent::DebounceFired(ticket));
        });

        let poller = StatsPoller::start(
            stats_source,
            settings.stats_interval,
            settings.stats_fallback_total,
        );
        let stats = poller.subscribe();

        Self {
            id: Uuid::new_v4(),
            orchestrator: SearchOrchestrator::with_limit(dataset, settings.default_limit),
            accordion: AccordionState::new(),
            debouncer,
            client,
            poller,
            stats,
            stats_open: true,
            events_tx,
            events_rx,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn view(&self) -> SessionView {
        let outcome = self.orchestrator.outcome();
        let query = self.orchestrator.query();

        let results: Vec<ResultCard> = outcome
            .results
            .iter()
            .map(|entry| ResultCard {
                summary: entry.summary(),
                website_link: entry.website_link().map(str::to_string),
                expanded: self.accordion.is_expanded(&entry.url),
                entry: entry.clone(),
            })
            .collect();

        let empty_message = self
            .orchestrator
            .shows_empty_message()
            .then(|| format!("NO ENTRIES FOUND FOR QUERY \"{}\"", query.term));

        SessionView {
            session_id: self.id,
            term: query.term.clone(),
            limit: query.limit.get(),
            phase: self.orchestrator.phase(),
            status: outcome.status,
            provenance: outcome.provenance,
            loading: self.orchestrator.is_loading(),
            elapsed_ms: outcome.elapsed_ms,
            has_searched: outcome.has_searched,
            result_count: results.len(),
            results,
            expanded: self.accordion.expanded().map(str::to_string),
            empty_message,
            stats: self.stats.borrow().clone(),
            quick_tags: QUICK_TAGS.to_vec(),
        }
    }

    /// Apply one user event / 处理用户事件
    pub fn handle_client_event(&mut self, event: ClientEvent) {
        match event {
            ClientEvent::Query { term } => self.change_query(&term),
            ClientEvent::Clear => self.change_query(""),
            ClientEvent::Submit => {
                let ticket = self.orchestrator.submit();
                self.schedule(ticket);
            }
            ClientEvent::SetLimit { limit } => match ResponseLimit::try_from(limit) {
                Ok(limit) => self.orchestrator.set_limit(limit),
                Err(e) => tracing::warn!("Session {}: {}", self.id, e),
            },
            ClientEvent::Toggle { url } => self.accordion.toggle(&url),
        }
    }

    fn change_query(&mut self, term: &str) {
        let ticket = self.orchestrator.on_query_change(term);
        self.schedule(ticket);
        self.accordion.retain_visible(self.orchestrator.results());
    }

    fn schedule(&mut self, ticket: Option<SearchTicket>) {
        match ticket {
            Some(ticket) => self.debouncer.call(ticket),
            None => self.debouncer.cancel(),
        }
    }

    fn handle_session_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::DebounceFired(ticket) => {
                if !self.orchestrator.begin_remote(&ticket) {
                    return;
                }
                tracing::debug!(
                    "Session {}: remote search '{}' (limit {})",
                    self.id,
                    ticket.term,
                    ticket.limit.get()
                );

                let client = Arc::clone(&self.client);
                let tx = self.events_tx.clone();
                tokio::spawn(async move {
                    let outcome = client.search(&ticket.term, ticket.limit).await;
                    let _ = tx.send(SessionEvent::RemoteResolved(ticket, outcome));
                });
            }
            SessionEvent::RemoteResolved(ticket, outcome) => {
                if self.orchestrator.apply_remote(&ticket, outcome) {
                    self.accordion.retain_visible(self.orchestrator.results());
                }
            }
        }
    }

    /// Run until the client side closes / 运行直到客户端关闭
    pub async fn run(
        mut self,
        mut inbound: mpsc::Receiver<ClientEvent>,
        outbound: mpsc::Sender<SessionView>,
    ) {
        tracing::info!("Session {} started", self.id);

        if outbound.send(self.view()).await.is_ok() {
            loop {
                tokio::select! {
                    event = inbound.recv() => match event {
                        Some(event) => self.handle_client_event(event),
                        None => break,
                    },
                    Some(event) = self.events_rx.recv() => self.handle_session_event(event),
                    changed = self.stats.changed(), if self.stats_open => {
                        if changed.is_err() {
                            self.stats_open = false;
                        }
                    }
                }

                if outbound.send(self.view()).await.is_err() {
                    break;
                }
            }
        }

        self.shutdown();
    }

    /// Stop timers; in-flight remote calls finish unobserved / 关闭会话
    pub fn shutdown(&mut self) {
        self.debouncer.cancel();
        self.poller.stop();
        tracing::info!("Session {} closed", self.id);
    }
}

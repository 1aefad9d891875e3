use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use futures::future::join_all;
use market_dashboard_core::symbol::Symbol;
use market_dashboard_core::timeframe::TimeFrame;
use tracing::{debug, info};

use crate::panel::{EntityPanel, PanelDisplay};
use crate::refresh::{CommitOutcome, RefreshCycle};
use crate::source::DashboardSource;

/// Owns one panel per watched symbol and the time-frame they all share.
///
/// Panels never touch each other's state; a failing symbol only affects its
/// own panel.
pub struct Dashboard<S: ?Sized> {
    source: Arc<S>,
    timeframe: TimeFrame,
    panels: BTreeMap<Symbol, EntityPanel<S>>,
    pending: Vec<RefreshCycle<S>>,
}

impl<S: DashboardSource + ?Sized + 'static> Dashboard<S> {
    pub fn new(source: Arc<S>, timeframe: TimeFrame) -> Self {
        Self {
            source,
            timeframe,
            panels: BTreeMap::new(),
            pending: Vec::new(),
        }
    }

    pub fn timeframe(&self) -> TimeFrame {
        self.timeframe
    }

    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.panels.keys()
    }

    pub fn panel(&self, symbol: &Symbol) -> Option<&EntityPanel<S>> {
        self.panels.get(symbol)
    }

    /// Mount panels for new symbols and drop panels for removed ones.
    pub fn sync_symbols(&mut self, symbols: impl IntoIterator<Item = Symbol>) {
        let wanted: BTreeSet<Symbol> = symbols.into_iter().collect();

        self.panels.retain(|symbol, _| {
            let keep = wanted.contains(symbol);
            if !keep {
                info!("{symbol}: panel removed");
            }
            keep
        });

        for symbol in wanted {
            if self.panels.contains_key(&symbol) {
                continue;
            }
            info!("{symbol}: panel added");
            let (panel, cycle) =
                EntityPanel::mount(Arc::clone(&self.source), symbol.clone(), self.timeframe);
            self.pending.push(cycle);
            self.panels.insert(symbol, panel);
        }
    }

    /// Switch every panel to `timeframe`. No-op if it is already active.
    pub fn set_timeframe(&mut self, timeframe: TimeFrame) {
        if timeframe == self.timeframe {
            return;
        }
        info!("time-frame {} -> {timeframe}", self.timeframe);
        self.timeframe = timeframe;
        for panel in self.panels.values() {
            self.pending.extend(panel.set_timeframe(timeframe));
        }
    }

    /// Drive every pending cycle concurrently. Cycles whose session was
    /// superseded while queued are skipped without fetching.
    pub async fn settle(&mut self) -> Vec<CommitOutcome> {
        let cycles = std::mem::take(&mut self.pending);
        debug!("settling {} refresh cycle(s)", cycles.len());
        join_all(cycles.into_iter().map(|cycle| async move {
            if !cycle.is_live() {
                return CommitOutcome::Discarded;
            }
            cycle.run().await
        }))
        .await
    }

    /// Refresh every panel now and wait for all of them to settle.
    pub async fn refresh_all(&mut self) -> Vec<CommitOutcome> {
        for panel in self.panels.values() {
            self.pending.push(panel.refresh());
        }
        self.settle().await
    }

    pub fn displays(&self) -> Vec<PanelDisplay> {
        self.panels.values().map(EntityPanel::display).collect()
    }
}

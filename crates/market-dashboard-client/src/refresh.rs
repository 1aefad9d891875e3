//! Per-symbol refresh sessions.
//!
//! Each [`RefreshController`] publishes a [`PanelView`] through a
//! `tokio::sync::watch` channel. Activating a (symbol, time-frame) pair
//! allocates a new [`SessionId`] and publishes `Loading` in one step; the
//! returned [`RefreshCycle`] fetches indicators and prices concurrently and
//! commits its result only if its session is still the published one.

use std::fmt;
use std::sync::Arc;

use market_dashboard_core::candle::Candle;
use market_dashboard_core::indicator::IndicatorSnapshot;
use market_dashboard_core::symbol::Symbol;
use market_dashboard_core::timeframe::TimeFrame;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::error::ClientError;
use crate::source::DashboardSource;

/// Number of recent candles requested for the sparkline.
pub const PRICE_HISTORY_LIMIT: usize = 60;

pub const NO_INDICATORS_MESSAGE: &str =
    "no indicators yet for this symbol — it may be newly added";
pub const FETCH_FAILED_MESSAGE: &str = "could not fetch data";

/// Generation number of a refresh session. Only the published one is live.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionId(u64);

impl SessionId {
    fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Data committed by a settled refresh. Replaced wholesale, never merged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PanelData {
    pub snapshot: Option<IndicatorSnapshot>,
    pub history: Vec<Candle>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PanelState {
    Loading,
    /// An error may still carry whatever price history was retrieved.
    Error {
        message: String,
        data: PanelData,
    },
    Ready(PanelData),
}

impl PanelState {
    pub fn is_loading(&self) -> bool {
        matches!(self, PanelState::Loading)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            PanelState::Error { message, .. } => Some(message),
            _ => None,
        }
    }

    pub fn data(&self) -> Option<&PanelData> {
        match self {
            PanelState::Loading => None,
            PanelState::Error { data, .. } | PanelState::Ready(data) => Some(data),
        }
    }
}

/// Everything a panel renders from, published as one value.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelView {
    pub symbol: Symbol,
    pub timeframe: TimeFrame,
    pub session: SessionId,
    pub state: PanelState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed,
    /// The session was superseded or retired before settling.
    Discarded,
}

pub struct RefreshController<S: ?Sized> {
    source: Arc<S>,
    view: Arc<watch::Sender<PanelView>>,
}

impl<S: ?Sized> RefreshController<S> {
    /// Create an idle controller showing `Loading` for the given pair.
    /// Nothing is fetched until [`RefreshController::activate`].
    pub fn new(source: Arc<S>, symbol: Symbol, timeframe: TimeFrame) -> Self {
        let (view, _) = watch::channel(PanelView {
            symbol,
            timeframe,
            session: SessionId::default(),
            state: PanelState::Loading,
        });
        Self {
            source,
            view: Arc::new(view),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<PanelView> {
        self.view.subscribe()
    }

    pub fn view(&self) -> PanelView {
        self.view.borrow().clone()
    }

    /// Invalidate the live session. Results still in flight are discarded.
    pub fn retire(&self) {
        self.view.send_modify(|view| {
            view.session = view.session.next();
            debug!("{} {}: session retired", view.symbol, view.timeframe);
        });
    }
}

impl<S: DashboardSource + ?Sized + 'static> RefreshController<S> {
    /// Start a new session for `(symbol, timeframe)`.
    ///
    /// The previous session is retired and `Loading` is published before
    /// this returns. Drive the returned cycle to fetch and commit.
    pub fn activate(&self, symbol: Symbol, timeframe: TimeFrame) -> RefreshCycle<S> {
        let mut session = SessionId::default();
        self.view.send_modify(|view| {
            session = view.session.next();
            *view = PanelView {
                symbol: symbol.clone(),
                timeframe,
                session,
                state: PanelState::Loading,
            };
        });
        debug!("{symbol} {timeframe}: session {session} activated");

        RefreshCycle {
            source: Arc::clone(&self.source),
            view: Arc::clone(&self.view),
            symbol,
            timeframe,
            session,
        }
    }

    /// Start a new session for the current pair.
    pub fn refresh(&self) -> RefreshCycle<S> {
        let (symbol, timeframe) = {
            let view = self.view.borrow();
            (view.symbol.clone(), view.timeframe)
        };
        self.activate(symbol, timeframe)
    }
}

impl<S: ?Sized> Drop for RefreshController<S> {
    fn drop(&mut self) {
        self.retire();
    }
}

/// One pending fetch-and-commit bound to a session.
pub struct RefreshCycle<S: ?Sized> {
    source: Arc<S>,
    view: Arc<watch::Sender<PanelView>>,
    symbol: Symbol,
    timeframe: TimeFrame,
    session: SessionId,
}

impl<S: ?Sized> RefreshCycle<S> {
    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn timeframe(&self) -> TimeFrame {
        self.timeframe
    }

    /// Whether this cycle's session is still the published one.
    pub fn is_live(&self) -> bool {
        self.view.borrow().session == self.session
    }

    fn commit(&self, state: PanelState) -> CommitOutcome {
        let committed = self.view.send_if_modified(|view| {
            if view.session != self.session {
                return false;
            }
            view.state = state;
            true
        });

        if committed {
            CommitOutcome::Committed
        } else {
            debug!(
                "{} {}: session {} superseded, result discarded",
                self.symbol, self.timeframe, self.session
            );
            CommitOutcome::Discarded
        }
    }
}

impl<S: DashboardSource + ?Sized + 'static> RefreshCycle<S> {
    /// Fetch indicators and prices concurrently, then commit if still live.
    ///
    /// Request failures are absorbed into "no data". A request task that
    /// panics or is cancelled maps to [`FETCH_FAILED_MESSAGE`].
    pub async fn run(self) -> CommitOutcome {
        let indicators = {
            let source = Arc::clone(&self.source);
            let symbol = self.symbol.clone();
            let timeframe = self.timeframe;
            tokio::spawn(async move { source.fetch_indicators(&symbol, timeframe).await })
        };
        let prices = {
            let source = Arc::clone(&self.source);
            let symbol = self.symbol.clone();
            let timeframe = self.timeframe;
            tokio::spawn(async move {
                source
                    .fetch_prices(&symbol, timeframe, PRICE_HISTORY_LIMIT)
                    .await
            })
        };

        let state = match tokio::join!(indicators, prices) {
            (Ok(indicators), Ok(prices)) => settle(
                self.absorb("indicators", indicators),
                self.absorb("prices", prices),
            ),
            (Err(e), _) | (_, Err(e)) => {
                warn!("{} {}: refresh failed: {e}", self.symbol, self.timeframe);
                PanelState::Error {
                    message: FETCH_FAILED_MESSAGE.to_string(),
                    data: PanelData::default(),
                }
            }
        };

        self.commit(state)
    }

    fn absorb<T>(&self, what: &str, result: Result<T, ClientError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                debug!(
                    "{} {}: {what} unavailable via {}: {e}",
                    self.symbol,
                    self.timeframe,
                    self.source.name()
                );
                None
            }
        }
    }
}

/// Combine both settled requests into the next state.
fn settle(snapshot: Option<IndicatorSnapshot>, history: Option<Vec<Candle>>) -> PanelState {
    let data = PanelData {
        snapshot,
        history: history.unwrap_or_default(),
    };
    if data.snapshot.is_none() {
        PanelState::Error {
            message: NO_INDICATORS_MESSAGE.to_string(),
            data,
        }
    } else {
        PanelState::Ready(data)
    }
}

use std::sync::Arc;

use market_dashboard_core::candle::closes;
use market_dashboard_core::classifier::{Classification, classify};
use market_dashboard_core::format::{fmt_timestamp, fmt_value};
use market_dashboard_core::indicator::DISPLAYED;
use market_dashboard_core::sparkline::{Canvas, SparkPath, reduce};
use market_dashboard_core::symbol::Symbol;
use market_dashboard_core::timeframe::TimeFrame;
use tokio::sync::watch;

use crate::refresh::{PanelState, PanelView, RefreshController, RefreshCycle};
use crate::source::DashboardSource;

/// Shown under every error message.
pub const ERROR_GUIDANCE: &str =
    "wait a minute and refresh, or remove the symbol if it is not supported";

/// One panel per tracked symbol. Dropping it retires its live session.
pub struct EntityPanel<S: ?Sized> {
    controller: RefreshController<S>,
}

impl<S: DashboardSource + ?Sized + 'static> EntityPanel<S> {
    /// Mount a panel and start its first refresh.
    pub fn mount(source: Arc<S>, symbol: Symbol, timeframe: TimeFrame) -> (Self, RefreshCycle<S>) {
        let controller = RefreshController::new(source, symbol.clone(), timeframe);
        let cycle = controller.activate(symbol, timeframe);
        (Self { controller }, cycle)
    }

    /// Re-target the panel. Starts a new session only if the pair changed.
    pub fn retarget(&self, symbol: Symbol, timeframe: TimeFrame) -> Option<RefreshCycle<S>> {
        let view = self.controller.view();
        if view.symbol == symbol && view.timeframe == timeframe {
            return None;
        }
        Some(self.controller.activate(symbol, timeframe))
    }

    pub fn set_timeframe(&self, timeframe: TimeFrame) -> Option<RefreshCycle<S>> {
        self.retarget(self.symbol(), timeframe)
    }

    /// Manual "refresh now" for the current pair.
    pub fn refresh(&self) -> RefreshCycle<S> {
        self.controller.refresh()
    }
}

impl<S: ?Sized> EntityPanel<S> {
    pub fn symbol(&self) -> Symbol {
        self.controller.view().symbol
    }

    pub fn view(&self) -> PanelView {
        self.controller.view()
    }

    pub fn subscribe(&self) -> watch::Receiver<PanelView> {
        self.controller.subscribe()
    }

    pub fn display(&self) -> PanelDisplay {
        PanelDisplay::from_view(&self.controller.view())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorField {
    pub label: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PanelBody {
    Loading,
    Error {
        message: String,
        guidance: &'static str,
    },
    Ready {
        indicators: [IndicatorField; 4],
        updated_at: String,
        sparkline: SparkPath,
    },
}

/// Render contract for one panel.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelDisplay {
    pub symbol: Symbol,
    pub timeframe: TimeFrame,
    pub badge: Classification,
    pub body: PanelBody,
}

impl PanelDisplay {
    pub fn from_view(view: &PanelView) -> Self {
        let snapshot = view.state.data().and_then(|data| data.snapshot.as_ref());
        let badge = classify(snapshot);

        let body = match &view.state {
            PanelState::Loading => PanelBody::Loading,
            PanelState::Error { message, .. } => PanelBody::Error {
                message: message.clone(),
                guidance: ERROR_GUIDANCE,
            },
            PanelState::Ready(data) => PanelBody::Ready {
                indicators: DISPLAYED.map(|(key, label)| IndicatorField {
                    label,
                    value: fmt_value(data.snapshot.as_ref().and_then(|s| s.value(key))),
                }),
                updated_at: fmt_timestamp(data.snapshot.as_ref().and_then(|s| s.at)),
                sparkline: reduce(&closes(&data.history), Canvas::SPARKLINE),
            },
        };

        Self {
            symbol: view.symbol.clone(),
            timeframe: view.timeframe,
            badge,
            body,
        }
    }
}

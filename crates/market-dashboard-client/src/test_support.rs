//! Instrumented sources for exercising panels without a gateway.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use market_dashboard_core::candle::Candle;
use market_dashboard_core::indicator::{IndicatorSnapshot, MA50, MA200, RSI14, VOL_SMA20};
use market_dashboard_core::symbol::Symbol;
use market_dashboard_core::timeframe::TimeFrame;
use rust_decimal::Decimal;
use tokio::sync::oneshot;

use crate::error::ClientError;
use crate::source::DashboardSource;

pub(crate) fn sym(s: &str) -> Symbol {
    Symbol::parse(s).unwrap()
}

pub(crate) fn snapshot(symbol: &str, ma50: f64, ma200: f64, rsi14: f64) -> IndicatorSnapshot {
    IndicatorSnapshot {
        symbol: sym(symbol),
        timeframe: TimeFrame::Day1,
        at: Some(Utc.with_ymd_and_hms(2025, 1, 15, 0, 0, 0).unwrap()),
        values: BTreeMap::from([
            (MA50.to_string(), ma50),
            (MA200.to_string(), ma200),
            (RSI14.to_string(), rsi14),
            (VOL_SMA20.to_string(), 1200.0),
        ]),
    }
}

/// Daily candles closing at the given prices, starting 2025-01-01.
pub(crate) fn candles(closes: &[f64]) -> Vec<Candle> {
    let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let close = Decimal::try_from(close).unwrap();
            Candle {
                timestamp: start + Duration::days(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: Decimal::from(1000),
            }
        })
        .collect()
}

fn server_error() -> ClientError {
    ClientError::Api {
        status: 500,
        message: "Internal Server Error".into(),
    }
}

/// Answers every request immediately with fixed data; `None` answers with a 500.
pub(crate) struct StaticSource {
    indicators: Option<IndicatorSnapshot>,
    prices: Option<Vec<Candle>>,
    panic_on_prices: bool,
}

impl StaticSource {
    pub(crate) fn new(indicators: Option<IndicatorSnapshot>, prices: Option<Vec<Candle>>) -> Self {
        Self {
            indicators,
            prices,
            panic_on_prices: false,
        }
    }

    pub(crate) fn ready(indicators: IndicatorSnapshot, prices: Vec<Candle>) -> Self {
        Self::new(Some(indicators), Some(prices))
    }

    pub(crate) fn panicking() -> Self {
        Self {
            panic_on_prices: true,
            ..Self::new(None, None)
        }
    }
}

#[async_trait]
impl DashboardSource for StaticSource {
    fn name(&self) -> &str {
        "static"
    }

    async fn fetch_indicators(
        &self,
        _symbol: &Symbol,
        _timeframe: TimeFrame,
    ) -> Result<IndicatorSnapshot, ClientError> {
        self.indicators.clone().ok_or_else(server_error)
    }

    async fn fetch_prices(
        &self,
        _symbol: &Symbol,
        _timeframe: TimeFrame,
        _limit: usize,
    ) -> Result<Vec<Candle>, ClientError> {
        if self.panic_on_prices {
            panic!("price decoder blew up");
        }
        self.prices.clone().ok_or_else(server_error)
    }
}

type Reply<T> = oneshot::Sender<Result<T, ClientError>>;

/// Parks every request until the test answers it, so resolution order is
/// fully controlled by the test.
#[derive(Default)]
pub(crate) struct ScriptedSource {
    indicators: Mutex<Vec<(Symbol, TimeFrame, Reply<IndicatorSnapshot>)>>,
    prices: Mutex<Vec<(Symbol, TimeFrame, Reply<Vec<Candle>>)>>,
    limits: Mutex<Vec<usize>>,
    indicator_calls: AtomicUsize,
    price_calls: AtomicUsize,
}

impl ScriptedSource {
    /// Yield until at least this many requests of each kind have arrived.
    pub(crate) async fn wait_for_calls(&self, indicators: usize, prices: usize) {
        while self.indicator_calls.load(Ordering::SeqCst) < indicators
            || self.price_calls.load(Ordering::SeqCst) < prices
        {
            tokio::task::yield_now().await;
        }
    }

    pub(crate) fn reply_indicators(
        &self,
        symbol: &Symbol,
        timeframe: TimeFrame,
        result: Result<IndicatorSnapshot, ClientError>,
    ) {
        let reply = take_pending(&self.indicators, symbol, timeframe);
        let _ = reply.send(result);
    }

    pub(crate) fn reply_prices(
        &self,
        symbol: &Symbol,
        timeframe: TimeFrame,
        result: Result<Vec<Candle>, ClientError>,
    ) {
        let reply = take_pending(&self.prices, symbol, timeframe);
        let _ = reply.send(result);
    }

    pub(crate) fn price_limits(&self) -> Vec<usize> {
        self.limits.lock().unwrap().clone()
    }
}

fn take_pending<T>(
    pending: &Mutex<Vec<(Symbol, TimeFrame, Reply<T>)>>,
    symbol: &Symbol,
    timeframe: TimeFrame,
) -> Reply<T> {
    let mut pending = pending.lock().unwrap();
    let index = pending
        .iter()
        .position(|(s, tf, _)| s == symbol && *tf == timeframe)
        .unwrap_or_else(|| panic!("no pending request for {symbol} {timeframe}"));
    pending.remove(index).2
}

async fn await_reply<T>(rx: oneshot::Receiver<Result<T, ClientError>>) -> Result<T, ClientError> {
    rx.await
        .unwrap_or_else(|_| Err(ClientError::Parse("reply dropped".into())))
}

#[async_trait]
impl DashboardSource for ScriptedSource {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn fetch_indicators(
        &self,
        symbol: &Symbol,
        timeframe: TimeFrame,
    ) -> Result<IndicatorSnapshot, ClientError> {
        let (tx, rx) = oneshot::channel();
        self.indicators
            .lock()
            .unwrap()
            .push((symbol.clone(), timeframe, tx));
        self.indicator_calls.fetch_add(1, Ordering::SeqCst);
        await_reply(rx).await
    }

    async fn fetch_prices(
        &self,
        symbol: &Symbol,
        timeframe: TimeFrame,
        limit: usize,
    ) -> Result<Vec<Candle>, ClientError> {
        let (tx, rx) = oneshot::channel();
        self.prices
            .lock()
            .unwrap()
            .push((symbol.clone(), timeframe, tx));
        self.limits.lock().unwrap().push(limit);
        self.price_calls.fetch_add(1, Ordering::SeqCst);
        await_reply(rx).await
    }
}

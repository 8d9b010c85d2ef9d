//! Signal normalizers.
//!
//! One pure function per source turns the raw events of a (ticker, source)
//! pair into a single [`SourceScore`]. Only events inside the lookback window
//! are scored; older events are available to sources that compare against a
//! previous filing.

pub mod ark;
pub mod congress;
pub mod darkpool;
pub mod insider;
pub mod institutional;
pub mod short_interest;
pub mod superinvestor;

use chrono::NaiveDate;
use confluence_core::{
    CongressTrade, DarkPoolVolume, EtfTrade, EventPayload, InsiderTransaction,
    InstitutionalFiling, ShortInterestReport, Sign, SignalEvent, SignalSource, SourceScore,
    SuperinvestorHolding, TradeSide,
};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::warn;

use crate::window::LookbackWindow;

/// Net evidence below this share of gross activity counts as balanced.
pub const BALANCE_RATIO: f64 = 0.10;

/// Subscore scale for activity without a clear direction.
pub const ACTIVITY_FACTOR: f64 = 0.25;

/// Validated, date-sorted events of one source split around the window.
#[derive(Debug)]
pub struct Observations<'a, T> {
    /// Events inside the window, oldest first.
    pub current: Vec<(NaiveDate, &'a T)>,
    /// Events on or before the window start, oldest first.
    pub prior: Vec<(NaiveDate, &'a T)>,
}

impl<'a, T: 'a> Observations<'a, T> {
    /// Date of the newest in-window event.
    #[must_use]
    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.current.last().map(|(d, _)| *d)
    }

    /// All events (prior then current) in date order.
    pub fn all(&self) -> impl Iterator<Item = &(NaiveDate, &'a T)> {
        self.prior.iter().chain(self.current.iter())
    }
}

/// Total order between two payloads of the same source reported on the same date.
///
/// Normalizers that pick a "latest" observation rely on this so that the
/// result depends on the event set, never on the input order.
pub trait Tiebreak {
    fn tiebreak(&self, other: &Self) -> Ordering;
}

fn side_rank(side: TradeSide) -> u8 {
    match side {
        TradeSide::Buy => 0,
        TradeSide::Sell => 1,
    }
}

impl Tiebreak for CongressTrade {
    fn tiebreak(&self, other: &Self) -> Ordering {
        self.trader
            .cmp(&other.trader)
            .then_with(|| self.transaction_date.cmp(&other.transaction_date))
            .then_with(|| self.disclosure_date.cmp(&other.disclosure_date))
            .then_with(|| side_rank(self.transaction_type).cmp(&side_rank(other.transaction_type)))
            .then_with(|| self.amount_range.cmp(&other.amount_range))
            .then_with(|| self.chamber.cmp(&other.chamber))
            .then_with(|| self.party.cmp(&other.party))
    }
}

impl Tiebreak for EtfTrade {
    fn tiebreak(&self, other: &Self) -> Ordering {
        self.fund
            .cmp(&other.fund)
            .then_with(|| side_rank(self.trade_type).cmp(&side_rank(other.trade_type)))
            .then_with(|| self.shares.cmp(&other.shares))
            .then_with(|| self.weight_pct.total_cmp(&other.weight_pct))
    }
}

impl Tiebreak for DarkPoolVolume {
    fn tiebreak(&self, other: &Self) -> Ordering {
        self.zscore
            .total_cmp(&other.zscore)
            .then_with(|| self.off_exchange_pct.total_cmp(&other.off_exchange_pct))
            .then_with(|| self.short_pct.total_cmp(&other.short_pct))
            .then_with(|| self.total_volume.cmp(&other.total_volume))
    }
}

impl Tiebreak for InstitutionalFiling {
    fn tiebreak(&self, other: &Self) -> Ordering {
        self.institution
            .cmp(&other.institution)
            .then_with(|| self.shares.cmp(&other.shares))
            .then_with(|| self.value.cmp(&other.value))
            .then_with(|| self.pct_of_portfolio.total_cmp(&other.pct_of_portfolio))
    }
}

impl Tiebreak for InsiderTransaction {
    fn tiebreak(&self, other: &Self) -> Ordering {
        self.insider_name
            .cmp(&other.insider_name)
            .then_with(|| self.title.cmp(&other.title))
            .then_with(|| side_rank(self.transaction_type).cmp(&side_rank(other.transaction_type)))
            .then_with(|| self.shares.cmp(&other.shares))
            .then_with(|| self.value.cmp(&other.value))
            .then_with(|| self.is_cluster.cmp(&other.is_cluster))
    }
}

impl Tiebreak for ShortInterestReport {
    fn tiebreak(&self, other: &Self) -> Ordering {
        self.pct_float
            .total_cmp(&other.pct_float)
            .then_with(|| self.short_interest.cmp(&other.short_interest))
            .then_with(|| self.change_pct.total_cmp(&other.change_pct))
            .then_with(|| self.days_to_cover.total_cmp(&other.days_to_cover))
    }
}

impl Tiebreak for SuperinvestorHolding {
    fn tiebreak(&self, other: &Self) -> Ordering {
        self.fund_name
            .cmp(&other.fund_name)
            .then_with(|| self.shares.cmp(&other.shares))
            .then_with(|| self.value.cmp(&other.value))
            .then_with(|| self.share_change.cmp(&other.share_change))
    }
}

/// Per-source scores for one ticker.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedSources {
    /// One entry per known source, absent sources included.
    pub scores: BTreeMap<SignalSource, SourceScore>,
    /// Events dropped as malformed.
    pub dropped_events: usize,
}

impl NormalizedSources {
    /// Number of sources with a nonzero sign.
    #[must_use]
    pub fn participating(&self) -> usize {
        self.scores.values().filter(|s| s.participates()).count()
    }
}

/// Squashes a non-negative magnitude into [0, 1): `x / (x + half)`.
///
/// `half` is the magnitude that maps to 0.5.
#[must_use]
pub fn saturate(x: f64, half: f64) -> f64 {
    if !x.is_finite() || x <= 0.0 || half <= 0.0 {
        return 0.0;
    }
    x / (x + half)
}

/// Builds a score from signed net evidence and gross activity.
///
/// Balanced evidence keeps a reduced activity subscore with a neutral sign.
#[must_use]
pub fn directional_score(
    source: SignalSource,
    net: f64,
    gross: f64,
    half: f64,
    event_count: usize,
    description: String,
    latest_event: Option<NaiveDate>,
) -> SourceScore {
    if gross <= 0.0 || net.abs() < BALANCE_RATIO * gross {
        let activity = 100.0 * saturate(gross, half) * ACTIVITY_FACTOR;
        return SourceScore::new(
            source,
            activity,
            Sign::Neutral,
            event_count,
            description,
            latest_event,
        );
    }

    SourceScore::new(
        source,
        100.0 * saturate(net.abs(), half),
        Sign::of(net),
        event_count,
        description,
        latest_event,
    )
}

/// Normalizes one source's events for one ticker.
#[must_use]
pub fn normalize(source: SignalSource, events: &[SignalEvent], window: &LookbackWindow) -> SourceScore {
    normalize_counted(source, events, window).0
}

/// Normalizes one source and reports how many events were dropped as malformed.
#[must_use]
pub fn normalize_counted(
    source: SignalSource,
    events: &[SignalEvent],
    window: &LookbackWindow,
) -> (SourceScore, usize) {
    match source {
        SignalSource::Congress => run(source, events, window, congress::score, |p| match p {
            EventPayload::Congress(t) => Some(t),
            _ => None,
        }),
        SignalSource::Ark => run(source, events, window, ark::score, |p| match p {
            EventPayload::Ark(t) => Some(t),
            _ => None,
        }),
        SignalSource::DarkPool => run(source, events, window, darkpool::score, |p| match p {
            EventPayload::DarkPool(v) => Some(v),
            _ => None,
        }),
        SignalSource::Institutional => {
            run(source, events, window, institutional::score, |p| match p {
                EventPayload::Institutional(f) => Some(f),
                _ => None,
            })
        }
        SignalSource::Insider => run(source, events, window, insider::score, |p| match p {
            EventPayload::Insider(t) => Some(t),
            _ => None,
        }),
        SignalSource::ShortInterest => {
            run(source, events, window, short_interest::score, |p| match p {
                EventPayload::ShortInterest(r) => Some(r),
                _ => None,
            })
        }
        SignalSource::Superinvestor => {
            run(source, events, window, superinvestor::score, |p| match p {
                EventPayload::Superinvestor(h) => Some(h),
                _ => None,
            })
        }
    }
}

/// Normalizes every known source, each with its own window.
pub fn normalize_all<W>(events: &[SignalEvent], window_for: W) -> NormalizedSources
where
    W: Fn(SignalSource) -> LookbackWindow,
{
    let mut scores = BTreeMap::new();
    let mut dropped_events = 0;

    for source in SignalSource::ALL {
        let window = window_for(source);
        let (score, dropped) = normalize_counted(source, events, &window);
        dropped_events += dropped;
        scores.insert(source, score);
    }

    NormalizedSources {
        scores,
        dropped_events,
    }
}

fn run<'a, T: Tiebreak + 'a, X, S>(
    source: SignalSource,
    events: &'a [SignalEvent],
    window: &LookbackWindow,
    score: S,
    extract: X,
) -> (SourceScore, usize)
where
    X: Fn(&'a EventPayload) -> Option<&'a T>,
    S: Fn(&Observations<'a, T>) -> SourceScore,
{
    let (observations, dropped) = collect(source, events, window, extract);
    if observations.current.is_empty() {
        return (SourceScore::absent(source), dropped);
    }
    (score(&observations), dropped)
}

fn collect<'a, T: Tiebreak + 'a, X>(
    source: SignalSource,
    events: &'a [SignalEvent],
    window: &LookbackWindow,
    extract: X,
) -> (Observations<'a, T>, usize)
where
    X: Fn(&'a EventPayload) -> Option<&'a T>,
{
    let mut current = Vec::new();
    let mut prior = Vec::new();
    let mut dropped = 0;

    for event in events.iter().filter(|e| e.source() == source) {
        if let Err(e) = event.validate() {
            warn!(ticker = %event.ticker, %source, date = %event.event_date, "Dropping event: {}", e);
            dropped += 1;
            continue;
        }
        let Some(payload) = extract(&event.payload) else {
            continue;
        };
        if window.contains(event.event_date) {
            current.push((event.event_date, payload));
        } else if window.is_prior(event.event_date) {
            prior.push((event.event_date, payload));
        }
    }

    current.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.tiebreak(b.1)));
    prior.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.tiebreak(b.1)));

    (Observations { current, prior }, dropped)
}

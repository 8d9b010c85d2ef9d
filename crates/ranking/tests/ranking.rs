use chrono::{NaiveDate, TimeZone, Utc};
use confluence_core::{ConfluenceRecord, Direction, SignalDetail, SignalSource};
use confluence_data::{InMemoryRecordStore, RecordStore};
use confluence_ranking::{Ranker, RecordQuery, TickerStatus};
use std::sync::Arc;

fn date(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
}

fn record(ticker: &str, day: u32, score: f64, direction: Direction, source: SignalSource) -> ConfluenceRecord {
    ConfluenceRecord {
        ticker: ticker.to_string(),
        score,
        direction,
        source_count: 1,
        source_scores: SignalSource::ALL
            .into_iter()
            .map(|s| (s, if s == source { score } else { 0.0 }))
            .collect(),
        details: vec![SignalDetail {
            source,
            description: format!("{source} fixture"),
            date: date(day),
        }],
        signal_date: date(day),
        computed_at: Utc.with_ymd_and_hms(2025, 6, day, 22, 30, 0).unwrap(),
    }
}

async fn seeded_store() -> Arc<InMemoryRecordStore> {
    let store = Arc::new(InMemoryRecordStore::new());
    let fixtures = [
        record("GME", 27, 35.0, Direction::Bearish, SignalSource::ShortInterest),
        record("GME", 30, 61.5, Direction::Bearish, SignalSource::ShortInterest),
        record("NVDA", 30, 72.0, Direction::Bullish, SignalSource::Congress),
        record("PLTR", 29, 48.0, Direction::Bullish, SignalSource::Insider),
        record("AMC", 30, 61.5, Direction::Mixed, SignalSource::DarkPool),
    ];
    for r in &fixtures {
        store.upsert(r).await.unwrap();
    }
    store
}

#[tokio::test]
async fn top_ranks_latest_record_per_ticker() {
    let ranker = Ranker::new(seeded_store().await);

    let ranked = ranker.top(&RecordQuery::new()).await.unwrap();
    let view: Vec<_> = ranked.iter().map(|r| (r.ticker.as_str(), r.score)).collect();

    assert_eq!(
        view,
        vec![("NVDA", 72.0), ("AMC", 61.5), ("GME", 61.5), ("PLTR", 48.0)]
    );
}

#[tokio::test]
async fn top_applies_filters() {
    let ranker = Ranker::new(seeded_store().await);

    let bearish = ranker
        .top(&RecordQuery::new().direction(Direction::Bearish))
        .await
        .unwrap();
    assert_eq!(bearish.len(), 1);
    assert_eq!(bearish[0].signal_date, date(30));

    let insiders = ranker
        .top(&RecordQuery::new().source(SignalSource::Insider).min_score(10.0))
        .await
        .unwrap();
    assert_eq!(insiders.len(), 1);
    assert_eq!(insiders[0].ticker, "PLTR");

    let first = ranker.top(&RecordQuery::new().limit(1)).await.unwrap();
    assert_eq!(first[0].ticker, "NVDA");
}

#[tokio::test]
async fn history_is_ascending() {
    let ranker = Ranker::new(seeded_store().await);

    let history = ranker.history("gme", date(1), date(30)).await.unwrap();

    let dates: Vec<_> = history.iter().map(|r| r.signal_date).collect();
    assert_eq!(dates, vec![date(27), date(30)]);
}

#[tokio::test]
async fn lookup_distinguishes_missing_tickers() {
    let ranker = Ranker::new(seeded_store().await);

    match ranker.lookup("NVDA").await.unwrap() {
        TickerStatus::Scored(record) => assert!((record.score - 72.0).abs() < f64::EPSILON),
        TickerStatus::NoData { .. } => panic!("expected a record"),
    }

    let missing = ranker.lookup("tsla").await.unwrap();
    assert_eq!(
        missing,
        TickerStatus::NoData {
            ticker: "TSLA".to_string()
        }
    );
    assert!(missing.record().is_none());
}

#[tokio::test]
async fn ranking_never_mutates_records() {
    let store = seeded_store().await;
    let before = store.all().await;
    let ranker = Ranker::new(Arc::clone(&store));

    let _ = ranker.top(&RecordQuery::new().limit(2)).await.unwrap();
    let _ = ranker.history("GME", date(1), date(30)).await.unwrap();

    assert_eq!(store.all().await, before);
}

#[tokio::test]
async fn ranked_records_serialize_to_flat_contract() {
    let ranker = Ranker::new(seeded_store().await);
    let ranked = ranker.top(&RecordQuery::new().ticker("NVDA")).await.unwrap();

    let json = serde_json::to_value(&ranked[0]).unwrap();
    assert_eq!(json["congress_score"], 72.0);
    assert_eq!(json["insider_score"], 0.0);
    assert_eq!(json["direction"], "bullish");
}

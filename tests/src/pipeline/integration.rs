#![cfg(test)]
use std::sync::Arc;
use std::time::Duration;

use edgeprobe_common::config::FilterConfig;
use edgeprobe_common::network::range::AddressRange;
use edgeprobe_core::partition::partition;
use edgeprobe_core::rank::filter_and_rank;

use crate::utils::{Behaviour, CountingProbe, ScriptedDialer, config, pipeline, unit};

/// A unit whose samples never connect leaves no trace in the results.
#[tokio::test]
async fn silent_unit_is_absent_from_results() {
    let live = unit("198.51.100.0/24");
    let dead = unit("203.0.113.0/24");

    let dialer = Arc::new(
        ScriptedDialer::new()
            .with(live, Behaviour::Answer(Duration::from_millis(2)))
            .with(dead, Behaviour::Silent),
    );
    let probe = Arc::new(CountingProbe::new().with(live, Some("HKG")).with(dead, Some("NRT")));

    let outcome = pipeline(config(8), dialer, probe.clone())
        .run(&[live, dead])
        .await
        .unwrap();

    assert_eq!(outcome.summaries.len(), 1);
    assert_eq!(outcome.summaries[0].unit, live);
    assert_eq!(outcome.summaries[0].city(), "Hong Kong");
    assert_eq!(outcome.report.latency_failed, 2);
    // Only answering samples move on to location resolution.
    assert!(probe.calls() <= 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn network_concurrency_never_exceeds_the_pool() {
    let ranges: Vec<AddressRange> = vec!["10.0.0.0/18".parse().unwrap()];
    let units = partition(&ranges);
    assert_eq!(units.len(), 64);

    let mut dialer = ScriptedDialer::new();
    let mut probe = CountingProbe::new();
    for u in &units {
        dialer = dialer.with(*u, Behaviour::Answer(Duration::from_millis(3)));
        probe = probe.with(*u, Some("NRT"));
    }
    let dialer = Arc::new(dialer);

    let pipeline = pipeline(config(4), dialer.clone(), Arc::new(probe));
    let outcome = pipeline.run(&units).await.unwrap();

    assert_eq!(outcome.summaries.len(), 64);
    assert_eq!(dialer.calls(), 64 * 2 * 4);
    assert!(dialer.peak() <= 4);
    assert!(pipeline.admission().peak() <= 4);
    assert!(pipeline.admission().peak() >= 1);
    assert_eq!(pipeline.admission().in_flight(), 0);
}

#[tokio::test]
async fn cached_location_skips_further_probes() {
    let only = unit("198.51.100.0/24");
    let dialer = Arc::new(ScriptedDialer::new().with(only, Behaviour::Answer(Duration::ZERO)));
    let probe = Arc::new(CountingProbe::new().with(only, Some("HKG")));

    let mut cfg = config(1);
    cfg.samples_per_unit = 5;

    let outcome = pipeline(cfg, dialer, probe.clone()).run(&[only]).await.unwrap();

    assert_eq!(probe.calls(), 1);
    assert_eq!(outcome.report.cache_hits, 4);
    assert_eq!(outcome.report.resolved, 5);
    assert_eq!(outcome.summaries[0].samples, 5);
}

#[tokio::test]
async fn unresolvable_unit_needs_show_all() {
    let known = unit("198.51.100.0/24");
    let hidden = unit("203.0.113.0/24");

    let dialer = Arc::new(
        ScriptedDialer::new()
            .with(known, Behaviour::Answer(Duration::ZERO))
            .with(hidden, Behaviour::Answer(Duration::ZERO)),
    );
    let probe = Arc::new(CountingProbe::new().with(known, Some("NRT")).with(hidden, None));

    let mut cfg = config(1);
    cfg.resolve_retries = 2;
    let outcome = pipeline(cfg, dialer, probe.clone()).run(&[known, hidden]).await.unwrap();

    // Two samples of the hidden unit, three attempts each, never cached.
    assert_eq!(probe.calls(), 1 + 6);

    let default_view = filter_and_rank(outcome.summaries.clone(), &FilterConfig::default());
    assert_eq!(default_view.len(), 1);
    assert_eq!(default_view[0].location_id(), "NRT");

    let everything = FilterConfig {
        show_all: true,
        ..FilterConfig::default()
    };
    let full_view = filter_and_rank(outcome.summaries, &everything);
    assert_eq!(full_view.len(), 2);
    assert!(full_view.iter().any(|s| s.is_unknown()));
}

#[tokio::test]
async fn ranking_prefers_loss_then_latency_and_truncates() {
    let slow = unit("198.51.100.0/24");
    let fast = unit("198.51.101.0/24");
    let lossy = unit("198.51.102.0/24");

    let dialer = Arc::new(
        ScriptedDialer::new()
            .with(slow, Behaviour::Answer(Duration::from_millis(40)))
            .with(fast, Behaviour::Answer(Duration::from_millis(2)))
            .with(lossy, Behaviour::Flaky(Duration::from_millis(1))),
    );
    let probe = Arc::new(
        CountingProbe::new()
            .with(slow, Some("HKG"))
            .with(fast, Some("HKG"))
            .with(lossy, Some("NRT")),
    );

    let outcome = pipeline(config(8), dialer, probe)
        .run(&[slow, fast, lossy])
        .await
        .unwrap();
    assert_eq!(outcome.summaries.len(), 3);

    let ranked = filter_and_rank(outcome.summaries.clone(), &FilterConfig::default());
    let order: Vec<_> = ranked.iter().map(|s| s.unit).collect();
    assert_eq!(order, vec![fast, slow, lossy]);
    assert_eq!(ranked[2].loss_rate, 0.5);

    let top_two = FilterConfig {
        limit: Some(2),
        ..FilterConfig::default()
    };
    let truncated = filter_and_rank(outcome.summaries, &top_two);
    assert_eq!(truncated.iter().map(|s| s.unit).collect::<Vec<_>>(), vec![fast, slow]);
}

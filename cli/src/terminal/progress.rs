use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use edgeprobe_core::scheduler::{ProgressSink, Stage};
use indicatif::ProgressStyle;
use tracing::{Span, info_span};
use tracing_indicatif::span_ext::IndicatifSpanExt;

const TICKS: &[&str] = &[
    "▁▁▁▁▁",
    "▁▂▂▂▁",
    "▁▄▂▄▁",
    "▂▄▆▄▂",
    "▄▆█▆▄",
    "▂▄▆▄▂",
    "▁▄▂▄▁",
    "▁▂▂▂▁",
];

fn stage_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.blue} {msg} [{elapsed_precise}] {wide_bar:.green/black} {pos}/{len}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .tick_strings(TICKS)
}

/// Renders each probing stage as a bar owned by a tracing span.
#[derive(Default)]
pub struct StageProgress {
    spans: Mutex<HashMap<Stage, Span>>,
}

impl StageProgress {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressSink for StageProgress {
    fn stage_started(&self, stage: Stage, total: usize) {
        let span = info_span!("stage", %stage);
        span.pb_set_style(&stage_style());
        span.pb_set_length(total as u64);
        span.pb_set_message(&format!("Probing {stage}"));
        span.pb_start();

        self.spans
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(stage, span);
    }

    fn advanced(&self, stage: Stage, done: usize, _total: usize) {
        let spans = self.spans.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(span) = spans.get(&stage) {
            span.pb_set_position(done as u64);
        }
    }

    fn stage_finished(&self, stage: Stage) {
        self.spans
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&stage);
    }
}

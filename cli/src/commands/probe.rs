use std::sync::Arc;
use std::time::Instant;

use edgeprobe_common::network::unit::AddressUnit;
use edgeprobe_core::partition::partition;
use edgeprobe_core::pipeline::Pipeline;
use edgeprobe_core::rank::filter_and_rank;
use tracing::{error, info};

use crate::commands::{Settings, generate};
use crate::output;
use crate::sources::{self, CATALOG_URL, RetryPolicy};
use crate::summary;
use crate::terminal::print;
use crate::terminal::progress::StageProgress;

pub async fn probe(settings: &Settings) -> anyhow::Result<()> {
    let start_time = Instant::now();

    let ranges = sources::load_ranges(&settings.source).await?;
    let units = partition(&ranges);
    info!("{} ranges split into {} units", ranges.len(), units.len());

    let catalog = sources::fetch_catalog(CATALOG_URL, RetryPolicy::CATALOG).await?;
    info!("Location catalog lists {} locations", catalog.len());

    print::header("probing");
    let pipeline = Pipeline::new(settings.probe.clone(), Arc::new(catalog))
        .with_progress(Arc::new(StageProgress::new()));
    let outcome = pipeline.run(&units).await?;
    summary::print_run_report(&outcome.report);

    let ranked = filter_and_rank(outcome.summaries, &settings.filter);
    info!("{} ranges passed the filters", ranked.len());

    if let Some(path) = &settings.csv {
        match output::write_csv(path, &ranked) {
            Ok(()) => info!("Results written to {}", path.display()),
            Err(e) => error!("{e:#}"),
        }
    }

    if settings.list.is_requested() {
        let kept: Vec<AddressUnit> = ranked.iter().map(|summary| summary.unit).collect();
        generate::write_list(&kept, &settings.list);
    }

    summary::print_summary(&ranked, start_time.elapsed());
    Ok(())
}

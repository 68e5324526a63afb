use edgeprobe_common::config::AddressListConfig;
use edgeprobe_common::network::unit::AddressUnit;
use edgeprobe_core::iplist::generate_address_list;
use edgeprobe_core::partition::partition;
use tracing::{error, info};

use crate::commands::Settings;
use crate::output;
use crate::sources;
use crate::terminal::print;

/// Writes the address list straight from the range list, without probing.
pub async fn generate(settings: &Settings) -> anyhow::Result<()> {
    let ranges = sources::load_ranges(&settings.source).await?;
    let units = partition(&ranges);
    info!("{} ranges split into {} units", ranges.len(), units.len());

    print::header("address list");
    write_list(&units, &settings.list);
    Ok(())
}

/// Draws and writes the address list; a write failure is logged, not raised.
pub fn write_list(units: &[AddressUnit], list: &AddressListConfig) {
    let addresses = generate_address_list(units, list.ipv4, list.ipv6);

    match output::write_address_list(&list.path, &addresses) {
        Ok(()) => info!("{} addresses written to {}", addresses.len(), list.path.display()),
        Err(e) => error!("{e:#}"),
    }
}

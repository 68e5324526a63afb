use std::collections::HashMap;
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use edgeprobe_common::config::ProbeConfig;
use edgeprobe_common::location::LocationCatalog;
use edgeprobe_common::network::unit::AddressUnit;
use edgeprobe_core::pipeline::Pipeline;
use edgeprobe_core::prober::Dialer;
use edgeprobe_core::resolver::LocationProbe;

pub fn unit(s: &str) -> AddressUnit {
    AddressUnit::new(s.parse().unwrap()).unwrap()
}

pub fn catalog() -> Arc<LocationCatalog> {
    let json = r#"[
        {"iata":"HKG","lat":22.31,"lon":113.91,"cca2":"HK","region":"Asia Pacific","city":"Hong Kong"},
        {"iata":"NRT","lat":35.76,"lon":140.38,"cca2":"JP","region":"Asia Pacific","city":"Tokyo"}
    ]"#;
    Arc::new(LocationCatalog::from_json(json).unwrap())
}

pub fn config(concurrency: usize) -> ProbeConfig {
    ProbeConfig {
        connect_timeout: Duration::from_millis(50),
        resolve_timeout: Duration::from_millis(50),
        ..ProbeConfig::default()
    }
    .with_concurrency(concurrency)
}

pub fn pipeline(config: ProbeConfig, dialer: Arc<ScriptedDialer>, probe: Arc<CountingProbe>) -> Pipeline {
    Pipeline::new(config, catalog())
        .with_dialer(dialer)
        .with_location_probe(probe)
}

#[derive(Debug, Clone, Copy)]
pub enum Behaviour {
    /// Connects after the delay.
    Answer(Duration),
    /// Every other attempt per address times out.
    Flaky(Duration),
    /// Never connects.
    Silent,
}

/// Dialer answering per unit, instrumented with call and concurrency counters.
#[derive(Default)]
pub struct ScriptedDialer {
    rules: Vec<(AddressUnit, Behaviour)>,
    attempts: Mutex<HashMap<IpAddr, u32>>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl ScriptedDialer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, unit: AddressUnit, behaviour: Behaviour) -> Self {
        self.rules.push((unit, behaviour));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    fn behaviour(&self, addr: IpAddr) -> Option<Behaviour> {
        self.rules
            .iter()
            .find(|(unit, _)| unit.contains(addr))
            .map(|(_, behaviour)| *behaviour)
    }

    async fn attempt(&self, addr: IpAddr, timeout: Duration) -> io::Result<()> {
        match self.behaviour(addr) {
            Some(Behaviour::Answer(delay)) => {
                tokio::time::sleep(delay).await;
                Ok(())
            }
            Some(Behaviour::Flaky(delay)) => {
                let attempt = {
                    let mut attempts = self.attempts.lock().unwrap();
                    let n = attempts.entry(addr).or_insert(0);
                    *n += 1;
                    *n
                };
                if attempt % 2 == 0 {
                    tokio::time::sleep(timeout).await;
                    Err(io::ErrorKind::TimedOut.into())
                } else {
                    tokio::time::sleep(delay).await;
                    Ok(())
                }
            }
            Some(Behaviour::Silent) => {
                tokio::time::sleep(timeout).await;
                Err(io::ErrorKind::TimedOut.into())
            }
            None => Err(io::ErrorKind::ConnectionRefused.into()),
        }
    }
}

#[async_trait]
impl Dialer for ScriptedDialer {
    async fn dial(&self, target: SocketAddr, timeout: Duration) -> io::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let result = self.attempt(target.ip(), timeout).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

/// Location probe answering a fixed marker per unit and counting calls.
#[derive(Default)]
pub struct CountingProbe {
    markers: Vec<(AddressUnit, Option<String>)>,
    calls: AtomicUsize,
}

impl CountingProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` makes every probe of `unit` come back without a marker.
    pub fn with(mut self, unit: AddressUnit, location: Option<&str>) -> Self {
        self.markers
            .push((unit, location.map(|id| format!("8a1b2c3d4e5f6789-{id}"))));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LocationProbe for CountingProbe {
    async fn probe(&self, addr: IpAddr) -> anyhow::Result<Option<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;

        Ok(self
            .markers
            .iter()
            .find(|(unit, _)| unit.contains(addr))
            .and_then(|(_, marker)| marker.clone()))
    }
}

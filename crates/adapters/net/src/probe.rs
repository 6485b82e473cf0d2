//! Reachability probes.
//!
//! Both strategies turn every failure into a [`ProbeOutcome`]: a clear "no
//! answer" is `Unreachable`, an ambiguous failure (name resolution, missing
//! `ping` binary) is `Inconclusive`.

use std::future::Future;
use std::io::ErrorKind;
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::net::TcpStream;
use tokio::process::Command;

use deq_app::ports::Prober;
use deq_domain::device::Device;
use deq_domain::settings::{PollerSettings, ProbeStrategy};
use deq_domain::status::ProbeOutcome;

// ── TCP connect ───────────────────────────────────────────────────

/// Reachability by TCP connect to `address:probe_port`.
///
/// A refused connection still means the host answered, so it counts as
/// reachable.
#[derive(Debug, Clone)]
pub struct TcpProbe {
    default_port: u16,
    timeout: Duration,
}

impl TcpProbe {
    #[must_use]
    pub fn new(default_port: u16, timeout: Duration) -> Self {
        Self {
            default_port,
            timeout,
        }
    }

    /// Probe an arbitrary `host:port`.
    pub async fn check(&self, host: &str, port: u16) -> ProbeOutcome {
        let started = Instant::now();

        let target = match tokio::net::lookup_host((host, port)).await {
            Ok(mut addrs) => addrs.next(),
            Err(err) => {
                return ProbeOutcome::Inconclusive {
                    reason: format!("cannot resolve {host}: {err}"),
                };
            }
        };
        let Some(target) = target else {
            return ProbeOutcome::Inconclusive {
                reason: format!("{host} resolved to no address"),
            };
        };

        match tokio::time::timeout(self.timeout, TcpStream::connect(target)).await {
            Ok(Ok(_stream)) => ProbeOutcome::Reachable {
                latency: started.elapsed(),
            },
            Ok(Err(err)) if err.kind() == ErrorKind::ConnectionRefused => {
                ProbeOutcome::Reachable {
                    latency: started.elapsed(),
                }
            }
            Ok(Err(err)) => ProbeOutcome::Unreachable {
                reason: format!("connect to {target} failed: {err}"),
            },
            Err(_) => ProbeOutcome::Unreachable {
                reason: format!("connect to {target} timed out"),
            },
        }
    }
}

impl Prober for TcpProbe {
    fn probe(&self, device: &Device) -> impl Future<Output = ProbeOutcome> + Send {
        let port = device.probe_port.unwrap_or(self.default_port);
        async move { self.check(&device.address, port).await }
    }
}

// ── ICMP via system ping ──────────────────────────────────────────

/// Reachability by one ICMP echo, using the system `ping` binary so no raw
/// socket privileges are needed.
#[derive(Debug, Clone)]
pub struct PingProbe {
    binary: String,
    timeout: Duration,
}

impl PingProbe {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self::with_binary("ping", timeout)
    }

    #[must_use]
    pub fn with_binary(binary: impl Into<String>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }

    /// `ping -W` takes whole seconds.
    fn wait_secs(&self) -> u64 {
        let secs = self.timeout.as_secs() + u64::from(self.timeout.subsec_nanos() > 0);
        secs.max(1)
    }

    pub async fn check(&self, host: &str) -> ProbeOutcome {
        let started = Instant::now();
        let child = Command::new(&self.binary)
            .args(["-c", "1", "-W", &self.wait_secs().to_string(), host])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status();

        match tokio::time::timeout(self.timeout + Duration::from_secs(1), child).await {
            Ok(Ok(status)) => classify_exit(status.code(), started.elapsed()),
            Ok(Err(err)) => ProbeOutcome::Inconclusive {
                reason: format!("cannot run {}: {err}", self.binary),
            },
            Err(_) => ProbeOutcome::Unreachable {
                reason: "ping timed out".to_string(),
            },
        }
    }
}

/// Map a `ping` exit status: 0 answered, 1 no reply, anything else unknown.
fn classify_exit(code: Option<i32>, latency: Duration) -> ProbeOutcome {
    match code {
        Some(0) => ProbeOutcome::Reachable { latency },
        Some(1) => ProbeOutcome::Unreachable {
            reason: "no echo reply".to_string(),
        },
        Some(code) => ProbeOutcome::Inconclusive {
            reason: format!("ping exited with status {code}"),
        },
        None => ProbeOutcome::Inconclusive {
            reason: "ping terminated by signal".to_string(),
        },
    }
}

impl Prober for PingProbe {
    fn probe(&self, device: &Device) -> impl Future<Output = ProbeOutcome> + Send {
        async move { self.check(&device.address).await }
    }
}

// ── Strategy selection ────────────────────────────────────────────

/// The probe selected by [`PollerSettings::probe`].
#[derive(Debug, Clone)]
pub enum NetProbe {
    Tcp(TcpProbe),
    Ping(PingProbe),
}

impl NetProbe {
    #[must_use]
    pub fn from_settings(settings: &PollerSettings) -> Self {
        let timeout = settings.probe_timeout();
        match settings.probe {
            ProbeStrategy::Tcp => Self::Tcp(TcpProbe::new(settings.default_probe_port, timeout)),
            ProbeStrategy::Ping => Self::Ping(PingProbe::new(timeout)),
        }
    }
}

impl Prober for NetProbe {
    fn probe(&self, device: &Device) -> impl Future<Output = ProbeOutcome> + Send {
        async move {
            match self {
                Self::Tcp(probe) => probe.probe(device).await,
                Self::Ping(probe) => probe.probe(device).await,
            }
        }
    }
}

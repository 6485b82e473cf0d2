//! In-memory core for extension tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::future::BoxFuture;

use deq_app::ports::{RemoteShell, WakeSender};
use deq_app::{ActionExecutor, Core, DeviceDirectory, RenderScheduler, SectionRegistry, StatusCache};
use deq_domain::action::ActionResult;
use deq_domain::device::{Device, RemoteAccess};
use deq_domain::id::DeviceId;
use deq_domain::mac::MacAddress;
use deq_domain::settings::Settings;
use deq_domain::status::{DeviceStatus, ProbeOutcome};
use deq_domain::time;

/// Shell answering from a command → result table; unknown commands fail.
#[derive(Default)]
pub struct ScriptedShell {
    answers: Mutex<HashMap<String, ActionResult>>,
    pub calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedShell {
    pub fn answer(&self, command: &str, exit_code: i32, stdout: &str, stderr: &str) {
        self.answers.lock().unwrap().insert(
            command.to_string(),
            ActionResult::completed(
                exit_code,
                stdout.to_string(),
                stderr.to_string(),
                Duration::from_millis(5),
            ),
        );
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

impl RemoteShell for ScriptedShell {
    fn run<'a>(
        &'a self,
        device: &'a Device,
        _remote: &'a RemoteAccess,
        command: &'a str,
    ) -> BoxFuture<'a, ActionResult> {
        self.calls
            .lock()
            .unwrap()
            .push((device.id.to_string(), command.to_string()));
        let answer = self.answers.lock().unwrap().get(command).cloned();
        Box::pin(async move {
            answer.unwrap_or_else(|| {
                ActionResult::completed(127, String::new(), "command not found".into(), Duration::ZERO)
            })
        })
    }
}

struct SilentWaker;

impl WakeSender for SilentWaker {
    fn send_magic_packet(&self, _mac: MacAddress) -> BoxFuture<'_, std::io::Result<()>> {
        Box::pin(async { Ok(()) })
    }
}

pub struct Harness {
    pub core: Core,
    pub cache: Arc<StatusCache>,
    pub shell: Arc<ScriptedShell>,
}

impl Harness {
    pub fn new(settings: Settings) -> Self {
        let devices = DeviceDirectory::new(vec![
            device("nas-1", "NAS", "10.0.0.5"),
            device("router", "Router <main>", "10.0.0.1"),
        ])
        .unwrap();
        let cache = Arc::new(StatusCache::new(&devices, settings.poller.stale_after()));
        let shell = Arc::new(ScriptedShell::default());
        let executor = Arc::new(ActionExecutor::new(
            devices.clone(),
            Arc::clone(&shell) as Arc<dyn RemoteShell>,
            Arc::new(SilentWaker) as Arc<dyn WakeSender>,
            settings.actions.clone(),
        ));
        let core = Core::new(
            devices,
            Arc::new(settings),
            Arc::clone(&cache),
            executor,
            Arc::new(SectionRegistry::new()),
        );
        Self { core, cache, shell }
    }

    pub fn set_online(&self, id: &str) {
        self.cache.store(DeviceStatus::from_outcome(
            DeviceId::new(id).unwrap(),
            ProbeOutcome::Reachable {
                latency: Duration::from_millis(4),
            },
            time::now(),
        ));
    }

    pub fn set_offline(&self, id: &str) {
        self.cache.store(DeviceStatus::from_outcome(
            DeviceId::new(id).unwrap(),
            ProbeOutcome::Unreachable {
                reason: "connect timed out".into(),
            },
            time::now(),
        ));
    }

    /// Load the extensions and build a scheduler over their sections.
    pub fn scheduler(&self, extensions: &[Box<dyn deq_app::ports::Extension>]) -> RenderScheduler {
        let table = deq_app::load_extensions(&self.core, extensions).unwrap();
        RenderScheduler::new(table, Settings::default().scheduler)
    }
}

fn device(id: &str, name: &str, address: &str) -> Device {
    Device::builder()
        .id(DeviceId::new(id).unwrap())
        .name(name)
        .address(address)
        .remote(RemoteAccess::new("admin"))
        .build()
        .unwrap()
}

pub fn settings_with(name: &str, table: serde_json::Value) -> Settings {
    let mut settings = Settings::default();
    settings.extensions.insert(name.to_string(), table);
    settings
}

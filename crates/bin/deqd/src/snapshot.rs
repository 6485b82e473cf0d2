//! Dashboard snapshot export for the external serving layer.
//!
//! The file is replaced atomically: the JSON is written to a temporary file
//! in the target directory and renamed over the previous snapshot, so a
//! reader never sees a half-written document.

use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use deq_app::RenderScheduler;
use deq_domain::section::SectionView;
use deq_domain::time::{self, Timestamp};

/// Quiet period after a render result before the snapshot is written, so
/// one cycle of sections produces one write.
pub const SETTLE_DELAY: Duration = Duration::from_millis(250);

/// The document written to disk.
#[derive(Debug, Serialize)]
pub struct Snapshot<'a> {
    pub generated_at: Timestamp,
    pub sections: &'a [SectionView],
}

/// Snapshot write error.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("failed to serialize snapshot: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write snapshot {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Atomically replace `path` with the JSON form of `sections`.
///
/// # Errors
///
/// Returns [`SnapshotError`] when serialization, the temporary file or the
/// final rename fails.
pub fn write_snapshot(path: &Path, sections: &[SectionView]) -> Result<(), SnapshotError> {
    let document = Snapshot {
        generated_at: time::now(),
        sections,
    };
    let json = serde_json::to_vec_pretty(&document)?;

    let wrap = |source| SnapshotError::Write {
        path: path.to_path_buf(),
        source,
    };
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = tempfile::NamedTempFile::new_in(dir).map_err(wrap)?;
    file.write_all(&json).map_err(wrap)?;
    file.as_file().sync_all().map_err(wrap)?;
    file.persist(path).map_err(|err| wrap(err.error))?;
    Ok(())
}

/// Rewrite the snapshot whenever the scheduler stores a render result, until
/// `cancel` fires. Write failures are logged and retried on the next change.
///
/// Subscribes before returning, so renders that finish before the future is
/// first polled are not missed.
pub fn export(
    scheduler: Arc<RenderScheduler>,
    path: PathBuf,
    cancel: CancellationToken,
) -> impl Future<Output = ()> + Send + 'static {
    let mut changes = scheduler.subscribe();
    async move {
        tracing::info!(path = %path.display(), "snapshot export started");

        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                changed = changes.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
            tokio::select! {
                () = cancel.cancelled() => break,
                () = tokio::time::sleep(SETTLE_DELAY) => {}
            }
            changes.borrow_and_update();

            let sections = scheduler.snapshot();
            let target = path.clone();
            match tokio::task::spawn_blocking(move || write_snapshot(&target, &sections)).await {
                Ok(Ok(())) => tracing::debug!(path = %path.display(), "snapshot written"),
                Ok(Err(err)) => tracing::warn!(error = %err, "snapshot write failed"),
                Err(err) => tracing::warn!(error = %err, "snapshot writer task failed"),
            }
        }

        tracing::info!("snapshot export stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use deq_app::SectionRegistry;
    use deq_app::ports::{ExtensionError, render_fn};
    use deq_domain::section::{SectionOutput, SectionSpec};
    use deq_domain::settings::SchedulerSettings;

    fn view(id: &str, fragment: &str) -> SectionView {
        let spec = SectionSpec::new(id, "Title", "icon").unwrap();
        let output = SectionOutput::rendered(fragment.to_string(), time::now());
        SectionView::new(&spec, &output)
    }

    #[test]
    fn should_write_sections_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dashboard.json");

        write_snapshot(&path, &[view("storage", "<p>ok</p>"), view("network", "")]).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let sections = json["sections"].as_array().unwrap();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0]["id"], "storage");
        assert_eq!(sections[0]["fragment"], "<p>ok</p>");
        assert_eq!(sections[1]["id"], "network");
        assert!(json["generated_at"].is_string());
    }

    #[test]
    fn should_replace_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dashboard.json");
        std::fs::write(&path, "stale").unwrap();

        write_snapshot(&path, &[view("storage", "fresh")]).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("fresh"));
        let leftovers = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn should_fail_when_directory_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("dashboard.json");

        let err = write_snapshot(&path, &[]).unwrap_err();

        assert!(matches!(err, SnapshotError::Write { .. }));
    }

    #[tokio::test]
    async fn should_export_after_render() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dashboard.json");
        let registry = SectionRegistry::new();
        registry
            .register(
                SectionSpec::new("storage", "Storage", "hdd").unwrap(),
                render_fn(|| async { Ok::<_, ExtensionError>("<p>42%</p>".to_string()) }),
            )
            .unwrap();
        let scheduler = Arc::new(RenderScheduler::new(
            registry.seal().unwrap(),
            SchedulerSettings::default(),
        ));
        let cancel = CancellationToken::new();
        let exporter = tokio::spawn(export(
            Arc::clone(&scheduler),
            path.clone(),
            cancel.clone(),
        ));

        scheduler.render_all().await;
        let mut written = false;
        for _ in 0..50 {
            tokio::time::sleep(Duration::from_millis(50)).await;
            if std::fs::read_to_string(&path).is_ok_and(|s| s.contains("42%")) {
                written = true;
                break;
            }
        }
        cancel.cancel();
        exporter.await.unwrap();

        assert!(written);
    }
}

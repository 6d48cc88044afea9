use std::future::Future;
use std::sync::Arc;

use crate::error::Error;

/// Receives failures of detached tasks. Nothing else ever sees them.
pub trait FailureSink: Send + Sync + 'static {
    fn report(&self, task: &'static str, error: &Error);
}

/// Default [`FailureSink`]: a `warn!` log line.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingFailureSink;

impl FailureSink for TracingFailureSink {
    fn report(&self, task: &'static str, error: &Error) {
        tracing::warn!(task, kind = ?error.kind(), error = %error, "Detached task failed");
    }
}

/// Run `work` on the ambient tokio runtime without joining it.
///
/// Returns nothing the caller could await: the outcome only reaches `sink`.
/// Outside a runtime the work is dropped and reported.
pub fn spawn_detached<F>(task: &'static str, sink: Arc<dyn FailureSink>, work: F)
where
    F: Future<Output = Result<(), Error>> + Send + 'static,
{
    let Ok(runtime) = tokio::runtime::Handle::try_current() else {
        sink.report(task, &Error::Config("no async runtime available".into()));
        return;
    };

    runtime.spawn(async move {
        if let Err(e) = work.await {
            sink.report(task, &e);
        }
    });
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;
    use tokio::sync::Notify;

    use super::*;
    use crate::error::ErrorKind;

    #[derive(Default)]
    struct Collect {
        reports: Mutex<Vec<(&'static str, ErrorKind)>>,
        notify: Notify,
    }

    impl FailureSink for Collect {
        fn report(&self, task: &'static str, error: &Error) {
            self.reports.lock().push((task, error.kind()));
            self.notify.notify_one();
        }
    }

    #[tokio::test]
    async fn test_failure_reaches_sink() {
        let sink = Arc::new(Collect::default());

        spawn_detached("probe", sink.clone(), async {
            Err(Error::Unreachable("down".into()))
        });

        sink.notify.notified().await;
        assert_eq!(*sink.reports.lock(), vec![("probe", ErrorKind::Unreachable)]);
    }

    #[tokio::test]
    async fn test_success_is_silent() {
        let sink = Arc::new(Collect::default());
        let (done_tx, done_rx) = tokio::sync::oneshot::channel();

        spawn_detached("probe", sink.clone(), async move {
            let _ = done_tx.send(());
            Ok(())
        });

        done_rx.await.unwrap();
        tokio::task::yield_now().await;
        assert!(sink.reports.lock().is_empty());
    }

    #[test]
    fn test_without_runtime_reports_instead_of_panicking() {
        let sink = Arc::new(Collect::default());

        spawn_detached("probe", sink.clone(), async { Ok(()) });

        assert_eq!(*sink.reports.lock(), vec![("probe", ErrorKind::Config)]);
    }
}

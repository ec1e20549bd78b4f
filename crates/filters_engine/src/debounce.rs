use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Collapses bursts of calls into one: each `call` cancels the pending one and
/// schedules `callback` for `delay` after the latest call, with its argument.
pub struct Debouncer<T> {
    handle: Handle,
    delay: Duration,
    callback: Arc<dyn Fn(T) + Send + Sync>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl<T: Send + 'static> Debouncer<T> {
    pub fn new<F>(handle: Handle, delay: Duration, callback: F) -> Self
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        Self {
            handle,
            delay,
            callback: Arc::new(callback),
            pending: Mutex::new(None),
        }
    }

    pub fn call(&self, arg: T) {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = pending.take() {
            previous.abort();
        }
        let callback = Arc::clone(&self.callback);
        let delay = self.delay;
        *pending = Some(self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            callback(arg);
        }));
    }

    pub fn cancel(&self) {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = pending.take() {
            previous.abort();
        }
    }

    /// Whether a scheduled call has not run yet.
    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        let pending = self.pending.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(task) = pending.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use tokio::runtime::Handle;
    use tokio::time::sleep;

    use super::Debouncer;

    fn recording(delay_ms: u64) -> (Debouncer<u32>, Arc<Mutex<Vec<u32>>>) {
        let calls = Arc::new(Mutex::new(Vec::<u32>::new()));
        let sink = Arc::clone(&calls);
        let debouncer = Debouncer::new(
            Handle::current(),
            Duration::from_millis(delay_ms),
            move |value: u32| sink.lock().unwrap().push(value),
        );
        (debouncer, calls)
    }

    #[tokio::test(start_paused = true)]
    async fn burst_runs_once_with_last_argument() {
        let (debouncer, calls) = recording(300);
        for value in 1..=5 {
            debouncer.call(value);
            sleep(Duration::from_millis(100)).await;
        }
        assert!(debouncer.is_pending());
        assert!(calls.lock().unwrap().is_empty());

        sleep(Duration::from_millis(400)).await;
        assert_eq!(*calls.lock().unwrap(), vec![5]);
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn spaced_calls_each_run() {
        let (debouncer, calls) = recording(300);
        debouncer.call(1);
        sleep(Duration::from_millis(350)).await;
        debouncer.call(2);
        sleep(Duration::from_millis(350)).await;
        assert_eq!(*calls.lock().unwrap(), vec![1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_and_drop_discard_the_pending_call() {
        let (debouncer, calls) = recording(300);
        debouncer.call(1);
        debouncer.cancel();
        sleep(Duration::from_millis(350)).await;
        assert!(calls.lock().unwrap().is_empty());

        debouncer.call(2);
        drop(debouncer);
        sleep(Duration::from_millis(350)).await;
        assert!(calls.lock().unwrap().is_empty());
    }
}

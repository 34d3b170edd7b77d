// This code is licensed under Elastic License 2.0
// https://www.elastic.co/licensing/elastic-license

use log::{debug, error, info, warn};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::backend::Backend;
use crate::model::sample::MetricPush;
use crate::utils::sync::{Arc, Mutex, TokioMutex};

/// One write unit, together with the completion handle of the batch it belongs to.
struct Job {
  push: MetricPush,

  // Never sent on. The batch is complete once every clone has been dropped.
  _done: mpsc::Sender<()>,
}

/// A fixed set of workers pushing write units to the backend, fed by one bounded queue.
pub struct WritePool {
  sender: Mutex<Option<mpsc::Sender<Job>>>,
  workers: Mutex<Vec<JoinHandle<()>>>,
}

impl WritePool {
  /// Start `workers` worker tasks. Must be called from within a tokio runtime.
  pub fn new(backend: Arc<dyn Backend>, workers: usize, queue_size: usize) -> Self {
    let workers = workers.max(1);
    let (sender, receiver) = mpsc::channel(queue_size.max(1));
    let receiver = Arc::new(TokioMutex::new(receiver));

    let handles = (0..workers)
      .map(|id| tokio::spawn(run_worker(id, backend.clone(), receiver.clone())))
      .collect();

    info!("Started write pool with {} workers", workers);

    WritePool {
      sender: Mutex::new(Some(sender)),
      workers: Mutex::new(handles),
    }
  }

  /// Queue every write unit of the batch and wait until all of them have been processed.
  ///
  /// Individual push failures are logged by the workers and do not fail the batch.
  pub async fn submit_batch(&self, batch: Vec<MetricPush>) {
    let sender = match self.sender.lock().as_ref() {
      Some(sender) => sender.clone(),
      None => {
        warn!("Write pool is shut down, dropping {} write units", batch.len());
        return;
      }
    };

    let count = batch.len();
    let (done, mut all_done) = mpsc::channel::<()>(1);
    for push in batch {
      let job = Job {
        push,
        _done: done.clone(),
      };
      if sender.send(job).await.is_err() {
        warn!("Write pool queue closed while submitting a batch");
        break;
      }
    }
    drop(done);

    // Resolves with None once the last job of this batch has been dropped by a worker.
    all_done.recv().await;
    debug!("Processed write batch of {} units", count);
  }

  /// Close the queue and wait for the workers to drain it.
  pub async fn shutdown(&self) {
    self.sender.lock().take();
    let handles: Vec<JoinHandle<()>> = self.workers.lock().drain(..).collect();
    for handle in handles {
      if let Err(err) = handle.await {
        error!("Write pool worker failed: {}", err);
      }
    }
    info!("Write pool shut down");
  }
}

async fn run_worker(
  id: usize,
  backend: Arc<dyn Backend>,
  receiver: Arc<TokioMutex<mpsc::Receiver<Job>>>,
) {
  loop {
    let job = receiver.lock().await.recv().await;
    let Some(job) = job else {
      break;
    };

    let push = &job.push;
    if let Err(err) = backend.push_samples(std::slice::from_ref(push)).await {
      error!(
        "Could not push sample for metric {} with tags {:?} at {}: {}",
        push.name, push.tags, push.timestamp_ms, err
      );
    }
  }
  debug!("Write pool worker {} exiting", id);
}

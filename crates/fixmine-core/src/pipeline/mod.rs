/*!
# Fan-out Pipeline

One producer broadcasts every classified record to every registered
consumer. Each consumer runs on its own thread and owns its own unbounded
queue, so every consumer sees the complete record stream in submission
order.

## Consumer lifecycle

`Running -> Draining -> Terminated`. A running consumer blocks on its queue
and consumes records one at a time. The [`Message::Shutdown`] marker (one
per consumer) moves it to draining: no further records are read,
`cleanup()` runs exactly once, and the thread ends.

Shutdown is cooperative and not preemptive: [`ConsumerHandle::shutdown`]
enqueues the marker and blocks until every earlier record has been consumed
and `cleanup()` has returned. There is no timeout; a stuck consumer stalls
shutdown.

## Failure policy

A consumer whose `consume` or `cleanup` fails ends its thread with that
error and drops its queue. The next publish to it fails with
[`PipelineError::ConsumerDisconnected`] instead of blocking, and shutting the
consumer down reports the original error.
*/

pub mod serializer;
pub mod statistics;

use std::thread::{self, JoinHandle};

use anyhow::Context;
use crossbeam_channel::{Receiver, Sender};
use tracing::{debug, error, info};

use crate::rules::ClassifiedRecord;

pub use serializer::{Compression, RecordReader, RecordSerializer};
pub use statistics::{AggregateEntry, StatisticsRenderer, GENERAL_TABLE, PROJECTS_TABLE};

/// Pipeline errors
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    /// The consumer's queue is gone, its thread already ended
    #[error("Consumer '{name}' is no longer receiving records")]
    ConsumerDisconnected { name: String },

    /// The consumer thread panicked
    #[error("Consumer '{name}' panicked")]
    ConsumerPanicked { name: String },

    /// `consume` or `cleanup` failed
    #[error("Consumer '{name}' failed: {source:#}")]
    Consumer {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    /// The worker thread could not be started
    #[error("Failed to spawn consumer '{name}': {source}")]
    Spawn {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

/// What travels over a consumer queue
#[derive(Debug, Clone)]
pub enum Message {
    Data(ClassifiedRecord),
    Shutdown,
}

/// Lifecycle of a consumer worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumerState {
    Running,
    Draining,
    Terminated,
}

/// A long-lived record sink driven by its own worker thread
pub trait Consumer: Send + 'static {
    fn name(&self) -> &str;

    /// Handle one record, in submission order
    fn consume(&mut self, record: ClassifiedRecord) -> anyhow::Result<()>;

    /// Finalize after the shutdown marker. Runs exactly once.
    fn cleanup(&mut self) -> anyhow::Result<()>;
}

/// What a consumer reports once it has terminated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumerReport {
    pub name: String,
    pub consumed: u64,
}

/// Producer-side handle to one running consumer
pub struct ConsumerHandle {
    name: String,
    sender: Sender<Message>,
    worker: Option<JoinHandle<anyhow::Result<ConsumerReport>>>,
}

impl ConsumerHandle {
    /// Start a consumer on a dedicated thread with a private unbounded queue
    pub fn spawn<C: Consumer>(consumer: C) -> Result<Self, PipelineError> {
        let name = consumer.name().to_string();
        let (sender, receiver) = crossbeam_channel::unbounded();

        let worker = thread::Builder::new()
            .name(format!("consumer-{name}"))
            .spawn(move || run_consumer(consumer, receiver))
            .map_err(|source| PipelineError::Spawn {
                name: name.clone(),
                source,
            })?;

        info!(consumer = %name, "consumer started");
        Ok(Self {
            name,
            sender,
            worker: Some(worker),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Enqueue one record. Never blocks.
    pub fn send(&self, record: ClassifiedRecord) -> Result<(), PipelineError> {
        self.sender
            .send(Message::Data(record))
            .map_err(|_| PipelineError::ConsumerDisconnected {
                name: self.name.clone(),
            })
    }

    /// Enqueue the shutdown marker and wait for the consumer to drain,
    /// clean up and terminate
    pub fn shutdown(mut self) -> Result<ConsumerReport, PipelineError> {
        self.join()
    }

    fn join(&mut self) -> Result<ConsumerReport, PipelineError> {
        let name = self.name.clone();
        let Some(worker) = self.worker.take() else {
            return Err(PipelineError::ConsumerDisconnected { name });
        };

        // A dead worker has dropped its queue; joining still recovers its error.
        if self.sender.send(Message::Shutdown).is_err() {
            debug!(consumer = %name, "queue already closed at shutdown");
        }

        match worker.join() {
            Ok(Ok(report)) => Ok(report),
            Ok(Err(source)) => Err(PipelineError::Consumer { name, source }),
            Err(_) => Err(PipelineError::ConsumerPanicked { name }),
        }
    }
}

impl Drop for ConsumerHandle {
    fn drop(&mut self) {
        if self.worker.is_some() {
            if let Err(e) = self.join() {
                error!(consumer = %self.name, "consumer failed during implicit shutdown: {e}");
            }
        }
    }
}

fn run_consumer<C: Consumer>(mut consumer: C, receiver: Receiver<Message>) -> anyhow::Result<ConsumerReport> {
    let name = consumer.name().to_string();
    let mut state = ConsumerState::Running;
    let mut consumed = 0u64;

    while state == ConsumerState::Running {
        match receiver.recv() {
            Ok(Message::Data(record)) => {
                consumer
                    .consume(record)
                    .with_context(|| format!("record {} rejected by {name}", consumed + 1))?;
                consumed += 1;
            }
            // A closed queue means every producer handle is gone; treat it
            // like the marker so cleanup still runs.
            Ok(Message::Shutdown) | Err(_) => state = ConsumerState::Draining,
        }
    }

    debug!(consumer = %name, consumed, ?state, "draining");
    consumer.cleanup().with_context(|| format!("cleanup of {name} failed"))?;
    state = ConsumerState::Terminated;
    info!(consumer = %name, consumed, ?state, "consumer finished");

    Ok(ConsumerReport { name, consumed })
}

/// Broadcasts every record to every registered consumer
#[derive(Default)]
pub struct FanOut {
    consumers: Vec<ConsumerHandle>,
}

impl FanOut {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn `consumer` and start delivering records to it
    pub fn register<C: Consumer>(&mut self, consumer: C) -> Result<(), PipelineError> {
        self.consumers.push(ConsumerHandle::spawn(consumer)?);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.consumers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.consumers.is_empty()
    }

    /// Push a copy of `record` onto every consumer's queue
    pub fn publish(&self, record: &ClassifiedRecord) -> Result<(), PipelineError> {
        for consumer in &self.consumers {
            consumer.send(record.clone())?;
        }
        Ok(())
    }

    /// Shut consumers down one at a time, in registration order. Every
    /// consumer is joined even if an earlier one failed; the first failure
    /// is returned.
    pub fn shutdown(self) -> Result<Vec<ConsumerReport>, PipelineError> {
        let mut reports = Vec::with_capacity(self.consumers.len());
        let mut first_error = None;

        for consumer in self.consumers {
            match consumer.shutdown() {
                Ok(report) => reports.push(report),
                Err(e) => {
                    error!("{e}");
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(reports),
        }
    }
}

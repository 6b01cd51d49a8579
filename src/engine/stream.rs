use std::pin::Pin;
use std::task::{Context, Poll};

use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::errors::EngineError;

pub type StreamItem<T> = Result<T, EngineError>;

/// Producer half of an [`ItemStream`].
pub struct ItemSender<T> {
    inner: mpsc::Sender<StreamItem<T>>,
}

impl<T> Clone for ItemSender<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> ItemSender<T> {
    /// Emits one item. Fails with `StreamClosed` once the consumer destroyed the stream.
    pub async fn send(&self, item: T) -> Result<(), EngineError> {
        self.inner
            .send(Ok(item))
            .await
            .map_err(|_| EngineError::StreamClosed)
    }

    /// Emits a terminal error. The consumer sees no items after it.
    pub async fn fail(&self, error: EngineError) -> Result<(), EngineError> {
        self.inner
            .send(Err(error))
            .await
            .map_err(|_| EngineError::StreamClosed)
    }

    /// Blocking form of [`send`](Self::send) for producers running off the async runtime.
    pub fn blocking_send(&self, item: T) -> Result<(), EngineError> {
        self.inner
            .blocking_send(Ok(item))
            .map_err(|_| EngineError::StreamClosed)
    }

    pub fn blocking_fail(&self, error: EngineError) -> Result<(), EngineError> {
        self.inner
            .blocking_send(Err(error))
            .map_err(|_| EngineError::StreamClosed)
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }
}

/// An asynchronous stream of result items produced by an engine.
///
/// The stream ends when every sender is dropped, or right after the first error.
/// Producer tasks attached to the stream are aborted when it is destroyed or
/// dropped, so abandoning a stream never leaks the work feeding it.
pub struct ItemStream<T> {
    receiver: mpsc::Receiver<StreamItem<T>>,
    tasks: Vec<JoinHandle<()>>,
    done: bool,
}

pub struct StreamChannel;

impl StreamChannel {
    pub fn bounded<T>(capacity: usize) -> (ItemSender<T>, ItemStream<T>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (
            ItemSender { inner: tx },
            ItemStream {
                receiver: rx,
                tasks: Vec::new(),
                done: false,
            },
        )
    }
}

impl<T> ItemStream<T> {
    /// A stream that yields `items` in order and then ends.
    pub fn from_items(items: Vec<T>) -> Self {
        let (tx, rx) = mpsc::channel(items.len().max(1));
        for item in items {
            // Capacity covers every item, so this cannot fail.
            let _ = tx.try_send(Ok(item));
        }
        Self {
            receiver: rx,
            tasks: Vec::new(),
            done: false,
        }
    }

    pub fn empty() -> Self {
        Self::from_items(Vec::new())
    }

    pub fn attach_task(&mut self, task: JoinHandle<()>) {
        self.tasks.push(task);
    }

    pub fn with_task(mut self, task: JoinHandle<()>) -> Self {
        self.attach_task(task);
        self
    }

    /// Receives the next item; `None` once the stream has ended.
    pub async fn recv(&mut self) -> Option<StreamItem<T>> {
        self.next().await
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Asks the producers to stop. Fire-and-forget: items already in flight are discarded.
    pub fn destroy(&mut self) {
        self.done = true;
        self.receiver.close();
        self.abort_tasks();
    }

    fn abort_tasks(&mut self) {
        while let Some(task) = self.tasks.pop() {
            task.abort();
        }
    }
}

// No field is ever pinned structurally.
impl<T> Unpin for ItemStream<T> {}

impl<T> Stream for ItemStream<T> {
    type Item = StreamItem<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.done {
            return Poll::Ready(None);
        }
        match this.receiver.poll_recv(cx) {
            Poll::Ready(Some(Ok(item))) => Poll::Ready(Some(Ok(item))),
            Poll::Ready(Some(Err(error))) => {
                this.done = true;
                Poll::Ready(Some(Err(error)))
            }
            Poll::Ready(None) => {
                this.done = true;
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<T> Drop for ItemStream<T> {
    fn drop(&mut self) {
        self.abort_tasks();
    }
}

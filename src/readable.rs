//! Lazy result sequences for `readable` methods.
//!
//! A [`Readable`] yields data items until an explicit end marker. Errors travel
//! out of band: an error item terminates the sequence but is distinct from a
//! normal end. Once finished a readable stays finished; it cannot be restarted.

use tokio::sync::mpsc;

use crate::error::{BindingError, BindingResult};

enum ReadableEvent<T> {
    Data(T),
    Error(BindingError),
    End,
}

/// Create a connected sink/readable pair.
pub fn readable<T>() -> (ReadableSink<T>, Readable<T>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ReadableSink { tx }, Readable { rx, done: false })
}

/// Producer side. Cloneable so it can live inside callbacks.
pub struct ReadableSink<T> {
    tx: mpsc::UnboundedSender<ReadableEvent<T>>,
}

impl<T> Clone for ReadableSink<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T> ReadableSink<T> {
    /// Returns `false` once the consumer is gone.
    pub fn push(&self, item: T) -> bool {
        self.tx.send(ReadableEvent::Data(item)).is_ok()
    }

    pub fn fail(self, error: BindingError) {
        let _ = self.tx.send(ReadableEvent::Error(error));
    }

    pub fn end(self) {
        let _ = self.tx.send(ReadableEvent::End);
    }
}

/// Consumer side.
pub struct Readable<T> {
    rx: mpsc::UnboundedReceiver<ReadableEvent<T>>,
    done: bool,
}

impl<T> Readable<T> {
    /// Next item; `None` after the end marker, or when every sink is dropped.
    pub async fn next(&mut self) -> Option<BindingResult<T>> {
        if self.done {
            return None;
        }
        match self.rx.recv().await {
            Some(ReadableEvent::Data(item)) => Some(Ok(item)),
            Some(ReadableEvent::Error(e)) => {
                self.finish();
                Some(Err(e))
            }
            Some(ReadableEvent::End) | None => {
                self.finish();
                None
            }
        }
    }

    /// Drain to the end marker, failing on the first error.
    pub async fn collect(mut self) -> BindingResult<Vec<T>> {
        let mut items = Vec::new();
        while let Some(item) = self.next().await {
            items.push(item?);
        }
        Ok(items)
    }

    pub fn is_finished(&self) -> bool {
        self.done
    }

    fn finish(&mut self) {
        self.done = true;
        self.rx.close();
    }
}

//! Row sources: the cursor abstraction consumed by the encoders
//!
//! Encoders are synchronous and drain one row at a time. Drivers, on the
//! other hand, read their cursors on an async runtime. `RowStream` bridges the
//! two with a bounded channel: a producer task pushes `RowEvent`s while the
//! encoder thread blocks on the receiving side, so at most `capacity` rows are
//! in flight at any point.

use crate::{Result, SqlxpError, Value};
use tokio::sync::mpsc;

/// Number of rows buffered between a driver's cursor and the encoder.
pub const DEFAULT_ROW_BUFFER: usize = 256;

/// A single-pass cursor over a query result.
///
/// The calling protocol is: `columns()` once, then `advance()` until it
/// returns `false`, calling `scan()` after every `true`, and finally
/// `final_error()` to learn whether the cursor ended cleanly.
pub trait RowSource {
    /// Ordered column names of the result set.
    fn columns(&mut self) -> Result<Vec<String>>;

    /// Move to the next row. Returns `false` once the cursor is exhausted or
    /// has failed; the failure is reported by [`RowSource::final_error`].
    ///
    /// May block until the producer delivers the next row.
    fn advance(&mut self) -> bool;

    /// Copy the current row into `slots`, one slot per column.
    fn scan(&mut self, slots: &mut [Value]) -> Result<()>;

    /// Terminal error of the cursor, checked once after `advance` returns `false`.
    fn final_error(&mut self) -> Option<SqlxpError>;
}

/// Message sent from a driver's cursor to a [`RowStream`].
#[derive(Debug)]
pub enum RowEvent {
    /// A complete row
    Row(Vec<Value>),
    /// The row exists but its values could not be converted
    ScanFailed(SqlxpError),
    /// The cursor broke; no further rows follow
    CursorFailed(SqlxpError),
}

/// Producing half of a row channel, owned by the driver task.
///
/// Every send reports whether the consumer is still listening. Once it
/// returns `false` the producer should stop reading its cursor.
#[derive(Debug, Clone)]
pub struct RowSender {
    tx: mpsc::Sender<RowEvent>,
}

/// Consuming half of a row channel, wrapped by [`RowStream::new`].
#[derive(Debug)]
pub struct RowReceiver {
    rx: mpsc::Receiver<RowEvent>,
}

/// Create a bounded row channel holding at most `capacity` pending events.
pub fn row_channel(capacity: usize) -> (RowSender, RowReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (RowSender { tx }, RowReceiver { rx })
}

impl RowSender {
    pub async fn send(&self, event: RowEvent) -> bool {
        self.tx.send(event).await.is_ok()
    }

    pub async fn send_row(&self, values: Vec<Value>) -> bool {
        self.send(RowEvent::Row(values)).await
    }

    /// Send from a plain (non-async) thread, e.g. a blocking SQLite reader.
    pub fn blocking_send(&self, event: RowEvent) -> bool {
        self.tx.blocking_send(event).is_ok()
    }

    /// Whether the consuming side has gone away.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Channel-backed [`RowSource`] handed out by database connections.
///
/// `advance` uses a blocking receive, even for streams built with
/// [`RowStream::from_rows`]. Calling it from a thread that is driving a Tokio
/// runtime panics; drain the stream on a plain thread or inside
/// `tokio::task::spawn_blocking`.
#[derive(Debug)]
pub struct RowStream {
    columns: Vec<String>,
    receiver: RowReceiver,
    current: Option<Result<Vec<Value>>>,
    failure: Option<SqlxpError>,
    exhausted: bool,
    rows_received: u64,
}

impl RowStream {
    pub fn new(columns: Vec<String>, receiver: RowReceiver) -> Self {
        Self {
            columns,
            receiver,
            current: None,
            failure: None,
            exhausted: false,
            rows_received: 0,
        }
    }

    /// Build a stream over rows that are already in memory.
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self::from_events(columns, rows.into_iter().map(RowEvent::Row).collect())
    }

    /// Build a stream that replays the given events in order.
    pub fn from_events(columns: Vec<String>, events: Vec<RowEvent>) -> Self {
        let (sender, receiver) = row_channel(events.len());
        for event in events {
            // Capacity equals the event count, so this cannot fill up.
            let _ = sender.tx.try_send(event);
        }
        Self::new(columns, receiver)
    }

    /// Rows (including unreadable ones) taken from the channel so far.
    pub fn rows_received(&self) -> u64 {
        self.rows_received
    }
}

impl RowSource for RowStream {
    fn columns(&mut self) -> Result<Vec<String>> {
        Ok(self.columns.clone())
    }

    fn advance(&mut self) -> bool {
        self.current = None;
        if self.exhausted {
            return false;
        }

        match self.receiver.rx.blocking_recv() {
            Some(RowEvent::Row(values)) => {
                self.rows_received += 1;
                self.current = Some(Ok(values));
                true
            }
            Some(RowEvent::ScanFailed(error)) => {
                self.rows_received += 1;
                self.current = Some(Err(error));
                true
            }
            Some(RowEvent::CursorFailed(error)) => {
                tracing::debug!(error = %error, rows = self.rows_received, "row cursor failed");
                self.failure = Some(error);
                self.exhausted = true;
                self.receiver.rx.close();
                false
            }
            None => {
                tracing::debug!(rows = self.rows_received, "row cursor exhausted");
                self.exhausted = true;
                false
            }
        }
    }

    fn scan(&mut self, slots: &mut [Value]) -> Result<()> {
        match self.current.take() {
            Some(Ok(values)) => {
                if values.len() != slots.len() {
                    return Err(SqlxpError::Scan(format!(
                        "expected {} destination slots, row has {} values",
                        slots.len(),
                        values.len()
                    )));
                }
                for (slot, value) in slots.iter_mut().zip(values) {
                    *slot = value;
                }
                Ok(())
            }
            Some(Err(error)) => Err(error),
            None => Err(SqlxpError::Scan(
                "scan called without a current row".to_string(),
            )),
        }
    }

    fn final_error(&mut self) -> Option<SqlxpError> {
        self.failure.take()
    }
}

//! Bounded FIFO mailbox feeding one supervised actor.
//!
//! Unlike `tokio::sync::mpsc`, closing happens on the sending side: the owner
//! of an actor can refuse new commands while the actor drains what is
//! already queued, and senders parked on a full queue wake at once.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tokio::sync::Notify;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("mailbox closed")]
pub struct MailboxSendError;

struct Shared<T> {
	capacity: usize,
	queue: Mutex<VecDeque<T>>,
	closed: AtomicBool,
	/// Signalled when an item is queued or the mailbox closes.
	readable: Notify,
	/// Signalled when an item is taken or the mailbox closes.
	writable: Notify,
}

enum Push<T> {
	Queued,
	Full(T),
	Closed,
}

impl<T> Shared<T> {
	fn is_closed(&self) -> bool {
		self.closed.load(Ordering::Acquire)
	}

	fn push(&self, item: T) -> Push<T> {
		if self.is_closed() {
			return Push::Closed;
		}
		let mut queue = self.queue.lock();
		if queue.len() >= self.capacity {
			return Push::Full(item);
		}
		queue.push_back(item);
		drop(queue);
		self.readable.notify_one();
		Push::Queued
	}
}

pub struct MailboxSender<T> {
	shared: Arc<Shared<T>>,
}

pub struct MailboxReceiver<T> {
	shared: Arc<Shared<T>>,
}

impl<T> Clone for MailboxSender<T> {
	fn clone(&self) -> Self {
		Self {
			shared: Arc::clone(&self.shared),
		}
	}
}

/// Creates a mailbox holding at most `capacity` queued items.
///
/// # Panics
///
/// Panics if `capacity` is zero.
pub fn bounded<T>(capacity: usize) -> (MailboxSender<T>, MailboxReceiver<T>) {
	assert!(capacity > 0, "mailbox capacity must be > 0");
	let shared = Arc::new(Shared {
		capacity,
		queue: Mutex::new(VecDeque::with_capacity(capacity)),
		closed: AtomicBool::new(false),
		readable: Notify::new(),
		writable: Notify::new(),
	});
	(
		MailboxSender {
			shared: Arc::clone(&shared),
		},
		MailboxReceiver { shared },
	)
}

impl<T> MailboxSender<T> {
	/// Queues `item`, waiting while the mailbox is full.
	///
	/// Cancel safe: dropping the future before it resolves queues nothing.
	pub async fn send(&self, mut item: T) -> Result<(), MailboxSendError> {
		loop {
			// Registered before the capacity check so a concurrent pop is not missed.
			let writable = self.shared.writable.notified();
			match self.shared.push(item) {
				Push::Queued => return Ok(()),
				Push::Closed => return Err(MailboxSendError),
				Push::Full(rejected) => item = rejected,
			}
			writable.await;
		}
	}

	/// Closes the mailbox. Queued items are still delivered; new sends fail
	/// and parked senders wake with [`MailboxSendError`].
	pub fn close(&self) {
		self.shared.closed.store(true, Ordering::Release);
		self.shared.readable.notify_waiters();
		self.shared.writable.notify_waiters();
	}
}

impl<T> MailboxReceiver<T> {
	/// Takes the oldest item. Returns `None` once closed and drained.
	pub async fn recv(&self) -> Option<T> {
		loop {
			let readable = self.shared.readable.notified();
			let item = self.shared.queue.lock().pop_front();
			if let Some(item) = item {
				self.shared.writable.notify_one();
				return Some(item);
			}
			if self.shared.is_closed() {
				return None;
			}
			readable.await;
		}
	}
}

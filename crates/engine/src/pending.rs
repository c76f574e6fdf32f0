use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tokio::sync::oneshot;

use crate::error::EngineError;
use crate::protocol::{RequestId, ResponseBody};

pub(crate) type Reply = Result<ResponseBody, EngineError>;

/// In-flight requests keyed by correlation id.
///
/// Every entry is removed exactly once: by its response, by a failed send,
/// or by [`close`](Self::close). After `close`, new entries are refused with
/// the recorded reason.
#[derive(Default)]
pub(crate) struct PendingTable {
	inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
	waiters: FxHashMap<RequestId, oneshot::Sender<Reply>>,
	closed: Option<EngineError>,
}

impl PendingTable {
	pub(crate) fn register(&self, id: RequestId) -> Result<oneshot::Receiver<Reply>, EngineError> {
		let mut inner = self.inner.lock();
		if let Some(reason) = &inner.closed {
			return Err(reason.clone());
		}
		let (tx, rx) = oneshot::channel();
		inner.waiters.insert(id, tx);
		Ok(rx)
	}

	pub(crate) fn take(&self, id: RequestId) -> Option<oneshot::Sender<Reply>> {
		self.inner.lock().waiters.remove(&id)
	}

	pub(crate) fn len(&self) -> usize {
		self.inner.lock().waiters.len()
	}

	/// Reason recorded by the first [`close`](Self::close), if any.
	pub(crate) fn closed(&self) -> Option<EngineError> {
		self.inner.lock().closed.clone()
	}

	/// Rejects every waiter with `reason` and refuses new ones. The first
	/// reason sticks; later calls only drain. Returns how many were rejected.
	pub(crate) fn close(&self, reason: EngineError) -> usize {
		let (waiters, reason) = {
			let mut inner = self.inner.lock();
			let reason = inner.closed.get_or_insert(reason).clone();
			(std::mem::take(&mut inner.waiters), reason)
		};
		let rejected = waiters.len();
		for (_, tx) in waiters {
			let _ = tx.send(Err(reason.clone()));
		}
		rejected
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn close_rejects_waiters_and_refuses_new_ones() {
		let table = PendingTable::default();
		let first = table.register(1).unwrap();
		let second = table.register(2).unwrap();
		assert_eq!(table.len(), 2);

		assert_eq!(table.close(EngineError::Destroyed), 2);
		assert_eq!(table.len(), 0);
		assert_eq!(first.await.unwrap().err(), Some(EngineError::Destroyed));
		assert_eq!(second.await.unwrap().err(), Some(EngineError::Destroyed));
		assert_eq!(table.register(3).err(), Some(EngineError::Destroyed));
	}

	#[test]
	fn first_close_reason_sticks() {
		let table = PendingTable::default();
		table.close(EngineError::WorkerFailed("boom".into()));
		table.close(EngineError::Destroyed);
		assert_eq!(table.closed(), Some(EngineError::WorkerFailed("boom".into())));
	}

	#[test]
	fn take_removes_once() {
		let table = PendingTable::default();
		let _rx = table.register(7).unwrap();
		assert!(table.take(7).is_some());
		assert!(table.take(7).is_none());
		assert_eq!(table.len(), 0);
	}
}

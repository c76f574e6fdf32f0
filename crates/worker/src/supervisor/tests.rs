use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use super::*;
use crate::MailboxSendError;

/// Emits the running sum of every command; a zero command stops it.
#[derive(Default)]
struct RunningSum(u32);

#[async_trait]
impl WorkerActor for RunningSum {
	type Cmd = u32;
	type Evt = u32;

	async fn handle(&mut self, cmd: u32, ctx: &mut ActorContext<u32>) -> Result<ActorFlow, String> {
		if cmd == 0 {
			return Ok(ActorFlow::Stop);
		}
		self.0 += cmd;
		ctx.emit(self.0);
		Ok(ActorFlow::Continue)
	}
}

/// Announces each command, then sleeps far past any test timeout.
struct Stuck {
	stopped: Arc<AtomicBool>,
}

#[async_trait]
impl WorkerActor for Stuck {
	type Cmd = ();
	type Evt = &'static str;

	async fn handle(&mut self, _cmd: (), ctx: &mut ActorContext<&'static str>) -> Result<ActorFlow, String> {
		ctx.emit("busy");
		tokio::time::sleep(Duration::from_secs(60)).await;
		Ok(ActorFlow::Continue)
	}

	async fn on_stop(&mut self, _ctx: &mut ActorContext<&'static str>) {
		self.stopped.store(true, Ordering::SeqCst);
	}
}

/// Spawns a [`Stuck`] actor and waits until it is inside its handler.
async fn stuck_actor(name: &str) -> (ActorHandle<()>, ActorEvents<&'static str>, Arc<AtomicBool>) {
	let stopped = Arc::new(AtomicBool::new(false));
	let stuck = Stuck { stopped: Arc::clone(&stopped) };
	let (handle, mut events) = spawn_supervised_actor(ActorSpec::new(name, TaskClass::Background, stuck));
	handle.send(()).await.unwrap();
	let busy = tokio::time::timeout(Duration::from_secs(2), events.recv()).await;
	assert_eq!(busy.ok().flatten(), Some("busy"));
	(handle, events, stopped)
}

async fn wait_exit(handle: &ActorHandle<impl Send + 'static>) -> ActorExit {
	let mut exit = handle.watch_exit();
	let exit = tokio::time::timeout(Duration::from_secs(2), exit.wait_for(Option::is_some))
		.await
		.expect("supervisor should publish an exit")
		.expect("exit sender alive");
	exit.clone().unwrap()
}

#[tokio::test]
async fn events_follow_command_order() {
	let (handle, mut events) = spawn_supervised_actor(ActorSpec::new("sum", TaskClass::Interactive, RunningSum::default()));
	for cmd in [3, 4, 5, 0] {
		handle.send(cmd).await.unwrap();
	}

	assert_eq!(events.recv().await, Some(3));
	assert_eq!(events.recv().await, Some(7));
	assert_eq!(events.recv().await, Some(12));
	assert_eq!(wait_exit(&handle).await.kind(), ActorExitKind::Stopped);
}

#[tokio::test]
async fn no_event_is_lost_behind_a_slow_reader() {
	let (handle, mut events) = spawn_supervised_actor(ActorSpec::new("backlog", TaskClass::Interactive, RunningSum::default()).mailbox_capacity(1));
	for _ in 0..200 {
		handle.send(1).await.unwrap();
	}
	handle.send(0).await.unwrap();
	wait_exit(&handle).await;

	let mut received = Vec::new();
	while let Some(sum) = events.recv().await {
		received.push(sum);
	}
	assert_eq!(received, (1..=200).collect::<Vec<u32>>());
}

#[tokio::test]
async fn event_stream_ends_after_the_exit_is_published() {
	let (handle, mut events) = spawn_supervised_actor(ActorSpec::new("order", TaskClass::Interactive, RunningSum::default()));
	handle.send(2).await.unwrap();
	handle.send(0).await.unwrap();

	assert_eq!(events.recv().await, Some(2));
	let end = tokio::time::timeout(Duration::from_secs(2), events.recv()).await;
	assert_eq!(end.ok(), Some(None));
	assert_eq!(handle.exit().map(|exit| exit.kind()), Some(ActorExitKind::Stopped));
}

#[tokio::test]
async fn graceful_shutdown_drains_queued_commands() {
	let (handle, mut events) = spawn_supervised_actor(ActorSpec::new("drain", TaskClass::Interactive, RunningSum::default()));
	handle.send(1).await.unwrap();
	handle.send(2).await.unwrap();

	let report = handle.shutdown(ShutdownMode::Graceful { timeout: Duration::from_secs(1) }).await;
	assert!(report.completed());
	assert_eq!(report.exit().map(ActorExit::kind), Some(ActorExitKind::MailboxClosed));
	assert_eq!(events.recv().await, Some(1));
	assert_eq!(events.recv().await, Some(3));
	assert_eq!(handle.send(4).await, Err(MailboxSendError));
}

#[tokio::test]
async fn handler_errors_end_the_actor() {
	struct Rejecting;

	#[async_trait]
	impl WorkerActor for Rejecting {
		type Cmd = ();
		type Evt = ();

		async fn handle(&mut self, _cmd: (), _ctx: &mut ActorContext<()>) -> Result<ActorFlow, String> {
			Err("rejected".to_string())
		}
	}

	let (handle, mut events) = spawn_supervised_actor(ActorSpec::new("rejecting", TaskClass::Background, Rejecting));
	assert!(handle.exit().is_none());

	handle.send(()).await.unwrap();
	let exit = wait_exit(&handle).await;
	assert_eq!(exit.kind(), ActorExitKind::HandlerFailed);
	assert_eq!(exit.message(), Some("rejected"));
	assert!(exit.is_failure());
	assert_eq!(events.recv().await, None);
	assert_eq!(handle.send(()).await, Err(MailboxSendError));
}

#[tokio::test]
async fn panics_are_reported_with_their_message() {
	struct Panics;

	#[async_trait]
	impl WorkerActor for Panics {
		type Cmd = ();
		type Evt = ();

		async fn handle(&mut self, _cmd: (), _ctx: &mut ActorContext<()>) -> Result<ActorFlow, String> {
			panic!("index out of range");
		}
	}

	let (handle, _events) = spawn_supervised_actor(ActorSpec::new("panics", TaskClass::Background, Panics));
	handle.send(()).await.unwrap();

	let exit = wait_exit(&handle).await;
	assert_eq!(exit.kind(), ActorExitKind::Panicked);
	assert_eq!(exit.message(), Some("index out of range"));
}

#[tokio::test]
async fn immediate_shutdown_interrupts_a_busy_handler() {
	let (handle, _events, stopped) = stuck_actor("immediate").await;

	let report = tokio::time::timeout(Duration::from_millis(500), handle.shutdown(ShutdownMode::Immediate))
		.await
		.expect("shutdown should not hang");
	assert!(report.completed());
	assert_eq!(report.exit().map(ActorExit::kind), Some(ActorExitKind::Cancelled));
	assert!(stopped.load(Ordering::SeqCst), "on_stop runs after cancellation");
}

#[tokio::test]
async fn graceful_timeout_cancels_a_busy_handler() {
	let (handle, _events, stopped) = stuck_actor("timeout").await;

	let report = handle.shutdown(ShutdownMode::Graceful { timeout: Duration::from_millis(10) }).await;
	assert!(report.timed_out());
	assert_eq!(wait_exit(&handle).await.kind(), ActorExitKind::Cancelled);
	assert!(stopped.load(Ordering::SeqCst));
}

#[tokio::test]
async fn graceful_or_force_escalates_to_immediate() {
	let (handle, _events, _) = stuck_actor("escalate").await;

	let report = tokio::time::timeout(Duration::from_secs(2), handle.shutdown_graceful_or_force(Duration::from_millis(10)))
		.await
		.expect("forced shutdown should not hang");
	assert!(report.completed());
	assert_eq!(report.exit().map(ActorExit::kind), Some(ActorExitKind::Cancelled));
}

#[tokio::test]
async fn cancelled_actor_rejects_sends_without_waiting() {
	let (handle, _events) = spawn_supervised_actor(ActorSpec::new("cancel", TaskClass::Background, RunningSum::default()).mailbox_capacity(1));
	handle.cancel();
	assert!(handle.is_cancelled());

	let sent = tokio::time::timeout(Duration::from_millis(50), handle.send(1)).await;
	assert_eq!(sent.ok(), Some(Err(MailboxSendError)));
	assert_eq!(wait_exit(&handle).await.kind(), ActorExitKind::Cancelled);
}

#[tokio::test]
async fn concurrent_shutdowns_both_return() {
	let (handle, _events, _) = stuck_actor("concurrent").await;
	let handle = Arc::new(handle);

	let other = Arc::clone(&handle);
	let first = tokio::spawn(async move { other.shutdown(ShutdownMode::Immediate).await });
	let second = tokio::time::timeout(Duration::from_secs(2), handle.shutdown(ShutdownMode::Immediate))
		.await
		.expect("second shutdown should not hang");

	assert!(second.completed());
	assert!(first.await.unwrap().completed());
}

#[tokio::test]
async fn dropping_the_handle_cancels_the_actor() {
	let (handle, _events, stopped) = stuck_actor("dropped").await;
	let mut exit = handle.watch_exit();
	drop(handle);

	let finished = tokio::time::timeout(Duration::from_secs(2), exit.wait_for(Option::is_some)).await;
	assert!(finished.is_ok());
	assert!(stopped.load(Ordering::SeqCst));
}

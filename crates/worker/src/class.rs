/// Execution classes used for worker scheduling and trace output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskClass {
	/// Work a user is waiting on, such as a filter evaluation after a click.
	Interactive,
	/// Plumbing that may lag behind, such as response routing.
	Background,
	/// CPU-heavy work such as rebuilding the trait index.
	CpuBlocking,
}

impl TaskClass {
	pub(crate) const fn as_str(self) -> &'static str {
		match self {
			Self::Interactive => "interactive",
			Self::Background => "background",
			Self::CpuBlocking => "cpu_blocking",
		}
	}
}

impl std::fmt::Display for TaskClass {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Where a pipeline is in its page loop.
///
/// `Idle → Scanning → Distributing → (Scanning | Done)`, with any state able
/// to fall into `Terminated` on error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Scanning,
    Distributing,
    Done,
    Terminated,
}

impl PipelineState {
    pub fn is_final(&self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Terminated)
    }
}

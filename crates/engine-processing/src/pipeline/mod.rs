use crate::error::RunFailure;
use engine_core::{
    connectors::{sink::set::SinkSet, source::Scanner},
    context::run::RunContext,
    error::PipelineError,
};
use model::pagination::{cursor::PageCursor, page::Page};
use tracing::{error, info};

pub mod state;

pub use state::PipelineState;

/// Drives a [`Scanner`] page by page and hands every page to a [`SinkSet`].
///
/// Pages are strictly sequential: the next page is only requested once every
/// sink is done with the current one. The loop ends when the source stops
/// returning a continuation token, and only then.
pub struct Pipeline {
    scanner: Scanner,
    sinks: SinkSet,
    cursor: PageCursor,
    state: PipelineState,
}

impl Pipeline {
    pub fn new(scanner: Scanner, sinks: SinkSet) -> Self {
        let cursor = scanner.start();
        Pipeline {
            scanner,
            sinks,
            cursor,
            state: PipelineState::Idle,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn cursor(&self) -> &PageCursor {
        &self.cursor
    }

    pub fn sinks(&self) -> &SinkSet {
        &self.sinks
    }

    /// Processes one page and returns the state reached.
    ///
    /// Counters in `ctx` are updated for the page, including records a sink
    /// wrote before failing. Once the pipeline is `Done` or `Terminated` this
    /// is a no-op.
    pub async fn step(&mut self, ctx: &mut RunContext) -> Result<PipelineState, PipelineError> {
        match self.state {
            PipelineState::Done | PipelineState::Terminated => return Ok(self.state),
            PipelineState::Idle => {
                self.cursor = self.scanner.start();
                self.state = PipelineState::Scanning;
            }
            // A step abandoned mid-distribution never advanced the cursor, so
            // the same page is fetched again.
            PipelineState::Scanning | PipelineState::Distributing => {
                self.state = PipelineState::Scanning;
            }
        }

        let page_index = self.cursor.page_index();
        let response = match self.scanner.fetch_page(&self.cursor).await {
            Ok(response) => response,
            Err(e) => {
                self.state = PipelineState::Terminated;
                return Err(e);
            }
        };

        self.state = PipelineState::Distributing;
        ctx.record_page(response.records.len());

        let has_next = !response.is_last();
        let page = Page::new(page_index, response.records);
        let mut failure = None;

        for outcome in self.sinks.distribute(&page).await {
            match outcome.result {
                Ok(written) => ctx.record_write(&outcome.sink, &written),
                Err(e) => {
                    ctx.record_partial_write(&outcome.sink, e.records_written(), e.output_dir());
                    if failure.is_none() {
                        failure = Some(PipelineError::from_sink(&outcome.sink, page_index, e));
                    }
                }
            }
        }

        if let Some(err) = failure {
            self.state = PipelineState::Terminated;
            return Err(err);
        }

        info!(
            page = page_index,
            records = page.len(),
            has_next,
            "Saved page"
        );

        self.cursor.advance(response.next);
        self.state = if self.cursor.is_exhausted() {
            PipelineState::Done
        } else {
            PipelineState::Scanning
        };

        Ok(self.state)
    }

    /// Runs to completion. On failure the error comes back together with the
    /// counters accumulated so far.
    pub async fn run(mut self, mut ctx: RunContext) -> Result<RunContext, RunFailure> {
        info!(
            run_id = %ctx.run_id,
            label = %ctx.label,
            source = %self.scanner.location(),
            page_size = self.scanner.page_size().get(),
            sinks = ?self.sinks.names(),
            mode = ?self.sinks.mode(),
            "Starting export"
        );

        loop {
            match self.step(&mut ctx).await {
                Ok(PipelineState::Done) => break,
                Ok(_) => continue,
                Err(error) => {
                    error!(
                        run_id = %ctx.run_id,
                        pages = ctx.pages_scanned,
                        records_written = ctx.records_written(),
                        error = %error,
                        "Export failed"
                    );
                    return Err(RunFailure {
                        context: ctx,
                        error,
                    });
                }
            }
        }

        info!(
            run_id = %ctx.run_id,
            pages = ctx.pages_scanned,
            records_scanned = ctx.records_scanned,
            records_written = ctx.records_written(),
            "No more data. Done."
        );

        Ok(ctx)
    }
}

use anyhow::Result;
use studytime::{cli::run_cli, utils::runtime::single_thread_runtime};
use tracing::error;

fn main() -> Result<()> {
    let runtime = single_thread_runtime()?;
    let result = runtime.block_on(run_cli());
    // Stdin is read on a blocking thread that can't be cancelled, so don't wait for it.
    runtime.shutdown_background();
    result.inspect_err(|e| {
        error!("Error running tracker {e:?}");
    })
}

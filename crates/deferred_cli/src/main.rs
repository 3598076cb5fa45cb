use std::fs;
use std::path::PathBuf;

use anyhow::bail;
use clap::Parser;
use deferred_value::{Deferred, Fault, Produced, Scheduler, TurnQueue};
use tracing::debug;

use crate::opts::Opts;

mod logging;
mod opts;

fn main() -> anyhow::Result<()> {
    let opts = Opts::parse();

    logging::configure_tracing(opts.verbose)?;

    let queue = TurnQueue::new();

    let contents = read_file(&queue, opts.path);

    contents.then(|data| {
        println!("{}", data);
        Ok(Produced::none())
    });
    contents.finally(|| debug!("read settled"));

    let turns = queue.run_until_idle();
    debug!("queue idle. turns: {}", turns);

    if contents.is_rejected() {
        bail!(
            "unable to read file: {}",
            contents.payload().unwrap_or_default()
        );
    }

    Ok(())
}

/// Wraps a blocking file read in a root deferred value; the read happens
/// when the scheduler runs the computation, not here.
fn read_file<S>(scheduler: &S, path: PathBuf) -> Deferred
where
    S: Scheduler + ?Sized,
{
    Deferred::new(scheduler, move |fulfill, reject| {
        match fs::read_to_string(&path) {
            Ok(data) => fulfill.call(data),
            Err(error) => reject.call(Fault::new(error.to_string())),
        }
        Ok(())
    })
}

use std::time::Duration;

use clap::Parser;

use sitter::common::cli::RootOptions;
use sitter::common::setup::setup_logging;
use sitter::monitor::markers::Markers;
use sitter::monitor::process::{Monitor, MonitorConfig};
use sitter::scheduler::slurm::{JobRequest, SlurmQueue, SlurmSubmitter, derive_job_name};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let opts = RootOptions::parse();
    setup_logging(opts.debug);

    let request = JobRequest {
        job_name: derive_job_name(&opts.output_prefix, opts.job_name.as_deref()),
        output_prefix: opts.output_prefix.clone(),
        queue: opts.queue,
        resources: opts.resources,
        command_script: opts.command_script,
    };
    let config = MonitorConfig {
        sleep_time: Duration::from_secs(opts.sleep_time),
        crashcheck_interval: Duration::from_secs(opts.crashcheck_interval),
        crashcheck_attempts: opts.crashcheck_attempts,
        error_resub_limit: opts.error_resub_limit,
    };
    let monitor = Monitor::new(
        config,
        Markers::new(&opts.output_prefix),
        Box::new(SlurmSubmitter::new(request)),
        Box::new(SlurmQueue),
    );

    match monitor.run().await {
        Ok(outcome) => std::process::exit(outcome.exit_code()),
        Err(error) => {
            log::error!("{error:?}");
            std::process::exit(1);
        }
    }
}

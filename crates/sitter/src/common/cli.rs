use std::path::PathBuf;

use clap::Parser;

/// Submits a batch job to Slurm and blocks until it terminally succeeds or
/// fails, resubmitting crashed or stuck attempts along the way.
///
/// Exit code 0 means the job wrote its success marker, 2 means it wrote its
/// fail marker; any other termination is a monitoring failure.
#[derive(Parser, Debug)]
#[command(name = "sitter", version)]
pub struct RootOptions {
    /// Base path for the marker files and the scheduler stdout/stderr logs
    #[arg(long)]
    pub output_prefix: String,

    /// Scheduler job name; derived from the output prefix when not given
    #[arg(long)]
    pub job_name: Option<String>,

    /// Resource request appended to the submission command
    #[arg(long, default_value = "--time=2:00:00 --mem=17g")]
    pub resources: String,

    /// Slurm partition to submit into
    #[arg(long, default_value = "norm")]
    pub queue: String,

    /// Script submitted as the body of the job
    #[arg(long)]
    pub command_script: PathBuf,

    /// Seconds between marker file checks
    #[arg(long, default_value_t = 10)]
    pub sleep_time: u64,

    /// Seconds of polling between queue-based crash checks
    #[arg(long, default_value_t = 3600)]
    pub crashcheck_interval: u64,

    /// Consecutive failed queue queries tolerated before giving up
    #[arg(long, default_value_t = 10)]
    pub crashcheck_attempts: u32,

    /// Resubmissions allowed for jobs stuck in a scheduler error state
    #[arg(long, default_value_t = 3)]
    pub error_resub_limit: u32,

    /// Enables more detailed log output
    #[arg(long, env = "SITTER_DEBUG")]
    pub debug: bool,
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use crate::common::cli::RootOptions;

    fn parse(args: &[&str]) -> RootOptions {
        RootOptions::try_parse_from(
            ["sitter"]
                .into_iter()
                .chain(args.iter().copied())
                .collect::<Vec<_>>(),
        )
        .unwrap()
    }

    #[test]
    fn defaults() {
        let opts = parse(&[
            "--output-prefix",
            "/data/run/chr1",
            "--command-script",
            "/data/run/chr1.sh",
        ]);
        assert_eq!(opts.resources, "--time=2:00:00 --mem=17g");
        assert_eq!(opts.queue, "norm");
        assert_eq!(opts.sleep_time, 10);
        assert_eq!(opts.crashcheck_interval, 3600);
        assert_eq!(opts.crashcheck_attempts, 10);
        assert_eq!(opts.error_resub_limit, 3);
        assert_eq!(opts.job_name, None);
        assert!(!opts.debug);
    }

    #[test]
    fn output_prefix_is_required() {
        assert!(RootOptions::try_parse_from(["sitter", "--command-script", "x.sh"]).is_err());
    }

    #[test]
    fn overrides() {
        let opts = parse(&[
            "--output-prefix",
            "/data/run/chr1",
            "--command-script",
            "/data/run/chr1.sh",
            "--job-name",
            "impute",
            "--queue",
            "quick",
            "--sleep-time",
            "1",
            "--error-resub-limit",
            "0",
        ]);
        assert_eq!(opts.job_name.as_deref(), Some("impute"));
        assert_eq!(opts.queue, "quick");
        assert_eq!(opts.sleep_time, 1);
        assert_eq!(opts.error_resub_limit, 0);
    }
}

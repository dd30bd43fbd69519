use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use crate::scheduler::common::run_checked;
use crate::scheduler::{
    JobId, QueueInspector, QueueSnapshot, SchedulerError, SchedulerResult, Submission, Submitter,
};

/// Status code reported by the queue listing for jobs stuck in an error
/// state (e.g. `Eqw`); every other code counts as healthy.
const ERROR_STATE: &str = "E";

/// Fallback job name when the derived name degenerates to nothing.
const DEFAULT_JOB_NAME: &str = "bash";

/// Derives the scheduler job name: the explicit name if given, otherwise the
/// last path segment of the output prefix. Leading digits are stripped in
/// either case (job names must not start with a digit); an empty result
/// falls back to [`DEFAULT_JOB_NAME`].
pub fn derive_job_name(output_prefix: &str, explicit: Option<&str>) -> String {
    let name = match explicit {
        Some(name) => name,
        None => output_prefix.rsplit('/').next().unwrap_or(output_prefix),
    };
    let name = name.trim_start_matches(|c: char| c.is_ascii_digit());
    if name.is_empty() {
        DEFAULT_JOB_NAME.to_string()
    } else {
        name.to_string()
    }
}

/// Everything needed to build the `sbatch` invocation of one job. Fixed at
/// startup; every (re)submission reuses the same command line.
#[derive(Debug, Clone)]
pub struct JobRequest {
    /// Base path of the marker files and the scheduler stdout/stderr logs.
    pub output_prefix: String,
    pub job_name: String,
    /// Slurm partition.
    pub queue: String,
    /// Raw resource request, split on whitespace into `sbatch` arguments.
    pub resources: String,
    pub command_script: PathBuf,
}

impl JobRequest {
    /// The full submission command line. `--no-requeue` keeps Slurm from
    /// restarting the job on its own; crash recovery belongs to the monitor.
    pub fn sbatch_arguments(&self) -> Vec<String> {
        let mut arguments = vec![
            "sbatch".to_string(),
            "--output".to_string(),
            format!("{}.output", self.output_prefix),
            "--error".to_string(),
            format!("{}.error", self.output_prefix),
            "--partition".to_string(),
            self.queue.clone(),
            "--job-name".to_string(),
            self.job_name.clone(),
        ];
        arguments.extend(self.resources.split_whitespace().map(String::from));
        arguments.push("--no-requeue".to_string());
        arguments.push(self.command_script.display().to_string());
        arguments
    }
}

pub struct SlurmSubmitter {
    request: JobRequest,
}

impl SlurmSubmitter {
    pub fn new(request: JobRequest) -> Self {
        Self { request }
    }
}

impl Submitter for SlurmSubmitter {
    fn submit(&self) -> Pin<Box<dyn Future<Output = SchedulerResult<Submission>>>> {
        let arguments = self.request.sbatch_arguments();
        Box::pin(async move {
            let output = run_checked(&arguments)
                .await
                .map_err(SchedulerError::Submission)?;
            let job_id = parse_job_id(&output)?;
            Ok(Submission { job_id, output })
        })
    }
}

/// Queue access through the `sjobs` listing and `scancel`.
pub struct SlurmQueue;

impl QueueInspector for SlurmQueue {
    fn list_jobs(&self) -> Pin<Box<dyn Future<Output = SchedulerResult<QueueSnapshot>>>> {
        Box::pin(async move {
            let output = run_checked(&["sjobs".to_string()])
                .await
                .map_err(SchedulerError::Inspection)?;
            parse_queue_listing(&output)
        })
    }

    fn kill(&self, job_id: JobId) -> Pin<Box<dyn Future<Output = SchedulerResult<()>>>> {
        let arguments = vec!["scancel".to_string(), job_id.to_string()];
        Box::pin(async move {
            run_checked(&arguments).await.map_err(SchedulerError::Kill)?;
            Ok(())
        })
    }
}

/// Extracts the job id echoed by `sbatch`: the leading digits of the first
/// token of the output.
fn parse_job_id(output: &str) -> SchedulerResult<JobId> {
    let trimmed = output.trim_start();
    let end = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    trimmed[..end].parse().map_err(|_| {
        SchedulerError::Submission(format!("missing job id in sbatch output {output:?}"))
    })
}

/// Parses the `sjobs` output: one header line, then data lines with at least
/// five whitespace-separated fields, the job id in the second and the status
/// code in the fifth.
fn parse_queue_listing(output: &str) -> SchedulerResult<QueueSnapshot> {
    let mut snapshot = QueueSnapshot::new();
    for line in output.lines().skip(1) {
        if line.trim().is_empty() {
            continue;
        }
        let malformed = || SchedulerError::Parse(format!("malformed sjobs line {line:?}"));
        let mut fields = line.split_whitespace();
        let job_id: JobId = fields
            .nth(1)
            .ok_or_else(malformed)?
            .parse()
            .map_err(|_| malformed())?;
        let status = fields.nth(2).ok_or_else(malformed)?;
        snapshot.insert(job_id, status != ERROR_STATE);
    }
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use crate::scheduler::SchedulerError;
    use crate::scheduler::slurm::{
        JobRequest, derive_job_name, parse_job_id, parse_queue_listing,
    };

    #[test]
    fn job_id_from_bare_number() {
        assert_eq!(parse_job_id("48293155").unwrap(), 48293155);
        assert_eq!(parse_job_id("  48293155\n").unwrap(), 48293155);
    }

    #[test]
    fn job_id_ignores_trailing_text() {
        assert_eq!(parse_job_id("123 cn3144").unwrap(), 123);
        assert_eq!(parse_job_id("123abc").unwrap(), 123);
    }

    #[test]
    fn job_id_requires_leading_digits() {
        assert!(matches!(
            parse_job_id("Submitted batch job 123"),
            Err(SchedulerError::Submission(_))
        ));
        assert!(parse_job_id("").is_err());
        assert!(parse_job_id("   \n").is_err());
    }

    #[test]
    fn queue_listing_maps_status() {
        let output = "User     JobId    Name         Part  St  Reason  Runtime  Walltime  Nodes
palmerc  123456   chr1_impute  norm  R   ---     1:23:45  2:00:00   1
palmerc  123457   chr2_impute  norm  PD  ---     0:00     2:00:00   1

palmerc  123458   chr3_impute  norm  E   ---     0:00     2:00:00   1
";
        let snapshot = parse_queue_listing(output).unwrap();
        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot.get(&123456), Some(&true));
        assert_eq!(snapshot.get(&123457), Some(&true));
        assert_eq!(snapshot.get(&123458), Some(&false));
        assert_eq!(snapshot.get(&999999), None);
    }

    #[test]
    fn queue_listing_empty_is_valid() {
        assert!(parse_queue_listing("").unwrap().is_empty());
        assert!(
            parse_queue_listing("User JobId Name Part St\n")
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn queue_listing_rejects_malformed_lines() {
        let output = "User JobId Name Part St\npalmerc 123456 chr1\n";
        let error = parse_queue_listing(output).unwrap_err();
        assert!(matches!(error, SchedulerError::Parse(_)));
        assert!(error.to_string().contains("palmerc 123456 chr1"));

        let output = "User JobId Name Part St\npalmerc notanid chr1 norm R\n";
        assert!(parse_queue_listing(output).is_err());
    }

    #[test]
    fn derives_name_from_prefix() {
        assert_eq!(derive_job_name("/data/run/chr1_impute", None), "chr1_impute");
        assert_eq!(derive_job_name("chr1_impute", None), "chr1_impute");
    }

    #[test]
    fn derived_name_strips_leading_digits() {
        assert_eq!(derive_job_name("/data/run/22_impute", None), "_impute");
        assert_eq!(derive_job_name("/data/run/2022", None), "bash");
        assert_eq!(derive_job_name("/data/run/", None), "bash");
    }

    #[test]
    fn explicit_name_wins_but_is_still_sanitized() {
        assert_eq!(derive_job_name("/data/run/chr1", Some("impute")), "impute");
        assert_eq!(derive_job_name("/data/run/chr1", Some("22x")), "x");
    }

    #[test]
    fn sbatch_command_shape() {
        let request = JobRequest {
            output_prefix: "/data/run/chr1".to_string(),
            job_name: "chr1".to_string(),
            queue: "norm".to_string(),
            resources: "--time=2:00:00 --mem=17g".to_string(),
            command_script: PathBuf::from("/data/run/chr1.sh"),
        };
        assert_eq!(
            request.sbatch_arguments(),
            vec![
                "sbatch",
                "--output",
                "/data/run/chr1.output",
                "--error",
                "/data/run/chr1.error",
                "--partition",
                "norm",
                "--job-name",
                "chr1",
                "--time=2:00:00",
                "--mem=17g",
                "--no-requeue",
                "/data/run/chr1.sh",
            ]
        );
    }
}

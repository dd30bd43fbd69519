use std::process::Output;

use tokio::process::Command;

pub fn create_command(arguments: &[String]) -> Command {
    let mut command = Command::new(&arguments[0]);
    command.args(&arguments[1..]);
    command
}

pub fn check_command_output(output: Output) -> Result<Output, String> {
    let status = output.status;
    if !status.success() {
        return Err(format!(
            "exit code: {}\nstderr: {}\nstdout: {}",
            status.code().unwrap_or(-1),
            String::from_utf8_lossy(&output.stderr).trim(),
            String::from_utf8_lossy(&output.stdout).trim()
        ));
    }
    Ok(output)
}

/// Runs an external command to completion and returns its captured stdout.
/// The error string names the failing command.
pub async fn run_checked(arguments: &[String]) -> Result<String, String> {
    log::debug!("Running command `{}`", arguments.join(" "));
    let output = create_command(arguments)
        .output()
        .await
        .map_err(|error| format!("cannot start `{}`: {error}", arguments[0]))?;
    let output = check_command_output(output)
        .map_err(|error| format!("`{}` failed: {error}", arguments.join(" ")))?;
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

//! Deployment hook: runs a shell command in the background.

use sha2::{Digest, Sha256};
use tokio::process::Command;
use tokio::task::JoinHandle;

use crate::config::DeployConfig;

/// Compare a presented secret with the configured one without leaking the
/// position of the first differing byte.
pub fn secret_matches(expected: &str, presented: &str) -> bool {
    let a = Sha256::digest(expected.as_bytes());
    let b = Sha256::digest(presented.as_bytes());
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Spawn the deploy command via `sh -c` in the configured directory.
///
/// Output is logged when the command finishes; the caller does not wait.
pub fn spawn_deploy(config: &DeployConfig) -> JoinHandle<()> {
    let command = config.command.clone();
    let dir = config.dir.clone();

    tokio::spawn(async move {
        tracing::info!(%command, %dir, "Deployment started");
        let result = Command::new("sh")
            .arg("-c")
            .arg(&command)
            .current_dir(&dir)
            .output()
            .await;

        match result {
            Ok(output) if output.status.success() => {
                tracing::info!(
                    stdout = %String::from_utf8_lossy(&output.stdout),
                    "Deployment finished"
                );
            }
            Ok(output) => {
                tracing::error!(
                    code = ?output.status.code(),
                    stderr = %String::from_utf8_lossy(&output.stderr),
                    "Deployment command failed"
                );
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to launch deployment command");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_comparison() {
        assert!(secret_matches("s3cret", "s3cret"));
        assert!(!secret_matches("s3cret", "s3cret "));
        assert!(!secret_matches("s3cret", ""));
    }

    #[tokio::test]
    async fn runs_command_in_directory() {
        let config = DeployConfig {
            secret: Some("x".into()),
            dir: ".".into(),
            command: "true".into(),
        };
        spawn_deploy(&config).await.unwrap();
    }
}

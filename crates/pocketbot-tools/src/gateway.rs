//! The device command gateway.
//!
//! All device side effects funnel through one seam: execute an opaque
//! command string, hand back the captured text output. Faults are converted
//! to their message text rather than propagated, so callers always get a
//! string to work with.

use tracing::debug;

#[async_trait::async_trait]
pub trait CommandGateway: Send + Sync {
    async fn invoke(&self, command: &str) -> String;
}

/// Gateway that shells out to the Termux API commands on the device.
pub struct TermuxGateway;

#[async_trait::async_trait]
impl CommandGateway for TermuxGateway {
    async fn invoke(&self, command: &str) -> String {
        debug!(command, "Invoking device command");
        let result = tokio::process::Command::new("sh")
            .arg("-c")
            .arg(command)
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .output()
            .await;

        match result {
            Ok(output) => String::from_utf8_lossy(&output.stdout).trim().to_string(),
            Err(e) => e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invoke_captures_stdout() {
        let gateway = TermuxGateway;
        let output = gateway.invoke("echo pocketbot").await;
        assert_eq!(output, "pocketbot");
    }

    #[tokio::test]
    async fn test_invoke_trims_trailing_newline() {
        let gateway = TermuxGateway;
        let output = gateway.invoke("printf 'a\\nb\\n'").await;
        assert_eq!(output, "a\nb");
    }
}

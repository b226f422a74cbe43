// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Content extraction through an external helper program.

Reading the recording file format is delegated to a helper executable.
It is invoked as

```text
<program> [args...] locations <locator>
<program> [args...] coordinates <locator>
```

and prints one JSON document on stdout:

```text
{"imaging": [...], "electrodes": [...], "icephys": [...]}
{"coordinates": [[x, y, z], ...]}
```

Non-finite coordinate values are written as `null`.
*/

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use brain_atlas_config::{ExtractorConfig, RetryConfig};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::process::Command;
use tracing::trace;

use crate::retry::RetryPolicy;
use crate::traits::ContentExtractor;
use crate::types::*;

#[derive(Debug, Deserialize)]
struct CoordinatesOutput {
    #[serde(default)]
    coordinates: Vec<[Option<f64>; 3]>,
}

/// Runs the configured helper program once per request
#[derive(Debug, Clone)]
pub struct CommandContentExtractor {
    program: String,
    args: Vec<String>,
    timeout: Duration,
    retry: RetryPolicy,
}

impl CommandContentExtractor {
    pub fn new(config: &ExtractorConfig, retry: &RetryConfig) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            retry: RetryPolicy::from(retry),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn run_once<T: DeserializeOwned>(&self, command: &str, locator: &str) -> ServiceResult<T> {
        trace!(
            target: "brain-atlas-services",
            "Running {} {} {}",
            self.program,
            command,
            locator
        );

        let child = Command::new(&self.program)
            .args(&self.args)
            .arg(command)
            .arg(locator)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ServiceError::Extraction(format!("failed to start {}: {}", self.program, e)))?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| ServiceError::Timeout(format!("{} {}", command, locator)))?
            .map_err(|e| ServiceError::Extraction(format!("{} {}: {}", command, locator, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ServiceError::Extraction(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        serde_json::from_slice(&output.stdout)
            .map_err(|e| ServiceError::Extraction(format!("unreadable {} output: {}", command, e)))
    }

    async fn run<T: DeserializeOwned>(&self, command: &str, locator: &str) -> ServiceResult<T> {
        self.retry
            .run(locator, move || self.run_once(command, locator))
            .await
    }
}

#[async_trait]
impl ContentExtractor for CommandContentExtractor {
    async fn extract_locations(&self, locator: &str) -> ServiceResult<LocationSet> {
        self.run("locations", locator).await
    }

    async fn extract_coordinates(&self, locator: &str) -> ServiceResult<Vec<Coordinate>> {
        let output: CoordinatesOutput = self.run("coordinates", locator).await?;
        Ok(output
            .coordinates
            .into_iter()
            .map(|row| row.map(|v| v.unwrap_or(f64::NAN)))
            .collect())
    }
}

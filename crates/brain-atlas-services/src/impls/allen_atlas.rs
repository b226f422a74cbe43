// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Allen Institute reference atlas client: structure ontology and per-structure
meshes.
*/

use std::time::Duration;

use async_trait::async_trait;
use brain_atlas_config::{GeometryConfig, OntologyConfig, RetryConfig};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde_json::Value;
use tracing::info;

use crate::retry::RetryPolicy;
use crate::traits::{GeometrySource, OntologySource};
use crate::types::*;

const STRUCTURE_ID_PLACEHOLDER: &str = "{structure_id}";

/// HTTP client for the ontology download and the mesh archive
#[derive(Debug, Clone)]
pub struct AllenAtlasClient {
    ontology_http: reqwest::Client,
    geometry_http: reqwest::Client,
    structure_graph_url: String,
    mesh_url_template: String,
    retry: RetryPolicy,
}

impl AllenAtlasClient {
    pub fn new(
        ontology: &OntologyConfig,
        geometry: &GeometryConfig,
        retry: &RetryConfig,
    ) -> ServiceResult<Self> {
        let ontology_http = reqwest::Client::builder()
            .timeout(Duration::from_secs(ontology.request_timeout_secs))
            .build()
            .map_err(|e| ServiceError::Transport(format!("http client build failed: {}", e)))?;

        let mut headers = HeaderMap::new();
        let agent = HeaderValue::from_str(&geometry.user_agent)
            .map_err(|e| ServiceError::Transport(format!("invalid user agent: {}", e)))?;
        headers.insert(USER_AGENT, agent);
        let geometry_http = reqwest::Client::builder()
            .timeout(Duration::from_secs(geometry.request_timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| ServiceError::Transport(format!("http client build failed: {}", e)))?;

        Ok(Self {
            ontology_http,
            geometry_http,
            structure_graph_url: ontology.structure_graph_url.clone(),
            mesh_url_template: geometry.mesh_url_template.clone(),
            retry: RetryPolicy::from(retry),
        })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn mesh_url(&self, structure_id: u32) -> String {
        self.mesh_url_template
            .replace(STRUCTURE_ID_PLACEHOLDER, &structure_id.to_string())
    }
}

#[async_trait]
impl OntologySource for AllenAtlasClient {
    async fn fetch_structure_graph(&self) -> ServiceResult<Value> {
        let url = self.structure_graph_url.as_str();
        let http = &self.ontology_http;
        info!(target: "brain-atlas-services", "Fetching structure graph from {}", url);

        let payload: Value = self
            .retry
            .run(url, move || async move {
                let response = http
                    .get(url)
                    .send()
                    .await
                    .map_err(|e| ServiceError::from_reqwest(e, url))?;
                let status = response.status();
                if !status.is_success() {
                    return Err(ServiceError::Http {
                        status: status.as_u16(),
                        url: url.to_string(),
                    });
                }
                response
                    .json::<Value>()
                    .await
                    .map_err(|e| ServiceError::InvalidResponse(format!("{}: {}", url, e)))
            })
            .await?;

        if payload.get("success").and_then(Value::as_bool) == Some(false) {
            return Err(ServiceError::InvalidResponse(format!(
                "{}: service reported failure",
                url
            )));
        }
        Ok(payload)
    }
}

#[async_trait]
impl GeometrySource for AllenAtlasClient {
    async fn fetch_geometry(&self, structure_id: u32) -> ServiceResult<Vec<u8>> {
        let url = self.mesh_url(structure_id);
        let url = url.as_str();
        let http = &self.geometry_http;

        self.retry
            .run(url, move || async move {
                let response = http
                    .get(url)
                    .send()
                    .await
                    .map_err(|e| ServiceError::from_reqwest(e, url))?;
                let status = response.status();
                if status == reqwest::StatusCode::NOT_FOUND {
                    return Err(ServiceError::NotFound {
                        resource: "mesh".to_string(),
                        id: structure_id.to_string(),
                    });
                }
                if !status.is_success() {
                    return Err(ServiceError::Http {
                        status: status.as_u16(),
                        url: url.to_string(),
                    });
                }
                let body = response
                    .bytes()
                    .await
                    .map_err(|e| ServiceError::from_reqwest(e, url))?;
                Ok(body.to_vec())
            })
            .await
    }
}

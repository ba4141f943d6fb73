// src/collab/zones.rs

//! Availability-zone lookup.

use std::sync::Arc;

use anyhow::{Context, anyhow};
use serde::Deserialize;
use tracing::{debug, info};

use crate::errors::{ProvisionError, Result};
use crate::exec::{BoxFuture, ExecutionRequest, ProcessBackend};

/// Zones are spread over at most this many AZs per machine pool.
pub const MAX_ZONES_PER_POOL: usize = 3;

/// Number of zones a pool of `replicas` machines is spread over.
pub fn zone_count(replicas: u32) -> usize {
    (replicas as usize).min(MAX_ZONES_PER_POOL)
}

/// Contract: return up to `count` zone names of `region`, in provider order.
pub trait ZoneLookup: Send + Sync {
    fn list_availability_zones<'a>(
        &'a self,
        region: &'a str,
        count: usize,
    ) -> BoxFuture<'a, Result<Vec<String>>>;
}

/// Fixed zone list from configuration.
#[derive(Debug, Clone)]
pub struct StaticZones {
    zones: Vec<String>,
}

impl StaticZones {
    pub fn new(zones: Vec<String>) -> Self {
        Self { zones }
    }
}

impl ZoneLookup for StaticZones {
    fn list_availability_zones<'a>(
        &'a self,
        _region: &'a str,
        count: usize,
    ) -> BoxFuture<'a, Result<Vec<String>>> {
        let zones: Result<Vec<String>> = if self.zones.is_empty() && count > 0 {
            Err(anyhow!("no availability zones configured").into())
        } else {
            Ok(self.zones.iter().take(count).cloned().collect())
        };
        Box::pin(std::future::ready(zones))
    }
}

/// Asks the `aws` CLI (`ec2 describe-availability-zones`).
pub struct AwsCliZones {
    backend: Arc<dyn ProcessBackend>,
    binary: String,
}

impl AwsCliZones {
    pub fn new(backend: Arc<dyn ProcessBackend>, binary: impl Into<String>) -> Self {
        Self {
            backend,
            binary: binary.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeZonesOutput {
    availability_zones: Vec<ZoneEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ZoneEntry {
    zone_name: String,
    #[serde(default)]
    state: Option<String>,
}

/// Available zone names from `describe-availability-zones` JSON output.
pub fn parse_zone_listing(json: &str) -> Result<Vec<String>> {
    let parsed: DescribeZonesOutput = serde_json::from_str(json)?;
    Ok(parsed
        .availability_zones
        .into_iter()
        .filter(|z| z.state.as_deref().is_none_or(|s| s == "available"))
        .map(|z| z.zone_name)
        .collect())
}

impl AwsCliZones {
    async fn lookup(&self, region: &str, count: usize) -> Result<Vec<String>> {
        let request = ExecutionRequest::command(&self.binary, "ec2", "describe-availability-zones")
            .arg("--region")
            .arg(region)
            .arg("--output")
            .arg("json");

        let result = self.backend.run(&request).await?;
        if !result.success() {
            return Err(ProvisionError::Execution {
                binary: self.binary.clone(),
                result: Box::new(result),
            });
        }

        let mut zones = parse_zone_listing(&result.stdout)
            .map_err(anyhow::Error::from)
            .with_context(|| format!("parsing availability zones for region {region}"))?;
        debug!(region, available = zones.len(), "availability zones listed");

        if zones.is_empty() {
            return Err(anyhow!("no availability zones found for region {region}").into());
        }
        zones.truncate(count);
        info!(region, zones = ?zones, "selected availability zones");
        Ok(zones)
    }
}

impl ZoneLookup for AwsCliZones {
    fn list_availability_zones<'a>(
        &'a self,
        region: &'a str,
        count: usize,
    ) -> BoxFuture<'a, Result<Vec<String>>> {
        Box::pin(self.lookup(region, count))
    }
}

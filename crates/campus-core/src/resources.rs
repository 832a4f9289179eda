//! Resource catalog API client.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::dispatch::{ApiError, RequestDispatcher};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceStatus {
    Active,
    OutOfService,
}

/// A bookable facility or asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub capacity: u32,
    pub location: String,
    pub status: ResourceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability_start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability_end: Option<String>,
}

/// Optional search filters; unset fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceFilters {
    pub kind: Option<String>,
    pub capacity: Option<u32>,
    pub location: Option<String>,
}

impl ResourceFilters {
    fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(kind) = &self.kind {
            query.push(("type", kind.clone()));
        }
        if let Some(capacity) = self.capacity {
            query.push(("capacity", capacity.to_string()));
        }
        if let Some(location) = &self.location {
            query.push(("location", location.clone()));
        }
        query
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResourceAnalytics {
    pub total_resources: u64,
    pub active_resources: u64,
    pub out_of_service_resources: u64,
    pub resources_by_type: BTreeMap<String, u64>,
}

/// Typed calls over the dispatcher. Business rules live in the API.
#[derive(Clone)]
pub struct ResourceClient {
    dispatcher: Arc<RequestDispatcher>,
}

impl ResourceClient {
    pub fn new(dispatcher: Arc<RequestDispatcher>) -> Self {
        Self { dispatcher }
    }

    /// # Errors
    /// See [`ApiError`].
    pub async fn list(&self) -> Result<Vec<Resource>, ApiError> {
        self.dispatcher.get("/resources", &[]).await
    }

    /// # Errors
    /// See [`ApiError`].
    pub async fn get(&self, id: i64) -> Result<Resource, ApiError> {
        self.dispatcher.get(&format!("/resources/{id}"), &[]).await
    }

    /// # Errors
    /// See [`ApiError`].
    pub async fn search(&self, filters: &ResourceFilters) -> Result<Vec<Resource>, ApiError> {
        self.dispatcher
            .get("/resources/search", &filters.to_query())
            .await
    }

    /// # Errors
    /// See [`ApiError`].
    pub async fn create(&self, resource: &Resource) -> Result<Resource, ApiError> {
        self.dispatcher.post("/resources", resource).await
    }

    /// # Errors
    /// See [`ApiError`].
    pub async fn update(&self, id: i64, resource: &Resource) -> Result<Resource, ApiError> {
        self.dispatcher
            .put(&format!("/resources/{id}"), resource)
            .await
    }

    /// # Errors
    /// See [`ApiError`].
    pub async fn delete(&self, id: i64) -> Result<(), ApiError> {
        self.dispatcher.delete(&format!("/resources/{id}")).await
    }

    /// # Errors
    /// See [`ApiError`].
    pub async fn analytics(&self) -> Result<ResourceAnalytics, ApiError> {
        self.dispatcher.get("/resources/analytics", &[]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_uses_api_field_names() {
        let json = r#"{
            "id": 7,
            "name": "Lab 3",
            "type": "LAB",
            "capacity": 40,
            "location": "Block B",
            "status": "OUT_OF_SERVICE",
            "availabilityStart": "08:00",
            "availabilityEnd": null
        }"#;
        let resource: Resource = serde_json::from_str(json).unwrap();

        assert_eq!(resource.id, Some(7));
        assert_eq!(resource.kind, "LAB");
        assert_eq!(resource.status, ResourceStatus::OutOfService);
        assert_eq!(resource.availability_start.as_deref(), Some("08:00"));
        assert!(resource.availability_end.is_none());

        let value = serde_json::to_value(&resource).unwrap();
        assert_eq!(value["type"], "LAB");
        assert_eq!(value["availabilityStart"], "08:00");
    }

    #[test]
    fn test_filters_skip_unset_fields() {
        let filters = ResourceFilters {
            kind: Some("LAB".to_string()),
            capacity: None,
            location: Some("Block B".to_string()),
        };
        assert_eq!(
            filters.to_query(),
            vec![("type", "LAB".to_string()), ("location", "Block B".to_string())]
        );
        assert!(ResourceFilters::default().to_query().is_empty());
    }

    #[test]
    fn test_analytics_tolerates_missing_breakdown() {
        let analytics: ResourceAnalytics =
            serde_json::from_str(r#"{"totalResources":3,"activeResources":2,"outOfServiceResources":1}"#)
                .unwrap();
        assert_eq!(analytics.total_resources, 3);
        assert!(analytics.resources_by_type.is_empty());
    }
}

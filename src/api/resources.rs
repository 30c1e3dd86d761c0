use std::path::Path;

use clap::ValueEnum;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use super::client::{unwrap, ApiClient, ApiResult};
use crate::error::ApiError;

/// Admin collections exposed by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Resource {
    Students,
    Courses,
    Subjects,
    Results,
    Certificates,
    AdmitCards,
    Gallery,
    Franchises,
    Members,
    StudyMaterials,
    Assignments,
    Uploads,
}

impl Resource {
    pub const ALL: [Resource; 12] = [
        Resource::Students,
        Resource::Courses,
        Resource::Subjects,
        Resource::Results,
        Resource::Certificates,
        Resource::AdmitCards,
        Resource::Gallery,
        Resource::Franchises,
        Resource::Members,
        Resource::StudyMaterials,
        Resource::Assignments,
        Resource::Uploads,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            Resource::Students => "/students",
            Resource::Courses => "/courses",
            Resource::Subjects => "/subjects",
            Resource::Results => "/results",
            Resource::Certificates => "/certificates",
            Resource::AdmitCards => "/admit-cards",
            Resource::Gallery => "/gallery",
            Resource::Franchises => "/franchises",
            Resource::Members => "/members",
            Resource::StudyMaterials => "/study-materials",
            Resource::Assignments => "/assignments",
            Resource::Uploads => "/uploads",
        }
    }

    /// Path of one record. The id is sent as a single percent-encoded
    /// segment, so `/`, `?` and `#` in it never reshape the request target.
    pub fn item_path(&self, id: &str) -> Result<String, ApiError> {
        let id = id.trim();
        if id.is_empty() || id == "." || id == ".." {
            return Err(ApiError::invalid_request(format!("Invalid record id '{}'", id)));
        }

        let mut target = Url::parse("http://localhost/")
            .map_err(|e| ApiError::invalid_request(e.to_string()))?;
        target
            .path_segments_mut()
            .map_err(|_| ApiError::invalid_request("Cannot build record path"))?
            .clear()
            .push(self.path().trim_start_matches('/'))
            .push(id);
        Ok(target.path().to_string())
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path().trim_start_matches('/'))
    }
}

/// CRUD over one collection, returning unwrapped payloads
#[derive(Debug, Clone, Copy)]
pub struct ResourceApi<'a> {
    client: &'a ApiClient,
    resource: Resource,
}

impl<'a> ResourceApi<'a> {
    pub fn new(client: &'a ApiClient, resource: Resource) -> Self {
        Self { client, resource }
    }

    pub fn resource(&self) -> Resource {
        self.resource
    }

    pub async fn list(&self) -> ApiResult<Value> {
        unwrap(self.client.get(self.resource.path())).await
    }

    /// List with query parameters (search, pagination, franchise filter, ...)
    pub async fn list_with_query<Q>(&self, query: &Q) -> ApiResult<Value>
    where
        Q: Serialize + ?Sized,
    {
        unwrap(self.client.get_with_query(self.resource.path(), query)).await
    }

    pub async fn fetch(&self, id: &str) -> ApiResult<Value> {
        let path = self.resource.item_path(id)?;
        unwrap(self.client.get(&path)).await
    }

    pub async fn create<B>(&self, body: &B) -> ApiResult<Value>
    where
        B: Serialize + ?Sized,
    {
        unwrap(self.client.post(self.resource.path(), body)).await
    }

    pub async fn update<B>(&self, id: &str, body: &B) -> ApiResult<Value>
    where
        B: Serialize + ?Sized,
    {
        let path = self.resource.item_path(id)?;
        unwrap(self.client.put(&path, body)).await
    }

    pub async fn remove(&self, id: &str) -> ApiResult<Value> {
        let path = self.resource.item_path(id)?;
        unwrap(self.client.delete(&path)).await
    }

    /// Create a record that carries attachments (student photo, documents)
    pub async fn create_multipart(&self, form: Form) -> ApiResult<Value> {
        unwrap(self.client.post_multipart(self.resource.path(), form)).await
    }

    pub async fn update_multipart(&self, id: &str, form: Form) -> ApiResult<Value> {
        let path = self.resource.item_path(id)?;
        unwrap(self.client.put_multipart(&path, form)).await
    }
}

/// Build a multipart part from a file on disk
pub async fn file_part(path: &Path) -> Result<Part, ApiError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| ApiError::invalid_request(format!("Cannot read {}: {}", path.display(), e)))?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());

    Ok(Part::bytes(bytes).file_name(file_name))
}

/// Upload a single file to the uploads endpoint under `field`
pub async fn upload_file(client: &ApiClient, path: &Path, field: &str) -> ApiResult<Value> {
    let part = file_part(path).await?;
    let form = Form::new().part(field.to_string(), part);
    ResourceApi::new(client, Resource::Uploads).create_multipart(form).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_match_backend_routes() {
        assert_eq!(Resource::AdmitCards.path(), "/admit-cards");
        assert_eq!(Resource::StudyMaterials.path(), "/study-materials");
        assert_eq!(Resource::Students.item_path("42").unwrap(), "/students/42");
        assert_eq!(Resource::AdmitCards.item_path(" 65f0c2 ").unwrap(), "/admit-cards/65f0c2");
    }

    #[test]
    fn record_ids_stay_inside_one_segment() {
        assert_eq!(Resource::Students.item_path("1?admin=true").unwrap(), "/students/1%3Fadmin=true");
        assert_eq!(Resource::Students.item_path("1#frag").unwrap(), "/students/1%23frag");
        assert_eq!(Resource::Gallery.item_path("../members").unwrap(), "/gallery/..%2Fmembers");
        assert_eq!(Resource::Courses.item_path("a b").unwrap(), "/courses/a%20b");
    }

    #[test]
    fn blank_or_dot_ids_are_rejected() {
        for id in ["", "   ", ".", ".."] {
            let err = Resource::Students.item_path(id).unwrap_err();
            assert_eq!(err.error_code(), "INVALID_REQUEST");
        }
    }

    #[test]
    fn display_and_value_enum_agree() {
        for resource in Resource::ALL {
            let parsed = Resource::from_str(&resource.to_string(), false).unwrap();
            assert_eq!(parsed, resource);
        }
    }
}

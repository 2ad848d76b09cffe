//! Employee endpoints
//!
//! Writes go out as multipart forms; updates tunnel through `POST` with a
//! `_method=PUT` field.

use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::multipart::{Form, Part};
use serde::de::IgnoredAny;
use shared::request::EmployeeQuery;
use shared::response::EmployeesData;
use shared::{ApiPagination, Employee, PagedEnvelope};

use crate::http::ApiClient;
use crate::{ClientError, ClientResult};

/// Largest accepted photo
pub const MAX_IMAGE_BYTES: usize = 2 * 1024 * 1024;

/// Page size used to look an employee up by id
const LOOKUP_PAGE_SIZE: u32 = 100;

// ============================================================================
// Payloads
// ============================================================================

/// One page of employees
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmployeePage {
    pub employees: Vec<Employee>,
    pub pagination: ApiPagination,
}

/// A photo picked for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    /// MIME type guessed from the file name
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let mime = mime_guess::from_path(&file_name)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Self {
            file_name,
            mime,
            bytes,
        }
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = mime.into();
        self
    }

    /// Read a file from disk
    pub async fn from_path(path: impl AsRef<Path>) -> ClientResult<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        Ok(Self::new(file_name, bytes))
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Must be `image/*` and at most 2 MiB
    pub fn validate(&self) -> ClientResult<()> {
        if !self.mime.starts_with("image/") {
            return Err(ClientError::Validation(
                "File must be an image (JPG, PNG, GIF, etc.)".into(),
            ));
        }
        if self.size() > MAX_IMAGE_BYTES {
            return Err(ClientError::Validation("Maximum file size is 2MB".into()));
        }
        Ok(())
    }

    /// `data:<mime>;base64,...` preview
    pub async fn to_data_url(&self) -> String {
        let file = self.clone();
        let encode = move || format!("data:{};base64,{}", file.mime, STANDARD.encode(&file.bytes));
        match tokio::task::spawn_blocking(encode).await {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(error = %e, "Image preview encoding failed");
                String::new()
            }
        }
    }

    fn to_part(&self) -> ClientResult<Part> {
        Ok(Part::bytes(self.bytes.clone())
            .file_name(self.file_name.clone())
            .mime_str(&self.mime)?)
    }
}

/// Fields of a create / update
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmployeeInput {
    pub name: String,
    pub phone: String,
    /// Division id
    pub division: String,
    pub position: String,
    pub image: Option<ImageFile>,
}

impl EmployeeInput {
    /// Multipart body; blank phone and missing image are left out
    pub fn to_form(&self) -> ClientResult<Form> {
        let mut form = Form::new().text("name", self.name.clone());
        if !self.phone.is_empty() {
            form = form.text("phone", self.phone.clone());
        }
        form = form
            .text("division", self.division.clone())
            .text("position", self.position.clone());
        if let Some(image) = &self.image {
            form = form.part("image", image.to_part()?);
        }
        Ok(form)
    }
}

// ============================================================================
// Service
// ============================================================================

#[derive(Debug, Clone)]
pub struct EmployeeService {
    api: ApiClient,
}

impl EmployeeService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// GET /employees
    pub async fn list(&self, query: &EmployeeQuery) -> ClientResult<EmployeePage> {
        let resp: PagedEnvelope<EmployeesData> =
            self.api.get_with_query("employees", query).await?;
        Ok(EmployeePage {
            employees: resp.data.employees,
            pagination: resp.pagination,
        })
    }

    /// Look an employee up in the first 100 records
    ///
    /// The backend has no single-employee read.
    pub async fn find(&self, id: &str) -> ClientResult<Option<Employee>> {
        let query = EmployeeQuery {
            page: Some(1),
            ..EmployeeQuery::first(LOOKUP_PAGE_SIZE)
        };
        let page = self.list(&query).await?;
        Ok(page.employees.into_iter().find(|e| e.id == id))
    }

    /// POST /employees
    pub async fn create(&self, input: &EmployeeInput) -> ClientResult<()> {
        let form = input.to_form()?;
        self.api
            .post_multipart::<IgnoredAny>("employees", form)
            .await?;
        tracing::info!(name = %input.name, "Employee created");
        Ok(())
    }

    /// POST /employees/{id} with `_method=PUT`
    pub async fn update(&self, id: &str, input: &EmployeeInput) -> ClientResult<()> {
        let form = input.to_form()?.text("_method", "PUT");
        self.api
            .post_multipart::<IgnoredAny>(&format!("employees/{id}"), form)
            .await?;
        tracing::info!(id, "Employee updated");
        Ok(())
    }

    /// DELETE /employees/{id}
    pub async fn delete(&self, id: &str) -> ClientResult<()> {
        self.api
            .delete::<IgnoredAny>(&format!("employees/{id}"))
            .await?;
        tracing::info!(id, "Employee deleted");
        Ok(())
    }
}

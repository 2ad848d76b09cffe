//! Create / edit employee form

use std::collections::BTreeMap;
use std::sync::Arc;

use shared::{Division, Employee};

use super::{EMPLOYEES, fetch_all_divisions};
use crate::cache::{Mutation, QueryClient, QueryKey};
use crate::services::{DivisionService, EmployeeInput, EmployeeService, ImageFile};
use crate::{ClientError, ClientResult};

pub const CREATE_FAILED: &str = "Failed to add employee";
pub const UPDATE_FAILED: &str = "Failed to update employee";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FormField {
    Name,
    Phone,
    Division,
    Position,
}

/// `employees{id, scope=lookup}`; invalidated together with the list
fn lookup_key(id: &str) -> QueryKey {
    QueryKey::new(EMPLOYEES).with("scope", "lookup").with("id", id)
}

pub struct EmployeeForm {
    mode: FormMode,
    queries: QueryClient,
    employees: EmployeeService,
    divisions: DivisionService,
    create: Mutation,
    update: Mutation,

    name: String,
    phone: String,
    division: String,
    position: String,
    image: Option<ImageFile>,
    preview: String,

    division_options: Arc<Vec<Division>>,
    errors: BTreeMap<FormField, String>,
    server_error: Option<String>,
    not_found: bool,
}

impl EmployeeForm {
    fn new(
        mode: FormMode,
        queries: QueryClient,
        employees: EmployeeService,
        divisions: DivisionService,
    ) -> Self {
        Self {
            create: Mutation::new("create employee", queries.clone()).invalidates(EMPLOYEES),
            update: Mutation::new("update employee", queries.clone()).invalidates(EMPLOYEES),
            mode,
            queries,
            employees,
            divisions,
            name: String::new(),
            phone: String::new(),
            division: String::new(),
            position: String::new(),
            image: None,
            preview: String::new(),
            division_options: Arc::new(Vec::new()),
            errors: BTreeMap::new(),
            server_error: None,
            not_found: false,
        }
    }

    pub fn create(queries: QueryClient, employees: EmployeeService, divisions: DivisionService) -> Self {
        Self::new(FormMode::Create, queries, employees, divisions)
    }

    pub fn edit(
        id: impl Into<String>,
        queries: QueryClient,
        employees: EmployeeService,
        divisions: DivisionService,
    ) -> Self {
        Self::new(FormMode::Edit(id.into()), queries, employees, divisions)
    }

    /// Load divisions and, when editing, the employee
    pub async fn load(&mut self) -> ClientResult<()> {
        self.division_options = fetch_all_divisions(&self.queries, &self.divisions).await?;

        match self.mode.clone() {
            FormMode::Create => {
                if self.division.is_empty() {
                    if let Some(first) = self.division_options.first() {
                        self.division = first.id.clone();
                    }
                }
            }
            FormMode::Edit(id) => {
                let service = self.employees.clone();
                let lookup = id.clone();
                let found: Arc<Option<Employee>> = self
                    .queries
                    .fetch(lookup_key(&id), move || {
                        let service = service.clone();
                        let id = lookup.clone();
                        async move { service.find(&id).await }
                    })
                    .await?;
                match found.as_ref() {
                    Some(employee) => self.fill(employee),
                    None => {
                        tracing::debug!(id = %id, "Employee not found");
                        self.not_found = true;
                    }
                }
            }
        }
        Ok(())
    }

    fn fill(&mut self, employee: &Employee) {
        self.name = employee.name.clone();
        self.phone = employee.phone.clone();
        self.division = employee.division.id.clone();
        self.position = employee.position.clone();
        self.image = None;
        self.preview = employee.image.clone();
    }

    // ========== Fields ==========

    pub fn mode(&self) -> &FormMode {
        &self.mode
    }

    pub fn is_edit(&self) -> bool {
        matches!(self.mode, FormMode::Edit(_))
    }

    pub fn not_found(&self) -> bool {
        self.not_found
    }

    pub fn division_options(&self) -> &[Division] {
        &self.division_options
    }

    pub fn field(&self, field: FormField) -> &str {
        match field {
            FormField::Name => &self.name,
            FormField::Phone => &self.phone,
            FormField::Division => &self.division,
            FormField::Position => &self.position,
        }
    }

    /// Edit a field; clears that field's error
    pub fn set_field(&mut self, field: FormField, value: impl Into<String>) {
        let value = value.into();
        match field {
            FormField::Name => self.name = value,
            FormField::Phone => self.phone = value,
            FormField::Division => self.division = value,
            FormField::Position => self.position = value,
        }
        self.errors.remove(&field);
    }

    pub fn errors(&self) -> &BTreeMap<FormField, String> {
        &self.errors
    }

    pub fn error(&self, field: FormField) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    pub fn server_error(&self) -> Option<&str> {
        self.server_error.as_deref()
    }

    /// Required: name, division, position
    pub fn validate(&mut self) -> bool {
        self.errors.clear();
        if self.name.trim().is_empty() {
            self.errors.insert(FormField::Name, "Name is required".into());
        }
        if self.division.is_empty() {
            self.errors.insert(FormField::Division, "Division is required".into());
        }
        if self.position.trim().is_empty() {
            self.errors.insert(FormField::Position, "Position is required".into());
        }
        self.errors.is_empty()
    }

    // ========== Image ==========

    /// Rejected files leave the form unchanged
    pub async fn select_image(&mut self, file: ImageFile) -> ClientResult<()> {
        file.validate()?;
        self.preview = file.to_data_url().await;
        self.image = Some(file);
        Ok(())
    }

    pub fn remove_image(&mut self) {
        self.image = None;
        self.preview.clear();
    }

    pub fn image(&self) -> Option<&ImageFile> {
        self.image.as_ref()
    }

    /// Data URL of a picked file, or the stored photo URL
    pub fn preview(&self) -> &str {
        &self.preview
    }

    // ========== Submit ==========

    pub fn is_submitting(&self) -> bool {
        self.create.is_pending() || self.update.is_pending()
    }

    pub fn input(&self) -> EmployeeInput {
        EmployeeInput {
            name: self.name.clone(),
            phone: self.phone.clone(),
            division: self.division.clone(),
            position: self.position.clone(),
            image: self.image.clone(),
        }
    }

    /// Validate and send; true on success
    ///
    /// Nothing is sent when validation fails.
    pub async fn submit(&mut self) -> bool {
        self.server_error = None;
        if !self.validate() {
            return false;
        }

        let input = self.input();
        let (result, fallback) = match &self.mode {
            FormMode::Create => (self.create.run(self.employees.create(&input)).await, CREATE_FAILED),
            FormMode::Edit(id) => (
                self.update.run(self.employees.update(id, &input)).await,
                UPDATE_FAILED,
            ),
        };

        match result {
            Ok(()) => true,
            Err(ClientError::Busy(_)) => false,
            Err(e) => {
                self.server_error = Some(e.user_message(fallback));
                false
            }
        }
    }
}

impl std::fmt::Debug for EmployeeForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmployeeForm")
            .field("mode", &self.mode)
            .field("name", &self.name)
            .field("division", &self.division)
            .field("errors", &self.errors)
            .finish_non_exhaustive()
    }
}

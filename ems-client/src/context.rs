//! Application context
//!
//! Wires storage, history, the HTTP client, the query cache and the session
//! together once, and hands out screen controllers that share them.

use std::sync::Arc;

use reqwest::Url;

use crate::cache::QueryClient;
use crate::history::{History, MemoryHistory};
use crate::http::ApiClient;
use crate::query::{QueryParams, SearchInput};
use crate::services::{DivisionService, EmployeeService};
use crate::session::{Session, SessionState};
use crate::storage::{FileStore, Storage};
use crate::theme::ThemeContext;
use crate::views::{Dashboard, EmployeeForm, EmployeeList, ProfileForm};
use crate::{ClientConfig, ClientError, ClientResult};

/// Everything a front end needs, built once per process
#[derive(Clone)]
pub struct EmsContext {
    pub config: ClientConfig,
    pub storage: Storage,
    pub history: Arc<dyn History>,
    pub api: ApiClient,
    pub queries: QueryClient,
    pub session: Session,
    pub employees: EmployeeService,
    pub divisions: DivisionService,
    pub theme: Arc<ThemeContext>,
}

impl std::fmt::Debug for EmsContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmsContext")
            .field("base_url", &self.config.base_url)
            .field("location", &self.history.location().as_str())
            .finish_non_exhaustive()
    }
}

impl EmsContext {
    pub fn new(config: ClientConfig, storage: Storage, history: Arc<dyn History>) -> ClientResult<Self> {
        // 先从持久化的 user 恢复, 启动时不会闪现未登录状态
        let state = SessionState::restore(&storage);
        let queries = QueryClient::new(config.query_config());
        let api = ApiClient::new(&config, storage.clone(), state, history.clone(), queries.clone())?;

        Ok(Self {
            session: Session::new(api.clone()),
            employees: EmployeeService::new(api.clone()),
            divisions: DivisionService::new(api.clone()),
            theme: Arc::new(ThemeContext::load(storage.clone(), false)),
            queries,
            api,
            history,
            storage,
            config,
        })
    }

    /// File-backed storage under `config.data_dir`, history at `/`
    pub fn open(config: ClientConfig) -> ClientResult<Self> {
        let storage = Storage::new(FileStore::new(&config.data_dir));
        let history: Arc<dyn History> = Arc::new(MemoryHistory::at(&config.app_url, "/")?);
        Self::new(config, storage, history)
    }

    /// Push an in-app location such as `/employees?page=2`
    pub fn navigate(&self, path: &str) -> ClientResult<()> {
        let url = self
            .app_url()?
            .join(path)
            .map_err(|e| ClientError::InvalidUrl(e.to_string()))?;
        self.history.push(url);
        Ok(())
    }

    fn app_url(&self) -> ClientResult<Url> {
        Url::parse(&self.config.app_url).map_err(|e| ClientError::InvalidUrl(e.to_string()))
    }

    // ========== Screens ==========

    pub fn params(&self) -> QueryParams {
        QueryParams::new(self.history.clone())
    }

    pub fn employee_list(&self) -> EmployeeList {
        let params = self.params();
        let search = SearchInput::new(params.clone(), self.config.search_debounce);
        EmployeeList::new(
            params,
            search,
            self.queries.clone(),
            self.employees.clone(),
            self.divisions.clone(),
            self.config.per_page,
        )
    }

    pub fn create_employee_form(&self) -> EmployeeForm {
        EmployeeForm::create(self.queries.clone(), self.employees.clone(), self.divisions.clone())
    }

    pub fn edit_employee_form(&self, id: &str) -> EmployeeForm {
        EmployeeForm::edit(id, self.queries.clone(), self.employees.clone(), self.divisions.clone())
    }

    pub fn profile_form(&self) -> ProfileForm {
        ProfileForm::from_user(self.session.user().as_ref())
    }

    pub fn dashboard(&self) -> Dashboard {
        Dashboard::new(self.queries.clone(), self.employees.clone(), self.divisions.clone())
    }
}

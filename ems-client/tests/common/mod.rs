// ems-client/tests/common/mod.rs
// 测试用 mock 后端 (axum, 绑定 127.0.0.1:0)

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Multipart, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use ems_client::{ClientConfig, EmsContext, MemoryHistory, Storage};
use serde::Deserialize;
use serde_json::{Value, json};
use shared::{Division, Employee, User};

pub const TOKEN: &str = "token-123";
pub const PASSWORD: &str = "password";

// ============================================================================
// Mock state
// ============================================================================

pub struct MockState {
    hits: Mutex<HashMap<String, usize>>,
    pub employees: Mutex<Vec<Employee>>,
    pub divisions: Mutex<Vec<Division>>,
    pub user: Mutex<User>,
    /// 最近一次 multipart 请求的字段 (文件字段记录文件名)
    pub last_form: Mutex<Option<HashMap<String, String>>>,
    pub last_profile_body: Mutex<Option<Value>>,
    /// 所有 token 失效
    pub expired: AtomicBool,
    pub fail_logout: AtomicBool,
    pub list_delay: Mutex<Duration>,
}

impl MockState {
    fn new() -> Self {
        Self {
            hits: Mutex::new(HashMap::new()),
            employees: Mutex::new(seed_employees(13)),
            divisions: Mutex::new(seed_divisions(3)),
            user: Mutex::new(admin()),
            last_form: Mutex::new(None),
            last_profile_body: Mutex::new(None),
            expired: AtomicBool::new(false),
            fail_logout: AtomicBool::new(false),
            list_delay: Mutex::new(Duration::ZERO),
        }
    }

    fn hit(&self, route: &str) {
        *self.hits.lock().unwrap().entry(route.to_string()).or_default() += 1;
    }

    /// 某个路由被请求的次数, 例如 "GET /employees"
    pub fn hits(&self, route: &str) -> usize {
        self.hits.lock().unwrap().get(route).copied().unwrap_or(0)
    }

    pub fn set_divisions(&self, count: usize) {
        *self.divisions.lock().unwrap() = seed_divisions(count);
    }

    fn authorized(&self, headers: &HeaderMap) -> Result<(), Response> {
        let ok = headers
            .get("authorization")
            .and_then(|h| h.to_str().ok())
            .is_some_and(|h| h == format!("Bearer {TOKEN}"));
        if ok && !self.expired.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(error(StatusCode::UNAUTHORIZED, "Unauthenticated."))
        }
    }
}

pub fn admin() -> User {
    User {
        id: "u-1".into(),
        username: "admin".into(),
        name: "Administrator".into(),
        email: Some("admin@example.com".into()),
        phone: None,
    }
}

fn seed_divisions(count: usize) -> Vec<Division> {
    let names = ["Backend", "Frontend", "Design"];
    (1..=count)
        .map(|i| Division {
            id: format!("d-{i}"),
            name: names.get(i - 1).map(|n| n.to_string()).unwrap_or(format!("Division {i}")),
        })
        .collect()
}

fn seed_employees(count: usize) -> Vec<Employee> {
    (1..=count)
        .map(|i| Employee {
            id: format!("e-{i:02}"),
            image: String::new(),
            name: format!("Employee {i:02}"),
            phone: String::new(),
            division: Division {
                id: if i % 2 == 1 { "d-1" } else { "d-2" }.into(),
                name: if i % 2 == 1 { "Backend" } else { "Frontend" }.into(),
            },
            position: if i % 3 == 0 { "Designer" } else { "Engineer" }.into(),
        })
        .collect()
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "status": "error", "message": message }))).into_response()
}

fn paginate<T: Clone>(items: &[T], page: Option<u32>, per_page: Option<u32>) -> (Vec<T>, Value) {
    let per_page = per_page.unwrap_or(10).max(1) as usize;
    let page = page.unwrap_or(1).max(1) as usize;
    let total = items.len();
    let last_page = total.div_ceil(per_page).max(1);
    let slice = items
        .iter()
        .skip((page - 1) * per_page)
        .take(per_page)
        .cloned()
        .collect();
    (
        slice,
        json!({
            "current_page": page,
            "last_page": last_page,
            "per_page": per_page,
            "total": total,
        }),
    )
}

// ============================================================================
// Handlers
// ============================================================================

type AppState = Arc<MockState>;

#[derive(Deserialize)]
struct LoginBody {
    username: String,
    password: String,
}

async fn login(State(state): State<AppState>, Json(body): Json<LoginBody>) -> Response {
    state.hit("POST /login");
    if body.username != "admin" || body.password != PASSWORD {
        return error(StatusCode::UNAUTHORIZED, "Invalid credentials");
    }
    let user = state.user.lock().unwrap().clone();
    Json(json!({
        "status": "success",
        "message": "Login successful",
        "data": { "token": TOKEN, "admin": user }
    }))
    .into_response()
}

async fn logout(State(state): State<AppState>) -> Response {
    state.hit("POST /logout");
    if state.fail_logout.load(Ordering::SeqCst) {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "Server error");
    }
    Json(json!({ "status": "success", "message": "Logged out" })).into_response()
}

async fn profile(State(state): State<AppState>, headers: HeaderMap) -> Response {
    state.hit("GET /auth/profile");
    if let Err(resp) = state.authorized(&headers) {
        return resp;
    }
    let user = state.user.lock().unwrap().clone();
    Json(json!({ "status": "success", "message": "OK", "data": { "admin": user } })).into_response()
}

async fn update_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.hit("PUT /auth/profile");
    if let Err(resp) = state.authorized(&headers) {
        return resp;
    }
    if body.get("username").and_then(Value::as_str) == Some("taken") {
        return error(StatusCode::UNPROCESSABLE_ENTITY, "The username has already been taken.");
    }
    *state.last_profile_body.lock().unwrap() = Some(body.clone());

    let mut user = state.user.lock().unwrap();
    if let Some(name) = body.get("name").and_then(Value::as_str) {
        user.name = name.to_string();
    }
    if let Some(username) = body.get("username").and_then(Value::as_str) {
        user.username = username.to_string();
    }
    if let Some(phone) = body.get("phone").and_then(Value::as_str) {
        user.phone = Some(phone.to_string());
    }
    if let Some(email) = body.get("email").and_then(Value::as_str) {
        user.email = Some(email.to_string());
    }
    let user = user.clone();
    Json(json!({ "status": "success", "message": "Updated", "data": { "admin": user } }))
        .into_response()
}

#[derive(Deserialize)]
struct EmployeeParams {
    page: Option<u32>,
    per_page: Option<u32>,
    name: Option<String>,
    division_id: Option<String>,
}

async fn list_employees(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<EmployeeParams>,
) -> Response {
    state.hit("GET /employees");
    if let Err(resp) = state.authorized(&headers) {
        return resp;
    }
    let delay = *state.list_delay.lock().unwrap();
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let filtered: Vec<Employee> = state
        .employees
        .lock()
        .unwrap()
        .iter()
        .filter(|e| {
            params
                .name
                .as_deref()
                .is_none_or(|n| e.name.to_lowercase().contains(&n.to_lowercase()))
        })
        .filter(|e| params.division_id.as_deref().is_none_or(|d| e.division.id == d))
        .cloned()
        .collect();
    let (employees, pagination) = paginate(&filtered, params.page, params.per_page);
    Json(json!({
        "status": "success",
        "message": "OK",
        "data": { "employees": employees },
        "pagination": pagination,
    }))
    .into_response()
}

async fn read_form(mut multipart: Multipart) -> HashMap<String, String> {
    let mut fields = HashMap::new();
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let value = match file_name {
            Some(file_name) => file_name,
            None => field.text().await.unwrap(),
        };
        fields.insert(name, value);
    }
    fields
}

async fn create_employee(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Response {
    state.hit("POST /employees");
    if let Err(resp) = state.authorized(&headers) {
        return resp;
    }
    let form = read_form(multipart).await;
    *state.last_form.lock().unwrap() = Some(form.clone());

    let name = form.get("name").cloned().unwrap_or_default();
    if name == "Duplicate" {
        return error(StatusCode::UNPROCESSABLE_ENTITY, "Employee already exists");
    }
    let division_id = form.get("division").cloned().unwrap_or_default();
    let mut employees = state.employees.lock().unwrap();
    let employee = Employee {
        id: format!("e-{:02}", employees.len() + 1),
        image: String::new(),
        name,
        phone: form.get("phone").cloned().unwrap_or_default(),
        division: Division {
            id: division_id.clone(),
            name: division_id,
        },
        position: form.get("position").cloned().unwrap_or_default(),
    };
    employees.insert(0, employee);
    (
        StatusCode::CREATED,
        Json(json!({ "status": "success", "message": "Created" })),
    )
        .into_response()
}

async fn update_employee(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Response {
    state.hit("POST /employees/{id}");
    if let Err(resp) = state.authorized(&headers) {
        return resp;
    }
    let form = read_form(multipart).await;
    *state.last_form.lock().unwrap() = Some(form.clone());

    let mut employees = state.employees.lock().unwrap();
    let Some(employee) = employees.iter_mut().find(|e| e.id == id) else {
        return error(StatusCode::NOT_FOUND, "Employee not found");
    };
    if let Some(name) = form.get("name") {
        employee.name = name.clone();
    }
    if let Some(position) = form.get("position") {
        employee.position = position.clone();
    }
    Json(json!({ "status": "success", "message": "Updated" })).into_response()
}

async fn delete_employee(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    state.hit("DELETE /employees/{id}");
    if let Err(resp) = state.authorized(&headers) {
        return resp;
    }
    let mut employees = state.employees.lock().unwrap();
    let before = employees.len();
    employees.retain(|e| e.id != id);
    if employees.len() == before {
        return error(StatusCode::NOT_FOUND, "Employee not found");
    }
    Json(json!({ "status": "success", "message": "Deleted" })).into_response()
}

#[derive(Deserialize)]
struct DivisionParams {
    page: Option<u32>,
    per_page: Option<u32>,
}

async fn list_divisions(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<DivisionParams>,
) -> Response {
    state.hit("GET /divisions");
    if let Err(resp) = state.authorized(&headers) {
        return resp;
    }
    let divisions = state.divisions.lock().unwrap().clone();
    let (divisions, pagination) = paginate(&divisions, params.page, params.per_page);
    Json(json!({
        "status": "success",
        "message": "OK",
        "data": { "divisions": divisions },
        "pagination": pagination,
    }))
    .into_response()
}

// ============================================================================
// Harness
// ============================================================================

pub struct Backend {
    pub state: Arc<MockState>,
    pub base_url: String,
}

/// 启动 mock 后端
pub async fn spawn_backend() -> Backend {
    let state = Arc::new(MockState::new());
    let api = Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/auth/profile", get(profile).put(update_profile))
        .route("/employees", get(list_employees).post(create_employee))
        .route(
            "/employees/{id}",
            post(update_employee).delete(delete_employee),
        )
        .route("/divisions", get(list_divisions))
        .with_state(state.clone());
    let app = Router::new().nest("/api", api);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Backend {
        state,
        base_url: format!("http://{addr}/api"),
    }
}

impl Backend {
    pub fn config(&self) -> ClientConfig {
        ClientConfig::new(&self.base_url)
            .with_app_url("http://app.test/")
            .with_timeout(5)
            .with_search_debounce(Duration::from_millis(50))
    }

    /// 内存存储 + 指定路径的上下文
    pub fn context(&self, path: &str) -> (EmsContext, Arc<MemoryHistory>) {
        self.context_with(Storage::memory(), path)
    }

    pub fn context_with(&self, storage: Storage, path: &str) -> (EmsContext, Arc<MemoryHistory>) {
        let history = Arc::new(MemoryHistory::at("http://app.test/", path).unwrap());
        let ctx = EmsContext::new(self.config(), storage, history.clone()).unwrap();
        (ctx, history)
    }

    /// 已登录的上下文
    pub async fn logged_in(&self, path: &str) -> (EmsContext, Arc<MemoryHistory>) {
        let (ctx, history) = self.context(path);
        let outcome = ctx.session.login("admin", PASSWORD).await;
        assert!(outcome.success, "login failed: {:?}", outcome.error);
        (ctx, history)
    }
}

// ems-client/tests/session_flow.rs
// 会话生命周期集成测试

mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;

use common::{PASSWORD, TOKEN, spawn_backend};
use ems_client::{
    ClientConfig, EmsContext, FileStore, History, MemoryHistory, ProfileUpdate, SessionPhase,
    Storage, StorageKey, User,
};
use tempfile::TempDir;

#[tokio::test]
async fn test_login_persists_token_and_user() {
    let backend = spawn_backend().await;
    let temp_dir = TempDir::new().unwrap();
    let storage = Storage::new(FileStore::new(temp_dir.path()));
    let (ctx, _) = backend.context_with(storage.clone(), "/login");

    assert_eq!(ctx.session.phase(), SessionPhase::Unauthenticated);
    let outcome = ctx.session.login("admin", PASSWORD).await;
    assert!(outcome.success);
    assert!(outcome.error.is_none());
    assert_eq!(ctx.session.phase(), SessionPhase::Authenticated);

    assert_eq!(storage.get::<String>(StorageKey::AuthToken).as_deref(), Some(TOKEN));
    assert_eq!(
        storage.get::<User>(StorageKey::AuthUser).map(|u| u.username),
        Some("admin".to_string())
    );
    assert!(temp_dir.path().join("auth_token.json").exists());

    // 新进程从持久化的 user 直接恢复, 不请求 profile
    let (restored, _) = backend.context_with(storage, "/");
    assert!(restored.session.is_authenticated());
    assert!(restored.session.bootstrap().await.is_some());
    assert_eq!(backend.state.hits("GET /auth/profile"), 0);
}

#[tokio::test]
async fn test_login_failure_returns_backend_message() {
    let backend = spawn_backend().await;
    let (ctx, history) = backend.context("/login");

    let outcome = ctx.session.login("admin", "wrong").await;
    assert!(!outcome.success);
    assert_eq!(outcome.error.as_deref(), Some("Invalid credentials"));
    assert!(!ctx.session.is_authenticated());
    assert!(!ctx.storage.contains(StorageKey::AuthToken));
    // 已经在登录页, 不再跳转
    assert_eq!(history.depth(), 1);
}

#[tokio::test]
async fn test_login_failure_without_message_uses_fallback() {
    let backend = spawn_backend().await;
    // 指向不存在的路径: 404 且没有 JSON message
    let broken = ClientConfig::new(format!("{}/missing", backend.base_url));
    let history = Arc::new(MemoryHistory::at("http://app.test/", "/login").unwrap());
    let ctx = EmsContext::new(broken, Storage::memory(), history).unwrap();

    let outcome = ctx.session.login("admin", PASSWORD).await;
    assert!(!outcome.success);
    assert_eq!(outcome.error.as_deref(), Some("Login failed. Please try again."));
}

#[tokio::test]
async fn test_bootstrap_fetches_profile_once() {
    let backend = spawn_backend().await;
    let storage = Storage::memory();
    storage.set(StorageKey::AuthToken, TOKEN);
    let (ctx, _) = backend.context_with(storage.clone(), "/");

    assert!(!ctx.session.is_authenticated());
    let user = ctx.session.bootstrap().await.unwrap();
    assert_eq!(user.username, "admin");
    assert!(ctx.session.is_authenticated());
    assert!(storage.contains(StorageKey::AuthUser));

    // 已有 user, 不再请求
    ctx.session.bootstrap().await;
    assert_eq!(backend.state.hits("GET /auth/profile"), 1);
}

#[tokio::test]
async fn test_bootstrap_with_rejected_token_clears_silently() {
    let backend = spawn_backend().await;
    let storage = Storage::memory();
    storage.set(StorageKey::AuthToken, "stale-token");
    let (ctx, history) = backend.context_with(storage.clone(), "/login");

    assert!(ctx.session.bootstrap().await.is_none());
    assert!(!ctx.session.is_authenticated());
    assert!(!storage.contains(StorageKey::AuthToken));
    assert!(!storage.contains(StorageKey::AuthUser));
    assert_eq!(history.location().path(), "/login");
}

#[tokio::test]
async fn test_bootstrap_without_token_makes_no_request() {
    let backend = spawn_backend().await;
    let (ctx, _) = backend.context("/");
    assert!(ctx.session.bootstrap().await.is_none());
    assert_eq!(backend.state.hits("GET /auth/profile"), 0);
}

#[tokio::test]
async fn test_logout_clears_even_when_server_fails() {
    let backend = spawn_backend().await;
    let (ctx, _) = backend.logged_in("/").await;
    backend.state.fail_logout.store(true, Ordering::SeqCst);

    ctx.session.logout().await;
    assert_eq!(backend.state.hits("POST /logout"), 1);
    assert!(!ctx.session.is_authenticated());
    assert!(!ctx.storage.contains(StorageKey::AuthToken));
    assert!(!ctx.storage.contains(StorageKey::AuthUser));
}

#[tokio::test]
async fn test_any_401_ends_session_and_redirects_once() {
    let backend = spawn_backend().await;
    let (ctx, history) = backend.logged_in("/employees?page=2").await;
    backend.state.expired.store(true, Ordering::SeqCst);

    let err = ctx
        .employees
        .list(&shared::request::EmployeeQuery::first(10))
        .await
        .unwrap_err();
    assert!(err.is_unauthorized());

    assert!(!ctx.session.is_authenticated());
    assert!(!ctx.storage.contains(StorageKey::AuthToken));
    assert!(!ctx.storage.contains(StorageKey::AuthUser));
    assert_eq!(history.location().path(), "/login");
    assert_eq!(history.location().query(), None);
    assert_eq!(history.depth(), 2);

    // 第二个 401 不再重复跳转
    let _ = ctx.divisions.all().await;
    assert_eq!(history.depth(), 2);
}

#[tokio::test]
async fn test_update_profile_sends_only_filled_fields() {
    let backend = spawn_backend().await;
    let (ctx, _) = backend.logged_in("/profile").await;

    let update = ProfileUpdate {
        name: Some("Root".into()),
        ..ProfileUpdate::default()
    }
    .with_password("secret", None);
    let outcome = ctx.session.update_profile(&update).await;
    assert!(outcome.success);

    let body = backend.state.last_profile_body.lock().unwrap().clone().unwrap();
    assert_eq!(body["name"], "Root");
    assert_eq!(body["password"], "secret");
    assert_eq!(body["password_confirmation"], "");
    assert!(body.get("email").is_none());
    assert!(body.get("username").is_none());

    assert_eq!(ctx.session.user().unwrap().name, "Root");
    assert_eq!(ctx.storage.get::<User>(StorageKey::AuthUser).unwrap().name, "Root");
}

#[tokio::test]
async fn test_profile_form_reports_backend_error() {
    let backend = spawn_backend().await;
    let (ctx, _) = backend.logged_in("/profile").await;

    let mut form = ctx.profile_form();
    assert_eq!(form.username, "admin");
    form.username = "taken".into();
    assert!(!form.submit(&ctx.session).await);
    assert_eq!(form.error_message(), Some("The username has already been taken."));
    assert_eq!(ctx.session.user().unwrap().username, "admin");

    form.username = "admin".into();
    form.email = "broken".into();
    assert!(!form.submit(&ctx.session).await);
    assert_eq!(form.error_message(), Some("Invalid email format"));
    assert_eq!(backend.state.hits("PUT /auth/profile"), 1);

    form.email = "root@example.com".into();
    assert!(form.submit(&ctx.session).await);
    assert_eq!(form.success_message(), Some("Profile updated successfully!"));
    assert_eq!(
        ctx.session.user().unwrap().email.as_deref(),
        Some("root@example.com")
    );
}

#[tokio::test]
async fn test_relogin_after_401_refetches_lists() {
    let backend = spawn_backend().await;
    let (ctx, history) = backend.logged_in("/employees").await;

    let view = ctx.employee_list().load().await;
    assert_eq!(view.pagination.total_items, 13);
    assert!(!ctx.queries.is_empty());

    backend.state.expired.store(true, Ordering::SeqCst);
    let err = ctx
        .employees
        .list(&shared::request::EmployeeQuery::first(10))
        .await
        .unwrap_err();
    assert!(err.is_unauthorized());
    assert!(ctx.queries.is_empty());
    assert_eq!(history.location().path(), "/login");

    // 新会话看到的是服务端的新数据
    backend.state.expired.store(false, Ordering::SeqCst);
    backend.state.employees.lock().unwrap().truncate(2);
    assert!(ctx.session.login("admin", PASSWORD).await.success);
    ctx.navigate("/employees").unwrap();

    let view = ctx.employee_list().load().await;
    assert_eq!(view.pagination.total_items, 2);
    assert_eq!(backend.state.hits("GET /employees"), 2);
}

#[tokio::test]
async fn test_logout_and_login_drop_cached_queries() {
    let backend = spawn_backend().await;
    let (ctx, _) = backend.logged_in("/employees").await;

    ctx.employee_list().divisions().await.unwrap();
    assert!(!ctx.queries.is_empty());
    ctx.session.logout().await;
    assert!(ctx.queries.is_empty());

    assert!(ctx.session.login("admin", PASSWORD).await.success);
    ctx.employee_list().divisions().await.unwrap();
    assert_eq!(backend.state.hits("GET /divisions"), 2);

    // 再次登录 (换用户) 同样清空
    assert!(!ctx.queries.is_empty());
    assert!(ctx.session.login("admin", PASSWORD).await.success);
    assert!(ctx.queries.is_empty());
}

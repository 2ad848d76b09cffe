//! Session - 登录会话
//!
//! 状态: Unauthenticated → Authenticating → Authenticated
//! - 登出 / 任意接口返回 401 → Unauthenticated
//! - 启动时从持久化的 user 恢复，避免闪现未登录状态

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use shared::{ApiEnvelope, LoginData, LoginRequest, ProfileData, ProfileUpdate, User};

use crate::http::ApiClient;
use crate::storage::{Storage, StorageKey};

/// 登录失败的默认提示
pub const LOGIN_FAILED: &str = "Login failed. Please try again.";
/// 更新资料失败的默认提示
pub const PROFILE_UPDATE_FAILED: &str = "Failed to update profile.";

// ============================================================================
// Session State
// ============================================================================

/// 会话阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Unauthenticated,
    /// 登录或恢复请求进行中
    Authenticating,
    Authenticated,
}

/// 共享的会话槽 (HTTP 层和 Session 共同持有)
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    user: Arc<RwLock<Option<User>>>,
    authenticating: Arc<AtomicUsize>,
}

impl SessionState {
    /// 从持久化存储恢复
    pub fn restore(storage: &Storage) -> Self {
        let user = storage.get::<User>(StorageKey::AuthUser);
        Self {
            user: Arc::new(RwLock::new(user)),
            authenticating: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// 当前阶段
    pub fn phase(&self) -> SessionPhase {
        if self.is_authenticated() {
            SessionPhase::Authenticated
        } else if self.authenticating.load(Ordering::SeqCst) > 0 {
            SessionPhase::Authenticating
        } else {
            SessionPhase::Unauthenticated
        }
    }

    fn begin_auth(&self) -> AuthGuard {
        self.authenticating.fetch_add(1, Ordering::SeqCst);
        AuthGuard {
            counter: self.authenticating.clone(),
        }
    }

    /// 当前用户
    pub fn user(&self) -> Option<User> {
        self.user.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    pub(crate) fn set(&self, user: User) {
        *self.user.write().unwrap_or_else(PoisonError::into_inner) = Some(user);
    }

    pub(crate) fn clear(&self) {
        *self.user.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

/// 认证请求结束时退出 Authenticating
struct AuthGuard {
    counter: Arc<AtomicUsize>,
}

impl Drop for AuthGuard {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}

// ============================================================================
// Auth Outcome
// ============================================================================

/// 登录 / 更新资料的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthOutcome {
    pub success: bool,
    pub error: Option<String>,
}

impl AuthOutcome {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
        }
    }
}

// ============================================================================
// Session
// ============================================================================

/// 认证会话
#[derive(Debug, Clone)]
pub struct Session {
    api: ApiClient,
}

impl Session {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    fn storage(&self) -> &Storage {
        self.api.storage()
    }

    fn state(&self) -> &SessionState {
        self.api.session_state()
    }

    /// 当前用户
    pub fn user(&self) -> Option<User> {
        self.state().user()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state().is_authenticated()
    }

    pub fn phase(&self) -> SessionPhase {
        self.state().phase()
    }

    /// 启动时恢复会话
    ///
    /// 有 token 但没有缓存的 user 时拉取一次 profile；失败则静默清除凭证。
    pub async fn bootstrap(&self) -> Option<User> {
        let has_token = self
            .storage()
            .get::<String>(StorageKey::AuthToken)
            .is_some_and(|t| !t.is_empty());

        if !has_token || self.state().is_authenticated() {
            return self.user();
        }

        let _auth = self.state().begin_auth();
        match self
            .api
            .get::<ApiEnvelope<ProfileData>>("auth/profile")
            .await
        {
            Ok(resp) => {
                let user = resp.data.user;
                self.storage().set(StorageKey::AuthUser, &user);
                self.state().set(user.clone());
                tracing::info!(username = %user.username, "Session restored");
                Some(user)
            }
            Err(e) => {
                tracing::debug!(error = %e, "Session bootstrap failed, falling back to login");
                self.clear_local();
                None
            }
        }
    }

    /// 登录
    pub async fn login(&self, username: &str, password: &str) -> AuthOutcome {
        let request = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };

        let _auth = self.state().begin_auth();
        match self
            .api
            .post::<ApiEnvelope<LoginData>, _>("login", &request)
            .await
        {
            Ok(resp) => {
                let LoginData { token, user } = resp.data;
                self.storage().set(StorageKey::AuthToken, &token);
                self.storage().set(StorageKey::AuthUser, &user);
                // 不复用上一个会话的查询结果
                self.api.queries().clear();
                tracing::info!(username = %user.username, "Logged in");
                self.state().set(user);
                AuthOutcome::ok()
            }
            Err(e) => {
                tracing::debug!(username = %username, error = %e, "Login failed");
                AuthOutcome::failed(e.user_message(LOGIN_FAILED))
            }
        }
    }

    /// 登出
    ///
    /// 通知服务端是尽力而为，本地凭证无条件清除。
    pub async fn logout(&self) {
        if let Err(e) = self.api.post_empty::<serde::de::IgnoredAny>("logout").await {
            tracing::debug!(error = %e, "Logout request failed, ignoring");
        }
        self.clear_local();
        tracing::info!("Logged out");
    }

    /// 更新个人资料 (只发送提供的字段)
    pub async fn update_profile(&self, update: &ProfileUpdate) -> AuthOutcome {
        match self
            .api
            .put::<ApiEnvelope<ProfileData>, _>("auth/profile", update)
            .await
        {
            Ok(resp) => {
                let user = resp.data.user;
                self.storage().set(StorageKey::AuthUser, &user);
                self.state().set(user);
                AuthOutcome::ok()
            }
            Err(e) => AuthOutcome::failed(e.user_message(PROFILE_UPDATE_FAILED)),
        }
    }

    fn clear_local(&self) {
        self.state().clear();
        self.api.queries().clear();
        self.storage().remove(StorageKey::AuthToken);
        self.storage().remove(StorageKey::AuthUser);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_restores_persisted_user() {
        let storage = Storage::memory();
        assert!(!SessionState::restore(&storage).is_authenticated());

        let user = User {
            id: "1".into(),
            username: "admin".into(),
            name: "Admin".into(),
            email: Some("admin@example.com".into()),
            phone: None,
        };
        storage.set(StorageKey::AuthUser, &user);

        let state = SessionState::restore(&storage);
        assert!(state.is_authenticated());
        assert_eq!(state.phase(), SessionPhase::Authenticated);
        assert_eq!(state.user(), Some(user));

        // 克隆共享同一个槽
        let other = state.clone();
        other.clear();
        assert!(!state.is_authenticated());
        assert_eq!(state.phase(), SessionPhase::Unauthenticated);
    }

    #[test]
    fn test_phase_while_authenticating() {
        let state = SessionState::default();
        let guard = state.begin_auth();
        assert_eq!(state.phase(), SessionPhase::Authenticating);
        drop(guard);
        assert_eq!(state.phase(), SessionPhase::Unauthenticated);
    }
}

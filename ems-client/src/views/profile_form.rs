// ems-client/src/views/profile_form.rs
// 个人资料表单

use std::sync::LazyLock;

use regex::Regex;
use shared::{ProfileUpdate, User};

use crate::session::Session;

const PROFILE_UPDATED: &str = "Profile updated successfully!";

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("Invalid regex"));

/// 邮箱格式校验
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// 个人资料表单
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileForm {
    pub name: String,
    pub username: String,
    pub phone: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,

    success_message: Option<String>,
    error_message: Option<String>,
}

impl ProfileForm {
    /// 用当前用户初始化
    pub fn from_user(user: Option<&User>) -> Self {
        let Some(user) = user else {
            return Self::default();
        };
        Self {
            name: user.name.clone(),
            username: user.username.clone(),
            phone: user.phone.clone().unwrap_or_default(),
            email: user.email.clone().unwrap_or_default(),
            ..Self::default()
        }
    }

    pub fn success_message(&self) -> Option<&str> {
        self.success_message.as_deref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// 按顺序校验, 返回第一个错误
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Name is required".into());
        }
        if self.username.trim().is_empty() {
            return Err("Username is required".into());
        }
        if !self.email.is_empty() && !is_valid_email(&self.email) {
            return Err("Invalid email format".into());
        }
        Ok(())
    }

    /// 只带非空字段
    pub fn to_update(&self) -> ProfileUpdate {
        let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());
        let update = ProfileUpdate {
            name: non_empty(&self.name),
            username: non_empty(&self.username),
            phone: non_empty(&self.phone),
            email: non_empty(&self.email),
            ..ProfileUpdate::default()
        };
        if self.password.is_empty() {
            update
        } else {
            update.with_password(&self.password, non_empty(&self.password_confirmation))
        }
    }

    /// 提交; 成功返回 true
    pub async fn submit(&mut self, session: &Session) -> bool {
        self.success_message = None;
        self.error_message = None;

        if let Err(message) = self.validate() {
            self.error_message = Some(message);
            return false;
        }

        let outcome = session.update_profile(&self.to_update()).await;
        if outcome.success {
            self.password.clear();
            self.password_confirmation.clear();
            self.success_message = Some(PROFILE_UPDATED.into());
            true
        } else {
            self.error_message = outcome.error;
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> ProfileForm {
        ProfileForm::from_user(Some(&User {
            id: "1".into(),
            username: "admin".into(),
            name: "Admin".into(),
            email: None,
            phone: Some("0812".into()),
        }))
    }

    #[test]
    fn test_email_pattern_compiles() {
        let re = LazyLock::force(&EMAIL_RE);
        assert!(re.is_match("root@example.com"));
        assert!(is_valid_email("first.last+tag@mail.example.org"));
    }

    #[test]
    fn test_email_format() {
        assert!(is_valid_email("a@b.co"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@c.d"));
        assert!(!is_valid_email("@c.d"));
    }

    #[test]
    fn test_validate_order() {
        let mut form = form();
        assert!(form.validate().is_ok());

        form.email = "nope".into();
        assert_eq!(form.validate().unwrap_err(), "Invalid email format");

        form.username = " ".into();
        assert_eq!(form.validate().unwrap_err(), "Username is required");

        form.name.clear();
        assert_eq!(form.validate().unwrap_err(), "Name is required");
    }

    #[test]
    fn test_update_is_sparse() {
        let form = form();
        let update = form.to_update();
        assert_eq!(update.name.as_deref(), Some("Admin"));
        assert_eq!(update.phone.as_deref(), Some("0812"));
        assert!(update.email.is_none());
        assert!(update.password.is_none());
        assert!(update.password_confirmation.is_none());
    }

    #[test]
    fn test_password_carries_confirmation() {
        let mut form = form();
        form.password = "secret".into();
        let update = form.to_update();
        assert_eq!(update.password.as_deref(), Some("secret"));
        assert_eq!(update.password_confirmation.as_deref(), Some(""));
    }
}

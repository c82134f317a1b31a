//! Availability Gate - AI 可用性判断
//!
//! 凭证来源（按优先级）：
//! 1. 环境变量（每次请求重新读取，运行中设置或移除即时生效）
//! 2. 配置文件中的 `ai.api_key`

use secrecy::SecretString;

/// 凭证来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Environment,
    Config,
}

/// 凭证存在性检查
#[derive(Clone)]
pub struct AvailabilityGate {
    env_var: String,
    configured: Option<SecretString>,
}

impl std::fmt::Debug for AvailabilityGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AvailabilityGate")
            .field("env_var", &self.env_var)
            .field("configured", &self.configured.is_some())
            .finish()
    }
}

impl AvailabilityGate {
    pub fn new(env_var: impl Into<String>, configured: Option<SecretString>) -> Self {
        Self {
            env_var: env_var.into(),
            configured,
        }
    }

    /// 环境变量名
    pub fn env_var(&self) -> &str {
        &self.env_var
    }

    /// 当前可用的凭证；空白值视为不存在
    pub fn credential(&self) -> Option<SecretString> {
        self.lookup().map(|(key, _)| key)
    }

    /// 当前凭证及其来源
    pub fn lookup(&self) -> Option<(SecretString, CredentialSource)> {
        if let Some(value) = std::env::var(&self.env_var)
            .ok()
            .filter(|v| !v.trim().is_empty())
        {
            return Some((
                SecretString::new(value.trim().into()),
                CredentialSource::Environment,
            ));
        }
        self.configured
            .clone()
            .map(|key| (key, CredentialSource::Config))
    }

    pub fn is_available(&self) -> bool {
        self.lookup().is_some()
    }
}

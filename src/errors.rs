//! 统一错误处理模块
//!
//! 使用宏自动生成错误类型，支持错误代码和类型名称。

use std::fmt;

/// 定义错误类型的宏
///
/// 自动生成：
/// - enum 定义
/// - code() 方法 - 返回错误代码
/// - error_type() 方法 - 返回错误类型名称
/// - message() 方法 - 返回错误详情
/// - 便捷构造函数
macro_rules! define_hwsystem_errors {
    ($(
        $variant:ident($code:literal, $type_name:literal)
    ),* $(,)?) => {
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub enum HWSystemError {
            $($variant(String),)*
        }

        impl HWSystemError {
            /// 获取错误代码
            pub fn code(&self) -> &'static str {
                match self {
                    $(HWSystemError::$variant(_) => $code,)*
                }
            }

            /// 获取错误类型名称
            pub fn error_type(&self) -> &'static str {
                match self {
                    $(HWSystemError::$variant(_) => $type_name,)*
                }
            }

            /// 获取错误详情
            pub fn message(&self) -> &str {
                match self {
                    $(HWSystemError::$variant(msg) => msg,)*
                }
            }
        }

        // 生成便捷构造函数
        paste::paste! {
            impl HWSystemError {
                $(
                    pub fn [<$variant:snake>]<T: Into<String>>(msg: T) -> Self {
                        HWSystemError::$variant(msg.into())
                    }
                )*
            }
        }
    };
}

define_hwsystem_errors! {
    NotFound("E001", "Resource Not Found"),
    Forbidden("E002", "Forbidden"),
    InvalidTransition("E003", "Invalid Transition"),
    OutOfRange("E004", "Out Of Range"),
    DeadlinePassed("E005", "Deadline Passed"),
    DuplicateActiveSubmission("E006", "Duplicate Active Submission"),
    Timeout("E007", "Timeout"),
    Conflict("E008", "Conflict"),
    Validation("E009", "Validation Error"),
    Authentication("E010", "Authentication Error"),
    Storage("E011", "Storage Error"),
    Serialization("E012", "Serialization Error"),
    Configuration("E013", "Configuration Error"),
    Internal("E014", "Internal Error"),
}

impl HWSystemError {
    /// 是否属于锁竞争类错误（内部有限次重试）
    pub fn is_retryable(&self) -> bool {
        matches!(self, HWSystemError::Timeout(_) | HWSystemError::Conflict(_))
    }

    /// 是否为内部错误（对外统一映射为 Internal，不泄露细节）
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            HWSystemError::Storage(_)
                | HWSystemError::Serialization(_)
                | HWSystemError::Configuration(_)
                | HWSystemError::Internal(_)
        )
    }

    /// 转换为可以返回给调用方的错误
    pub fn into_public(self) -> Self {
        if self.is_internal() {
            HWSystemError::internal("服务内部错误，请稍后重试")
        } else {
            self
        }
    }

    /// 格式化为彩色输出（用于开发环境）
    #[cfg(debug_assertions)]
    pub fn format_colored(&self) -> String {
        format!(
            "\x1b[1;31m[ERROR]\x1b[0m \x1b[33m{}\x1b[0m \x1b[31m{}\x1b[0m\n  {}",
            self.code(),
            self.error_type(),
            self.message()
        )
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for HWSystemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for HWSystemError {}

// 为常见的错误类型实现 From trait
impl From<std::io::Error> for HWSystemError {
    fn from(err: std::io::Error) -> Self {
        HWSystemError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for HWSystemError {
    fn from(err: serde_json::Error) -> Self {
        HWSystemError::Serialization(err.to_string())
    }
}

impl From<chrono::ParseError> for HWSystemError {
    fn from(err: chrono::ParseError) -> Self {
        HWSystemError::Validation(err.to_string())
    }
}

impl From<config::ConfigError> for HWSystemError {
    fn from(err: config::ConfigError) -> Self {
        HWSystemError::Configuration(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, HWSystemError>;

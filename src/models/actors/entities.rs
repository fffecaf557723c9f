use serde::{Deserialize, Serialize};

use crate::models::UserId;

// 操作者角色（由身份提供方在令牌中给出）
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    Student,   // 学生
    Teacher,   // 教师
    Parent,    // 家长
    Principal, // 校长
}

impl ActorRole {
    pub const STUDENT: &'static str = "student";
    pub const TEACHER: &'static str = "teacher";
    pub const PARENT: &'static str = "parent";
    pub const PRINCIPAL: &'static str = "principal";

    pub fn staff_roles() -> &'static [&'static ActorRole] {
        &[&Self::Teacher, &Self::Principal]
    }
}

impl<'de> Deserialize<'de> for ActorRole {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(|_| {
            serde::de::Error::custom(format!(
                "无效的用户角色: '{s}'. 支持的角色: student, teacher, parent, principal"
            ))
        })
    }
}

impl std::fmt::Display for ActorRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActorRole::Student => write!(f, "{}", ActorRole::STUDENT),
            ActorRole::Teacher => write!(f, "{}", ActorRole::TEACHER),
            ActorRole::Parent => write!(f, "{}", ActorRole::PARENT),
            ActorRole::Principal => write!(f, "{}", ActorRole::PRINCIPAL),
        }
    }
}

impl std::str::FromStr for ActorRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            ActorRole::STUDENT => Ok(ActorRole::Student),
            ActorRole::TEACHER => Ok(ActorRole::Teacher),
            ActorRole::PARENT => Ok(ActorRole::Parent),
            ActorRole::PRINCIPAL => Ok(ActorRole::Principal),
            _ => Err(format!("Invalid actor role: {s}")),
        }
    }
}

/// 操作者上下文
///
/// 每个核心操作都显式接收 `Actor`，不依赖任何全局登录状态。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Actor {
    pub id: UserId,
    pub role: ActorRole,
}

impl Actor {
    pub fn new(id: UserId, role: ActorRole) -> Self {
        Self { id, role }
    }

    pub fn is(&self, role: ActorRole) -> bool {
        self.role == role
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip_through_str() {
        for role in [
            ActorRole::Student,
            ActorRole::Teacher,
            ActorRole::Parent,
            ActorRole::Principal,
        ] {
            assert_eq!(role.to_string().parse::<ActorRole>(), Ok(role));
        }
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        let err = serde_json::from_str::<ActorRole>("\"admin\"").unwrap_err();
        assert!(err.to_string().contains("admin"));
    }
}

//! HWSystem Grading - 作业提交生命周期与评分服务
//!
//! 管理作业提交从提交、批阅、评分到重交的状态机，并基于生命周期事件提供
//! 班级、学生、学校、作业四个维度的统计。
//!
//! # 架构
//! - `config`: 配置管理
//! - `errors`: 统一错误处理
//! - `middlewares`: 认证授权中间件
//! - `models`: 数据模型定义
//! - `routes`: API 路由层
//! - `runtime`: 运行时生命周期管理
//! - `services`: 核心引擎（生命周期、评分、作业目录、组织架构、统计聚合）
//! - `storage`: 数据存储层（内存实现，提交与事件原子写入）
//! - `utils`: 工具函数

pub mod config;
pub mod errors;
pub mod middlewares;
pub mod models;
pub mod routes;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod utils;

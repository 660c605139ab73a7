pub mod access;
pub mod admin;
pub mod auth;
pub mod chat;
pub mod dao;
pub mod dashboard;
pub mod dispatch;
pub mod membership;
pub mod tasks;
pub mod workflow;

pub use access::{AccessService, Principal};
pub use admin::UserAdminService;
pub use auth::AuthService;
pub use chat::ChatService;
pub use dao::base::{DaoError, DaoResult};
pub use dashboard::DashboardService;
pub use dispatch::Dispatcher;
pub use membership::MembershipService;
pub use tasks::TaskService;
pub use workflow::{ProposalWorkflow, StatusChangeWorkflow};

pub mod base;
pub mod chat;
pub mod notification;
pub mod project;
pub mod proposal;
pub mod status_request;
pub mod task;
pub mod user;

pub use base::BaseDao;

pub mod approval;
pub mod chat_message;
pub mod comment;
pub mod notification;
pub mod project;
pub mod project_member;
pub mod status_change_request;
pub mod task;
pub mod task_proposal;
pub mod user;

pub use approval::*;
pub use chat_message::*;
pub use comment::*;
pub use notification::*;
pub use project::*;
pub use project_member::*;
pub use status_change_request::*;
pub use task::*;
pub use task_proposal::*;
pub use user::*;

use mongodb::Database;
use std::sync::Arc;
use taskflow_config::Settings;
use taskflow_services::{
    AccessService, AuthService, ChatService, DashboardService, Dispatcher, MembershipService,
    ProposalWorkflow, StatusChangeWorkflow, TaskService, UserAdminService,
    dao::{
        chat::ChatDao, notification::NotificationDao, project::ProjectDao, proposal::ProposalDao,
        status_request::StatusRequestDao, task::TaskDao, user::UserDao,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub settings: Settings,
    pub auth: Arc<AuthService>,
    pub users: Arc<UserDao>,
    pub notifications: Arc<NotificationDao>,
    pub access: Arc<AccessService>,
    pub membership: Arc<MembershipService>,
    pub tasks: Arc<TaskService>,
    pub status_changes: Arc<StatusChangeWorkflow>,
    pub proposals: Arc<ProposalWorkflow>,
    pub chat: Arc<ChatService>,
    pub dashboard: Arc<DashboardService>,
    pub user_admin: Arc<UserAdminService>,
}

impl AppState {
    pub fn new(db: Database, settings: Settings) -> Self {
        let auth = Arc::new(AuthService::new(settings.jwt.clone()));

        let users = Arc::new(UserDao::new(&db));
        let project_dao = Arc::new(ProjectDao::new(&db));
        let task_dao = Arc::new(TaskDao::new(&db));
        let request_dao = Arc::new(StatusRequestDao::new(&db));
        let proposal_dao = Arc::new(ProposalDao::new(&db));
        let notifications = Arc::new(NotificationDao::new(&db));
        let chat_dao = Arc::new(ChatDao::new(&db));

        let access = Arc::new(AccessService::new(project_dao.clone()));
        let dispatcher = Arc::new(Dispatcher::new(notifications.clone(), chat_dao.clone()));

        let membership = Arc::new(MembershipService::new(
            access.clone(),
            project_dao.clone(),
            task_dao.clone(),
            users.clone(),
            dispatcher.clone(),
        ));
        let tasks = Arc::new(TaskService::new(
            access.clone(),
            project_dao.clone(),
            task_dao.clone(),
            request_dao.clone(),
            dispatcher.clone(),
        ));
        let status_changes = Arc::new(StatusChangeWorkflow::new(
            access.clone(),
            project_dao.clone(),
            task_dao.clone(),
            request_dao.clone(),
            users.clone(),
            dispatcher.clone(),
        ));
        let proposals = Arc::new(ProposalWorkflow::new(
            access.clone(),
            project_dao.clone(),
            task_dao.clone(),
            proposal_dao.clone(),
            users.clone(),
            dispatcher,
        ));
        let chat = Arc::new(ChatService::new(access.clone(), chat_dao));
        let dashboard = Arc::new(DashboardService::new(
            access.clone(),
            membership.clone(),
            task_dao,
            request_dao,
            proposal_dao,
            notifications.clone(),
        ));
        let user_admin = Arc::new(UserAdminService::new(
            users.clone(),
            project_dao,
            notifications.clone(),
        ));

        Self {
            db,
            settings,
            auth,
            users,
            notifications,
            access,
            membership,
            tasks,
            status_changes,
            proposals,
            chat,
            dashboard,
            user_admin,
        }
    }
}

use mongodb::{Database, IndexModel, options::IndexOptions};
use tracing::info;

pub async fn ensure_indexes(db: &Database) -> Result<(), mongodb::error::Error> {
    // Users
    create_indexes(
        db,
        "users",
        vec![
            index_unique(bson::doc! { "email": 1 }),
            index_unique(bson::doc! { "username": 1 }),
        ],
    )
    .await?;

    // Projects
    create_indexes(
        db,
        "projects",
        vec![
            index(bson::doc! { "creator_id": 1 }),
            index(bson::doc! { "deleted_at": 1, "name": 1 }),
        ],
    )
    .await?;

    // Project Members
    create_indexes(
        db,
        "project_members",
        vec![
            index_unique(bson::doc! { "project_id": 1, "user_id": 1 }),
            index(bson::doc! { "user_id": 1, "role": 1 }),
        ],
    )
    .await?;

    // Tasks
    create_indexes(
        db,
        "tasks",
        vec![
            index(bson::doc! { "project_id": 1, "status": 1, "created_at": -1 }),
            index(bson::doc! { "assignee_id": 1, "status": 1 }),
            index(bson::doc! { "assignee_ids": 1, "status": 1 }),
        ],
    )
    .await?;

    // Comments
    create_indexes(
        db,
        "comments",
        vec![index(bson::doc! { "task_id": 1, "created_at": 1 })],
    )
    .await?;

    // Status Change Requests
    create_indexes(
        db,
        "status_change_requests",
        vec![
            index(bson::doc! { "task_id": 1, "created_at": 1 }),
            index(bson::doc! { "project_id": 1, "status": 1, "created_at": 1 }),
        ],
    )
    .await?;

    // Task Proposals
    create_indexes(
        db,
        "task_proposals",
        vec![index(
            bson::doc! { "project_id": 1, "status": 1, "created_at": 1 },
        )],
    )
    .await?;

    // Chat Messages
    create_indexes(
        db,
        "chat_messages",
        vec![index(bson::doc! { "project_id": 1, "created_at": -1 })],
    )
    .await?;

    // Notifications
    create_indexes(
        db,
        "notifications",
        vec![index(
            bson::doc! { "user_id": 1, "is_read": 1, "created_at": -1 },
        )],
    )
    .await?;

    info!("All indexes ensured");
    Ok(())
}

fn index(keys: bson::Document) -> IndexModel {
    IndexModel::builder().keys(keys).build()
}

fn index_unique(keys: bson::Document) -> IndexModel {
    IndexModel::builder()
        .keys(keys)
        .options(IndexOptions::builder().unique(true).build())
        .build()
}

async fn create_indexes(
    db: &Database,
    collection: &str,
    indexes: Vec<IndexModel>,
) -> Result<(), mongodb::error::Error> {
    db.collection::<bson::Document>(collection)
        .create_indexes(indexes)
        .await?;
    info!(collection, "Indexes created");
    Ok(())
}

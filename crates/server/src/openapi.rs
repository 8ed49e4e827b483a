use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::spexare::list,
        crate::routes::spexare::create,
        crate::routes::spexare::find,
        crate::routes::spexare::update,
        crate::routes::spexare::remove,
        crate::routes::spex::list,
        crate::routes::spex::create,
        crate::routes::spex_categories::list,
        crate::routes::spex_categories::create,
        crate::routes::tasks::list,
        crate::routes::tasks::create,
        crate::routes::task_categories::list,
        crate::routes::task_categories::create,
        crate::routes::tags::list,
        crate::routes::tags::create,
        crate::routes::events::list,
        crate::routes::settings::list,
    ),
    tags(
        (name = "health"),
        (name = "spexare"),
        (name = "spex"),
        (name = "spex-categories"),
        (name = "tasks"),
        (name = "task-categories"),
        (name = "tags"),
        (name = "events"),
        (name = "settings")
    )
)]
pub struct ApiDoc;

use super::flash::{flash_error, flash_info, flash_success, take_flashes, Flash};
use super::links;
use crate::db::get_db_pool;
use crate::middleware::ClientCtx;
use crate::moderation;
use crate::orm::{categories, posts, thread_events, threads};
use crate::template::{Paginator, PaginatorToHtml};
use actix_web::{error, get, post, web, Error, HttpResponse, Responder};
use askama_actix::{Template, TemplateToResponse};
use sea_orm::{entity::*, query::*, DatabaseConnection, QueryFilter};
use serde::Deserialize;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_thread)
        .service(view_thread_page)
        .service(view_thread_last)
        .service(pin_thread)
        .service(announce_thread)
        .service(remove_thread_weight)
        .service(open_thread)
        .service(close_thread)
        .service(hide_thread)
        .service(unhide_thread)
        .service(approve_thread)
        .service(view_move_thread_form)
        .service(move_thread)
        .service(view_merge_thread_form)
        .service(merge_thread)
        .service(delete_thread);
}

#[derive(Template)]
#[template(path = "thread.html")]
pub struct ThreadTemplate {
    pub client: ClientCtx,
    pub flashes: Vec<Flash>,
    pub category: categories::Model,
    pub thread: threads::Model,
    pub posts: Vec<posts::Model>,
    pub events: Vec<thread_events::Model>,
    pub paginator: Paginator,
}

#[derive(Template)]
#[template(path = "thread_move.html")]
pub struct MoveThreadTemplate {
    pub client: ClientCtx,
    pub flashes: Vec<Flash>,
    pub thread: threads::Model,
    pub categories: Vec<categories::Model>,
}

#[derive(Template)]
#[template(path = "thread_merge.html")]
pub struct MergeThreadTemplate {
    pub client: ClientCtx,
    pub flashes: Vec<Flash>,
    pub thread: threads::Model,
}

#[derive(Deserialize)]
pub struct ModerationForm {
    pub csrf_token: String,
}

#[derive(Deserialize)]
pub struct MoveThreadForm {
    pub csrf_token: String,
    pub category_id: i32,
}

#[derive(Deserialize)]
pub struct MergeThreadForm {
    pub csrf_token: String,
    pub other_thread_id: i32,
}

/// Returns which human-readable page number this position will appear in.
pub fn get_page_for_pos(pos: i32, posts_per_page: i32) -> i32 {
    ((std::cmp::max(1, pos) - 1) / posts_per_page) + 1
}

pub fn get_pages_in_thread(cnt: i32, posts_per_page: i32) -> i32 {
    ((std::cmp::max(1, cnt) - 1) / posts_per_page) + 1
}

/// Loads a thread for handlers, mapping absence to 404.
async fn find_thread(db: &DatabaseConnection, thread_id: i32) -> Result<threads::Model, Error> {
    threads::Entity::find_by_id(thread_id)
        .one(db)
        .await
        .map_err(|e| {
            log::error!("Failed to find thread: {}", e);
            error::ErrorInternalServerError("Database error")
        })?
        .ok_or_else(|| error::ErrorNotFound("Thread not found."))
}

fn see_other(location: String) -> HttpResponse {
    HttpResponse::SeeOther()
        .append_header(("Location", location))
        .finish()
}

fn flash_outcome(session: &actix_session::Session, changed: bool, applied: &str) {
    if changed {
        flash_success(session, applied);
    } else {
        flash_info(session, "Thread is already in the requested state.");
    }
}

async fn render_thread_page(
    client: ClientCtx,
    session: actix_session::Session,
    thread_id: i32,
    page: i32,
) -> Result<HttpResponse, Error> {
    let db = get_db_pool();
    let thread = find_thread(db, thread_id).await?;

    // Hidden threads stay visible to the moderators who can unhide them.
    if thread.is_hidden && !client.can("moderate.thread.hide") {
        return Err(error::ErrorNotFound("Thread not found."));
    }

    let category = categories::Entity::find_by_id(thread.category_id)
        .one(db)
        .await
        .map_err(error::ErrorInternalServerError)?
        .ok_or_else(|| error::ErrorNotFound("Category not found."))?;

    let posts_per_page = crate::app_config::get_app_config().forum.posts_per_page;
    let page_count = get_pages_in_thread(thread.post_count, posts_per_page);
    let page = page.clamp(1, page_count);

    let post_models = posts::Entity::find()
        .filter(posts::Column::ThreadId.eq(thread.id))
        .order_by_asc(posts::Column::CreatedAt)
        .paginate(db, posts_per_page as usize)
        .fetch_page((page - 1) as usize)
        .await
        .map_err(error::ErrorInternalServerError)?;

    let events = if thread.has_events {
        thread_events::Entity::find()
            .filter(thread_events::Column::ThreadId.eq(thread.id))
            .order_by_asc(thread_events::Column::CreatedAt)
            .all(db)
            .await
            .map_err(error::ErrorInternalServerError)?
    } else {
        Vec::new()
    };

    let paginator = Paginator {
        base_url: links::thread_url(thread.id, 1),
        this_page: page,
        page_count,
    };

    Ok(ThreadTemplate {
        client,
        flashes: take_flashes(&session),
        category,
        thread,
        posts: post_models,
        events,
        paginator,
    }
    .to_response())
}

#[get("/threads/{thread_id}/")]
pub async fn view_thread(
    client: ClientCtx,
    session: actix_session::Session,
    path: web::Path<i32>,
) -> Result<impl Responder, Error> {
    render_thread_page(client, session, path.into_inner(), 1).await
}

#[get("/threads/{thread_id}/page-{page}")]
pub async fn view_thread_page(
    client: ClientCtx,
    session: actix_session::Session,
    path: web::Path<(i32, i32)>,
) -> Result<impl Responder, Error> {
    let (thread_id, page) = path.into_inner();
    render_thread_page(client, session, thread_id, page).await
}

/// Jump to the newest page of a thread.
#[get("/threads/{thread_id}/last")]
pub async fn view_thread_last(path: web::Path<i32>) -> Result<impl Responder, Error> {
    let thread_id = path.into_inner();
    let thread = find_thread(get_db_pool(), thread_id).await?;

    let posts_per_page = crate::app_config::get_app_config().forum.posts_per_page;
    let last_page = get_pages_in_thread(thread.post_count, posts_per_page);
    Ok(see_other(links::thread_url(thread_id, last_page)))
}

/// Shared prologue for the single-button moderation endpoints.
async fn moderation_target(
    client: &ClientCtx,
    session: &actix_session::Session,
    csrf_token: &str,
    permission: &str,
    thread_id: i32,
) -> Result<(crate::user::Profile, threads::Model), Error> {
    let user = client.require_login()?.clone();
    crate::middleware::csrf::validate_csrf_token(session, csrf_token)?;
    client.require_permission(permission)?;

    let thread = find_thread(get_db_pool(), thread_id).await?;
    Ok((user, thread))
}

#[post("/threads/{thread_id}/pin")]
pub async fn pin_thread(
    client: ClientCtx,
    session: actix_session::Session,
    path: web::Path<i32>,
    form: web::Form<ModerationForm>,
) -> Result<impl Responder, Error> {
    let thread_id = path.into_inner();
    let (user, thread) =
        moderation_target(&client, &session, &form.csrf_token, "moderate.thread.pin", thread_id)
            .await?;

    let changed = moderation::threads::pin_thread(get_db_pool(), &user, &thread)
        .await
        .map_err(error::ErrorInternalServerError)?;

    if changed {
        log::info!("Thread {} pinned by {}", thread_id, user.name);
    }
    flash_outcome(&session, changed, "Thread pinned.");
    Ok(see_other(links::thread_url(thread_id, 1)))
}

#[post("/threads/{thread_id}/announce")]
pub async fn announce_thread(
    client: ClientCtx,
    session: actix_session::Session,
    path: web::Path<i32>,
    form: web::Form<ModerationForm>,
) -> Result<impl Responder, Error> {
    let thread_id = path.into_inner();
    let (user, thread) =
        moderation_target(&client, &session, &form.csrf_token, "moderate.thread.pin", thread_id)
            .await?;

    let changed = moderation::threads::announce_thread(get_db_pool(), &user, &thread)
        .await
        .map_err(error::ErrorInternalServerError)?;

    if changed {
        log::info!("Thread {} announced by {}", thread_id, user.name);
    }
    flash_outcome(&session, changed, "Thread turned into an announcement.");
    Ok(see_other(links::thread_url(thread_id, 1)))
}

#[post("/threads/{thread_id}/weight")]
pub async fn remove_thread_weight(
    client: ClientCtx,
    session: actix_session::Session,
    path: web::Path<i32>,
    form: web::Form<ModerationForm>,
) -> Result<impl Responder, Error> {
    let thread_id = path.into_inner();
    let (user, thread) =
        moderation_target(&client, &session, &form.csrf_token, "moderate.thread.pin", thread_id)
            .await?;

    let changed = moderation::threads::remove_thread_weight(get_db_pool(), &user, &thread)
        .await
        .map_err(error::ErrorInternalServerError)?;

    if changed {
        log::info!("Thread {} weight removed by {}", thread_id, user.name);
    }
    flash_outcome(&session, changed, "Thread weight removed.");
    Ok(see_other(links::thread_url(thread_id, 1)))
}

#[post("/threads/{thread_id}/open")]
pub async fn open_thread(
    client: ClientCtx,
    session: actix_session::Session,
    path: web::Path<i32>,
    form: web::Form<ModerationForm>,
) -> Result<impl Responder, Error> {
    let thread_id = path.into_inner();
    let (user, thread) = moderation_target(
        &client,
        &session,
        &form.csrf_token,
        "moderate.thread.close",
        thread_id,
    )
    .await?;

    let changed = moderation::threads::open_thread(get_db_pool(), &user, &thread)
        .await
        .map_err(error::ErrorInternalServerError)?;

    if changed {
        log::info!("Thread {} opened by {}", thread_id, user.name);
    }
    flash_outcome(&session, changed, "Thread opened.");
    Ok(see_other(links::thread_url(thread_id, 1)))
}

#[post("/threads/{thread_id}/close")]
pub async fn close_thread(
    client: ClientCtx,
    session: actix_session::Session,
    path: web::Path<i32>,
    form: web::Form<ModerationForm>,
) -> Result<impl Responder, Error> {
    let thread_id = path.into_inner();
    let (user, thread) = moderation_target(
        &client,
        &session,
        &form.csrf_token,
        "moderate.thread.close",
        thread_id,
    )
    .await?;

    let changed = moderation::threads::close_thread(get_db_pool(), &user, &thread)
        .await
        .map_err(error::ErrorInternalServerError)?;

    if changed {
        log::info!("Thread {} closed by {}", thread_id, user.name);
    }
    flash_outcome(&session, changed, "Thread closed.");
    Ok(see_other(links::thread_url(thread_id, 1)))
}

#[post("/threads/{thread_id}/hide")]
pub async fn hide_thread(
    client: ClientCtx,
    session: actix_session::Session,
    path: web::Path<i32>,
    form: web::Form<ModerationForm>,
) -> Result<impl Responder, Error> {
    let thread_id = path.into_inner();
    let (user, thread) = moderation_target(
        &client,
        &session,
        &form.csrf_token,
        "moderate.thread.hide",
        thread_id,
    )
    .await?;

    let changed = moderation::threads::hide_thread(get_db_pool(), &user, &thread)
        .await
        .map_err(error::ErrorInternalServerError)?;

    if changed {
        log::info!("Thread {} hidden by {}", thread_id, user.name);
    }
    flash_outcome(&session, changed, "Thread hidden.");
    Ok(see_other(links::thread_url(thread_id, 1)))
}

#[post("/threads/{thread_id}/unhide")]
pub async fn unhide_thread(
    client: ClientCtx,
    session: actix_session::Session,
    path: web::Path<i32>,
    form: web::Form<ModerationForm>,
) -> Result<impl Responder, Error> {
    let thread_id = path.into_inner();
    let (user, thread) = moderation_target(
        &client,
        &session,
        &form.csrf_token,
        "moderate.thread.hide",
        thread_id,
    )
    .await?;

    let changed = moderation::threads::unhide_thread(get_db_pool(), &user, &thread)
        .await
        .map_err(error::ErrorInternalServerError)?;

    if changed {
        log::info!("Thread {} made visible by {}", thread_id, user.name);
    }
    flash_outcome(&session, changed, "Thread made visible.");
    Ok(see_other(links::thread_url(thread_id, 1)))
}

#[post("/threads/{thread_id}/approve")]
pub async fn approve_thread(
    client: ClientCtx,
    session: actix_session::Session,
    path: web::Path<i32>,
    form: web::Form<ModerationForm>,
) -> Result<impl Responder, Error> {
    let thread_id = path.into_inner();
    let (user, thread) = moderation_target(
        &client,
        &session,
        &form.csrf_token,
        "moderate.thread.approve",
        thread_id,
    )
    .await?;

    let changed = moderation::threads::approve_thread(get_db_pool(), &user, &thread)
        .await
        .map_err(error::ErrorInternalServerError)?;

    if changed {
        log::info!("Thread {} approved by {}", thread_id, user.name);
    }
    flash_outcome(&session, changed, "Thread approved.");
    Ok(see_other(links::thread_url(thread_id, 1)))
}

#[get("/threads/{thread_id}/move")]
pub async fn view_move_thread_form(
    client: ClientCtx,
    session: actix_session::Session,
    path: web::Path<i32>,
) -> Result<impl Responder, Error> {
    client.require_login()?;
    client.require_permission("moderate.thread.move")?;

    let db = get_db_pool();
    let thread = find_thread(db, path.into_inner()).await?;

    let category_models = categories::Entity::find()
        .filter(categories::Column::Level.gt(0))
        .order_by_asc(categories::Column::Name)
        .all(db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(MoveThreadTemplate {
        client,
        flashes: take_flashes(&session),
        thread,
        categories: category_models,
    }
    .to_response())
}

#[post("/threads/{thread_id}/move")]
pub async fn move_thread(
    client: ClientCtx,
    session: actix_session::Session,
    path: web::Path<i32>,
    form: web::Form<MoveThreadForm>,
) -> Result<impl Responder, Error> {
    let thread_id = path.into_inner();
    let (user, thread) = moderation_target(
        &client,
        &session,
        &form.csrf_token,
        "moderate.thread.move",
        thread_id,
    )
    .await?;

    let db = get_db_pool();
    let new_category = categories::Entity::find_by_id(form.category_id)
        .one(db)
        .await
        .map_err(error::ErrorInternalServerError)?
        .ok_or_else(|| error::ErrorNotFound("Target category not found."))?;

    let changed = moderation::threads::move_thread(db, &user, &thread, &new_category)
        .await
        .map_err(error::ErrorInternalServerError)?;

    if changed {
        log::info!(
            "Thread {} moved to category {} by {}",
            thread_id,
            new_category.id,
            user.name
        );
    }
    flash_outcome(
        &session,
        changed,
        &format!("Thread moved to {}.", new_category.name),
    );
    Ok(see_other(links::thread_url(thread_id, 1)))
}

#[get("/threads/{thread_id}/merge")]
pub async fn view_merge_thread_form(
    client: ClientCtx,
    session: actix_session::Session,
    path: web::Path<i32>,
) -> Result<impl Responder, Error> {
    client.require_login()?;
    client.require_permission("moderate.thread.merge")?;

    let thread = find_thread(get_db_pool(), path.into_inner()).await?;

    Ok(MergeThreadTemplate {
        client,
        flashes: take_flashes(&session),
        thread,
    }
    .to_response())
}

#[post("/threads/{thread_id}/merge")]
pub async fn merge_thread(
    client: ClientCtx,
    session: actix_session::Session,
    path: web::Path<i32>,
    form: web::Form<MergeThreadForm>,
) -> Result<impl Responder, Error> {
    let thread_id = path.into_inner();
    let (user, thread) = moderation_target(
        &client,
        &session,
        &form.csrf_token,
        "moderate.thread.merge",
        thread_id,
    )
    .await?;

    if form.other_thread_id == thread.id {
        flash_error(&session, "A thread can not be merged with itself.");
        return Ok(see_other(links::thread_url(thread_id, 1)));
    }

    let db = get_db_pool();
    let other_thread = find_thread(db, form.other_thread_id).await?;

    moderation::threads::merge_thread(db, &user, &thread, &other_thread)
        .await
        .map_err(error::ErrorInternalServerError)?;

    log::info!(
        "Thread {} merged into thread {} by {}",
        other_thread.id,
        thread_id,
        user.name
    );
    flash_success(
        &session,
        &format!("Merged in \"{}\".", other_thread.title),
    );
    Ok(see_other(links::thread_url(thread_id, 1)))
}

#[post("/threads/{thread_id}/delete")]
pub async fn delete_thread(
    client: ClientCtx,
    session: actix_session::Session,
    path: web::Path<i32>,
    form: web::Form<ModerationForm>,
) -> Result<impl Responder, Error> {
    let thread_id = path.into_inner();
    let (user, thread) = moderation_target(
        &client,
        &session,
        &form.csrf_token,
        "moderate.thread.delete",
        thread_id,
    )
    .await?;

    let db = get_db_pool();
    let category = categories::Entity::find_by_id(thread.category_id)
        .one(db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    moderation::threads::delete_thread(db, &user, &thread)
        .await
        .map_err(error::ErrorInternalServerError)?;

    log::info!("Thread {} deleted by {}", thread_id, user.name);
    flash_success(&session, "Thread deleted.");

    let destination = category
        .as_ref()
        .map(links::category_url)
        .unwrap_or_else(|| "/threads/".to_owned());
    Ok(see_other(destination))
}

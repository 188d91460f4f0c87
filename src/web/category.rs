use super::flash::{take_flashes, Flash};
use super::links;
use crate::db::get_db_pool;
use crate::middleware::ClientCtx;
use crate::orm::{categories, threads};
use crate::template::{Paginator, PaginatorToHtml};
use actix_web::{error, get, web, Error, HttpResponse, Responder};
use askama_actix::{Template, TemplateToResponse};
use sea_orm::{entity::*, query::*, QueryFilter};

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_index)
        .service(view_thread_index)
        .service(view_thread_index_page)
        .service(view_category)
        .service(view_category_page);
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub client: ClientCtx,
    pub flashes: Vec<Flash>,
    pub categories: Vec<categories::Model>,
}

#[derive(Template)]
#[template(path = "thread_list.html")]
pub struct ThreadListTemplate {
    pub client: ClientCtx,
    pub flashes: Vec<Flash>,
    /// None on the root thread index.
    pub category: Option<categories::Model>,
    pub threads: Vec<threads::Model>,
    pub paginator: Paginator,
}

#[get("/")]
pub async fn view_index(
    client: ClientCtx,
    session: actix_session::Session,
) -> Result<impl Responder, Error> {
    let category_models = categories::Entity::find()
        .filter(categories::Column::Level.gt(0))
        .order_by_asc(categories::Column::Name)
        .all(get_db_pool())
        .await
        .map_err(error::ErrorInternalServerError)?;

    Ok(IndexTemplate {
        client,
        flashes: take_flashes(&session),
        categories: category_models,
    }
    .to_response())
}

async fn render_thread_list(
    client: ClientCtx,
    session: actix_session::Session,
    category: Option<categories::Model>,
    page: i32,
) -> Result<HttpResponse, Error> {
    let db = get_db_pool();

    let mut query = threads::Entity::find();
    if let Some(category) = &category {
        query = query.filter(threads::Column::CategoryId.eq(category.id));
    }

    // Hidden threads are only listed for the moderators who can act on them.
    if !client.can("moderate.thread.hide") {
        query = query.filter(threads::Column::IsHidden.eq(false));
    }

    // Announcements over pins over everything else, then by activity.
    let query = query
        .order_by_desc(threads::Column::Weight)
        .order_by_desc(threads::Column::LastPostAt);

    let threads_per_page = crate::app_config::get_app_config().forum.threads_per_page;
    let pager = query.paginate(db, threads_per_page as usize);
    let page_count = std::cmp::max(1, pager.num_pages().await.map_err(error::ErrorInternalServerError)? as i32);
    let page = page.clamp(1, page_count);
    let thread_models = pager
        .fetch_page((page - 1) as usize)
        .await
        .map_err(error::ErrorInternalServerError)?;

    let base_url = category
        .as_ref()
        .map(links::category_url)
        .unwrap_or_else(|| "/threads/".to_owned());

    Ok(ThreadListTemplate {
        client,
        flashes: take_flashes(&session),
        category,
        threads: thread_models,
        paginator: Paginator {
            base_url,
            this_page: page,
            page_count,
        },
    }
    .to_response())
}

#[get("/threads/")]
pub async fn view_thread_index(
    client: ClientCtx,
    session: actix_session::Session,
) -> Result<impl Responder, Error> {
    render_thread_list(client, session, None, 1).await
}

#[get("/threads/page-{page}")]
pub async fn view_thread_index_page(
    client: ClientCtx,
    session: actix_session::Session,
    path: web::Path<i32>,
) -> Result<impl Responder, Error> {
    render_thread_list(client, session, None, path.into_inner()).await
}

async fn find_category(category_id: i32) -> Result<categories::Model, Error> {
    categories::Entity::find_by_id(category_id)
        .one(get_db_pool())
        .await
        .map_err(error::ErrorInternalServerError)?
        .ok_or_else(|| error::ErrorNotFound("Category not found."))
}

#[get("/categories/{category_id}/")]
pub async fn view_category(
    client: ClientCtx,
    session: actix_session::Session,
    path: web::Path<i32>,
) -> Result<impl Responder, Error> {
    let category = find_category(path.into_inner()).await?;
    render_thread_list(client, session, Some(category), 1).await
}

#[get("/categories/{category_id}/page-{page}")]
pub async fn view_category_page(
    client: ClientCtx,
    session: actix_session::Session,
    path: web::Path<(i32, i32)>,
) -> Result<impl Responder, Error> {
    let (category_id, page) = path.into_inner();
    let category = find_category(category_id).await?;
    render_thread_list(client, session, Some(category), page).await
}

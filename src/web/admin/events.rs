//! Moderation event log.
//!
//! Read-only view over the append-only audit trail.

use super::scaffold::{
    check_screen_permission, current_ordering, list_page, ordering_choices, see_other,
    set_ordering, AdminScreen, ListScreen,
};
use crate::middleware::ClientCtx;
use crate::orm::thread_events;
use crate::template::{Paginator, PaginatorToHtml};
use crate::web::flash::{take_flashes, Flash};
use actix_web::{error, get, post, web, Error, Responder};
use askama_actix::{Template, TemplateToResponse};
use sea_orm::{query::*, Select};
use serde::Deserialize;

pub struct EventsScreen;

impl AdminScreen for EventsScreen {
    type Entity = thread_events::Entity;

    const ROOT_LINK: &'static str = "/admin/events";
    const MESSAGE_404: &'static str = "Requested event does not exist.";
    const PERMISSION: &'static str = "admin.events";
}

impl ListScreen for EventsScreen {
    const ORDERING: &'static [(&'static str, &'static str)] =
        &[("Newest first", "newest"), ("Oldest first", "oldest")];
    const ITEMS_PER_PAGE: i32 = 50;

    fn order_query(query: Select<Self::Entity>, key: &str) -> Select<Self::Entity> {
        match key {
            "oldest" => query.order_by_asc(thread_events::Column::CreatedAt),
            _ => query.order_by_desc(thread_events::Column::CreatedAt),
        }
    }
}

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_events)
        .service(view_events_page)
        .service(set_events_ordering);
}

#[derive(Template)]
#[template(path = "admin/events.html")]
struct EventsListTemplate {
    client: ClientCtx,
    flashes: Vec<Flash>,
    items: Vec<thread_events::Model>,
    paginator: Paginator,
    order: (&'static str, &'static str),
    order_choices: Vec<(&'static str, &'static str)>,
}

#[derive(Deserialize)]
struct OrderingForm {
    csrf_token: String,
    order_by: String,
}

async fn render_events(
    client: ClientCtx,
    session: actix_session::Session,
    page: i32,
) -> Result<actix_web::HttpResponse, Error> {
    if let Err(redirect) = check_screen_permission::<EventsScreen>(&client, &session) {
        return Ok(redirect);
    }

    let (items, paginator) = list_page::<EventsScreen>(&session, page)
        .await
        .map_err(error::ErrorInternalServerError)?;
    let order = current_ordering::<EventsScreen>(&session);

    Ok(EventsListTemplate {
        client,
        flashes: take_flashes(&session),
        items,
        paginator,
        order,
        order_choices: ordering_choices::<EventsScreen>(order),
    }
    .to_response())
}

#[get("/admin/events")]
pub async fn view_events(
    client: ClientCtx,
    session: actix_session::Session,
) -> Result<impl Responder, Error> {
    render_events(client, session, 1).await
}

#[get("/admin/events/page-{page}")]
pub async fn view_events_page(
    client: ClientCtx,
    session: actix_session::Session,
    path: web::Path<i32>,
) -> Result<impl Responder, Error> {
    render_events(client, session, path.into_inner()).await
}

#[post("/admin/events/order")]
pub async fn set_events_ordering(
    client: ClientCtx,
    session: actix_session::Session,
    form: web::Form<OrderingForm>,
) -> Result<impl Responder, Error> {
    crate::middleware::csrf::validate_csrf_token(&session, &form.csrf_token)?;
    if let Err(redirect) = check_screen_permission::<EventsScreen>(&client, &session) {
        return Ok(redirect);
    }

    set_ordering::<EventsScreen>(&session, &form.order_by);
    Ok(see_other(EventsScreen::ROOT_LINK))
}

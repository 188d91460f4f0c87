//! Category management screens.

use super::scaffold::{
    check_screen_permission, current_ordering, get_target_or_redirect, list_page,
    ordering_choices, see_other, set_ordering, AdminScreen, ListScreen,
};
use crate::db::get_db_pool;
use crate::middleware::ClientCtx;
use crate::orm::{categories, threads};
use crate::slug::slugify;
use crate::template::{Paginator, PaginatorToHtml};
use crate::web::flash::{flash_error, flash_success, take_flashes, Flash};
use actix_web::{error, get, post, web, Error, Responder};
use askama_actix::{Template, TemplateToResponse};
use sea_orm::{entity::*, query::*, ActiveValue::Set, QueryFilter, Select};
use serde::Deserialize;
use validator::Validate;

pub struct CategoriesScreen;

impl AdminScreen for CategoriesScreen {
    type Entity = categories::Entity;

    const ROOT_LINK: &'static str = "/admin/categories";
    const MESSAGE_404: &'static str = "Requested category does not exist.";
    const PERMISSION: &'static str = "admin.categories";
}

impl ListScreen for CategoriesScreen {
    const ORDERING: &'static [(&'static str, &'static str)] = &[
        ("Name", "name"),
        ("Threads", "threads"),
        ("Posts", "posts"),
    ];

    fn order_query(query: Select<Self::Entity>, key: &str) -> Select<Self::Entity> {
        match key {
            "threads" => query.order_by_desc(categories::Column::ThreadCount),
            "posts" => query.order_by_desc(categories::Column::PostCount),
            _ => query.order_by_asc(categories::Column::Name),
        }
    }
}

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_categories)
        .service(set_categories_ordering)
        .service(view_create_category_form)
        .service(create_category)
        .service(view_edit_category_form)
        .service(update_category)
        .service(delete_category);
}

#[derive(Template)]
#[template(path = "admin/categories.html")]
struct CategoriesListTemplate {
    client: ClientCtx,
    flashes: Vec<Flash>,
    items: Vec<categories::Model>,
    paginator: Paginator,
    order: (&'static str, &'static str),
    order_choices: Vec<(&'static str, &'static str)>,
}

#[derive(Template)]
#[template(path = "admin/category_form.html")]
struct CategoryFormTemplate {
    client: ClientCtx,
    flashes: Vec<Flash>,
    target: Option<categories::Model>,
}

#[derive(Deserialize)]
struct OrderingForm {
    csrf_token: String,
    order_by: String,
}

#[derive(Deserialize, Validate)]
struct CategoryForm {
    csrf_token: String,
    #[validate(length(min = 1, max = 100, message = "Category name must be 1-100 characters."))]
    name: String,
    #[validate(range(min = 1, max = 5, message = "Category level must be between 1 and 5."))]
    level: i32,
    /// "Save and keep editing" checkbox.
    stay: Option<String>,
}

fn flash_form_errors(session: &actix_session::Session, errors: &validator::ValidationErrors) {
    for errs in errors.field_errors().values() {
        for err in errs.iter() {
            match &err.message {
                Some(message) => flash_error(session, message),
                None => flash_error(session, "Submitted form contained errors."),
            }
        }
    }
}

#[get("/admin/categories")]
pub async fn view_categories(
    client: ClientCtx,
    session: actix_session::Session,
) -> Result<impl Responder, Error> {
    if let Err(redirect) = check_screen_permission::<CategoriesScreen>(&client, &session) {
        return Ok(redirect);
    }

    let (items, paginator) = list_page::<CategoriesScreen>(&session, 1)
        .await
        .map_err(error::ErrorInternalServerError)?;
    let order = current_ordering::<CategoriesScreen>(&session);

    Ok(CategoriesListTemplate {
        client,
        flashes: take_flashes(&session),
        items,
        paginator,
        order,
        order_choices: ordering_choices::<CategoriesScreen>(order),
    }
    .to_response())
}

#[post("/admin/categories/order")]
pub async fn set_categories_ordering(
    client: ClientCtx,
    session: actix_session::Session,
    form: web::Form<OrderingForm>,
) -> Result<impl Responder, Error> {
    crate::middleware::csrf::validate_csrf_token(&session, &form.csrf_token)?;
    if let Err(redirect) = check_screen_permission::<CategoriesScreen>(&client, &session) {
        return Ok(redirect);
    }

    set_ordering::<CategoriesScreen>(&session, &form.order_by);
    Ok(see_other(CategoriesScreen::ROOT_LINK))
}

#[get("/admin/categories/create")]
pub async fn view_create_category_form(
    client: ClientCtx,
    session: actix_session::Session,
) -> Result<impl Responder, Error> {
    if let Err(redirect) = check_screen_permission::<CategoriesScreen>(&client, &session) {
        return Ok(redirect);
    }

    Ok(CategoryFormTemplate {
        client,
        flashes: take_flashes(&session),
        target: None,
    }
    .to_response())
}

#[post("/admin/categories/create")]
pub async fn create_category(
    client: ClientCtx,
    session: actix_session::Session,
    form: web::Form<CategoryForm>,
) -> Result<impl Responder, Error> {
    crate::middleware::csrf::validate_csrf_token(&session, &form.csrf_token)?;
    if let Err(redirect) = check_screen_permission::<CategoriesScreen>(&client, &session) {
        return Ok(redirect);
    }

    if let Err(errors) = form.validate() {
        flash_form_errors(&session, &errors);
        return Ok(see_other("/admin/categories/create"));
    }

    let category = categories::ActiveModel {
        name: Set(form.name.clone()),
        slug: Set(slugify(&form.name)),
        level: Set(form.level),
        thread_count: Set(0),
        post_count: Set(0),
        last_thread_id: Set(None),
        ..Default::default()
    }
    .insert(get_db_pool())
    .await
    .map_err(|e| {
        log::error!("Failed to create category: {}", e);
        error::ErrorInternalServerError("Database error")
    })?;

    flash_success(&session, &format!("Category \"{}\" created.", category.name));

    if form.stay.is_some() {
        Ok(see_other("/admin/categories/create"))
    } else {
        Ok(see_other(CategoriesScreen::ROOT_LINK))
    }
}

#[get("/admin/categories/{id}/edit")]
pub async fn view_edit_category_form(
    client: ClientCtx,
    session: actix_session::Session,
    path: web::Path<i32>,
) -> Result<impl Responder, Error> {
    if let Err(redirect) = check_screen_permission::<CategoriesScreen>(&client, &session) {
        return Ok(redirect);
    }

    let target = match get_target_or_redirect::<CategoriesScreen>(&session, path.into_inner()).await
    {
        Ok(target) => target,
        Err(redirect) => return Ok(redirect),
    };

    Ok(CategoryFormTemplate {
        client,
        flashes: take_flashes(&session),
        target: Some(target),
    }
    .to_response())
}

#[post("/admin/categories/{id}/edit")]
pub async fn update_category(
    client: ClientCtx,
    session: actix_session::Session,
    path: web::Path<i32>,
    form: web::Form<CategoryForm>,
) -> Result<impl Responder, Error> {
    crate::middleware::csrf::validate_csrf_token(&session, &form.csrf_token)?;
    if let Err(redirect) = check_screen_permission::<CategoriesScreen>(&client, &session) {
        return Ok(redirect);
    }

    let id = path.into_inner();
    let target = match get_target_or_redirect::<CategoriesScreen>(&session, id).await {
        Ok(target) => target,
        Err(redirect) => return Ok(redirect),
    };

    if let Err(errors) = form.validate() {
        flash_form_errors(&session, &errors);
        return Ok(see_other(&format!("/admin/categories/{}/edit", id)));
    }

    let mut active: categories::ActiveModel = target.into();
    active.name = Set(form.name.clone());
    active.slug = Set(slugify(&form.name));
    active.level = Set(form.level);
    let category = active.update(get_db_pool()).await.map_err(|e| {
        log::error!("Failed to update category: {}", e);
        error::ErrorInternalServerError("Database error")
    })?;

    flash_success(&session, &format!("Category \"{}\" saved.", category.name));

    if form.stay.is_some() {
        Ok(see_other(&format!("/admin/categories/{}/edit", id)))
    } else {
        Ok(see_other(CategoriesScreen::ROOT_LINK))
    }
}

#[derive(Deserialize)]
struct DeleteForm {
    csrf_token: String,
}

#[post("/admin/categories/{id}/delete")]
pub async fn delete_category(
    client: ClientCtx,
    session: actix_session::Session,
    path: web::Path<i32>,
    form: web::Form<DeleteForm>,
) -> Result<impl Responder, Error> {
    crate::middleware::csrf::validate_csrf_token(&session, &form.csrf_token)?;
    if let Err(redirect) = check_screen_permission::<CategoriesScreen>(&client, &session) {
        return Ok(redirect);
    }

    let target = match get_target_or_redirect::<CategoriesScreen>(&session, path.into_inner()).await
    {
        Ok(target) => target,
        Err(redirect) => return Ok(redirect),
    };

    let db = get_db_pool();
    let thread_count = threads::Entity::find()
        .filter(threads::Column::CategoryId.eq(target.id))
        .count(db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    if thread_count > 0 {
        flash_error(
            &session,
            "Category still contains threads and can not be deleted.",
        );
        return Ok(see_other(CategoriesScreen::ROOT_LINK));
    }

    let name = target.name.clone();
    categories::Entity::delete_by_id(target.id)
        .exec(db)
        .await
        .map_err(|e| {
            log::error!("Failed to delete category: {}", e);
            error::ErrorInternalServerError("Database error")
        })?;

    log::info!("Category \"{}\" deleted by {}", name, client.get_name());
    flash_success(&session, &format!("Category \"{}\" deleted.", name));
    Ok(see_other(CategoriesScreen::ROOT_LINK))
}

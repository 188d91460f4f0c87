use crate::db::get_db_pool;
use crate::permission::PermissionData;
use crate::user::Profile;
use actix_session::Session;
use actix_web::dev::{self, Extensions, Payload, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{web::Data, Error, FromRequest, HttpMessage, HttpRequest};
use futures::future::{err, ready, LocalBoxFuture, Ready};
use std::rc::Rc;

/// Client data resolved once per request cycle.
#[derive(Clone, Debug)]
pub struct ClientCtxInner {
    /// User data. None is a guest.
    pub client: Option<Profile>,
    /// Group ids the user belongs to. Empty for guests.
    pub groups: Vec<i32>,
    /// Permission data.
    pub permissions: Data<PermissionData>,
    /// CSRF token for form protection.
    pub csrf_token: String,
}

impl Default for ClientCtxInner {
    fn default() -> Self {
        Self {
            permissions: Data::new(PermissionData::default()),
            groups: Vec::new(),
            client: None,
            csrf_token: String::new(),
        }
    }
}

impl ClientCtxInner {
    pub async fn from_session(session: &Session, permissions: Data<PermissionData>) -> Self {
        use crate::middleware::csrf::get_or_create_csrf_token;
        use crate::permission::get_group_ids_for_client;
        use crate::session::authenticate_client_by_session;

        let db = get_db_pool();
        let client = authenticate_client_by_session(session).await;
        let groups = get_group_ids_for_client(db, &client).await;
        let csrf_token = get_or_create_csrf_token(session).unwrap_or_default();

        ClientCtxInner {
            client,
            groups,
            permissions,
            csrf_token,
        }
    }
}

/// Client context passed to routes.
/// Wraps ClientCtxInner, which is set at the beginning of the request.
#[derive(Clone, Debug)]
pub struct ClientCtx(Data<ClientCtxInner>);

impl Default for ClientCtx {
    fn default() -> Self {
        Self(Data::new(ClientCtxInner::default()))
    }
}

impl ClientCtx {
    fn get_or_default_from_extensions(
        extensions: &mut Extensions,
        permissions: Data<PermissionData>,
    ) -> Self {
        match extensions.get::<Data<ClientCtxInner>>() {
            Some(cbox) => Self(cbox.clone()),
            None => {
                let cbox = Data::new(ClientCtxInner {
                    permissions,
                    ..Default::default()
                });
                extensions.insert(cbox.clone());
                Self(cbox)
            }
        }
    }

    pub fn get_groups(&self) -> Vec<i32> {
        self.0.groups.to_owned()
    }

    /// Returns either the user's id or None.
    pub fn get_id(&self) -> Option<i32> {
        self.0.client.as_ref().map(|u| u.id)
    }

    /// Returns either the user's name or the word for guest.
    pub fn get_name(&self) -> String {
        match &self.0.client {
            Some(user) => user.name.to_owned(),
            None => "Guest".to_owned(),
        }
    }

    pub fn get_user(&self) -> Option<&Profile> {
        self.0.client.as_ref()
    }

    pub fn get_csrf_token(&self) -> &str {
        &self.0.csrf_token
    }

    pub fn is_user(&self) -> bool {
        self.0.client.is_some()
    }

    pub fn can(&self, tag: &str) -> bool {
        self.0.permissions.can(self, tag)
    }

    /// Require user to be logged in. Returns the profile or ErrorUnauthorized.
    pub fn require_login(&self) -> Result<&Profile, actix_web::Error> {
        self.get_user()
            .ok_or_else(|| actix_web::error::ErrorUnauthorized("Login required"))
    }

    /// Require specific permission. Returns () or ErrorForbidden.
    pub fn require_permission(&self, permission: &str) -> Result<(), actix_web::Error> {
        if !self.can(permission) {
            return Err(actix_web::error::ErrorForbidden("Insufficient permissions"));
        }
        Ok(())
    }
}

/// Provides the `client: ClientCtx` parameter of route functions.
impl FromRequest for ClientCtx {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        if let Some(perm_arc) = req.app_data::<Data<PermissionData>>() {
            ready(Ok(ClientCtx::get_or_default_from_extensions(
                &mut req.extensions_mut(),
                perm_arc.clone(),
            )))
        } else {
            err(actix_web::error::ErrorServiceUnavailable(
                "Permission data is not loaded.",
            ))
        }
    }
}

impl<S: 'static, B> Transform<S, ServiceRequest> for ClientCtx
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = ClientCtxMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ClientCtxMiddleware {
            service: Rc::new(service),
        }))
    }
}

/// Client context middleware
pub struct ClientCtxMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for ClientCtxMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    dev::forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let svc = self.service.clone();

        // Borrows of `req` must be done in a precise way to avoid conflicts.
        // This order is important.
        let (httpreq, payload) = req.into_parts();
        let session = Session::extract(&httpreq).into_inner();
        let req = ServiceRequest::from_parts(httpreq, payload);

        Box::pin(async move {
            if let Some(perm_arc) = req.app_data::<Data<PermissionData>>() {
                let perm_arc = perm_arc.clone();

                match session {
                    Ok(session) => req.extensions_mut().insert(Data::new(
                        ClientCtxInner::from_session(&session, perm_arc).await,
                    )),
                    Err(err) => {
                        log::error!("Unable to extract Session data in middleware: {}", err);
                        None
                    }
                };
            };

            svc.call(req).await
        })
    }
}

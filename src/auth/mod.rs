use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::cookie::Cookie;
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use chrono::{Days, NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    permission::Role,
    schema::users,
    state::{Conn, DbPool},
    util_resp::FailureResponse,
};

pub mod login;
pub mod register;

pub const LOGIN_COOKIE: &str = "diveboard_session";

#[derive(Debug, Queryable, Serialize, Deserialize, Clone)]
pub struct User {
    pub id: String,
    pub email: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
    pub created_at: NaiveDateTime,
    pub last_login: Option<NaiveDateTime>,
}

impl User {
    pub fn role(&self) -> Role {
        // The column has a CHECK constraint, so this only falls back for
        // rows written by something other than this program.
        self.role.parse().unwrap_or(Role::Viewer)
    }
}

#[derive(serde::Serialize, serde::Deserialize)]
pub struct LoginSession {
    id: String,
    expiry: NaiveDateTime,
}

#[async_trait]
impl<S> FromRequestParts<S> for User
where
    S: Send + Sync,
    DbPool: FromRef<S>,
    Key: FromRef<S>,
{
    type Rejection = FailureResponse;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let jar: PrivateCookieJar<Key> =
            PrivateCookieJar::from_request_parts(parts, state)
                .await
                .map_err(|_| FailureResponse::Unauthenticated(()))?;

        let login_cookie = match jar.get(LOGIN_COOKIE) {
            Some(cookie) => cookie,
            None => return Err(FailureResponse::Unauthenticated(())),
        };

        let login: LoginSession =
            match serde_json::from_str::<LoginSession>(login_cookie.value()) {
                Ok(t) if Utc::now().naive_utc() < t.expiry => t,
                _ => return Err(FailureResponse::Unauthenticated(())),
            };

        // Dropped at the end of this function, so the handler can take the
        // same connection afterwards.
        let mut conn = Conn::<false>::from_request_parts(parts, state).await?;

        let user = users::table
            .filter(users::id.eq(login.id))
            .first::<User>(&mut *conn)
            .optional()?;

        user.ok_or(FailureResponse::Unauthenticated(()))
    }
}

pub fn set_login_cookie(id: String, jar: PrivateCookieJar) -> PrivateCookieJar {
    let expiry = Utc::now().naive_utc() + Days::new(7);

    let session = LoginSession { id, expiry };
    let value = match serde_json::to_string(&session) {
        Ok(value) => value,
        Err(e) => unreachable!("login session always serializes: {e}"),
    };

    let mut cookie = Cookie::new(LOGIN_COOKIE, value);
    cookie.set_path("/");
    cookie.set_http_only(true);
    jar.add(cookie)
}

pub fn clear_login_cookie(jar: PrivateCookieJar) -> PrivateCookieJar {
    jar.remove(Cookie::build(LOGIN_COOKIE).path("/"))
}

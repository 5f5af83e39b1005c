use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::{
    Form,
    extract::Query,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::PrivateCookieJar;
use chrono::Utc;
use diesel::prelude::*;
use hypertext::prelude::*;
use serde::Deserialize;
use tracing::{info, warn};

use crate::{
    auth::{User, clear_login_cookie, set_login_cookie},
    schema::users,
    state::Conn,
    template::Page,
    util_resp::{FailureResponse, StandardResponse, bad_request, success},
    widgets::alert::ErrorAlert,
};

pub async fn login_page(user: Option<User>) -> StandardResponse {
    if user.is_some() {
        return bad_request(
            Page::new()
                .user_opt(user)
                .body(maud! {
                    ErrorAlert
                        msg = "You are already logged in, so cannot log in!";
                })
                .render(),
        );
    }

    success(Page::new().user_opt(user).body(maud! {
        h1 { "Log in" }
        form method="post" class="mt-4" {
            div class="mb-3" {
                label for="id" class="form-label" { "Username or email" }
                input type="text" class="form-control" id="id" name="id";
            }
            div class="mb-3" {
                label for="password" class="form-label" { "Password" }
                input type="password" class="form-control" id="password" name="password";
            }
            button type="submit" class="btn btn-primary" { "Log in" }
        }
    }).render())
}

#[derive(Deserialize)]
pub struct LoginForm {
    pub id: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct NextParam {
    next: Option<String>,
}

/// Only the path of `next` is kept, so a login can never redirect off-site.
fn redirect_target(next: Option<&str>) -> String {
    next.and_then(|next| {
        url::Url::parse("http://localhost")
            .ok()
            .and_then(|base| base.join(next).ok())
    })
    .map(|url| url.path().to_string())
    .unwrap_or_else(|| "/".to_string())
}

pub async fn do_login(
    user: Option<User>,
    Query(params): Query<NextParam>,
    mut conn: Conn<true>,
    jar: PrivateCookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, FailureResponse> {
    let failure = |msg: &'static str| {
        bad_request(
            Page::new()
                .user_opt(user.clone())
                .body(maud! {
                    ErrorAlert msg = (msg);
                })
                .render(),
        )
    };

    let account = match users::table
        .filter(users::email.eq(&form.id).or(users::username.eq(&form.id)))
        .first::<User>(&mut *conn)
        .optional()?
    {
        Some(account) => account,
        None => {
            return failure(
                "No such user exists. Please return to the previous page and \
                 try again.",
            )
            .map(IntoResponse::into_response);
        }
    };

    let verified = PasswordHash::new(&account.password_hash)
        .map(|hash| {
            Argon2::default()
                .verify_password(form.password.as_bytes(), &hash)
                .is_ok()
        })
        .unwrap_or(false);

    if !verified {
        warn!(user = %account.username, "failed login attempt");
        return failure(
            "Incorrect password. Please return to the previous page and try \
             again.",
        )
        .map(IntoResponse::into_response);
    }

    diesel::update(users::table.filter(users::id.eq(&account.id)))
        .set(users::last_login.eq(Utc::now().naive_utc()))
        .execute(&mut *conn)?;

    info!(user = %account.username, "user logged in");

    let jar = set_login_cookie(account.id, jar);
    let target = redirect_target(params.next.as_deref());

    Ok((jar, Redirect::to(&target)).into_response())
}

pub async fn do_logout(jar: PrivateCookieJar) -> (PrivateCookieJar, Redirect) {
    (clear_login_cookie(jar), Redirect::to("/"))
}

#[cfg(test)]
mod tests {
    use super::redirect_target;

    #[test]
    fn next_parameter_stays_on_site() {
        assert_eq!(redirect_target(None), "/");
        assert_eq!(redirect_target(Some("/competitions/abc")), "/competitions/abc");
        assert_eq!(redirect_target(Some("https://evil.example/steal")), "/steal");
    }
}

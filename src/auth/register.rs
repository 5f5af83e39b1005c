use argon2::Argon2;
use argon2::PasswordHasher;
use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use axum::{
    Form,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::PrivateCookieJar;
use chrono::Utc;
use diesel::{insert_into, prelude::*};
use hypertext::prelude::*;
use serde::Deserialize;
use tracing::{error, info};
use uuid::Uuid;

use crate::{
    auth::{User, set_login_cookie},
    permission::Role,
    schema::users,
    state::Conn,
    template::Page,
    util_resp::{FailureResponse, StandardResponse, bad_request, see_other_ok, success},
    validation::*,
    widgets::alert::ErrorAlert,
};

pub async fn register_page(user: Option<User>) -> StandardResponse {
    if user.is_some() {
        return see_other_ok(Redirect::to("/"));
    }

    success(
        Page::new()
            .body(maud! {
                h1 {"Register"}
                form method="post" class="mt-4" {
                    div class="mb-3" {
                        label for="username" class="form-label" { "Username" }
                        input type="text" class="form-control" id="username" name="username";
                    }
                    div class="mb-3" {
                        label for="email" class="form-label" { "Email" }
                        input type="email" class="form-control" id="email" name="email";
                    }
                    div class="mb-3" {
                        label for="password" class="form-label" { "Password" }
                        input type="password" class="form-control" id="password" name="password";
                    }
                    div class="mb-3" {
                        label for="password2" class="form-label" { "Confirm Password" }
                        input type="password" class="form-control" id="password2" name="password2";
                    }
                    button type="submit" class="btn btn-primary" { "Register" }
                }
            })
            .render(),
    )
}

#[derive(Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub password2: String,
}

impl RegisterForm {
    fn validate(&self) -> Result<(), String> {
        is_ascii_no_spaces(&self.username)?;
        is_valid_email(&self.email)?;
        is_valid_password(&self.password)?;
        if self.password != self.password2 {
            return Err("the two passwords do not match".to_string());
        }
        Ok(())
    }
}

pub async fn do_register(
    user: Option<User>,
    mut conn: Conn<true>,
    jar: PrivateCookieJar,
    Form(form): Form<RegisterForm>,
) -> Result<Response, FailureResponse> {
    if user.is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    if let Err(msg) = form.validate() {
        return bad_request(
            Page::new()
                .body(maud! {
                    ErrorAlert msg = (&msg);
                })
                .render(),
        )
        .map(IntoResponse::into_response);
    }

    let existing = users::table
        .filter(
            users::username
                .eq(&form.username)
                .or(users::email.eq(&form.email)),
        )
        .first::<User>(&mut *conn)
        .optional()?;

    if let Some(existing) = existing {
        let is_email_problem = existing.email == form.email;

        return bad_request(
            Page::new()
                .body(maud! {
                    div class="alert alert-danger" role="alert" {
                        @if is_email_problem {
                            "That email is already taken"
                        } @else {
                            "That username is already taken"
                        }

                        ". Please return to the previous page and try again."
                    }
                })
                .render(),
        )
        .map(IntoResponse::into_response);
    }

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(form.password.as_bytes(), &salt)
        .map_err(|e| {
            error!("could not hash password: {e}");
            FailureResponse::ServerError(())
        })?
        .to_string();

    // Whoever sets the system up first gets to run it.
    let no_users_yet = users::table.count().get_result::<i64>(&mut *conn)? == 0;
    let role = if no_users_yet { Role::Admin } else { Role::Viewer };

    let id = Uuid::now_v7().to_string();
    insert_into(users::table)
        .values((
            users::id.eq(&id),
            users::username.eq(&form.username),
            users::email.eq(&form.email),
            users::password_hash.eq(password_hash),
            users::role.eq(role.as_str()),
            users::created_at.eq(Utc::now().naive_utc()),
        ))
        .execute(&mut *conn)?;

    info!(username = %form.username, role = role.as_str(), "registered user");

    let jar = set_login_cookie(id, jar);
    Ok((jar, Redirect::to("/")).into_response())
}

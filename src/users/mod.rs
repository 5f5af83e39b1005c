//! User administration.

use axum::{
    Form, Json,
    extract::Path,
    response::Redirect,
};
use diesel::{connection::LoadConnection, prelude::*, sqlite::Sqlite};
use hypertext::prelude::*;
use serde::Deserialize;
use tracing::info;

use crate::{
    auth::User,
    permission::{Permission, Role, require},
    schema::users,
    state::Conn,
    template::Page,
    util_resp::{
        FailureResponse, StandardResponse, json_ok, see_other_ok, success,
    },
};

impl User {
    #[tracing::instrument(skip(conn))]
    pub fn fetch(
        user_id: &str,
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> Result<Self, FailureResponse> {
        users::table
            .filter(users::id.eq(user_id))
            .first::<User>(conn)
            .optional()?
            .ok_or(FailureResponse::NotFound(()))
    }

    pub fn all(
        conn: &mut impl LoadConnection<Backend = Sqlite>,
    ) -> Result<Vec<Self>, FailureResponse> {
        Ok(users::table
            .order_by(users::created_at.asc())
            .load::<User>(conn)?)
    }
}

#[derive(Deserialize, Debug)]
pub struct RoleChange {
    pub role: String,
}

/// Changes somebody else's role; nobody may change their own.
fn change_role(
    actor: &User,
    target_id: &str,
    role: &str,
    conn: &mut impl LoadConnection<Backend = Sqlite>,
) -> Result<User, FailureResponse> {
    require(actor, Permission::ManageUsers)?;

    let role = role
        .parse::<Role>()
        .map_err(FailureResponse::BadRequestJson)?;

    let target = User::fetch(target_id, conn)?;
    if target.id == actor.id {
        return Err(FailureResponse::BadRequestJson(
            "you cannot change your own role".to_string(),
        ));
    }

    diesel::update(users::table.filter(users::id.eq(&target.id)))
        .set(users::role.eq(role.as_str()))
        .execute(conn)?;

    info!(
        user = %target.username,
        from = %target.role,
        to = %role,
        by = %actor.username,
        "changed user role"
    );

    User::fetch(&target.id, conn)
}

pub async fn list_users(user: User, mut conn: Conn<false>) -> StandardResponse {
    require(&user, Permission::ManageUsers)?;
    json_ok(User::all(&mut *conn)?)
}

pub async fn update_user_role(
    Path(user_id): Path<String>,
    user: User,
    mut conn: Conn<true>,
    Json(change): Json<RoleChange>,
) -> StandardResponse {
    json_ok(change_role(&user, &user_id, &change.role, &mut *conn)?)
}

pub async fn do_update_user_role_form(
    Path(user_id): Path<String>,
    user: User,
    mut conn: Conn<true>,
    Form(change): Form<RoleChange>,
) -> StandardResponse {
    change_role(&user, &user_id, &change.role, &mut *conn)?;
    see_other_ok(Redirect::to("/users"))
}

pub async fn users_page(user: User, mut conn: Conn<false>) -> StandardResponse {
    require(&user, Permission::ManageUsers)?;

    let all = User::all(&mut *conn)?;
    let my_id = user.id.clone();

    success(
        Page::new()
            .user(user)
            .title("Users")
            .body(maud! {
                h1 { "Users" }
                table class="table" {
                    thead {
                        tr {
                            th scope="col" { "Username" }
                            th scope="col" { "Email" }
                            th scope="col" { "Registered" }
                            th scope="col" { "Last login" }
                            th scope="col" { "Role" }
                        }
                    }
                    tbody {
                        @for account in &all {
                            tr {
                                td { (account.username) }
                                td { (account.email) }
                                td { (account.created_at.format("%Y-%m-%d").to_string()) }
                                td {
                                    @if let Some(last_login) = account.last_login {
                                        (last_login.format("%Y-%m-%d %H:%M").to_string())
                                    } @else {
                                        "never"
                                    }
                                }
                                td {
                                    @if account.id == my_id {
                                        (account.role) " (you)"
                                    } @else {
                                        form method="post"
                                            action=(format!("/users/{}/role", account.id))
                                            class="d-flex gap-2" {
                                            select name="role" class="form-select form-select-sm" {
                                                @for role in Role::ALL {
                                                    @if role == account.role() {
                                                        option value=(role.as_str()) selected { (role.as_str()) }
                                                    } @else {
                                                        option value=(role.as_str()) { (role.as_str()) }
                                                    }
                                                }
                                            }
                                            button type="submit" class="btn btn-sm btn-outline-primary" {
                                                "Save"
                                            }
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            })
            .render(),
    )
}

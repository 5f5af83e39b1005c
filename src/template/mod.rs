//! Templating code.
//!
//! This defines the [`Page`] item, which wraps every HTML view in this crate
//! with the shared head and navigation bar.

use hypertext::prelude::*;

use crate::{auth::User, competitions::Competition, permission::Role};

pub struct Page<R: Renderable> {
    body: Option<R>,
    user: Option<User>,
    competition: Option<Competition>,
    title: Option<String>,
}

impl<R: Renderable> Page<R> {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn competition(mut self, competition: Competition) -> Self {
        self.competition = Some(competition);
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn body(mut self, body: R) -> Self {
        self.body = Some(body);
        self
    }

    pub fn user(mut self, user: User) -> Self {
        self.user = Some(user);
        self
    }

    pub fn user_opt(mut self, user: Option<User>) -> Self {
        self.user = user;
        self
    }
}

impl<R: Renderable> Renderable for Page<R> {
    fn render_to(
        &self,
        buffer: &mut hypertext::Buffer<hypertext::context::Node>,
    ) {
        let is_admin = self
            .user
            .as_ref()
            .map(|user| user.role() == Role::Admin)
            .unwrap_or(false);

        maud! {
            html {
                head {
                    title {
                        @if let Some(title) = &self.title {
                            (title) " | "
                        }
                        "Diveboard"
                    }
                    script src="https://cdn.jsdelivr.net/npm/htmx.org@2.0.7/dist/htmx.min.js" integrity="sha384-ZBXiYtYQ6hJ2Y0ZNoYuI+Nq5MqWBr+chMrS/RkXpNzQCApHEhOt2aY8EJgqwHLkJ" crossorigin="anonymous" {
                    }
                    link href="https://cdn.jsdelivr.net/npm/bootstrap@5.3.8/dist/css/bootstrap.min.css" rel="stylesheet";
                    meta
                        name="viewport"
                        content="width=device-width, initial-scale=1";
                }
                body class="d-flex flex-column vh-100" {
                    nav class="navbar navbar-expand"
                        style="background-color: #0b4f6c;"
                        data-bs-theme="dark" {
                        div class="container-fluid" {
                            a class="navbar-brand text-white" href="/" {
                                "Diveboard"
                            }
                            @if let Some(competition) = &self.competition {
                                ul class="navbar-nav me-auto" {
                                    li class="nav-item" {
                                        a class="nav-link text-white" href=(format!("/competitions/{}", competition.id)) {
                                            (competition.name)
                                        }
                                    }
                                }
                            }
                            ul class="navbar-nav" {
                                @if is_admin {
                                    li class="nav-item" {
                                        a class="nav-link text-white" href="/users" {
                                            "Users"
                                        }
                                    }
                                }
                                @if let Some(user) = &self.user {
                                    li class="nav-item" {
                                        span class="nav-link text-white" {
                                            (user.username) " (" (user.role) ")"
                                        }
                                    }
                                    li class="nav-item" {
                                        form method="post" action="/logout" class="d-inline" {
                                            button type="submit" class="btn btn-link nav-link text-white" {
                                                "Log out"
                                            }
                                        }
                                    }
                                } @else {
                                    li class="nav-item" {
                                        a class="nav-link text-white" href="/login" {
                                            "Login"
                                        }
                                    }
                                    li class="nav-item" {
                                        a class="nav-link text-white" href="/register" {
                                            "Register"
                                        }
                                    }
                                }
                            }
                        }
                    }
                    div class="container flex-grow-1 mt-3" {
                        @if let Some(body) = &self.body {
                            (body)
                        }
                    }
                }
            }
        }.render_to(buffer)
    }
}

impl<R: Renderable> Default for Page<R> {
    fn default() -> Self {
        Self {
            body: Default::default(),
            user: Default::default(),
            competition: Default::default(),
            title: Default::default(),
        }
    }
}

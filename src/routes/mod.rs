pub mod admin;
pub mod auth;
pub mod health;
pub mod providers;
pub mod reviews;
pub mod saved;
pub mod tasks;
pub mod users;

use actix_web::web;

use crate::auth::{AdminAuthMiddleware, AuthMiddleware};

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .service(auth::register)
            .service(auth::login)
            .service(auth::verify_email)
            .service(auth::resend_verification)
            .service(auth::forgot_password)
            .service(auth::reset_password),
    )
    // Admin login is public; register it before the guarded admin scope so
    // the exact path wins.
    .service(admin::admin_login)
    .service(
        web::scope("/admin")
            .wrap(AdminAuthMiddleware)
            .configure(admin::config),
    )
    .service(
        web::scope("/users")
            .wrap(AuthMiddleware)
            .service(users::get_profile)
            .service(users::update_profile)
            .service(users::stats),
    )
    .service(
        web::scope("/tasks")
            .wrap(AuthMiddleware)
            .service(tasks::get_tasks)
            .service(tasks::create_task)
            .service(tasks::get_task)
            .service(tasks::update_task)
            .service(tasks::delete_task),
    )
    .service(
        web::scope("/saved")
            .wrap(AuthMiddleware)
            .service(saved::list_saved_tasks)
            .service(saved::toggle_saved_task)
            .service(saved::remove_saved_task)
            .service(saved::list_saved_providers)
            .service(saved::save_provider)
            .service(saved::remove_saved_provider),
    )
    // Mixed scope: browsing is public, everything else authenticates through
    // the extractor. Literal paths must come before `{id}`.
    .service(
        web::scope("/providers")
            .service(providers::register_provider)
            .service(providers::check_registration)
            .service(providers::my_provider)
            .service(providers::update_provider)
            .service(providers::search_providers)
            .service(providers::list_providers)
            .service(providers::get_provider),
    )
    .service(
        web::scope("/reviews")
            .service(reviews::create_review)
            .service(reviews::worker_reviews),
    );
}

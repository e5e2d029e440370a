#[macro_use]
extern crate rocket;

mod config;
mod db;
mod guards;
mod models;
mod routes;
mod services;
mod utils;

use dotenvy::dotenv;
use rocket::fairing::{Fairing, Info, Kind};
use rocket::fs::FileServer;
use rocket::http::Header;
use rocket::{Build, Request, Response, Rocket};
use rocket_okapi::swagger_ui::{SwaggerUIConfig, make_swagger_ui};

use services::{NoopNotifier, NotificationSender, SmtpNotifier};

/* ----------------------------- CORS ----------------------------- */

pub struct CORS;

#[rocket::async_trait]
impl Fairing for CORS {
    fn info(&self) -> Info {
        Info {
            name: "CORS",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, request: &'r Request<'_>, response: &mut Response<'r>) {
        if let Some(origin) = request.headers().get_one("Origin") {
            response.set_header(Header::new("Access-Control-Allow-Origin", origin));
        }

        response.set_header(Header::new(
            "Access-Control-Allow-Methods",
            "GET, POST, PUT, DELETE, OPTIONS",
        ));

        response.set_header(Header::new(
            "Access-Control-Allow-Headers",
            "Content-Type, Authorization",
        ));

        response.set_header(Header::new("Access-Control-Allow-Credentials", "true"));
    }
}

/* ----------------------------- OPTIONS ----------------------------- */

#[options("/<_..>")]
fn options_handler() {}

/* ----------------------------- ERRORS ----------------------------- */

#[catch(404)]
fn not_found() -> rocket::serde::json::Value {
    rocket::serde::json::json!({
        "success": false,
        "message": "Resource not found (check /api/v1 prefix)"
    })
}

#[catch(500)]
fn internal_error() -> rocket::serde::json::Value {
    rocket::serde::json::json!({
        "success": false,
        "message": "Internal server error"
    })
}

/* ----------------------------- SWAGGER ----------------------------- */

fn swagger_config() -> SwaggerUIConfig {
    SwaggerUIConfig {
        url: "/openapi.json".to_string(),
        ..Default::default()
    }
}

/* ----------------------------- LAUNCH ----------------------------- */

#[launch]
fn rocket() -> Rocket<Build> {
    dotenv().ok();
    env_logger::init();

    let notifier: Box<dyn NotificationSender> = if config::Config::is_mail_enabled() {
        Box::new(SmtpNotifier)
    } else {
        Box::new(NoopNotifier)
    };

    println!("🚀 TalentHub API running");
    println!("📚 Swagger UI → http://localhost:8000/api/docs");

    rocket::build()
        .attach(db::init())
        .attach(CORS)
        .manage(notifier)
        .mount("/", routes![options_handler])
        .mount(
            "/api/v1",
            routes![
                // Auth
                routes::auth::register,
                routes::auth::login,
                routes::auth::refresh_token,
                // Profile
                routes::user::create_profile,
                routes::user::get_profile,
                routes::user::update_profile,
                // Jobs
                routes::job::create_job,
                routes::job::publish_job,
                routes::job::update_job,
                routes::job::get_job,
                routes::job::list_jobs,
                routes::job::my_jobs,
                routes::job::delete_job,
                routes::job::match_estimate,
                // Applications
                routes::application::apply,
                routes::application::my_applications,
                routes::application::job_applications,
                routes::application::contact_candidate,
                // Match analysis
                routes::analysis::analyze_application,
                routes::analysis::get_match_score,
                routes::analysis::applicant_match_summary,
                // Assessments
                routes::assessment::generate_assessment,
                routes::assessment::get_assessment,
                routes::assessment::submit_responses,
                routes::assessment::application_assessments,
                // Uploads
                routes::file_upload::upload_resume,
                routes::file_upload::upload_resume_base64,
                routes::file_upload::list_resumes,
            ],
        )
        .mount("/uploads", FileServer::from("uploads"))
        .mount("/api/docs", make_swagger_ui(&swagger_config()))
        .register("/", catchers![not_found, internal_error])
}

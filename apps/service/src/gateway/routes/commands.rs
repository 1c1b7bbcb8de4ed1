use actix_web::{HttpResponse, Responder, post, web};
use pulse::Engine;
use pulse::commands::{Command, Reply};
use serde::Deserialize;
use serde_json::{Map, Value};

/// Command invocation relayed by the chat frontend.
///
/// Either the raw message text (`!status add ...`) or an already structured
/// subcommand with named options.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum CommandRequest {
    Text {
        user: String,
        text: String,
    },
    Structured {
        user: String,
        command: String,
        #[serde(default)]
        options: Map<String, Value>,
    },
}

/// Run a command and answer with its reply.
/// Text that is not addressed to us yields 204.
#[post("/commands")]
pub async fn commands_route(
    engine: web::Data<Engine>,
    request: web::Json<CommandRequest>,
) -> impl Responder {
    let engine = engine.into_inner();

    let reply = match request.into_inner() {
        CommandRequest::Text { user, text } => engine.handle_text(&user, &text).await,
        CommandRequest::Structured { user, command, options } => {
            match Command::from_structured(&command, &options) {
                Ok(command) => Some(engine.handle(&user, command).await),
                Err(e) => Some(Reply::text(e.to_string())),
            }
        }
    };

    match reply {
        Some(reply) => HttpResponse::Ok().json(reply),
        None => HttpResponse::NoContent().finish(),
    }
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::{App, test, web};
    use serde_json::json;

    use super::*;
    use crate::gateway::routes::test_support;

    async fn post(body: Value) -> (StatusCode, Option<Value>) {
        let engine = test_support::engine().await;
        let app = test::init_service(
            App::new().app_data(web::Data::from(engine)).service(commands_route),
        )
        .await;
        let request = test::TestRequest::post().uri("/commands").set_json(body).to_request();
        let response = test::call_service(&app, request).await;
        let status = response.status();
        let bytes = test::read_body(response).await;
        (status, serde_json::from_slice(&bytes).ok())
    }

    #[actix_web::test]
    async fn test_text_command_lists_targets() {
        let (status, body) = post(json!({ "user": "anyone", "text": "!status list" })).await;
        assert_eq!(status, StatusCode::OK);
        let content = body.unwrap()["content"].as_str().unwrap().to_string();
        assert!(content.starts_with("📋 Monitored sites:"));
        assert!(content.contains("`example`"));
    }

    #[actix_web::test]
    async fn test_unrelated_text_is_ignored() {
        let (status, body) = post(json!({ "user": "anyone", "text": "hello there" })).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(body.is_none());
    }

    #[actix_web::test]
    async fn test_structured_admin_command_requires_admin() {
        let request = json!({ "user": "stranger", "command": "maintenance", "options": { "mode": "on" } });
        let (status, body) = post(request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.unwrap()["content"], "You are not an admin.");
    }

    #[actix_web::test]
    async fn test_structured_command_by_main_admin() {
        let request = json!({ "user": "owner", "command": "maintenance", "options": { "mode": "on" } });
        let (_, body) = post(request).await;
        assert_eq!(body.unwrap()["content"], "Maintenance set to on");
    }

    #[actix_web::test]
    async fn test_structured_usage_error() {
        let (status, body) = post(json!({ "user": "owner", "command": "remove" })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.unwrap()["content"], "Usage: status remove <id>");
    }

    #[actix_web::test]
    async fn test_malformed_body_is_rejected() {
        let (status, _) = post(json!({ "text": "!status" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}

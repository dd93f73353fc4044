//! Application assembly from loaded configuration.

use serde_json::json;
use trellis::prelude::*;
use trellis::server::ServerError;
use trellis_test::TestClient;

const CONFIG: &str = r#"
[app]
name = "blog"
environment = "staging"
debug = true
controller_namespace = "blog::controllers"

[routing]
method_not_allowed = true
expose_route_list = true

[logging]
enabled = false
"#;

#[derive(Default)]
struct PostController;

impl PostController {
    fn show(&self, _req: &Request, params: &[&str]) -> String {
        format!("post {}", params[0])
    }
}

fn app() -> Application {
    let config = ConfigLoader::new()
        .with_string(CONFIG, "toml")
        .unwrap()
        .load()
        .unwrap();

    Application::builder(config)
        .routes(|routes| {
            routes
                .get("/posts/{id}", "PostController@show")?
                .name("posts.show")
                .where_number(["id"])?;
            routes.get("/broken", "blog::controllers::PostController@missing")?;
            Ok(())
        })
        .unwrap()
        .controllers(|controllers| {
            controllers
                .controller::<PostController>("PostController")
                .method("show", PostController::show);
        })
        .build()
        .unwrap()
}

#[test]
fn test_config_sections_reach_the_kernel() {
    let app = app();
    assert_eq!(app.config().app.name, "blog");
    assert_eq!(app.kernel().controllers().namespace(), "blog::controllers");
    assert!(app.kernel().options().method_not_allowed);
    assert!(app.kernel().options().expose_route_list);
    assert!(app.kernel().options().debug);
}

#[test]
fn test_namespaced_controller_resolves() {
    let client = TestClient::new(app().kernel().clone());
    client.get("/posts/3").send().assert_body_eq("post 3");
    client.get("/posts/abc").send().assert_status_code(404);
}

#[test]
fn test_debug_exposes_error_details() {
    let response = TestClient::new(app().kernel().clone())
        .get("/broken")
        .send();
    response.assert_status_code(500);
    response.assert_body_contains("missing");
}

#[test]
fn test_route_list_and_405_from_config() {
    let client = TestClient::new(app().kernel().clone());

    client
        .post("/posts/3")
        .send()
        .assert_status_code(405)
        .assert_header("allow", "GET, HEAD");

    let routes: serde_json::Value = client.get("/_routes").send().json().unwrap();
    assert_eq!(routes[0]["name"], json!("posts.show"));
}

#[tokio::test]
async fn test_serve_reports_bind_errors() {
    let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = taken.local_addr().unwrap();

    let mut config = TrellisConfig::default();
    config.server.http_addr = addr.to_string();
    config.logging.enabled = false;
    let app = Application::builder(config).build().unwrap();

    let err = app
        .serve_with_shutdown(ShutdownSignal::new())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Server(ServerError::Bind { .. })));
}

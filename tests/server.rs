//! Full server over a real socket: host layers, config-declared routes, shutdown.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::net::TcpListener;

use route_adapter::config::parse_config;
use route_adapter::dispatch::{ActionRegistry, DispatchError, Message};
use route_adapter::http::{json_body_parser, AxumContext, MiddlewareRegistry, X_REQUEST_ID};
use route_adapter::lifecycle::{build_server, Shutdown};

const CONFIG: &str = r#"
[listener]
bind_address = "127.0.0.1:0"

[options]
parse_body = false

[[routes]]
path = "/ping"
pattern = "role:test,cmd:ping"
methods = ["GET"]

[[routes]]
path = "/echo/:name"
pattern = "role:test,cmd:echo"
methods = ["post"]
middleware = ["json"]

[[routes]]
path = "/old"
pattern = "role:test,cmd:ping"
methods = ["GET"]
redirect = "/ping"

[[routes]]
path = "/broken"
pattern = "role:test,cmd:broken"
methods = ["GET"]
"#;

fn actions() -> ActionRegistry {
    let actions = ActionRegistry::new();
    actions.add("role:test,cmd:ping", |_msg| async { Ok(json!({"res": "pong"})) });
    actions.add("role:test,cmd:echo", |msg: Message| async move {
        Ok(json!({"name": msg.args.params["name"], "body": msg.args.body}))
    });
    actions.add("role:test,cmd:broken", |_msg| async {
        Err(DispatchError::failed("backend unavailable"))
    });
    actions
}

struct Running {
    base: String,
    shutdown: Shutdown,
    handle: tokio::task::JoinHandle<Result<(), std::io::Error>>,
}

async fn start() -> Running {
    let config = parse_config(CONFIG).unwrap();
    let mut middleware = MiddlewareRegistry::new();
    middleware.insert("json", json_body_parser(config.options.body_limit));

    let server = build_server(config, AxumContext::new(), Arc::new(actions()), middleware, None).unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());

    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    let handle = tokio::spawn(server.run(listener, rx));

    Running { base, shutdown, handle }
}

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_configured_routes_over_http() {
    let running = start().await;
    let client = client();

    let response = client
        .get(format!("{}/ping", running.base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert!(response.headers().contains_key(X_REQUEST_ID));
    assert_eq!(response.json::<Value>().await.unwrap(), json!({"res": "pong"}));

    let response = client
        .post(format!("{}/echo/ada", running.base))
        .json(&json!({"greeting": "hi"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(
        response.json::<Value>().await.unwrap(),
        json!({"name": "ada", "body": {"greeting": "hi"}})
    );

    let response = client
        .get(format!("{}/old", running.base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 302);
    assert_eq!(response.headers()["location"], "/ping");

    let response = client
        .get(format!("{}/broken", running.base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 500);

    running.shutdown.trigger();
    let result = tokio::time::timeout(Duration::from_secs(5), running.handle)
        .await
        .expect("server did not stop")
        .unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    let running = start().await;

    let response = client()
        .get(format!("{}/ping", running.base))
        .header(X_REQUEST_ID, "req-42")
        .send()
        .await
        .unwrap();
    assert_eq!(response.headers()[X_REQUEST_ID], "req-42");

    running.shutdown.trigger();
    let _ = running.handle.await;
}

#[tokio::test]
async fn test_unknown_path_is_not_found() {
    let running = start().await;

    let response = client()
        .get(format!("{}/missing", running.base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    running.shutdown.trigger();
    let _ = running.handle.await;
}

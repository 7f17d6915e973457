//! End-to-end routing and dispatch tests, driven through the public API.

use std::sync::{Arc, Mutex};

use trellis::{
    Application, Context, HandlerFunc, Method, MiddlewareFunc, Outcome, Router,
};

fn text_handler(body: &'static str) -> impl trellis::Handler {
    move |_c: Context| async move { body }
}

/// A middleware that records enter/exit against a shared log.
fn probe(label: &'static str, log: Arc<Mutex<Vec<String>>>) -> MiddlewareFunc {
    Arc::new(move |next: HandlerFunc| {
        let log = Arc::clone(&log);
        Arc::new(move |c: Context| {
            let log = Arc::clone(&log);
            let next = Arc::clone(&next);
            Box::pin(async move {
                log.lock().unwrap().push(format!("{label}-enter"));
                let result = next(c).await;
                log.lock().unwrap().push(format!("{label}-exit"));
                result
            })
        })
    })
}

async fn run(handler: HandlerFunc, c: &Context) -> Outcome {
    handler(c.clone()).await.expect("handler failed")
}

// The original scenario: register GET /get, then look it up under the right
// method, a wrong path, and a wrong method.
#[tokio::test]
async fn router_basic() {
    let mut r = Router::new();
    r.add(Method::Get, "/get", text_handler("ok"));

    let c = Context::new(Method::Get, "/get");
    let h = r.find(Method::Get, &c);
    assert!(!Arc::ptr_eq(&h, &r.not_found_handler()));
    assert_eq!(run(h, &c).await, Outcome::Text("ok".to_owned()));

    let miss = Context::new(Method::Get, "/nope");
    assert!(Arc::ptr_eq(&r.find(Method::Get, &miss), &r.not_found_handler()));

    let wrong_method = Context::new(Method::Post, "/get");
    assert!(Arc::ptr_eq(&r.find(Method::Post, &wrong_method), &r.not_found_handler()));
}

#[tokio::test]
async fn static_routes_return_their_own_handlers() {
    let mut r = Router::new();
    r.add(Method::Get, "/a", text_handler("a"));
    r.add(Method::Get, "/a/b", text_handler("ab"));
    r.add(Method::Post, "/a", text_handler("posted"));

    let c = Context::new(Method::Get, "/a/b");
    assert_eq!(run(r.find(Method::Get, &c), &c).await, Outcome::Text("ab".to_owned()));

    let c = Context::new(Method::Post, "/a");
    assert_eq!(run(r.find(Method::Post, &c), &c).await, Outcome::Text("posted".to_owned()));
}

#[tokio::test]
async fn parameters_bind_into_the_context() {
    let mut r = Router::new();
    r.add(Method::Get, "/user/:id", |c: Context| async move {
        Outcome::Text(c.param("id").unwrap_or_default())
    });

    let c = Context::new(Method::Get, "/user/42");
    let h = r.find(Method::Get, &c);
    assert_eq!(c.param("id").as_deref(), Some("42"));
    assert_eq!(run(h, &c).await, Outcome::Text("42".to_owned()));
}

#[tokio::test]
async fn static_beats_parameter() {
    let mut r = Router::new();
    r.add(Method::Get, "/user/new", text_handler("form"));
    r.add(Method::Get, "/user/:id", text_handler("profile"));

    let c = Context::new(Method::Get, "/user/new");
    assert_eq!(run(r.find(Method::Get, &c), &c).await, Outcome::Text("form".to_owned()));
    assert_eq!(c.param("id"), None);

    let c = Context::new(Method::Get, "/user/7");
    assert_eq!(run(r.find(Method::Get, &c), &c).await, Outcome::Text("profile".to_owned()));
}

#[tokio::test]
async fn wildcard_captures_the_remainder() {
    let mut r = Router::new();
    r.add(Method::Get, "/static/*", |c: Context| async move {
        Outcome::Text(c.wildcard().unwrap_or_default())
    });

    let c = Context::new(Method::Get, "/static/js/a.js");
    let h = r.find(Method::Get, &c);
    assert_eq!(c.wildcard().as_deref(), Some("js/a.js"));
    assert_eq!(run(h, &c).await, Outcome::Text("js/a.js".to_owned()));
}

#[tokio::test]
async fn trailing_slash_and_bare_path_share_a_route() {
    let mut r = Router::new();
    r.add(Method::Get, "/about", text_handler("about"));

    for target in ["/about", "/about/"] {
        let c = Context::new(Method::Get, target);
        assert!(
            !Arc::ptr_eq(&r.find(Method::Get, &c), &r.not_found_handler()),
            "{target} should match",
        );
    }
}

#[tokio::test]
async fn misses_never_panic_across_many_shapes() {
    let mut r = Router::new();
    r.add(Method::Get, "/a/:id/c", text_handler("x"));

    for target in ["/", "/a", "/a/1", "/a/1/c/d", "/b", "/a//c", "not-a-path"] {
        let c = Context::new(Method::Get, target);
        assert!(Arc::ptr_eq(&r.find(Method::Get, &c), &r.not_found_handler()));
    }
}

// Full-pipeline ordering: pre, wrap, group, route-level, handler.
#[tokio::test]
async fn middleware_layers_nest_in_registration_order() {
    let log = Arc::new(Mutex::new(Vec::new()));

    let mut app = Application::new();
    app.pre(probe("pre", Arc::clone(&log)));
    app.wrap(probe("wrap-a", Arc::clone(&log)));
    app.wrap(probe("wrap-b", Arc::clone(&log)));
    {
        let g = app.group("/api");
        g.wrap(probe("group", Arc::clone(&log)));
        g.add(
            Method::Get,
            "/thing",
            {
                let log = Arc::clone(&log);
                move |_c: Context| {
                    let log = Arc::clone(&log);
                    async move {
                        log.lock().unwrap().push("handler".to_owned());
                        Outcome::Empty
                    }
                }
            },
            &[probe("route", Arc::clone(&log))],
        );
    }
    app.prepare();

    let response = Arc::new(app).handle(Context::new(Method::Get, "/api/thing")).await;
    assert_eq!(response.status(), http::StatusCode::OK);
    assert_eq!(
        *log.lock().unwrap(),
        [
            "pre-enter",
            "wrap-a-enter",
            "wrap-b-enter",
            "group-enter",
            "route-enter",
            "handler",
            "route-exit",
            "group-exit",
            "wrap-b-exit",
            "wrap-a-exit",
            "pre-exit",
        ],
    );
}

#[tokio::test]
async fn group_application_is_idempotent_end_to_end() {
    let log = Arc::new(Mutex::new(Vec::new()));

    let mut app = Application::new();
    {
        let g = app.group("/g");
        g.wrap(probe("group", Arc::clone(&log)));
        g.get("/x", text_handler("x"));
    }
    app.prepare();
    app.prepare();
    app.prepare();

    Arc::new(app).handle(Context::new(Method::Get, "/g/x")).await;
    // One enter/exit pair: the middleware was wrapped exactly once.
    assert_eq!(*log.lock().unwrap(), ["group-enter", "group-exit"]);
}

#[tokio::test]
async fn custom_not_found_replaces_the_default_body() {
    let mut app = Application::new();
    app.not_found(|c: Context| async move {
        c.string(format!("no page at {}", c.path()));
        c.set_status(trellis::Status::NotFound);
        Outcome::Empty
    });

    let response = Arc::new(app).handle(Context::new(Method::Get, "/missing")).await;
    assert_eq!(response.status(), http::StatusCode::NOT_FOUND);

    use http_body_util::BodyExt;
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"no page at /missing");
}

#[tokio::test]
async fn any_registers_every_method() {
    let mut app = Application::new();
    app.any("/ping", text_handler("pong"));
    let app = Arc::new(app);

    for method in Method::ALL {
        let response = Arc::clone(&app).handle(Context::new(method, "/ping")).await;
        assert_eq!(response.status(), http::StatusCode::OK, "{method} should match");
    }
}

#[tokio::test]
async fn on_registers_only_the_given_methods() {
    let mut app = Application::new();
    app.on(&[Method::Get, Method::Post], "/form", text_handler("form"));
    let app = Arc::new(app);

    let ok = Arc::clone(&app).handle(Context::new(Method::Post, "/form")).await;
    assert_eq!(ok.status(), http::StatusCode::OK);

    let miss = Arc::clone(&app).handle(Context::new(Method::Put, "/form")).await;
    assert_eq!(miss.status(), http::StatusCode::NOT_FOUND);
}

//! Minimal trellis example — JSON endpoints, a group, CORS, static files.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/users/42
//!   curl -X POST http://localhost:3000/users \
//!        -H 'content-type: application/json' \
//!        -d '{"name":"alice"}'
//!   curl http://localhost:3000/admin/stats
//!   curl http://localhost:3000/static/css/site.css

use trellis::{Application, Context, HandlerResult, HttpException, Outcome, Server, Status};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let mut app = Application::new();
    app.pre(trellis::middleware::trace());
    app.wrap(trellis::middleware::cors());

    app.get("/users/:id", get_user)
        .post("/users", create_user)
        .delete("/users/:id", delete_user)
        .static_dir("/static", "assets");

    let admin = app.group("/admin");
    admin.get("/stats", |_c: Context| async {
        Outcome::Json(br#"{"requests":1024}"#.to_vec())
    });

    Server::bind("0.0.0.0:3000")
        .serve(app)
        .await
        .expect("server error");
}

// GET /users/:id
//
// Outcome::Json takes bytes — pass output from your serialiser:
//   serde_json:  Outcome::Json(serde_json::to_vec(&user).unwrap())
//   hand-built:  Outcome::Json(format!(...).into_bytes())
async fn get_user(c: Context) -> Outcome {
    let id = c.param("id").unwrap_or_default();
    Outcome::Json(format!(r#"{{"id":"{id}","name":"alice"}}"#).into_bytes())
}

// POST /users → 201 with a location header
async fn create_user(c: Context) -> HandlerResult {
    if c.body().is_empty() {
        return Err(HttpException::bad_request());
    }

    // Real app: let input: CreateUser = serde_json::from_slice(c.body()).unwrap();
    c.json(br#"{"id":"99","name":"new_user"}"#.to_vec());
    c.set_status(Status::Created);
    c.set_header("location", "/users/99");
    Ok(Outcome::Empty)
}

// DELETE /users/:id → 204 No Content
async fn delete_user(c: Context) -> Outcome {
    c.set_status(Status::NoContent);
    Outcome::Empty
}

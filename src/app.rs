use std::net::SocketAddr;

use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    routing::get,
    Json, Router,
};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::{api::MessageResponse, applications, auth, companies, config::AppConfig, jobs, state::AppState};

pub fn build_app(state: AppState) -> Router {
    let cors = cors_layer(&state.config);
    let local_uploads = state
        .config
        .storage
        .s3
        .is_none()
        .then(|| state.config.storage.uploads_dir.clone());

    let mut app = Router::new().nest(
        "/api/v1",
        Router::new()
            .merge(auth::router())
            .merge(companies::router())
            .merge(jobs::router())
            .merge(applications::router())
            .route("/health", get(|| async { Json(MessageResponse::ok("ok")) })),
    );
    if let Some(dir) = local_uploads {
        app = app.nest_service("/uploads", ServeDir::new(dir));
    }

    app.with_state(state).layer(cors).layer(
        TraceLayer::new_for_http()
            .make_span_with(|req: &axum::http::Request<_>| {
                let method = req.method().clone();
                let uri = req.uri().clone();
                tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
            })
            .on_response(
                |res: &axum::http::Response<_>, latency: std::time::Duration, span: &tracing::Span| {
                    let status = res.status();
                    span.record("status", tracing::field::display(status));
                    let latency_ms = latency.as_millis() as u64;
                    if status.is_server_error() {
                        tracing::error!(%status, latency_ms, "response");
                    } else {
                        tracing::info!(%status, latency_ms, "response");
                    }
                },
            ),
    )
}

/// The session cookie travels cross-origin, so origins must be explicit.
fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins()
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!(origin = %o, error = %e, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
}

pub async fn serve(app: Router) -> anyhow::Result<()> {
    let addr: SocketAddr = format!(
        "{}:{}",
        std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
        std::env::var("APP_PORT").unwrap_or_else(|_| "8080".into())
    )
    .parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{header, HeaderMap, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::{
        auth::repo_types::Role,
        testing::{company_of, job_of, verified_user, PASSWORD},
    };

    const BOUNDARY: &str = "hireboard-test-boundary";

    enum Part<'a> {
        Text(&'a str, &'a str),
        File(&'a str, &'a str, &'a str, Vec<u8>),
    }

    fn multipart_body(parts: Vec<Part<'_>>) -> Vec<u8> {
        let mut body = Vec::new();
        for part in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match part {
                Part::Text(name, value) => {
                    body.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                            .as_bytes(),
                    );
                }
                Part::File(name, file_name, content_type, bytes) => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n\
                             Content-Type: {content_type}\r\n\r\n"
                        )
                        .as_bytes(),
                    );
                    body.extend_from_slice(&bytes);
                    body.extend_from_slice(b"\r\n");
                }
            }
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn multipart_request(method: &str, uri: &str, cookie: Option<&str>, parts: Vec<Part<'_>>) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            );
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::from(multipart_body(parts))).unwrap()
    }

    fn json_request(method: &str, uri: &str, cookie: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn send(state: &AppState, req: Request<Body>) -> (StatusCode, HeaderMap, Value) {
        let res = build_app(state.clone()).oneshot(req).await.unwrap();
        let status = res.status();
        let headers = res.headers().clone();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, headers, body)
    }

    fn set_cookie(headers: &HeaderMap) -> String {
        headers
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    }

    /// Logs in over HTTP and returns the `token=...` pair for later requests.
    async fn login_cookie(state: &AppState, email: &str, role: &str) -> String {
        let (status, headers, _) = send(
            state,
            json_request(
                "POST",
                "/api/v1/users/login",
                None,
                json!({ "email": email, "password": PASSWORD, "role": role }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        set_cookie(&headers)
            .split(';')
            .next()
            .unwrap_or_default()
            .to_string()
    }

    #[test]
    fn routes_register_without_conflicts() {
        let _app = build_app(AppState::fake());
    }

    #[tokio::test]
    async fn register_answers_created_with_email_flag() {
        let state = AppState::fake();
        let req = multipart_request(
            "POST",
            "/api/v1/users/register",
            None,
            vec![
                Part::Text("fullname", "asha rao"),
                Part::Text("email", "asha@example.com"),
                Part::Text("phoneNumber", "9876543210"),
                Part::Text("password", PASSWORD),
                Part::Text("pancard", "abcde1234f"),
                Part::Text("adharcard", "123456789012"),
                Part::Text("role", "Student"),
                Part::File("profilePhoto", "me.png", "image/png", b"\x89PNG".to_vec()),
            ],
        );
        let (status, _, body) = send(&state, req).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["success"], true);
        assert_eq!(body["emailSent"], true);
    }

    #[tokio::test]
    async fn login_sets_http_only_cookie_and_logout_clears_it() {
        let state = AppState::fake();
        let user = verified_user(&state, Role::Student, 1).await;

        let (status, headers, body) = send(
            &state,
            json_request(
                "POST",
                "/api/v1/users/login",
                None,
                json!({ "email": user.email, "password": PASSWORD, "role": "Student" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["user"]["email"], user.email.as_str());
        assert!(body["user"].get("passwordHash").is_none());
        let cookie = set_cookie(&headers);
        assert!(cookie.starts_with("token="));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Strict"));
        assert!(cookie.contains("Max-Age=86400"));

        let token = cookie.split(';').next().unwrap();
        let (status, _, body) = send(&state, get("/api/v1/users/me", Some(token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["id"], user.id.to_string());

        let (status, headers, body) = send(
            &state,
            Request::builder()
                .method("POST")
                .uri("/api/v1/users/logout")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        let cleared = set_cookie(&headers);
        assert!(cleared.starts_with("token=;"));
        assert!(cleared.contains("Max-Age=0"));
    }

    #[tokio::test]
    async fn protected_route_without_token_is_401_json() {
        let state = AppState::fake();
        let (status, _, body) = send(&state, get("/api/v1/applications/get", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({ "success": false, "message": "No token provided" }));
    }

    #[tokio::test]
    async fn application_routes_keep_their_envelopes() {
        let state = AppState::fake();
        let recruiter = verified_user(&state, Role::Recruiter, 1).await;
        let student = verified_user(&state, Role::Student, 2).await;
        let company = company_of(&state, &recruiter, "Acme").await;
        let job = job_of(&state, &recruiter, &company).await;
        let student_cookie = login_cookie(&state, &student.email, "Student").await;
        let recruiter_cookie = login_cookie(&state, &recruiter.email, "Recruiter").await;

        let (status, _, body) = send(
            &state,
            get(&format!("/api/v1/applications/apply/{}", job.id), Some(&student_cookie)),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["success"], true);

        let (status, _, body) =
            send(&state, get("/api/v1/applications/get", Some(&student_cookie))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        let applied = body["application"].as_array().unwrap();
        assert_eq!(applied.len(), 1);
        assert_eq!(applied[0]["status"], "pending");
        assert_eq!(applied[0]["job"]["id"], job.id.to_string());

        let (status, _, body) = send(
            &state,
            get(
                &format!("/api/v1/applications/{}/applicants", job.id),
                Some(&recruiter_cookie),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["job"]["id"], job.id.to_string());
        let applicants = body["job"]["applications"].as_array().unwrap();
        assert_eq!(applicants.len(), 1);
        assert_eq!(applicants[0]["applicant"]["email"], student.email.as_str());
    }

    #[tokio::test]
    async fn profile_update_takes_resume_and_photo_at_their_limits() {
        let state = AppState::fake();
        let student = verified_user(&state, Role::Student, 1).await;
        let cookie = login_cookie(&state, &student.email, "Student").await;

        let req = multipart_request(
            "PUT",
            "/api/v1/users/update-profile",
            Some(&cookie),
            vec![
                Part::Text("bio", "Backend developer"),
                Part::File("resume", "cv.pdf", "application/pdf", vec![b'a'; 10 * 1024 * 1024 - 100]),
                Part::File("profilePhoto", "me.png", "image/png", vec![b'b'; 5 * 1024 * 1024 - 100]),
            ],
        );
        let (status, _, body) = send(&state, req).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["user"]["profile"]["resumeOriginalName"], "cv.pdf");
        assert!(body["user"]["profile"]["resume"]
            .as_str()
            .unwrap()
            .ends_with(".pdf"));
    }

    #[tokio::test]
    async fn oversized_form_is_reported_as_a_size_error() {
        let state = AppState::fake();
        let student = verified_user(&state, Role::Student, 1).await;
        let cookie = login_cookie(&state, &student.email, "Student").await;

        let req = multipart_request(
            "PUT",
            "/api/v1/users/update-profile",
            Some(&cookie),
            vec![Part::File(
                "resume",
                "cv.pdf",
                "application/pdf",
                vec![b'a'; crate::uploads::FORM_BODY_LIMIT + 1],
            )],
        );
        let (status, _, body) = send(&state, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "File exceeds the 16 MB limit");
    }
}

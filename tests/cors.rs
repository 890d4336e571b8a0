use self::support::{header, into_text, method_set, serve, sorted};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::HeaderValue;
use hyper::{Method, Request, Response, StatusCode};
use ranger::{cors_middleware, Context, Cors, ErrorResponse, HandlerError, Router, CORS_ORIGIN_ALL};
use std::convert::Infallible;
use std::time::Duration;

mod support;

const ORIGIN: &str = "https://api.example.com";

async fn ok(_: Context) -> Result<(StatusCode, ()), HandlerError> {
    Ok((StatusCode::OK, ()))
}

async fn raw_ok(_: Request<Full<Bytes>>) -> Result<Response<Full<Bytes>>, Infallible> {
    Ok(Response::new(Full::new(Bytes::from("bar"))))
}

#[tokio::test]
async fn can_set_origin_with_middleware() {
    let router = Router::builder()
        .middleware(cors_middleware(ORIGIN))
        .get_raw("/foo", raw_ok)
        .build()
        .unwrap();
    let serve = serve(router);

    let resp = serve.request(Method::GET, "/foo").await;
    assert_eq!(header(&resp, "access-control-allow-origin"), Some(ORIGIN));
    assert_eq!(into_text(resp.into_body()).await, "bar");
}

#[tokio::test]
async fn can_keep_origin_set_by_context_handler() {
    let router = Router::builder()
        .middleware(cors_middleware(ORIGIN))
        .get("/foo", |ctx: Context| async move {
            ctx.set_response_header("access-control-allow-origin", HeaderValue::from_static(CORS_ORIGIN_ALL));
            Ok((StatusCode::OK, ()))
        })
        .build()
        .unwrap();
    let serve = serve(router);

    let resp = serve.request(Method::GET, "/foo").await;
    assert_eq!(header(&resp, "access-control-allow-origin"), Some(CORS_ORIGIN_ALL));
}

#[tokio::test]
async fn can_keep_origin_set_by_transport_handler() {
    let router = Router::builder()
        .middleware(cors_middleware(ORIGIN))
        .get_raw("/foo", |_: Request<Full<Bytes>>| async move {
            let mut res = Response::new(Full::new(Bytes::from("bar")));
            res.headers_mut()
                .insert("access-control-allow-origin", HeaderValue::from_static(CORS_ORIGIN_ALL));
            Ok::<_, Infallible>(res)
        })
        .build()
        .unwrap();
    let serve = serve(router);

    let resp = serve.request(Method::GET, "/foo").await;
    assert_eq!(header(&resp, "access-control-allow-origin"), Some(CORS_ORIGIN_ALL));
}

#[tokio::test]
async fn can_answer_preflight_with_configured_values() {
    let cors = Cors::new()
        .origin(ORIGIN)
        .credentials(true)
        .methods([Method::OPTIONS, Method::GET, Method::PUT])
        .expose_headers(["X-Personal-One", "X-Personal-Two"])
        .max_age(Duration::from_secs(25 * 60));
    let router = Router::builder().register(cors).build().unwrap();
    let serve = serve(router);

    let resp = serve.request(Method::OPTIONS, "/foo").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(header(&resp, "access-control-allow-origin"), Some(ORIGIN));
    assert_eq!(
        method_set(header(&resp, "access-control-allow-methods").unwrap()),
        sorted(&["OPTIONS", "GET", "PUT"])
    );
    assert_eq!(header(&resp, "access-control-allow-credentials"), Some("true"));
    assert_eq!(
        header(&resp, "access-control-allow-headers"),
        Some("X-Personal-One,X-Personal-Two")
    );
    assert_eq!(header(&resp, "access-control-max-age"), Some("1500"));
    assert_eq!(into_text(resp.into_body()).await, "");
}

#[tokio::test]
async fn can_discover_methods_from_router() {
    let router = Router::builder()
        .register(Cors::new().max_age(Duration::ZERO))
        .get_raw("/foo", raw_ok)
        .put("/foo", ok)
        .build()
        .unwrap();
    let serve = serve(router);

    let resp = serve.request(Method::OPTIONS, "/foo").await;
    assert_eq!(header(&resp, "access-control-allow-origin"), Some(CORS_ORIGIN_ALL));
    assert_eq!(
        method_set(header(&resp, "access-control-allow-methods").unwrap()),
        sorted(&["OPTIONS", "GET", "PUT"])
    );
    assert!(resp.headers().get("access-control-allow-credentials").is_none());
    assert!(resp.headers().get("access-control-allow-headers").is_none());
    assert!(resp.headers().get("access-control-max-age").is_none());
}

#[tokio::test]
async fn can_answer_preflight_on_unknown_path() {
    let router = Router::builder()
        .register(Cors::new().max_age(Duration::ZERO))
        .build()
        .unwrap();
    let serve = serve(router);

    let resp = serve.request(Method::OPTIONS, "/foo").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(header(&resp, "access-control-allow-methods"), Some("OPTIONS"));

    // The preflight route doesn't make the path exist for other methods.
    let resp = serve.request(Method::GET, "/foo").await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(header(&resp, "access-control-allow-origin"), Some(CORS_ORIGIN_ALL));
}

#[tokio::test]
async fn can_scope_discovery_to_the_exact_path() {
    let router = Router::builder()
        .register(Cors::new().origin(ORIGIN))
        .get("/foo", ok)
        .put("/foo", ok)
        .sub_router("/foo", |r| r.post("/bar", ok).delete("/bar", ok))
        .build()
        .unwrap();
    let serve = serve(router);

    let resp = serve.request(Method::OPTIONS, "/foo").await;
    assert_eq!(header(&resp, "access-control-allow-origin"), Some(ORIGIN));
    assert_eq!(
        method_set(header(&resp, "access-control-allow-methods").unwrap()),
        sorted(&["OPTIONS", "GET", "PUT"])
    );

    let resp = serve.request(Method::OPTIONS, "/foo/bar").await;
    assert_eq!(
        method_set(header(&resp, "access-control-allow-methods").unwrap()),
        sorted(&["OPTIONS", "POST", "DELETE"])
    );
}

#[tokio::test]
async fn can_repeat_preflight_with_identical_headers() {
    let router = Router::builder()
        .register(Cors::new().credentials(true))
        .get("/foo", ok)
        .build()
        .unwrap();
    let serve = serve(router);

    let first = serve.request(Method::OPTIONS, "/foo").await;
    let second = serve.request(Method::OPTIONS, "/foo").await;
    assert_eq!(first.headers(), second.headers());
}

#[tokio::test]
async fn can_leave_explicit_options_route_in_charge() {
    let router = Router::builder()
        .register(Cors::new())
        .add("/foo", vec![Method::OPTIONS], |_: Context| async move {
            Ok((StatusCode::NO_CONTENT, ()))
        })
        .build()
        .unwrap();
    let serve = serve(router);

    let resp = serve.request(Method::OPTIONS, "/foo").await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(resp.headers().get("access-control-allow-methods").is_none());
    assert_eq!(header(&resp, "access-control-allow-origin"), Some(CORS_ORIGIN_ALL));
}

#[tokio::test]
async fn can_see_sub_router_methods_from_sub_router_cors() {
    let router = Router::builder()
        .get("/api/status", ok)
        .sub_router("/api", |r| r.register(Cors::new()).post("/items", ok).get("/items", ok))
        .build()
        .unwrap();
    let serve = serve(router);

    let resp = serve.request(Method::OPTIONS, "/api/items").await;
    assert_eq!(
        method_set(header(&resp, "access-control-allow-methods").unwrap()),
        sorted(&["OPTIONS", "POST", "GET"])
    );

    // The sub-router's middleware doesn't wrap the parent's routes.
    let resp = serve.request(Method::GET, "/api/status").await;
    assert!(resp.headers().get("access-control-allow-origin").is_none());
}

#[tokio::test]
async fn can_set_origin_on_error_and_panic_responses() {
    let router = Router::builder()
        .middleware(cors_middleware(ORIGIN))
        .get_raw("/err", |_| async move { Err::<Response<Full<Bytes>>, _>(std::io::Error::other("boom")) })
        .get("/panic", |_: Context| async move {
            if true {
                panic!("handler exploded");
            }
            Ok((StatusCode::OK, ()))
        })
        .build()
        .unwrap();
    let serve = serve(router);

    let resp = serve.request(Method::GET, "/err").await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(header(&resp, "access-control-allow-origin"), Some(ORIGIN));
    let body: ErrorResponse = serde_json::from_str(&into_text(resp.into_body()).await).unwrap();
    assert_eq!(body.data.message, "boom");

    let resp = serve.request(Method::GET, "/panic").await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(header(&resp, "access-control-allow-origin"), Some(ORIGIN));
}

use self::support::{header, into_text, serve};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::HeaderValue;
use hyper::{Method, Request, Response, StatusCode};
use ranger::prelude::*;
use ranger::{Context, HandlerError, Middleware, RequestInfo, RouteError, Router};
use std::convert::Infallible;
use std::sync::{Arc, Mutex};

mod support;

type Trail = Arc<Mutex<Vec<String>>>;

fn tracker(trail: &Trail, name: &'static str) -> Middleware {
    let trail = trail.clone();
    Middleware::around(move |req: Request<Full<Bytes>>, next| {
        let trail = trail.clone();
        async move {
            trail.lock().unwrap().push(format!("{} in", name));
            let res = next.run(req).await;
            trail.lock().unwrap().push(format!("{} out", name));
            res
        }
    })
}

#[tokio::test]
async fn can_wrap_in_registration_order() {
    let trail: Trail = Arc::default();
    let handler_trail = trail.clone();

    let router = Router::builder()
        .middleware(tracker(&trail, "root-1"))
        .middleware(tracker(&trail, "root-2"))
        .sub_router("/api", |r| {
            r.middleware(tracker(&trail, "api")).get("/items", move |_: Context| {
                let trail = handler_trail.clone();
                async move {
                    trail.lock().unwrap().push("handler".to_owned());
                    Ok((StatusCode::OK, ()))
                }
            })
            .with_middleware(tracker(&trail, "route"))
        })
        .build()
        .unwrap();
    let serve = serve(router);

    let resp = serve.request(Method::GET, "/api/items").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        *trail.lock().unwrap(),
        vec![
            "root-1 in",
            "root-2 in",
            "api in",
            "route in",
            "handler",
            "route out",
            "api out",
            "root-2 out",
            "root-1 out",
        ]
    );
}

#[tokio::test]
async fn can_apply_middlewares_registered_after_routes() {
    let router = Router::builder()
        .get("/", |_: Context| async move { Ok((StatusCode::OK, ())) })
        .middleware(Middleware::post(|mut res: Response<Full<Bytes>>| async move {
            res.headers_mut().insert("x-powered-by", HeaderValue::from_static("ranger"));
            Ok::<_, Infallible>(res)
        }))
        .build()
        .unwrap();
    let serve = serve(router);

    let resp = serve.request(Method::GET, "/").await;
    assert_eq!(header(&resp, "x-powered-by"), Some("ranger"));
}

#[tokio::test]
async fn can_short_circuit_the_chain() {
    let router = Router::builder()
        .middleware(Middleware::around(|req: Request<Full<Bytes>>, next| async move {
            if req.headers().contains_key("authorization") {
                return next.run(req).await;
            }
            let mut res = Response::new(Full::new(Bytes::from("denied")));
            *res.status_mut() = StatusCode::UNAUTHORIZED;
            Ok::<_, RouteError>(res)
        }))
        .get("/secret", |_: Context| async move {
            if true {
                panic!("the handler must not run");
            }
            Ok((StatusCode::OK, ()))
        })
        .build()
        .unwrap();
    let serve = serve(router);

    let resp = serve.request(Method::GET, "/secret").await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(into_text(resp.into_body()).await, "denied");
}

#[tokio::test]
async fn can_transform_request_in_pre_middleware() {
    let router = Router::builder()
        .middleware(Middleware::pre(|mut req: Request<Full<Bytes>>| async move {
            req.headers_mut().insert("x-user", HeaderValue::from_static("alice"));
            Ok::<_, Infallible>(req)
        }))
        .get("/me", |ctx: Context| async move {
            let user = ctx
                .headers()
                .get("x-user")
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_owned();
            Ok((StatusCode::OK, user))
        })
        .build()
        .unwrap();
    let serve = serve(router);

    let resp = serve.request(Method::GET, "/me").await;
    assert_eq!(into_text(resp.into_body()).await, r#""alice""#);
}

#[tokio::test]
async fn can_see_route_params_in_middleware() {
    let router = Router::builder()
        .middleware(Middleware::around(|req: Request<Full<Bytes>>, next| async move {
            let id = req.param("id").cloned().unwrap_or_default();
            let mut res = next.run(req).await?;
            res.headers_mut().insert("x-id", HeaderValue::from_str(&id)?);
            Ok::<_, RouteError>(res)
        }))
        .get("/items/:id", |_: Context| async move { Ok((StatusCode::OK, ())) })
        .build()
        .unwrap();
    let serve = serve(router);

    let resp = serve.request(Method::GET, "/items/9").await;
    assert_eq!(header(&resp, "x-id"), Some("9"));
}

#[tokio::test]
async fn can_pass_request_info_to_post_middleware() {
    let router = Router::builder()
        .middleware(Middleware::post_with_info(
            |mut res: Response<Full<Bytes>>, info: RequestInfo| async move {
                let line = format!("{} {}", info.method(), info.uri().path());
                res.headers_mut().insert("x-request", HeaderValue::from_str(&line)?);
                Ok::<_, RouteError>(res)
            },
        ))
        .post("/items", |_: Context| async move { Ok((StatusCode::CREATED, ())) })
        .build()
        .unwrap();
    let serve = serve(router);

    let resp = serve.request(Method::POST, "/items").await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert_eq!(header(&resp, "x-request"), Some("POST /items"));
}

#[tokio::test]
async fn can_wrap_404_and_405_with_root_middlewares() {
    let router = Router::builder()
        .middleware(Middleware::post(|mut res: Response<Full<Bytes>>| async move {
            res.headers_mut().insert("x-seen", HeaderValue::from_static("yes"));
            Ok::<_, Infallible>(res)
        }))
        .get("/foo", |_: Context| async move { Ok((StatusCode::OK, ())) })
        .build()
        .unwrap();
    let serve = serve(router);

    let resp = serve.request(Method::GET, "/missing").await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(header(&resp, "x-seen"), Some("yes"));

    let resp = serve.request(Method::DELETE, "/foo").await;
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(header(&resp, "x-seen"), Some("yes"));
    assert_eq!(header(&resp, "allow"), Some("GET"));
}

#[tokio::test]
async fn can_recover_from_middleware_panic() {
    let router = Router::builder()
        .middleware(Middleware::pre(|req: Request<Full<Bytes>>| async move {
            if req.uri().path() == "/boom" {
                panic!("middleware exploded");
            }
            Ok::<_, Infallible>(req)
        }))
        .get("/boom", |_: Context| async move { Ok((StatusCode::OK, ())) })
        .build()
        .unwrap();
    let serve = serve(router);

    let resp = serve.request(Method::GET, "/boom").await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn can_route_middleware_errors_to_err_handler() {
    let router = Router::builder()
        .middleware(Middleware::pre(|_: Request<Full<Bytes>>| async move {
            Err::<Request<Full<Bytes>>, _>(RouteError::from("rejected by middleware"))
        }))
        .get("/", |_: Context| async move { Ok((StatusCode::OK, ())) })
        .err_handler(|err: RouteError| async move {
            let mut res = Response::new(Full::new(Bytes::from(err.to_string())));
            *res.status_mut() = StatusCode::BAD_GATEWAY;
            res
        })
        .build()
        .unwrap();
    let serve = serve(router);

    let resp = serve.request(Method::GET, "/").await;
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(into_text(resp.into_body()).await, "rejected by middleware");
}

#[tokio::test]
async fn can_run_trace_middleware_transparently() {
    let router = Router::builder()
        .middleware(ranger::middleware::trace())
        .get("/", |_: Context| async move { Ok::<_, HandlerError>((StatusCode::OK, "traced")) })
        .build()
        .unwrap();
    let serve = serve(router);

    let resp = serve.request(Method::GET, "/").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(into_text(resp.into_body()).await, r#""traced""#);
}

#[tokio::test]
async fn can_post_process_errors_of_inner_middlewares() {
    let router = Router::builder()
        .middleware(Middleware::post(|mut res: Response<Full<Bytes>>| async move {
            res.headers_mut().insert("x-seen", HeaderValue::from_static("yes"));
            Ok::<_, Infallible>(res)
        }))
        .middleware(Middleware::pre(|_: Request<Full<Bytes>>| async move {
            Err::<Request<Full<Bytes>>, _>(RouteError::from("rejected by middleware"))
        }))
        .get("/", |_: Context| async move { Ok((StatusCode::OK, ())) })
        .err_handler(|err: RouteError| async move {
            let mut res = Response::new(Full::new(Bytes::from(err.to_string())));
            *res.status_mut() = StatusCode::BAD_GATEWAY;
            res
        })
        .build()
        .unwrap();
    let serve = serve(router);

    let resp = serve.request(Method::GET, "/").await;
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(header(&resp, "x-seen"), Some("yes"));
    assert_eq!(into_text(resp.into_body()).await, "rejected by middleware");
}

#[tokio::test]
async fn can_post_process_serialized_context_payload() {
    let router = Router::builder()
        .get("/book", |_: Context| async move { Ok((StatusCode::OK, serde_json::json!({ "title": "Dune" }))) })
        .with_middleware(Middleware::post(|res: Response<Full<Bytes>>| async move {
            let (parts, body) = res.into_parts();
            let payload: serde_json::Value = serde_json::from_str(&into_text(body).await)?;
            let wrapped = serde_json::to_vec(&serde_json::json!({ "book": payload }))?;
            Ok::<_, RouteError>(Response::from_parts(parts, Full::new(Bytes::from(wrapped))))
        }))
        .build()
        .unwrap();
    let serve = serve(router);

    let resp = serve.request(Method::GET, "/book").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(header(&resp, "content-type"), Some("application/json"));
    assert_eq!(into_text(resp.into_body()).await, r#"{"book":{"title":"Dune"}}"#);
}

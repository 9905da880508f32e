use std::sync::Arc;

use feather::{
    endpoint::{make, make_sync},
    http::{header, Method, StatusCode},
    Endpoint, Mux, MuxConfig, Request, RouteError, WILDCARD_PARAM,
};

fn echo_params() -> impl Endpoint {
    make_sync(|req: Request| {
        req.params()
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&")
    })
}

async fn get(app: &Mux, uri: &str) -> (StatusCode, String) {
    let resp = app
        .call(Request::builder().method(Method::GET).uri_str(uri).finish())
        .await;
    let status = resp.status();
    (status, resp.into_body().into_string().await.unwrap())
}

#[test]
fn static_and_param_conflict_in_both_orders() {
    let res = Mux::new()
        .try_handle(Method::GET, "/user/new", make_sync(|_| "new"))
        .and_then(|mux| mux.try_handle(Method::GET, "/user/:id", make_sync(|_| "id")));
    assert!(matches!(res, Err(RouteError::WildcardConflict { .. })));

    let res = Mux::new()
        .try_handle(Method::GET, "/user/:id", make_sync(|_| "id"))
        .and_then(|mux| mux.try_handle(Method::GET, "/user/new", make_sync(|_| "new")));
    assert!(matches!(res, Err(RouteError::WildcardConflict { .. })));

    // other methods have their own tree
    assert!(Mux::new()
        .try_handle(Method::GET, "/user/new", make_sync(|_| "new"))
        .and_then(|mux| mux.try_handle(Method::DELETE, "/user/:id", make_sync(|_| "id")))
        .is_ok());
}

#[test]
#[should_panic(expected = "duplicate param name 'id' detected for route '/a/:id/b/:id'")]
fn duplicate_param_names_panic() {
    let _ = Mux::new().get("/a/:id/b/:id", make_sync(|_| ()));
}

#[tokio::test]
async fn captures_params_and_wildcard() {
    let app = Mux::new()
        .get("/user/:id", echo_params())
        .get("/static/*", echo_params())
        .get("/user/:id/files/*", echo_params());

    assert_eq!(
        get(&app, "/user/42").await,
        (StatusCode::OK, "id=42".to_string())
    );
    assert_eq!(
        get(&app, "/static/css/a.css").await,
        (StatusCode::OK, format!("{}=css/a.css", WILDCARD_PARAM))
    );
    assert_eq!(
        get(&app, "/user/7/files/docs/readme.md").await,
        (StatusCode::OK, format!("id=7&{}=docs/readme.md", WILDCARD_PARAM))
    );
    assert_eq!(get(&app, "/users").await.0, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn redirects_keep_the_query() {
    let app = Mux::new()
        .get("/foo", make_sync(|_| "foo"))
        .post("/foo", make_sync(|_| "foo"));

    let resp = app
        .call(Request::builder().uri_str("/foo/?page=2").finish())
        .await;
    assert_eq!(resp.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(
        resp.headers().get(header::LOCATION).unwrap(),
        "/foo?page=2"
    );

    let resp = app
        .call(
            Request::builder()
                .method(Method::POST)
                .uri_str("/FOO")
                .finish(),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::PERMANENT_REDIRECT);
    assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/foo");
}

#[tokio::test]
async fn method_not_allowed_from_config() {
    let config: MuxConfig =
        serde_json::from_str(r#"{"handle_method_not_allowed": true}"#).unwrap();
    let app = Mux::with_config(config).get("/x", make_sync(|_| "x"));
    assert!(app.config().redirect_trailing_slash);

    let resp = app
        .call(
            Request::builder()
                .method(Method::DELETE)
                .uri_str("/x")
                .finish(),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(resp.headers().get(header::ALLOW).unwrap(), "GET");
}

#[tokio::test]
async fn priority_does_not_change_matches() {
    let routes = [
        "/search", "/support", "/blog", "/blog/:post", "/about", "/s", "/se", "/b",
    ];
    let mut orders = vec![routes.to_vec()];
    let mut reversed = routes.to_vec();
    reversed.reverse();
    orders.push(reversed);

    for order in orders {
        let mut app = Mux::new();
        for route in &order {
            let name = route.to_string();
            app = app.get(route, make_sync(move |_| name.clone()));
        }

        // repeated lookups on the same tree give the same answers
        for _ in 0..2 {
            for route in &routes {
                if route.contains(':') {
                    continue;
                }
                assert_eq!(get(&app, route).await, (StatusCode::OK, route.to_string()));
            }
            assert_eq!(
                get(&app, "/blog/hello").await,
                (StatusCode::OK, "/blog/:post".to_string())
            );
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_requests_keep_their_own_params() {
    let app = Arc::new(Mux::new().get(
        "/u/:id/f/*",
        make(|req: Request| async move {
            let first = req.param("id").to_string();
            tokio::task::yield_now().await;
            format!("{}|{}|{}", first, req.param("id"), req.wildcard())
        }),
    ));

    let tasks = (0..1000)
        .map(|i| {
            let app = app.clone();
            tokio::spawn(async move {
                let resp = get(&app, &format!("/u/{}/f/x/{}", i, i)).await;
                (i, resp)
            })
        })
        .collect::<Vec<_>>();

    for task in tasks {
        let (i, resp) = task.await.unwrap();
        assert_eq!(resp, (StatusCode::OK, format!("{}|{}|x/{}", i, i, i)));
    }
}

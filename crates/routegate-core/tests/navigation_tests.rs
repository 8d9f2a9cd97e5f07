use pretty_assertions::assert_eq;
use routegate_core::{
    IdleSignal, NavState, NavigateOptions, NavigationOutcome, RoutePath, SessionState,
};
use routegate_test_utils::{admin_session, login_home_registry, setup_router, RecordingLoader};
use tracing_test::traced_test;

#[tokio::test(start_paused = true)]
async fn test_login_round_trip() {
    let loader = RecordingLoader::new();
    let (router, session, navigator) = setup_router(login_home_registry(loader.clone()), None);

    // Unauthenticated visit to "/" is redirected, remembering "/"
    let outcome = router.navigate("/", None);
    let redirect = outcome.redirect().cloned().expect("redirect");
    assert_eq!(redirect.to, RoutePath::new("/login"));
    assert_eq!(redirect.origin(), Some(&RoutePath::new("/")));
    assert_eq!(
        navigator.last(),
        Some((
            RoutePath::new("/login"),
            NavigateOptions::replace().with_state(NavState::from_path("/")),
        ))
    );
    assert_eq!(loader.total_calls(), 0);

    // The host follows the redirect; the login page warms "/"
    let NavigationOutcome::Rendered { prefetches, .. } = router.navigate("/login", Some("/")) else {
        panic!("login page must render");
    };
    assert_eq!(prefetches.len(), 1);
    for ticket in prefetches {
        assert!(ticket.settled().await);
    }
    assert!(router.scheduler().is_completed("/"));

    // Valid credentials, then resume
    session.sign_in(admin_session());
    assert!(session.is_authenticated());
    let resumed = router.complete_login(&redirect.options.state);
    assert_eq!(resumed, RoutePath::new("/"));
    assert_eq!(navigator.last(), Some((RoutePath::new("/"), NavigateOptions::replace())));

    let NavigationOutcome::Rendered { path, prefetches } = router.navigate("/", None) else {
        panic!("home must render once signed in");
    };
    assert_eq!(path, RoutePath::new("/"));
    assert!(prefetches.is_empty());
    assert_eq!(loader.calls("/"), 1);
    assert_eq!(loader.calls("/login"), 0);
}

#[tokio::test]
async fn test_home_renders_without_prefetch_work() {
    let loader = RecordingLoader::new();
    let (router, session, navigator) = setup_router(login_home_registry(loader.clone()), None);
    session.sign_in(admin_session());

    let outcome = router.navigate("/", None);

    assert!(outcome.is_rendered());
    assert!(navigator.history().is_empty());
    assert_eq!(loader.total_calls(), 0);
    assert!(router.scheduler().completed().is_empty());
}

#[tokio::test]
async fn test_resume_defaults_to_root() {
    let (router, session, navigator) =
        setup_router(login_home_registry(RecordingLoader::new()), None);

    let NavigationOutcome::Rendered { .. } = router.navigate("/login", None) else {
        panic!("login page must render");
    };
    session.sign_in(admin_session());

    assert_eq!(router.complete_login(&NavState::default()), RoutePath::new("/"));
    assert_eq!(navigator.history().len(), 1);
}

#[tokio::test]
async fn test_logout_redirects_future_navigation() {
    let (router, session, navigator) =
        setup_router(login_home_registry(RecordingLoader::new()), None);
    session.sign_in(admin_session());
    assert!(router.navigate("/", None).is_rendered());

    session.sign_out();
    router.logout();
    assert_eq!(navigator.last(), Some((RoutePath::new("/login"), NavigateOptions::replace())));

    let outcome = router.navigate("/", None);
    assert_eq!(
        outcome.redirect().and_then(|r| r.origin()).cloned(),
        Some(RoutePath::new("/"))
    );
}

#[tokio::test]
#[traced_test]
async fn test_unknown_route_is_not_found() {
    let (router, _session, navigator) =
        setup_router(login_home_registry(RecordingLoader::new()), None);

    let outcome = router.navigate("/admin", None);

    assert!(matches!(outcome, NavigationOutcome::NotFound(ref p) if p.as_str() == "/admin"));
    assert!(navigator.history().is_empty());
    assert!(logs_contain("unknown route: '/admin'"));
    assert!(logs_contain("kind=\"config\""));
}

#[tokio::test(start_paused = true)]
async fn test_host_idle_signal_releases_prefetch() {
    let loader = RecordingLoader::new();
    let signal = IdleSignal::new();
    let (router, _session, _navigator) =
        setup_router(login_home_registry(loader.clone()), Some(signal.clone()));

    let NavigationOutcome::Rendered { prefetches, .. } = router.navigate("/login", None) else {
        panic!("login page must render");
    };
    tokio::task::yield_now().await;
    assert_eq!(loader.calls("/"), 0);

    signal.set_idle(true);
    for ticket in prefetches {
        assert!(ticket.settled().await);
    }
    assert_eq!(loader.calls("/"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_busy_host_still_prefetches_after_timeout() {
    let loader = RecordingLoader::new();
    let (router, _session, _navigator) =
        setup_router(login_home_registry(loader.clone()), Some(IdleSignal::new()));

    let start = tokio::time::Instant::now();
    let NavigationOutcome::Rendered { prefetches, .. } = router.navigate("/login", None) else {
        panic!("login page must render");
    };
    for ticket in prefetches {
        assert!(ticket.settled().await);
    }

    assert!(start.elapsed() >= router.scheduler().idle_timeout());
    assert_eq!(loader.calls("/"), 1);
}

//! Dev server command implementation with JSON APIs.

use super::build::{site_chrome, STATIC_ASSETS};
use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::{Path as AxumPath, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use docset_core::{Config, MarkdownProcessor, ResolveError, ResolvedDoc, Site, SiteHandle};
use docset_render::{render_doc_page, render_not_found, SiteChrome};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    chrome: Arc<SiteChrome>,
    site: Arc<SiteHandle>,
}

/// Start development server with file watching
pub async fn dev_server(config_path: &Path, port: Option<u16>) -> Result<()> {
    let config = Config::from_file(config_path).context("Failed to load configuration")?;
    let processor = Arc::new(
        MarkdownProcessor::for_theme(&config.highlight.theme)
            .context("Failed to initialize highlighter")?,
    );
    let site = Site::load(&config, processor.clone()).context("Failed to load content collection")?;
    let port = port.unwrap_or(config.server.port);
    let content_dir = config.content_dir();

    let state = AppState {
        chrome: Arc::new(site_chrome(&config)),
        config: Arc::new(config),
        site: Arc::new(SiteHandle::new(site)),
    };

    tracing::info!("Starting dev server on http://localhost:{}", port);
    println!("\nServing at http://localhost:{}", port);
    println!("   Press Ctrl+C to stop\n");

    // Set up file watching for live republishing
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut _watcher = RecommendedWatcher::new(
        move |res| {
            let _ = tx.send(res);
        },
        notify::Config::default(),
    )
    .context("Failed to initialize file watcher")?;

    _watcher
        .watch(&content_dir, RecursiveMode::Recursive)
        .with_context(|| format!("Failed to watch {:?}", content_dir))?;

    tokio::spawn({
        let state = state.clone();
        async move {
            while let Some(event) = rx.recv().await {
                match event {
                    Ok(ev) if touches_markdown(&ev) => {
                        // Debounce a bit by draining pending events
                        while rx.try_recv().is_ok() {}
                        tracing::info!("Content changed, reloading collection...");
                        let res = tokio::task::spawn_blocking({
                            let config = state.config.clone();
                            let processor = processor.clone();
                            move || Site::load(&config, processor)
                        })
                        .await;

                        match res {
                            Ok(Ok(site)) => state.site.republish(site),
                            Ok(Err(e)) => {
                                tracing::error!("Reload failed, keeping previous site: {}", e)
                            }
                            Err(e) => tracing::error!("Reload task panicked: {}", e),
                        }
                    }
                    Ok(_) => {}
                    Err(err) => tracing::warn!("Watcher error: {}", err),
                }
            }
        }
    });

    let app = router(state);

    let addr = format!("127.0.0.1:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

fn touches_markdown(event: &notify::Event) -> bool {
    !matches!(event.kind, EventKind::Access(_))
        && event
            .paths
            .iter()
            .any(|p| p.extension().is_some_and(|ext| ext == "md"))
}

fn router(state: AppState) -> Router {
    let docs_route = format!("{}/{{*slug}}", state.config.docs.route_prefix);

    Router::new()
        .route("/api/docs/{*slug}", get(api_doc))
        .route("/api/sidebar", get(api_sidebar))
        .route("/static/{*path}", get(serve_static))
        .route(&docs_route, get(serve_doc))
        .fallback(serve_404)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Slug lookup with the `/index` fallback used for section roots
async fn resolve(site: &Site, slug: &str) -> Result<ResolvedDoc, ResolveError> {
    let slug = slug.trim_matches('/');
    match site.resolve_by_slug(slug).await {
        Err(err) if err.is_not_found() => {
            site.resolve_by_slug(&format!("{}/index", slug))
                .await
                .map_err(|_| err)
        }
        other => other,
    }
}

async fn serve_doc(State(state): State<AppState>, AxumPath(slug): AxumPath<String>) -> Response {
    let prefix = state.config.docs.route_prefix.as_str();
    if let Some(target) = state.config.redirect_for(&format!("{}/{}", prefix, slug)) {
        return found(target);
    }

    let site = state.site.snapshot();
    let doc = match resolve(&site, &slug).await {
        Ok(doc) => doc,
        Err(err) if err.is_not_found() => return not_found_page(&state),
        Err(err) => return server_error(err),
    };
    // Section roots are laid out from the page they resolved to
    let page_path = format!("{}/{}", prefix, doc.metadata.path);
    let layout = match site.layout_data(&page_path).await {
        Ok(layout) => layout,
        Err(err) => return server_error(err),
    };

    match render_doc_page(&state.chrome, &doc, &layout) {
        Ok(html) => Html(html).into_response(),
        Err(err) => server_error(err),
    }
}

// ---- API handlers ----

async fn api_doc(State(state): State<AppState>, AxumPath(slug): AxumPath<String>) -> Response {
    let site = state.site.snapshot();

    match resolve(&site, &slug).await {
        Ok(doc) => Json(doc).into_response(),
        Err(err) if err.is_not_found() => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": err.to_string() })),
        )
            .into_response(),
        Err(err) => server_error(err),
    }
}

#[derive(Deserialize)]
struct SidebarParams {
    path: Option<String>,
}

async fn api_sidebar(State(state): State<AppState>, Query(params): Query<SidebarParams>) -> Response {
    let path = params.path.unwrap_or_default();
    let site = state.site.snapshot();

    match site.layout_data(&path).await {
        Ok(layout) => Json(layout).into_response(),
        Err(err) => server_error(err),
    }
}

async fn serve_static(State(state): State<AppState>, AxumPath(path): AxumPath<String>) -> Response {
    match STATIC_ASSETS.get_file(&path) {
        Some(file) => (
            [(header::CONTENT_TYPE, content_type_for_path(&path))],
            file.contents(),
        )
            .into_response(),
        None => not_found_page(&state),
    }
}

/// Serve custom 404 page
async fn serve_404(State(state): State<AppState>) -> Response {
    not_found_page(&state)
}

fn not_found_page(state: &AppState) -> Response {
    match render_not_found(&state.chrome) {
        Ok(html) => (StatusCode::NOT_FOUND, Html(html)).into_response(),
        // Fallback if the template fails
        Err(_) => (StatusCode::NOT_FOUND, "404 Not Found").into_response(),
    }
}

fn found(target: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, target.to_string())], Body::empty()).into_response()
}

fn server_error(err: impl std::fmt::Display) -> Response {
    tracing::error!("Request failed: {}", err);
    (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
}

fn content_type_for_path(path: &str) -> &'static str {
    match Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
        .as_str()
    {
        "html" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" => "application/javascript; charset=utf-8",
        "json" => "application/json; charset=utf-8",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "woff2" => "font/woff2",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::http::Request;
    use std::fs;
    use tempfile::{tempdir, TempDir};
    use tower::ServiceExt;

    fn page(title: &str, category: &str, order: u32) -> String {
        format!(
            "---\ntitle: {title}\ndescription: About {title}\ncategory: {category}\norder: {order}\n---\n# {title}\n"
        )
    }

    fn sample_state() -> (TempDir, AppState) {
        let tmp = tempdir().unwrap();
        let content = tmp.path().join("content");
        fs::create_dir_all(content.join("svelte")).unwrap();
        fs::create_dir_all(content.join("kit")).unwrap();
        fs::write(content.join("svelte/introduction.md"), page("Introduction", "Basics", 1)).unwrap();
        fs::write(content.join("kit/introduction.md"), page("Introduction", "Start", 1)).unwrap();
        fs::write(content.join("kit/routing.md"), page("Routing", "Core", 2)).unwrap();

        let config_path = tmp.path().join("docset.yml");
        fs::write(
            &config_path,
            "site:\n  title: Test\n  description: Desc\npaths:\n  content: content\n  output: build\n",
        )
        .unwrap();
        let config = Config::from_file(&config_path).unwrap();
        let site = Site::from_config(&config).unwrap();

        let state = AppState {
            chrome: Arc::new(site_chrome(&config)),
            config: Arc::new(config),
            site: Arc::new(SiteHandle::new(site)),
        };
        (tmp, state)
    }

    async fn get_path(state: AppState, uri: &str) -> Response {
        router(state)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn body_string(response: Response) -> String {
        let body = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
        String::from_utf8(body.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn doc_page_renders() {
        let (_tmp, state) = sample_state();
        let response = get_path(state, "/docs/kit/routing").await;
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_string(response).await;
        assert!(html.contains(r#"<h1 id="routing">Routing</h1>"#));
        assert!(html.contains("docs-layout--kit"));
    }

    #[tokio::test]
    async fn bare_variant_routes_redirect() {
        let (_tmp, state) = sample_state();
        let response = get_path(state.clone(), "/docs/kit").await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "/docs/kit/introduction");

        let response = get_path(state, "/docs/svelte").await;
        assert_eq!(response.headers()[header::LOCATION], "/docs/svelte/introduction");
    }

    #[tokio::test]
    async fn unknown_doc_is_404() {
        let (_tmp, state) = sample_state();
        let response = get_path(state.clone(), "/docs/kit/missing").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = get_path(state, "/api/docs/kit/missing").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn api_doc_returns_json() {
        let (_tmp, state) = sample_state();
        let response = get_path(state, "/api/docs/svelte/introduction").await;
        assert_eq!(response.status(), StatusCode::OK);

        let value: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(value["title"], "Introduction");
        assert_eq!(value["metadata"]["slugFull"], "/svelte/introduction");
        assert!(value["content"]["html"].as_str().unwrap().contains("<h1"));
    }

    #[tokio::test]
    async fn api_sidebar_partitions_by_path() {
        let (_tmp, state) = sample_state();
        let params = SidebarParams {
            path: Some("/docs/kit/routing".into()),
        };

        let response = api_sidebar(State(state), Query(params)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let value: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(value["isKit"], true);
        let categories: Vec<_> = value["sidebarLinks"]
            .as_object()
            .unwrap()
            .keys()
            .cloned()
            .collect();
        assert_eq!(categories, vec!["Start", "Core"]);
        assert_eq!(value["sidebarLinks"]["Core"][0]["href"], "routing");
    }

    #[tokio::test]
    async fn encoded_slugs_are_decoded() {
        let (tmp, state) = sample_state();
        let content = tmp.path().join("content/svelte");
        fs::write(content.join("two words.md"), page("Two words", "Basics", 2)).unwrap();
        fs::write(content.join("café.md"), page("Café", "Basics", 3)).unwrap();
        state
            .site
            .republish(Site::from_config(&state.config).unwrap());

        for uri in [
            "/docs/svelte/two%20words",
            "/docs/svelte/caf%C3%A9",
            "/api/docs/svelte/two%20words",
            "/api/docs/svelte/caf%C3%A9",
        ] {
            let response = get_path(state.clone(), uri).await;
            assert_eq!(response.status(), StatusCode::OK, "{}", uri);
        }

        let response = get_path(state, "/api/docs/svelte/caf%C3%A9").await;
        let value: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(value["metadata"]["path"], "svelte/café");
    }

    #[tokio::test]
    async fn section_index_uses_its_own_sidebar() {
        let (tmp, mut state) = sample_state();
        fs::write(tmp.path().join("content/kit/index.md"), page("Overview", "Start", 0)).unwrap();
        let mut config = (*state.config).clone();
        config.docs.redirects.clear();
        state.config = Arc::new(config);
        state
            .site
            .republish(Site::from_config(&state.config).unwrap());

        let response = get_path(state, "/docs/kit").await;
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_string(response).await;
        assert!(html.contains("docs-layout--kit"));
    }

    #[tokio::test]
    async fn static_css_is_served() {
        let (_tmp, state) = sample_state();
        let response = get_path(state, "/static/docset.css").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/css; charset=utf-8");
    }

    #[tokio::test]
    async fn republished_site_is_served() {
        let (tmp, state) = sample_state();
        fs::write(
            tmp.path().join("content/kit/hooks.md"),
            page("Hooks", "Core", 3),
        )
        .unwrap();
        state
            .site
            .republish(Site::from_config(&state.config).unwrap());

        let response = get_path(state, "/docs/kit/hooks").await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}

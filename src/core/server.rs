use anyhow::Result;
use axum::{
    extract::{Query, State},
    http::{Method, StatusCode, Uri},
    response::{Html, IntoResponse, Response},
    Router,
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::core::site::Site;
use crate::theme::{Renderer, ThemeRenderer};
use crate::utils::decode_path;

#[derive(Clone)]
struct AppState {
    site: Site,
    renderer: Arc<ThemeRenderer>,
}

#[derive(Debug, Default, Deserialize)]
struct PageQuery {
    page: Option<String>,
}

/// HTTP 服务器
pub struct Server {
    site: Site,
    renderer: ThemeRenderer,
    /// 端口
    port: u16,
}

impl Server {
    /// 创建新的服务器
    pub fn new(site: Site, renderer: ThemeRenderer, port: u16) -> Self {
        Self { site, renderer, port }
    }

    /// 路由：`/static` 提供主题资源，其余 GET 请求都交给站点解析
    pub fn router(&self) -> Router {
        let static_dir = ServeDir::new(self.renderer.source_dir());
        let state = AppState {
            site: self.site.clone(),
            renderer: Arc::new(self.renderer.clone()),
        };

        Router::new()
            .nest_service("/static", static_dir)
            .fallback(handle)
            .with_state(state)
            .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
    }

    /// 启动服务器
    pub async fn start(self) -> Result<()> {
        let app = self.router();

        let addr: SocketAddr = format!("0.0.0.0:{}", self.port).parse()?;
        info!("Server started at http://localhost:{}", self.port);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}

/// 查询参数中的页码，无效或小于 1 时为 1
fn parse_page(value: Option<&str>) -> usize {
    value
        .and_then(|v| v.trim().parse::<i64>().ok())
        .map(|n| n.max(1) as usize)
        .unwrap_or(1)
}

async fn handle(State(state): State<AppState>, method: Method, uri: Uri, query: Option<Query<PageQuery>>) -> Response {
    if method != Method::GET && method != Method::HEAD {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }

    let path = decode_path(uri.path());
    let page = parse_page(query.as_ref().and_then(|q| q.page.as_deref()));

    match tokio::task::spawn_blocking(move || render_path(&state, &path, page)).await {
        Ok(response) => response,
        Err(e) => {
            error!("请求处理失败: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
    }
}

/// 解析并渲染；同步执行
fn render_path(state: &AppState, path: &str, page: usize) -> Response {
    let contract = match state.site.resolve_page(path, page) {
        Ok(contract) => contract,
        Err(e) => {
            error!("{}", e);
            let status = StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            return (status, "Site configuration error").into_response();
        }
    };

    let (status, rendered) = if contract.is_404 {
        (StatusCode::NOT_FOUND, state.renderer.render_not_found(&contract))
    } else {
        (StatusCode::OK, state.renderer.render(&contract.template, &contract))
    };

    match rendered {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            error!("渲染 {} 失败: {:#}", path, e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
    }
}

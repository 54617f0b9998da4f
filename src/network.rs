use crate::config::CorsConfig;
use crate::game::is_valid_game_id;
use crate::message::{ErrorBody, GameSummary, GuessQuery};
use crate::service::GameService;
use crate::{Error, Result};
use axum::{
    Router,
    extract::{Path, Query},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, error, info};

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::InvalidTransition(_) => StatusCode::FORBIDDEN,
            _ => {
                error!("请求处理失败: {}", self);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// HTTP服务器，负责游戏接口
pub struct HttpServer {
    service: Arc<GameService>,
}

impl HttpServer {
    pub fn new(service: Arc<GameService>) -> Self {
        HttpServer { service }
    }

    /// 构建路由
    pub fn router(&self, cors_config: &CorsConfig) -> Router {
        let service = self.service.clone();

        Router::new()
            .route(
                "/games",
                get({
                    let service = service.clone();
                    move || async move { handle_list_games(service.clone()).await }
                })
                .post({
                    let service = service.clone();
                    move || async move { handle_start_game(service.clone()).await }
                }),
            )
            .route(
                "/games/:id",
                get({
                    let service = service.clone();
                    move |Path(id): Path<String>| async move {
                        handle_game_detail(id, service.clone()).await
                    }
                })
                .post({
                    let service = service.clone();
                    move |Path(id): Path<String>, Query(query): Query<GuessQuery>| async move {
                        handle_guess(id, query, service.clone()).await
                    }
                }),
            )
            .layer(cors_layer(cors_config))
    }

    /// 启动HTTP服务器，阻塞直到服务器退出
    pub async fn serve(&self, http_addr: &str, cors_config: &CorsConfig) -> Result<()> {
        let app = self.router(cors_config);
        let listener = tokio::net::TcpListener::bind(http_addr)
            .await
            .map_err(|e| {
                error!("绑定HTTP地址失败: {} - {}", http_addr, e);
                Error::Network(anyhow::anyhow!(e))
            })?;
        info!("HTTP服务器启动在 {}", http_addr);

        axum::serve(listener, app).await.map_err(|e| {
            error!("HTTP服务器运行错误: {}", e);
            Error::Network(anyhow::anyhow!(e))
        })?;
        Ok(())
    }
}

/// 根据配置设置CORS
fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let allow_all = || {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_credentials(false)
    };

    if config.allow_all_origins.unwrap_or(true) {
        debug!("CORS配置: 允许所有来源");
        return allow_all();
    }

    match &config.allowed_origins {
        Some(allowed_origins) if !allowed_origins.is_empty() => {
            let origins = allowed_origins
                .iter()
                .filter_map(|origin| origin.parse::<axum::http::HeaderValue>().ok())
                .collect::<Vec<_>>();
            debug!("CORS允许的来源: {:?}", origins);
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::OPTIONS,
                ])
                .allow_credentials(true)
        }
        _ => {
            debug!("CORS配置: 没有设置允许的来源，默认允许所有来源");
            allow_all()
        }
    }
}

/// 路径中的ID不符合格式时视为不存在
fn check_game_id(id: &str) -> Result<()> {
    if is_valid_game_id(id) {
        Ok(())
    } else {
        Err(Error::NotFound(id.to_string()))
    }
}

/// 处理游戏列表
async fn handle_list_games(service: Arc<GameService>) -> Result<Json<Vec<GameSummary>>> {
    let legacy = service.legacy_status_labels();
    let games = service.list_games().await?;
    Ok(Json(
        games
            .iter()
            .map(|game| GameSummary::from_game(game, legacy))
            .collect(),
    ))
}

/// 处理开始新游戏
async fn handle_start_game(service: Arc<GameService>) -> Result<(StatusCode, Json<GameSummary>)> {
    let game = service.start_game().await?;
    Ok((
        StatusCode::CREATED,
        Json(GameSummary::from_game(&game, service.legacy_status_labels())),
    ))
}

/// 处理游戏详情
async fn handle_game_detail(id: String, service: Arc<GameService>) -> Result<Json<GameSummary>> {
    check_game_id(&id)?;
    let game = service.get_game(&id).await?;
    Ok(Json(GameSummary::from_game(
        &game,
        service.legacy_status_labels(),
    )))
}

/// 处理猜测
async fn handle_guess(
    id: String,
    query: GuessQuery,
    service: Arc<GameService>,
) -> Result<Json<GameSummary>> {
    check_game_id(&id)?;
    let game = service.guess(&id, query.character.as_deref()).await?;
    Ok(Json(GameSummary::from_game(
        &game,
        service.legacy_status_labels(),
    )))
}

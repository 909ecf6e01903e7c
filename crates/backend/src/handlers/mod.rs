//! HTTP обработчики: тонкий слой между axum и executor'ом заполнения.

pub mod files;
pub mod system;
pub mod usecases;

use axum::http::StatusCode;
use once_cell::sync::OnceCell;
use std::sync::Arc;

use crate::shared::config::Config;
use crate::usecases::u508_fill_order_template::FillExecutor;

struct AppState {
    config: Config,
    executor: Arc<FillExecutor>,
}

static APP_STATE: OnceCell<AppState> = OnceCell::new();

/// Вызывается один раз при старте сервера
pub fn init(config: Config, executor: Arc<FillExecutor>) -> anyhow::Result<()> {
    APP_STATE
        .set(AppState { config, executor })
        .map_err(|_| anyhow::anyhow!("handlers state already initialized"))
}

fn state() -> Result<&'static AppState, StatusCode> {
    APP_STATE.get().ok_or_else(|| {
        tracing::error!("Handlers used before initialization");
        StatusCode::SERVICE_UNAVAILABLE
    })
}

pub(crate) fn config() -> Result<&'static Config, StatusCode> {
    state().map(|s| &s.config)
}

pub(crate) fn executor() -> Result<&'static Arc<FillExecutor>, StatusCode> {
    state().map(|s| &s.executor)
}

use common::utils::logging::{init_logging, LogFormat};
use configs::AppConfig;
use dotenvy::dotenv;
use storefront::StorefrontSession;
use tracing::{error, info, warn};
use uuid::Uuid;

fn setup_logging() {
    // 加载 .env（可配置 RUST_LOG、LOG_FORMAT、CONFIG_PATH 及 URL 覆盖项）
    dotenv().ok();
    let format = LogFormat::from_env();
    init_logging(format);
    info!(service = "storefront", event = "logger_init", ?format, "tracing subscriber initialized");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    setup_logging();

    let session_id = Uuid::new_v4();
    let pid = std::process::id();
    let version = env!("CARGO_PKG_VERSION");

    // Panic 钩子：捕获异常并输出错误日志
    std::panic::set_hook(Box::new(move |info| {
        error!(
            service = "storefront",
            event = "panic",
            %session_id,
            pid,
            message = %info,
            "unhandled panic occurred"
        );
    }));

    info!(service = "storefront", event = "start", %session_id, pid, version, "storefront client starting");

    let cfg = AppConfig::load_and_validate()?;
    let session = StorefrontSession::bootstrap(&cfg).await?;

    let selection = session.store().snapshot();
    match selection.store_id() {
        Some(store_uuid) => info!(event = "store_selected", %store_uuid, "selected store loaded"),
        None => warn!(event = "store_selected", "no store selected yet"),
    }

    // 可选：对给定路径发起一次带门店上下文的请求，例如 `storefront /products?sort=asc`
    if let Some(path) = std::env::args().nth(1) {
        match session.fetcher().get(&path).await {
            Ok(res) => info!(event = "probe", %path, status = %res.status(), "contextual request completed"),
            Err(e) => error!(event = "probe", %path, error = %e, "contextual request failed"),
        }
    }

    info!(service = "storefront", event = "stop", %session_id, pid, "storefront client stopped");
    Ok(())
}

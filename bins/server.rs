use dotenvy::dotenv;
use tracing::{error, info};

fn main() -> std::process::ExitCode {
    dotenv().ok();
    let cfg = configs::AppConfig::load_or_env().ok();
    let format = cfg.as_ref().map(|c| c.logging.format).unwrap_or_default();
    common::utils::logging::init_logging(format);

    let pid = std::process::id();
    let version = env!("CARGO_PKG_VERSION");

    std::panic::set_hook(Box::new(move |info| {
        error!(service = "spexregister", event = "panic", pid, message = %info, "unhandled panic occurred");
    }));

    // config.toml first, then TOKIO_WORKER_THREADS
    let worker_threads = cfg
        .and_then(|c| c.server.worker_threads)
        .or_else(|| std::env::var("TOKIO_WORKER_THREADS").ok().and_then(|v| v.parse::<usize>().ok()));

    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();
    if let Some(w) = worker_threads {
        builder.worker_threads(w);
    }
    let rt = match builder.build() {
        Ok(rt) => rt,
        Err(e) => {
            error!(service = "spexregister", event = "runtime_build_failed", error = %e, "failed to build tokio runtime");
            return std::process::ExitCode::FAILURE;
        }
    };

    info!(
        service = "spexregister",
        event = "start",
        pid,
        version,
        threads = worker_threads.unwrap_or_default(),
        "spexregister starting"
    );

    rt.block_on(async move {
        match server::run().await {
            Ok(()) => {
                info!(service = "spexregister", event = "stop", pid, "server stopped normally");
                std::process::ExitCode::SUCCESS
            }
            Err(e) => {
                error!(service = "spexregister", event = "run_failed", error = %e, "server::run returned error");
                std::process::ExitCode::FAILURE
            }
        }
    })
}

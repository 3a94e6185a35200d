use std::sync::Arc;

use scw_core::{config::Config, session::ChatSession};
use scw_http::HttpSupportApi;
use scw_term::TerminalView;

#[tokio::main]
async fn main() -> Result<(), scw_core::Error> {
    scw_core::logging::init("scw")?;

    let cfg = Arc::new(Config::load()?);
    let api = Arc::new(HttpSupportApi::new(&cfg)?);
    let view = Arc::new(TerminalView::new(cfg.use_color));
    let session = Arc::new(ChatSession::new(cfg.clone(), api, view));

    scw_term::console::run_console(cfg, session)
        .await
        .map_err(|e| scw_core::Error::External(format!("console loop failed: {e}")))?;

    Ok(())
}

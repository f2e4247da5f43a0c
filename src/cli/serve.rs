use std::sync::Arc;

use crate::{
    config::Config,
    error, info,
    management::{FileStore, KeyValueStore, MemoryStore},
    server::{build_state, start_api_server},
    warning,
};

pub async fn serve(addr: Option<String>, memory: bool, open: bool) {
    let mut config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => error!("Cannot load configuration. Err: {}", e),
    };
    if let Some(addr) = addr {
        config.server_address = addr;
    }

    let store: Arc<dyn KeyValueStore> = if memory {
        info!("Keeping session state in memory");
        Arc::new(MemoryStore::new())
    } else {
        info!("Keeping session state in {}", config.sessions_dir().display());
        Arc::new(FileStore::new(config.sessions_dir()))
    };

    let state = match build_state(&config, store) {
        Ok(s) => s,
        Err(e) => error!("Cannot initialise server. Err: {}", e),
    };

    if open {
        let login_url = format!("http://{}/spotify/login", config.server_address);
        if webbrowser::open(&login_url).is_err() {
            warning!(
                "Failed to open browser. Please navigate to the following URL manually:\n{}",
                login_url
            )
        }
    }

    info!("Listening on {}", config.server_address);
    if let Err(e) = start_api_server(&config, state).await {
        error!("Server stopped. Err: {}", e);
    }
}

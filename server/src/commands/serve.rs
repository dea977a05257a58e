use tracing::info;

use crate::{http_server, AppState, Result};

pub(crate) async fn serve() -> Result<()> {
    let state = AppState::from_env().await?;

    if state.app.seed_data {
        db::seed::seed(state.db()).await?;
    } else {
        info!("SEED_DATA is off, starting with the database as is");
    }

    http_server::run_server(state).await
}

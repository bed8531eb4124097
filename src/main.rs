use axum::Router;

use treetracker_query::observability;
use treetracker_query::prelude::*;
use treetracker_query::{handlers, health};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;
    observability::init_tracing(&config)?;

    tracing::info!(
        service = %config.service.name,
        environment = %config.service.environment,
        "configuration loaded"
    );

    let pool = create_pool(&config.database).await?;
    let state = AppState::new(config.clone(), pool);

    let app = Router::new()
        .merge(handlers::routes())
        .merge(health::routes())
        .with_state(state);

    Server::new(config).serve(app).await
}

use crate::context::BuildContext;
use crate::error::TaskError;
use kiln_dev_server::{DevServer, ServerConfig};

/// Start the dev server; returns once it is listening
pub async fn start(ctx: &BuildContext) -> Result<(), TaskError> {
    let settings = &ctx.config.server;
    let server = DevServer::new(
        ServerConfig {
            host: settings.host.clone(),
            port: settings.port,
            root_dir: ctx.path(&settings.base_dir),
            notify: settings.notify,
        },
        ctx.live_reload().clone(),
    );

    let running = server.bind().await.map_err(TaskError::Server)?;
    tracing::info!("Dev server listening on http://{}", running.addr);
    ctx.add_service(running.into_handle());
    Ok(())
}

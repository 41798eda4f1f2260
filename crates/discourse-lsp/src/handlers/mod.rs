mod commands;
mod configuration;
mod diagnostics;
mod hover;
mod lifecycle;
mod notifications;

pub use commands::*;
pub use configuration::*;
pub use diagnostics::*;
pub use hover::*;
pub use lifecycle::*;
pub use notifications::*;

use crate::state::GlobalState;
use tower_lsp::lsp_types::MessageType;
use tower_lsp::Client;

/// Mirror a server event to the client's log channel, honouring the configured level.
pub(crate) async fn log_to_client(
    client: &Client,
    state: &GlobalState,
    typ: MessageType,
    message: impl Into<String>,
) {
    let message = message.into();
    match typ {
        MessageType::ERROR => log::error!("{}", message),
        MessageType::WARNING => log::warn!("{}", message),
        MessageType::INFO => log::info!("{}", message),
        _ => log::debug!("{}", message),
    }

    let level = state.server.read().await.log_level;
    if level.allows(typ) {
        client.log_message(typ, message).await;
    }
}

use crate::config::Config;
use crate::service::SessionRegistry;

pub struct AppState {
    pub config: Config,
    pub sessions: SessionRegistry,
}

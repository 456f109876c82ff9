//! Process-wide shared state: the two registries (C3-backed, per §4.4/§4.5)
//! plus the static configuration every handler needs to build a reply.

use std::sync::Arc;

use crate::channels::ChannelRegistry;
use crate::config::Config;
use crate::users::UserRegistry;

#[derive(Clone)]
pub struct ServerState(Arc<ServerStateInner>);

struct ServerStateInner {
    pub users: UserRegistry,
    pub channels: ChannelRegistry,
    pub config: Config,
}

impl ServerState {
    pub fn new(config: Config) -> Self {
        ServerState(Arc::new(ServerStateInner {
            users: UserRegistry::new(),
            channels: ChannelRegistry::new(),
            config,
        }))
    }

    pub fn users(&self) -> &UserRegistry {
        &self.0.users
    }

    pub fn channels(&self) -> &ChannelRegistry {
        &self.0.channels
    }

    pub fn config(&self) -> &Config {
        &self.0.config
    }

    pub fn hostname(&self) -> &str {
        &self.0.config.hostname
    }

    pub fn password_required(&self) -> bool {
        self.0.config.password.is_some()
    }
}

pub mod allow_list;
pub mod client;
pub mod config;
pub mod desktop;
pub mod frame;
pub mod keys;
pub mod rpc;
pub mod service;

pub use allow_list::AllowListError;
pub use client::ClientError;
pub use config::ConfigError;
pub use desktop::DesktopError;
pub use frame::FrameError;
pub use keys::KeyError;
pub use rpc::RpcError;
pub use service::ServiceError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    AllowList(#[from] AllowListError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Keys(#[from] KeyError),

    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error(transparent)]
    Rpc(#[from] RpcError),

    #[error(transparent)]
    Desktop(#[from] DesktopError),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Client(#[from] ClientError),
}

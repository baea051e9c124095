//! Model downloader client: submission and realtime channel IO around the
//! pure session core.
mod channel;
mod initiator;
mod session;
mod settings;

pub use channel::ChannelManager;
pub use initiator::{ReqwestInitiator, SessionInitiator};
pub use session::DownloadSession;
pub use settings::{ClientSettings, DEFAULT_SERVER_URL};

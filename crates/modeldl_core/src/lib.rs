//! Model downloader core: pure session state machine and view-model helpers.
mod channel;
mod effect;
mod error;
mod event;
mod msg;
mod project;
mod request;
mod state;
mod update;
mod view_model;

pub use channel::ChannelState;
pub use effect::Effect;
pub use error::{FrameError, SubmissionError, TransportError, ValidationError};
pub use event::{classify_frame, parse_frame, ErrorEvent, InboundEvent, ProgressEvent, ProgressStatus};
pub use msg::Msg;
pub use project::{project, SessionInput, CONNECTION_ERROR_MESSAGE, DEFAULT_FAILURE_MESSAGE};
pub use request::{DownloadRequest, SessionId};
pub use state::{Phase, SessionState};
pub use update::{update, SessionMachine};
pub use view_model::DownloadViewModel;

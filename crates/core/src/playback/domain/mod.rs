pub mod playback_logger;
pub mod playback_session;
pub mod playback_state;
pub mod presentation_loop;

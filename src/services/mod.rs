pub mod command_router;
pub mod event_relay;

pub use command_router::CommandRouter;
pub use event_relay::EventRelay;

//! Resolution strategies, one per execution context

mod contextless;
mod hub;
mod local;
mod remote;
mod repository;
mod server;
mod temp_copy;
mod virtual_node;

pub use contextless::ContextlessResolver;
pub use hub::HubExecutorResolver;
pub use local::LocalResolver;
pub use remote::RemoteExecutorResolver;
pub use server::ServerExecutorResolver;
pub use temp_copy::TempCopyResolver;
pub use virtual_node::VirtualNodeResolver;

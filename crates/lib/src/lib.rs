//! A2A agents library: the PrimeAgent and SecondaryAgent HTTP services, the relay client,
//! the per-conversation mode router, and the completion provider.

pub mod a2a;
pub mod channels;
pub mod completion;
pub mod config;
pub mod echo;
pub mod gateway;
pub mod llm;
pub mod routing;
pub mod session;

mod methods;
mod protocol;
mod server;

pub use protocol::{JsonRpcError, JsonRpcMessage, JsonRpcResponse};
pub use server::{handle_message, run_server, serve, WorkerInfo};

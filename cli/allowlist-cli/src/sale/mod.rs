pub mod contract;
pub mod dispatch;
pub mod rpc;
pub mod transport;

pub use contract::{INft, IWhitelistSale, SaleClient};
pub use dispatch::{format_ether, CommandKind, Console, ConsoleError, Outcome, Role, SaleCommand};
pub use rpc::JsonRpcTransport;
pub use transport::{CallRequest, ChainTransport, Receipt, SubmitError};

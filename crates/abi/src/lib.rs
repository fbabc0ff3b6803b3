pub mod erc20;
pub mod escrow;
pub mod factory;
pub mod fees;
pub mod registry;

pub use erc20::{IERC20Permit, Permit};
pub use escrow::IEscrow;
pub use factory::{EscrowParams, IEscrowFactory};
pub use fees::IFeeManager;
pub use registry::IAgentRegistry;

pub mod paraswap;

pub use paraswap::ParaSwapRouter;

//! Gateway composition layer.
//!
//! [`Dotgate::builder()`] is the crate's front door:
//!
//! ```rust,no_run
//! use dotgate::Dotgate;
//! use tokio_util::sync::CancellationToken;
//!
//! # #[tokio::main]
//! # async fn main() -> dotgate::Result<()> {
//! let gateway = Dotgate::builder().cache_ttl_secs(120).build();
//!
//! let sdks = gateway.list_sdks(false, &CancellationToken::new()).await?;
//! println!("{sdks}");
//! # Ok(())
//! # }
//! ```

mod builder;
mod cli;

pub use builder::{Dotgate, DotgateBuilder};
pub use cli::CliGateway;

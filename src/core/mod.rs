pub mod traits;
pub mod session;
pub mod subscription;
pub mod gateway;

pub use traits::{SignerProvider, SignerSession};
pub use session::WalletSession;
pub use subscription::ReviewSubscription;
pub use gateway::{login_message, BlockchainGateway};

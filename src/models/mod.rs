pub mod review;
pub mod location;
pub mod session;

pub use review::{Review, ReviewInput};
pub use location::{Location, LocationScores, KeywordCount};
pub use session::{ConnectionState, ConnectedAccount, SignerKind, LoginOutcome, SubmittedReview, TransactionOutcome, TxStatus};

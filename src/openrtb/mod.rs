pub mod media;
pub mod path;
pub mod regs;
pub mod transaction;
pub mod version;

pub use media::{AdUnit, Audio, Banner, CreativeMarkupType, Format, Native, Video};
pub use path::FieldPath;
pub use regs::Regs;
pub use transaction::{BidRef, LineItem, Transaction, TransactionKind};
pub use version::{Generation, Version};

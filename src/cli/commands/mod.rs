//! CLI command implementations

pub mod activate;
pub mod cache;
pub mod config;
pub mod fetch;
pub mod install;
pub mod journal;
pub mod push;
pub mod status;
pub mod sync;

pub use activate::execute as activate;
pub use cache::execute as cache;
pub use config::execute as config;
pub use fetch::execute as fetch;
pub use install::execute as install;
pub use journal::execute as journal;
pub use push::execute as push;
pub use status::execute as status;
pub use sync::execute as sync;

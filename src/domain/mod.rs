mod account;
mod expense;
mod ledger;
mod link;
mod money;
mod period;
mod user;
mod validation;

pub use account::*;
pub use expense::*;
pub use ledger::*;
pub use link::*;
pub use money::*;
pub use period::*;
pub use user::*;
pub use validation::*;

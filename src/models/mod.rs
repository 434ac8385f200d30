mod custom_program;
mod package;
mod purchase;
mod suggestion;
mod support_ticket;
mod user;

pub use custom_program::*;
pub use package::*;
pub use purchase::*;
pub use suggestion::*;
pub use support_ticket::*;
pub use user::*;

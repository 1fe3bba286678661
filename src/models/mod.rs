pub mod appointment;
pub mod document;
pub mod enums;
pub mod fiche;
pub mod intervention;
pub mod notification;
pub mod role;
pub mod user;
pub mod verification;

pub use appointment::*;
pub use document::*;
pub use fiche::*;
pub use intervention::*;
pub use notification::*;
pub use role::*;
pub use user::*;
pub use verification::*;

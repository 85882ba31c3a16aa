//! Domain - アプリレコード、ユーザー / チーム、Info、エラー

pub mod app;
pub mod errors;
pub mod info;
pub mod protected;
pub mod user;

pub use app::{App, AutoScale, EnvVar, LimitQuantity, Limits};
pub use errors::{ErrorKind, KeelError};
pub use info::{Address, Info, Pod, Status};
pub use protected::{PROTECTED_ENV_VARS, check_protected, is_protected};
pub use user::{Team, User};

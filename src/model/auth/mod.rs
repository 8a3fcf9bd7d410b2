mod guard;
mod token;

pub use guard::{AdminUser, Authenticated};
pub use token::AuthClaims;

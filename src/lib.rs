#![allow(dead_code)]

pub mod chips_challenge;
pub mod formats;
pub mod replay;

pub mod utils {
    pub mod prelude {
        pub use anyhow::{anyhow, Context, Error};
        pub type Result<T> = anyhow::Result<T, Error>;
    }
}

pub mod prelude {
    pub use super::chips_challenge::prelude::*;
    pub use super::formats::*;
    pub use super::replay::*;
    pub use super::utils::prelude::*;
}

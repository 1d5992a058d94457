pub use crate::error::*;

mod database;
mod entity;
mod error;
mod modify;
mod mq;
mod notify;
mod policy;
mod query;

#[cfg(feature = "prelude")]
pub mod prelude {
    pub mod entity {
        pub use crate::entity::*;
    }
    pub mod policy {
        pub use crate::policy::*;
    }
}

#[cfg(feature = "interface")]
pub mod interface {
    pub mod database {
        pub use crate::database::*;
    }
    pub mod query {
        pub use crate::query::*;
    }
    pub mod update {
        pub use crate::modify::*;
    }
    pub mod mq {
        pub use crate::mq::*;
    }
    pub mod notify {
        pub use crate::notify::*;
    }
}

//! Value objects - immutable types that represent domain concepts

mod dm_key;
mod snowflake;
mod storage_path;

pub use dm_key::DmKey;
pub use snowflake::{Snowflake, SnowflakeGenerator, SnowflakeParseError};
pub use storage_path::{
    StoragePath, StorageScope, DM_ROOT, GROUP_ROOT, MESSAGES_LEAF, PUBLIC_ROOT,
};

pub mod config_cache;
pub mod db_utils;

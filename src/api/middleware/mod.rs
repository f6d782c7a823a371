pub mod storage_hook;

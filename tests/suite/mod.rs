mod checkpoint;
mod config;
mod save_flow;

mod config;
mod frame;
mod keys;
mod loopback;

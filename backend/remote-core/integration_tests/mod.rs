mod helpers;
mod plain;
mod server;
mod signed;

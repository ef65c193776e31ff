mod controller;
mod helpers;
mod remote;

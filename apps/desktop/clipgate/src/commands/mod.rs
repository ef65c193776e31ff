pub mod keygen;
pub mod remote;
pub mod serve;

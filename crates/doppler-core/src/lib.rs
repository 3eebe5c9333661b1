pub mod config;
pub mod consts;
pub mod debad;
pub mod error;
pub mod filters;
pub mod interp;
pub mod io;
pub mod normalize;
pub mod optimize;
pub mod reduce;
pub mod rvm;
pub mod spectrum;
pub mod xcorr;

mod bootstrap;
mod contacts;
mod demo;
mod loop_runner;
mod paths;
mod world;

pub(crate) use bootstrap::build_app;
pub(crate) use loop_runner::run;

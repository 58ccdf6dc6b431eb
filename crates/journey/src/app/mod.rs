mod bootstrap;
mod gameplay;
mod loop_runner;
mod settings;
mod title;

pub(crate) use loop_runner::run;

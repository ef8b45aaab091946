mod classify;
mod generate;

pub(crate) use classify::classify_instance;
pub(crate) use generate::generate_application;

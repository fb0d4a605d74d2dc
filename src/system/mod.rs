pub(crate) mod history;
pub(crate) mod logger;
pub(crate) mod shutdown_handlers;
pub(crate) mod summary_output;

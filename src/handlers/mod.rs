pub(crate) mod mentor_handlers;
pub(crate) mod momo_handlers;
pub(crate) mod service_handlers;

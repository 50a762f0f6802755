pub(crate) mod classify;
pub(crate) mod driver;
pub(crate) mod kernel;
pub(crate) mod pipeline;
pub(crate) mod pool;
pub(crate) mod session;
